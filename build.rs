fn main() {
    // cfg.toml はビルド時に toml-cfg が読み込む（無ければデフォルト値）
    println!("cargo:rerun-if-changed=cfg.toml");
    if !std::path::Path::new("cfg.toml").exists() {
        println!("cargo:warning=cfg.toml が見つかりません。cfg.toml.example をコピーして設定してください");
    }

    #[cfg(feature = "esp")]
    embuild::espidf::sysenv_output();
}
