use std::time::Duration;

use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::modem::Modem,
    nvs::EspDefaultNvsPartition,
    sntp::{EspSntp, SyncStatus},
    wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi},
};
use log::{info, warn};

use crate::core::config::AppConfig;

/// SNTP同期の最大待ち時間
pub const SNTP_SYNC_TIMEOUT: Duration = Duration::from_secs(15);

/// WiFi接続と時刻同期を管理するモジュール
pub struct NetworkManager;

impl NetworkManager {
    /// WiFiにSTAモードで接続し、ネットワークが使えるまで待ちます
    pub fn connect_wifi(
        modem: Modem,
        sysloop: &EspSystemEventLoop,
        nvs_partition: &EspDefaultNvsPartition,
        config: &AppConfig,
    ) -> anyhow::Result<BlockingWifi<EspWifi<'static>>> {
        if config.wifi_ssid.is_empty() {
            anyhow::bail!("WiFi SSIDが設定されていません。cfg.toml の wifi_ssid を確認してください");
        }

        let mut wifi = BlockingWifi::wrap(
            EspWifi::new(modem, sysloop.clone(), Some(nvs_partition.clone()))?,
            sysloop.clone(),
        )?;

        let auth_method = if config.wifi_password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };

        wifi.set_configuration(&Configuration::Client(ClientConfiguration {
            ssid: config
                .wifi_ssid
                .as_str()
                .try_into()
                .map_err(|_| anyhow::anyhow!("WiFi SSIDが長すぎます: {}", config.wifi_ssid))?,
            password: config
                .wifi_password
                .as_str()
                .try_into()
                .map_err(|_| anyhow::anyhow!("WiFi パスワードが長すぎます"))?,
            auth_method,
            ..Default::default()
        }))?;

        wifi.start()?;
        info!("WiFiをSTAモードで起動しました。接続中: {}", config.wifi_ssid);

        wifi.connect()?;
        wifi.wait_netif_up()?;

        let ip_info = wifi.wifi().sta_netif().get_ip_info()?;
        info!("✓ WiFi接続完了: IP {}", ip_info.ip);

        Ok(wifi)
    }

    /// SNTPで時刻を同期します
    ///
    /// 同期できなくても処理は続行します（タイムスタンプは起動時刻基準になります）。
    pub fn sync_time() -> anyhow::Result<EspSntp<'static>> {
        let sntp = EspSntp::new_default()?;
        info!("SNTP時刻同期を開始...");

        let step = Duration::from_millis(200);
        let mut waited = Duration::ZERO;
        while sntp.get_sync_status() != SyncStatus::Completed {
            if waited >= SNTP_SYNC_TIMEOUT {
                warn!("SNTP同期がタイムアウトしました（{}秒）", SNTP_SYNC_TIMEOUT.as_secs());
                return Ok(sntp);
            }
            std::thread::sleep(step);
            waited += step;
        }

        info!("✓ SNTP時刻同期完了");
        Ok(sntp)
    }
}
