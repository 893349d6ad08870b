use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use embedded_svc::mqtt::client::QoS;
use esp_idf_svc::mqtt::client::{EspMqttClient, EventPayload, MqttClientConfiguration};
use log::{info, warn};

use crate::core::config::AppConfig;
use crate::core::report::{Report, ReportError, Reporter};

/// MQTT keep-alive
pub const KEEP_ALIVE: Duration = Duration::from_secs(60);

/// MQTTブローカーへの送信
///
/// 送信キューと再接続は esp-mqtt タスクが管理します。イベントコールバックは
/// 接続状態フラグを更新するだけで、ディスプレイやセンサーには触れません。
pub struct MqttReporter {
    client: EspMqttClient<'static>,
    connected: Arc<AtomicBool>,
}

impl MqttReporter {
    /// クライアントを作成して接続を開始します（接続完了は待ちません）
    pub fn connect(config: &AppConfig) -> Result<Self, ReportError> {
        let connected = Arc::new(AtomicBool::new(false));
        let flag = connected.clone();
        let broker = config.mqtt_broker_url.clone();
        let client_id = format!("clearance-detector-{}", config.device_id);

        let mqtt_config = MqttClientConfiguration {
            client_id: Some(&client_id),
            keep_alive_interval: Some(KEEP_ALIVE),
            ..Default::default()
        };

        info!("MQTTブローカーに接続中: {}", config.mqtt_broker_url);
        let client = EspMqttClient::new_cb(&config.mqtt_broker_url, &mqtt_config, move |event| {
            match event.payload() {
                EventPayload::Connected(_) => {
                    flag.store(true, Ordering::SeqCst);
                    info!("✓ MQTTブローカーに接続しました: {}", broker);
                }
                EventPayload::Disconnected => {
                    flag.store(false, Ordering::SeqCst);
                    warn!("MQTTブローカーから切断されました");
                }
                EventPayload::Error(e) => warn!("MQTTエラー: {:?}", e),
                _ => {}
            }
        })
        .map_err(|e| ReportError::Connect(format!("{:?}", e)))?;

        Ok(Self { client, connected })
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// 接続完了を最大 `timeout` 待ちます
    pub fn wait_connected(&self, timeout: Duration) -> bool {
        let step = Duration::from_millis(100);
        let mut waited = Duration::ZERO;
        while !self.is_connected() && waited < timeout {
            std::thread::sleep(step);
            waited += step;
        }
        self.is_connected()
    }
}

impl Reporter for MqttReporter {
    fn publish(&mut self, report: &Report) -> Result<(), ReportError> {
        let payload = report.to_json()?;
        let topic = report.topic();
        self.client
            .enqueue(&topic, QoS::AtLeastOnce, false, payload.as_bytes())
            .map_err(|e| ReportError::Transport(format!("{:?}", e)))?;
        Ok(())
    }
}
