use chrono_tz::Tz;

/// HC-SR04 の最小測定周期（ミリ秒）
pub const MIN_MEASUREMENT_INTERVAL_MS: u32 = 60;

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    InvalidClearanceHeight(String),
    InvalidMountHeight(u32),
    InvalidDeviceId(String),
    InvalidBrokerUrl(String),
    InvalidTimezone(String),
    InvalidHeartbeatEvery(u32),
    InvalidMeasurementInterval(u32),
}

pub fn parse_clearance_height(value: &str) -> Result<f64, ValidationError> {
    match value.trim().parse::<f64>() {
        Ok(feet) if feet.is_finite() && feet > 0.0 => Ok(feet),
        _ => Err(ValidationError::InvalidClearanceHeight(value.to_string())),
    }
}

pub fn parse_mount_height(cm: u32) -> Result<f64, ValidationError> {
    if cm == 0 {
        Err(ValidationError::InvalidMountHeight(cm))
    } else {
        Ok(cm as f64)
    }
}

/// デバイスIDはMQTTトピックの一部になるため、ワイルドカードと区切り文字は使えない
pub fn validate_device_id(device_id: &str) -> Result<(), ValidationError> {
    let invalid = device_id.is_empty()
        || device_id
            .chars()
            .any(|c| c == '/' || c == '+' || c == '#' || c.is_whitespace());
    if invalid {
        Err(ValidationError::InvalidDeviceId(device_id.to_string()))
    } else {
        Ok(())
    }
}

pub fn validate_broker_url(url: &str) -> Result<(), ValidationError> {
    let host = url
        .strip_prefix("mqtt://")
        .or_else(|| url.strip_prefix("mqtts://"));
    match host {
        Some(rest) if !rest.is_empty() && !rest.starts_with(':') => Ok(()),
        _ => Err(ValidationError::InvalidBrokerUrl(url.to_string())),
    }
}

pub fn parse_timezone(value: &str) -> Result<Tz, ValidationError> {
    value
        .parse::<Tz>()
        .map_err(|_| ValidationError::InvalidTimezone(value.to_string()))
}

pub fn parse_heartbeat_every(value: u32) -> Result<u32, ValidationError> {
    if value == 0 {
        Err(ValidationError::InvalidHeartbeatEvery(value))
    } else {
        Ok(value)
    }
}

pub fn parse_measurement_interval_ms(value: u32) -> Result<u32, ValidationError> {
    if value < MIN_MEASUREMENT_INTERVAL_MS {
        Err(ValidationError::InvalidMeasurementInterval(value))
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clearance_height() {
        assert_eq!(parse_clearance_height("13.5"), Ok(13.5));
        assert_eq!(parse_clearance_height(" 12 "), Ok(12.0));
        assert!(parse_clearance_height("").is_err());
        assert!(parse_clearance_height("abc").is_err());
        assert!(parse_clearance_height("-1").is_err());
        assert!(parse_clearance_height("0").is_err());
        assert!(parse_clearance_height("inf").is_err());
    }

    #[test]
    fn test_parse_mount_height() {
        assert_eq!(parse_mount_height(450), Ok(450.0));
        assert_eq!(parse_mount_height(0), Err(ValidationError::InvalidMountHeight(0)));
    }

    #[test]
    fn test_validate_device_id() {
        assert!(validate_device_id("TEST_001").is_ok());
        assert!(validate_device_id("").is_err());
        assert!(validate_device_id("a/b").is_err());
        assert!(validate_device_id("dev+1").is_err());
        assert!(validate_device_id("dev#").is_err());
        assert!(validate_device_id("dev 1").is_err());
    }

    #[test]
    fn test_validate_broker_url() {
        assert!(validate_broker_url("mqtt://192.168.1.152:1883").is_ok());
        assert!(validate_broker_url("mqtts://broker.example.com").is_ok());
        assert!(validate_broker_url("http://192.168.1.152").is_err());
        assert!(validate_broker_url("mqtt://").is_err());
        assert!(validate_broker_url("mqtt://:1883").is_err());
        assert!(validate_broker_url("").is_err());
    }

    #[test]
    fn test_parse_timezone() {
        assert_eq!(parse_timezone("Asia/Tokyo"), Ok(chrono_tz::Asia::Tokyo));
        assert_eq!(parse_timezone("UTC"), Ok(chrono_tz::UTC));
        assert!(parse_timezone("Mars/Olympus").is_err());
    }

    #[test]
    fn test_parse_heartbeat_every() {
        assert_eq!(parse_heartbeat_every(10), Ok(10));
        assert!(parse_heartbeat_every(0).is_err());
    }

    #[test]
    fn test_parse_measurement_interval() {
        assert_eq!(parse_measurement_interval_ms(2000), Ok(2000));
        assert_eq!(parse_measurement_interval_ms(60), Ok(60));
        assert!(parse_measurement_interval_ms(59).is_err());
    }
}
