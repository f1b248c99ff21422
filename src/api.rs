use serde_json::{Value, json};

use crate::types::DeviceId;
use crate::{Error, Result};

pub const ZONES_PATH: &str = "/api/manager/zones/zone?recursive=1";
pub const DEVICES_PATH: &str = "/api/manager/devices/device";

pub fn device_state_path(device: &DeviceId) -> String {
    format!("/api/manager/devices/device/{device}/state")
}

pub fn state_update_payload(temperature: i32) -> Value {
    json!({
        "target_temperature": temperature
    })
}

/// Every hub response wraps its payload in `{ "result": ... }`.
pub fn parse_result(body: &str) -> Result<Value> {
    let parsed: Value = serde_json::from_str(body)?;
    parsed
        .get("result")
        .cloned()
        .ok_or_else(|| Error::Envelope("missing result field".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_path_embeds_device_id() {
        let path = device_state_path(&DeviceId::new("abc-123"));
        assert_eq!(path, "/api/manager/devices/device/abc-123/state");
    }

    #[test]
    fn state_payload_structure() {
        let payload = state_update_payload(21);
        assert_eq!(payload["target_temperature"], 21);
    }

    #[test]
    fn parse_result_unwraps_envelope() {
        let body = r#"{"result": {"id": 1, "children": {}}}"#;
        let result = parse_result(body).unwrap();
        assert_eq!(result["id"], 1);
    }

    #[test]
    fn parse_result_rejects_missing_envelope() {
        let err = parse_result(r#"{"id": 1}"#).unwrap_err();
        assert!(matches!(err, Error::Envelope(_)));
    }

    #[test]
    fn parse_result_rejects_invalid_json() {
        let err = parse_result("not json").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }
}
