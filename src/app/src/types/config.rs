use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_valid::Validate;

/// Trusted execution environment reported at device registration
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TeeType {
    #[default]
    Qtee,
    TrustZone,
}

/// Operating mode reported at device registration
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceMode {
    #[default]
    FullPos,
    PinPad,
}

/// Terminal configuration
///
/// Serialized in camelCase so that a `config.json` written for the browser
/// shell can be used unchanged by every shell.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct TerminalConfig {
    /// Base URL of the SoftPOS backend
    #[validate(pattern = r"^https?://\S+$")]
    pub backend_url: String,

    /// Fixed IMEI this simulated device registers with
    #[validate(pattern = r"^[0-9]{15}$")]
    pub default_imei: String,

    #[validate(min_length = 1)]
    pub device_model: String,

    pub tee_type: TeeType,
    pub device_mode: DeviceMode,
    pub debug: bool,

    /// Register the device and inject keys during boot
    pub auto_register: bool,

    /// Kernel version to load instead of the latest stable one
    pub kernel_version: Option<String>,

    /// Kernel service queried for health information
    pub kernel_service_url: Option<String>,

    /// ISO 3166 numeric terminal country code handed to the kernel
    #[validate(pattern = r"^[0-9]{3}$")]
    pub country_code: String,

    /// Currency the kernel instance is created with
    #[validate(min_length = 3)]
    #[validate(max_length = 3)]
    pub kernel_currency: String,

    /// Currency reported to the backend for transactions
    #[validate(min_length = 3)]
    #[validate(max_length = 3)]
    pub transaction_currency: String,

    /// Service returning `{"ip": "..."}` for the client IP of a transaction
    pub client_ip_lookup_url: Option<String>,

    #[validate(minimum = -90.0)]
    #[validate(maximum = 90.0)]
    pub latitude: f64,

    #[validate(minimum = -180.0)]
    #[validate(maximum = 180.0)]
    pub longitude: f64,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8080".to_string(),
            default_imei: "863592048725123".to_string(),
            device_model: "Sunbay-Web-Demo".to_string(),
            tee_type: TeeType::Qtee,
            device_mode: DeviceMode::FullPos,
            debug: true,
            auto_register: true,
            kernel_version: None,
            kernel_service_url: None,
            country_code: "156".to_string(),
            kernel_currency: "CNY".to_string(),
            transaction_currency: "USD".to_string(),
            client_ip_lookup_url: Some("https://api.ipify.org?format=json".to_string()),
            latitude: 37.7749,
            longitude: -122.4194,
        }
    }
}

impl TerminalConfig {
    /// Merge a partial JSON object over the current values
    ///
    /// Keys that are not configuration fields are ignored. A value of the wrong
    /// type rejects the whole merge and leaves `self` untouched.
    pub fn merge(&mut self, overrides: &Value) -> Result<(), String> {
        let Value::Object(overrides) = overrides else {
            return Err("configuration overrides must be a JSON object".to_string());
        };

        let Value::Object(mut merged) = serde_json::to_value(&*self)
            .map_err(|e| format!("failed to serialize configuration: {e}"))?
        else {
            return Err("configuration did not serialize to an object".to_string());
        };

        for (key, value) in overrides {
            if !merged.contains_key(key) {
                log::debug!("ignoring unknown configuration key {key}");
                continue;
            }

            let mut probe: Map<String, Value> = merged.clone();
            probe.insert(key.clone(), value.clone());
            if let Err(e) = serde_json::from_value::<TerminalConfig>(Value::Object(probe)) {
                return Err(format!("invalid value for {key}: {e}"));
            }

            merged.insert(key.clone(), value.clone());
        }

        *self = serde_json::from_value(Value::Object(merged))
            .map_err(|e| format!("failed to apply configuration: {e}"))?;

        Ok(())
    }

    /// Validate all fields, flattening the errors into one message
    pub fn ensure_valid(&self) -> Result<(), String> {
        self.validate()
            .map_err(|e| format!("invalid terminal configuration: {e}"))
    }
}
