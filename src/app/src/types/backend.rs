use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_valid::Validate;

use super::config::{DeviceMode, TeeType};

/// Kernel release metadata published by the backend
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct KernelVersion {
    pub id: String,
    pub version: String,
    pub file_path: String,
    /// SHA-256 of the module, hex encoded
    pub file_hash: String,
    pub file_size: u64,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Capabilities reported by the kernel service health endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HealthCapabilities {
    pub nfc_available: bool,
    pub tee_available: bool,
    pub emv_processing: bool,
    pub apdu_processing: bool,
    pub network_available: bool,
    pub gps_available: bool,
    pub backend_connected: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub capabilities: Option<HealthCapabilities>,
}

/// Placeholder key registered for the simulated device
pub const MOCK_PUBLIC_KEY: &str = "-----BEGIN PUBLIC KEY-----\nMIIBIjANBgkqhkiG9w0BAQEFAAOCAQ8AMIIBCgKCAQEA...\n-----END PUBLIC KEY-----";

/// Device registration payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct RegisterDeviceRequest {
    #[validate(pattern = r"^[0-9]{15}$")]
    pub imei: String,
    #[validate(min_length = 1)]
    pub model: String,
    pub os_version: String,
    pub tee_type: TeeType,
    pub public_key: String,
    pub device_mode: DeviceMode,
    pub nfc_present: bool,
}

/// Registration outcome; `message` tells a reused device from a new one
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistrationResult {
    pub device_id: Option<String>,
    pub message: Option<String>,
}

impl RegistrationResult {
    pub fn is_existing_device(&self) -> bool {
        self.message
            .as_deref()
            .is_some_and(|m| m.contains("already registered"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InjectKeyRequest {
    pub device_id: String,
}

/// Device integrity report attached to an attestation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheck {
    pub root_detection: bool,
    pub emulator_detection: bool,
    pub debugger_detection: bool,
    pub hook_detection: bool,
    pub tamper_detection: bool,
    pub security_score: u8,
}

impl Default for HealthCheck {
    fn default() -> Self {
        Self {
            root_detection: false,
            emulator_detection: false,
            debugger_detection: false,
            hook_detection: false,
            tamper_detection: false,
            security_score: 95,
        }
    }
}

/// Test card presented by the simulated terminal
pub mod test_card {
    pub const NUMBER: &str = "4111111111111111";
    pub const NUMBER_MASKED: &str = "4111********1111";
    pub const EXPIRY: &str = "12/25";
    pub const CVV: &str = "123";
    pub const HOLDER: &str = "TEST USER";
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttestRequest {
    pub device_id: String,
    /// Amount in minor units
    pub amount: u64,
    pub currency: String,
    pub card_number: String,
    pub expiry_date: String,
    pub cvv: String,
    pub cardholder_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub health_check: HealthCheck,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttestResult {
    pub transaction_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    pub device_id: String,
    pub transaction_type: String,
    pub amount: u64,
    pub currency: String,
    pub encrypted_pin_block: String,
    pub ksn: String,
    pub card_number_masked: String,
    pub transaction_token: String,
    pub latitude: f64,
    pub longitude: f64,
    pub location_accuracy: f64,
    pub location_timestamp: String,
    pub client_ip: String,
}

/// Processing outcome; everything besides the cryptogram is kept verbatim
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProcessResult {
    pub cryptogram: Option<String>,
    #[serde(flatten)]
    pub details: serde_json::Map<String, Value>,
}

/// Answer of the client IP lookup service
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientIp {
    pub ip: String,
}

/// Strip the optional `{ code, data, message }` envelope of backend responses
///
/// The `message` of the envelope is copied into `data` when `data` is an
/// object without a message of its own.
pub fn unwrap_envelope(document: Value) -> Value {
    let Value::Object(mut envelope) = document else {
        return document;
    };

    match envelope.remove("data") {
        Some(Value::Null) | None => Value::Object(envelope),
        Some(Value::Object(mut data)) => {
            if let Some(message) = envelope.remove("message") {
                data.entry("message").or_insert(message);
            }
            Value::Object(data)
        }
        Some(data) => data,
    }
}
