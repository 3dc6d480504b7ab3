use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Storage key of the registered device id
pub const DEVICE_ID_KEY: &str = "device_id";
/// Storage key of the IMEI the device id was registered with
pub const IMEI_KEY: &str = "imei";

/// Device id used for transactions when the terminal skipped registration
pub const FALLBACK_DEVICE_ID: &str = "webkernel-demo-001";

/// Prefix of device ids generated by early demo builds
pub const LEGACY_DEVICE_ID_PREFIX: &str = "demo-device-";

/// Lifecycle of the terminal
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TerminalState {
    #[default]
    Booting,
    Registering,
    InjectingKeys,
    Ready,
    Processing,
    Success,
    Error,
}

impl TerminalState {
    pub fn is_booting(self) -> bool {
        matches!(
            self,
            TerminalState::Booting | TerminalState::Registering | TerminalState::InjectingKeys
        )
    }

    pub fn is_finished(self) -> bool {
        matches!(self, TerminalState::Success | TerminalState::Error)
    }
}

/// Shape of a cached device id
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DeviceIdFormat {
    Uuid,
    Legacy,
    Unknown,
}

impl DeviceIdFormat {
    pub fn classify(device_id: &str) -> Self {
        if is_uuid(device_id) {
            DeviceIdFormat::Uuid
        } else if device_id.starts_with(LEGACY_DEVICE_ID_PREFIX) {
            DeviceIdFormat::Legacy
        } else {
            DeviceIdFormat::Unknown
        }
    }
}

/// Hyphenated form only, which is the only 36 character encoding
fn is_uuid(value: &str) -> bool {
    value.len() == 36 && Uuid::try_parse(value).is_ok()
}
