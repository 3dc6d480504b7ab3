use serde::{Deserialize, Serialize};

use crate::commands::{kernel::KernelOutput, storage::StorageOutput};
use crate::types::*;

/// Boot sequence events: kernel download, registration, key injection
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum BootEvent {
    #[serde(skip)]
    CachedDeviceIdLoaded(StorageOutput),
    #[serde(skip)]
    KernelMetadataResponse(Result<KernelVersion, String>),
    #[serde(skip)]
    KernelDownloadResponse(Result<Vec<u8>, String>),
    #[serde(skip)]
    KernelLoaded(KernelOutput),
    #[serde(skip)]
    MockKernelLoaded(KernelOutput),
    #[serde(skip)]
    RegisterResponse(Result<RegistrationResult, String>),
    #[serde(skip)]
    IdentityPersisted(StorageOutput),
    #[serde(skip)]
    InjectKeysResponse(Result<(), String>),
}

/// Keypad and transaction events
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum PaymentEvent {
    KeyPress {
        key: char,
    },
    Clear,
    /// `requested_at` is the RFC 3339 time the PAY key was pressed
    Pay {
        requested_at: String,
    },
    NewTransaction,

    #[serde(skip)]
    KernelStepCompleted(KernelOutput),
    #[serde(skip)]
    AttestResponse(Result<AttestResult, String>),
    #[serde(skip)]
    ClientIpResponse(Result<ClientIp, String>),
    #[serde(skip)]
    ProcessResponse(Result<ProcessResult, String>),
}

/// Kernel management outside of the boot sequence
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum KernelEvent {
    ListKernels,
    LoadVersion {
        version: String,
    },
    CheckHealth,

    #[serde(skip)]
    KernelListResponse(Result<Vec<KernelVersion>, String>),
    #[serde(skip)]
    VersionDownloadResponse(Result<Vec<u8>, String>),
    #[serde(skip)]
    VersionLoaded(KernelOutput),
    #[serde(skip)]
    HealthCheckResponse(Result<HealthResponse, String>),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum UiEvent {
    ClearError,
}

/// Events that can happen in the app
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Event {
    Initialize { config: TerminalConfig },
    Boot(BootEvent),
    Payment(PaymentEvent),
    Kernel(KernelEvent),
    Ui(UiEvent),
}
