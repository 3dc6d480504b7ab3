use serde::{Deserialize, Serialize};

use crate::emv::EmvStep;
use crate::types::*;

/// Payment in flight between PAY and the final verdict
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Amount in minor units
    pub amount_minor: u64,
    pub requested_at: String,
    pub step: EmvStep,
    pub aid: Option<String>,
    /// Cryptogram produced by the local kernel
    pub local_cryptogram: Option<String>,
    pub transaction_token: Option<String>,
}

/// Application Model - the complete state
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
pub struct Model {
    pub config: TerminalConfig,

    // Terminal state
    pub state: TerminalState,
    pub status_message: String,
    pub amount: String,
    pub cryptogram: String,
    pub transaction: Option<Transaction>,

    // Device identity
    pub device_id: Option<String>,
    pub cached_device_id: Option<String>,
    pub registration_done: bool,

    // Kernel state
    pub kernel_version: Option<String>,
    pub pending_kernel: Option<KernelVersion>,
    pub kernel_loaded: bool,
    pub available_kernels: Vec<KernelVersion>,
    pub health: Option<HealthResponse>,

    // UI state for side operations that do not change the terminal state
    pub is_loading: bool,
    pub error_message: Option<String>,
}

impl Model {
    /// Move the terminal to `state` and show `message`
    pub fn transition(&mut self, state: TerminalState, message: impl Into<String>) {
        let message = message.into();
        log::debug!("terminal {:?} -> {state:?}: {message}", self.state);
        self.state = state;
        self.status_message = message;
    }

    /// Boot failed; the terminal shows a declined screen
    pub fn fail_initialization(&mut self, reason: &str) {
        log::error!("initialization failed: {reason}");
        self.transition(TerminalState::Error, "Initialization Failed");
    }

    /// The payment failed; the terminal shows a declined screen
    pub fn fail_transaction(&mut self, reason: &str) {
        log::error!("transaction error: {reason}");
        self.transaction = None;
        self.transition(TerminalState::Error, "Transaction Failed");
    }

    /// The terminal finished booting and can take payments
    pub fn is_operational(&self) -> bool {
        self.kernel_loaded && self.registration_done
    }

    /// Device id reported with transactions
    pub fn transaction_device_id(&self) -> String {
        self.device_id
            .clone()
            .unwrap_or_else(|| FALLBACK_DEVICE_ID.to_string())
    }

    /// Start a loading operation (sets is_loading=true, clears error)
    pub fn start_loading(&mut self) {
        self.is_loading = true;
        self.error_message = None;
    }

    /// Stop loading and clear error
    pub fn stop_loading(&mut self) {
        self.is_loading = false;
        self.error_message = None;
    }

    /// Set an error message and stop loading
    pub fn set_error(&mut self, error: String) {
        self.is_loading = false;
        self.error_message = Some(error);
    }

    /// Set an error message, stop loading, and return a render command
    pub fn set_error_and_render(
        &mut self,
        error: String,
    ) -> crux_core::Command<crate::Effect, crate::events::Event> {
        self.set_error(error);
        crux_core::render::render()
    }
}
