use serde::{Deserialize, Serialize};

use crate::model::Model;
use crate::types::TerminalState;

/// Number of cryptogram characters shown on the receipt line
const CRYPTOGRAM_PREVIEW_LEN: usize = 16;
/// Number of device id characters shown in the footer
const DEVICE_ID_PREVIEW_LEN: usize = 12;
const PLACEHOLDER: &str = "---";

/// Color of the status LED above the display
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Led {
    #[default]
    Blink,
    Green,
    Blue,
    Red,
}

impl From<TerminalState> for Led {
    fn from(state: TerminalState) -> Self {
        match state {
            TerminalState::Booting | TerminalState::Registering | TerminalState::InjectingKeys => {
                Led::Blink
            }
            TerminalState::Ready | TerminalState::Success => Led::Green,
            TerminalState::Processing => Led::Blue,
            TerminalState::Error => Led::Red,
        }
    }
}

/// Everything a shell needs to draw the terminal
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TerminalView {
    pub state: TerminalState,
    pub status_message: String,
    pub led: Led,
    /// Amount as typed, `None` when the display shows only the status
    pub amount: Option<String>,
    /// Amount charged, shown on the approval screen
    pub approved_amount: Option<String>,
    pub keypad_enabled: bool,
    pub action_label: String,
    pub action_enabled: bool,
    pub cryptogram: Option<String>,
    pub device_id: String,
    pub kernel_version: String,
    /// Versions offered by the backend, as last listed
    pub available_kernels: Vec<String>,
    /// Status reported by the kernel service health check
    pub kernel_service: Option<String>,
    pub is_loading: bool,
    pub error_message: Option<String>,
}

impl From<&Model> for TerminalView {
    fn from(model: &Model) -> Self {
        let state = model.state;
        let finished = state.is_finished();

        let amount = matches!(state, TerminalState::Ready | TerminalState::Processing).then(|| {
            if model.amount.is_empty() {
                "0.00".to_string()
            } else {
                model.amount.clone()
            }
        });

        let approved_amount = (state == TerminalState::Success).then(|| model.amount.clone());

        let cryptogram = (state == TerminalState::Success && !model.cryptogram.is_empty())
            .then(|| format!("TC: {}...", preview(&model.cryptogram, CRYPTOGRAM_PREVIEW_LEN)));

        let device_id = model.device_id.as_deref().map_or_else(
            || PLACEHOLDER.to_string(),
            |id| format!("ID: {}...", preview(id, DEVICE_ID_PREVIEW_LEN)),
        );

        TerminalView {
            state,
            status_message: model.status_message.clone(),
            led: state.into(),
            amount,
            approved_amount,
            keypad_enabled: state == TerminalState::Ready,
            action_label: if finished { "NEW TRANSACTION" } else { "PAY" }.to_string(),
            action_enabled: finished
                || (state == TerminalState::Ready && !model.amount.is_empty()),
            cryptogram,
            device_id,
            kernel_version: model
                .kernel_version
                .clone()
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            available_kernels: model
                .available_kernels
                .iter()
                .map(|kernel| kernel.version.clone())
                .collect(),
            kernel_service: model.health.as_ref().map(|health| health.status.clone()),
            is_loading: model.is_loading,
            error_message: model.error_message.clone(),
        }
    }
}

fn preview(value: &str, len: usize) -> &str {
    value
        .char_indices()
        .nth(len)
        .map_or(value, |(end, _)| &value[..end])
}
