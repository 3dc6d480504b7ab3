pub mod api;
pub mod commands;
pub mod emv;
pub mod events;
pub mod http_helpers;
pub mod macros;
pub mod model;
pub mod types;
pub mod update;
pub mod view;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

use crux_core::Command;

// Re-export core types
pub use crate::{
    commands::{
        kernel::{KernelOperation, KernelOutput},
        storage::{StorageOperation, StorageOutput},
    },
    emv::{AcType, EmvStep},
    events::{BootEvent, Event, KernelEvent, PaymentEvent, UiEvent},
    http_helpers::{
        check_response_status, decode_backend_json, extract_bytes_response, extract_error_message,
        is_response_success, join_url, map_http_error, parse_json_response, process_bytes_response,
        process_json_response, process_status_response,
    },
    model::{Model, Transaction},
    types::*,
    view::{Led, TerminalView},
};
pub use crux_http::Result as HttpResult;

#[crux_macros::effect(typegen)]
pub enum Effect {
    Render(crux_core::render::RenderOperation),
    Http(crux_http::protocol::HttpRequest),
    Kernel(KernelOperation),
    Storage(StorageOperation),
}

pub type HttpCmd = crux_http::command::Http<Effect, Event>;
pub type KernelCmd = crate::commands::kernel::Kernel<Effect, Event>;
pub type StorageCmd = crate::commands::storage::Storage<Effect, Event>;

/// The Core application
#[derive(Default)]
pub struct App;

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = TerminalView;
    type Effect = Effect;

    fn update(&self, event: Self::Event, model: &mut Self::Model) -> Command<Effect, Event> {
        update::update(event, model)
    }

    fn view(&self, model: &Self::Model) -> Self::ViewModel {
        TerminalView::from(model)
    }
}

#[cfg(test)]
mod tests;
