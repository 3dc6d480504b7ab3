mod boot;
mod kernel;
mod payment;
mod ui;

use crux_core::Command;

use crate::events::Event;
use crate::model::Model;
use crate::Effect;

/// Main update dispatcher - routes events to domain-specific handlers
pub fn update(event: Event, model: &mut Model) -> Command<Effect, Event> {
    match event {
        Event::Initialize { config } => boot::initialize(config, model),
        Event::Boot(event) => boot::handle(event, model),
        Event::Payment(event) => payment::handle(event, model),
        Event::Kernel(event) => kernel::handle(event, model),
        Event::Ui(event) => ui::handle(event, model),
    }
}
