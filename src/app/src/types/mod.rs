//! Domain-based type organization
//!
//! Types are organized by domain to match the structure in `update/`:
//! - backend: request/response DTOs of the SoftPOS backend
//! - config: terminal configuration
//! - terminal: terminal state and client-local identity

pub mod backend;
pub mod config;
pub mod terminal;

pub use backend::*;
pub use config::*;
pub use terminal::*;
