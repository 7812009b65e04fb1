//! Editing-session state machine: step sequencing, validation, the submit
//! flow with its modal scroll lock, and the HTTP handlers that drive it.

pub mod completeness;
pub mod handlers;
pub mod modal;
pub mod sequencer;
pub mod session;
pub mod store;
pub mod validation;

pub use store::SessionStore;
