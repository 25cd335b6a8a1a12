//! Revolt Voice Assistant API Library Crate
//!
//! This library contains the server side of the voice assistant: configuration,
//! the session registry, the WebSocket protocol and session controller, and
//! routing. The `api` binary is a thin wrapper around this library.

pub mod config;
pub mod handlers;
pub mod registry;
pub mod router;
pub mod state;
pub mod ws;
