//! WebSocket Session Management
//!
//! - `protocol`: the JSON message format exchanged with the browser.
//! - `controller`: per-session single-flight generation and interruption.
//! - `session`: the connection lifecycle, from upgrade to teardown.

pub mod controller;
pub mod protocol;
pub mod session;

pub use session::{root_handler, ws_handler};
