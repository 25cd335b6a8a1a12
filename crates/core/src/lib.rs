//! Provider-agnostic text generation for the Revolt voice assistant.
//!
//! The server crate talks to the generation backend only through the traits in
//! [`llm_client`]; everything Gemini-specific stays in this crate.

pub mod error;
pub mod llm_client;
pub mod prompt;

pub use error::GenerationError;
