//! Abz is a terminal chat client for OpenRouter-compatible completion APIs.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the transcript, the credential, configuration and the
//!   orchestrator that turns a submission into one completion round-trip.
//! - [`api`] defines the wire payloads and the HTTP completion client.
//! - [`ui`] renders chat state and runs the interactive event loop.
//! - [`cli`] parses arguments and dispatches to the chat loop or to the
//!   one-shot commands.
//!
//! The binary (`src/main.rs`) only calls [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod logging;
pub mod ui;
