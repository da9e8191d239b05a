pub mod config;
pub mod constants;
pub mod credential;
pub mod history;
pub mod keyring;
pub mod message;
pub mod orchestrator;
