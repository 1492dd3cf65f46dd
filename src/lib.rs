//! Offline-first request worker for the Muloqot Plus web app.

pub mod cache;
pub mod config;
pub mod http;
pub mod install_prompt;
pub mod logging;
pub mod network;
pub mod poller;
pub mod template;
pub mod worker;
