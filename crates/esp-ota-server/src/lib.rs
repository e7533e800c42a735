//! esp-ota-server: over-the-air firmware updates for ESP32 devices
//!
//! Devices poll `GET /update` with their running firmware version. Devices
//! on the target version get `304 Not Modified`, all others download the
//! firmware image as an attachment.

pub mod api;
pub mod config;
pub mod firmware;
pub mod server;

#[cfg(test)]
mod proptests;

pub use config::ServerConfig;
pub use server::UpdateServer;
