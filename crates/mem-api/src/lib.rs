//! Memory Management API: HTTP surface, launcher, and configuration.

pub mod config;
pub mod docs;
pub mod error;
pub mod launcher;
pub mod server;
