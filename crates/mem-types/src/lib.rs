//! Core types and the store trait for the Memory Management API.
//!
//! DTOs here are the JSON wire format shared by the server and the deployment checker.

mod dto;
mod traits;

pub use dto::*;
pub use traits::*;
