//! Recruiting automation service: weighted candidate scoring and a
//! configurable interview pipeline over a shared store.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
