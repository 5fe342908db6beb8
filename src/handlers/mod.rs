//! HTTP handlers, grouped the way the public API is grouped.

pub mod everspass_handlers;
pub mod eversvoz_handlers;
pub mod health_handlers;
pub mod misc_handlers;
pub mod portfolio_handlers;
pub mod status_handlers;
