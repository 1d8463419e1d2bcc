//! HTTP gateway over the query service.

pub mod app;
pub mod client;
pub mod error;
pub mod handlers;
pub mod state;
