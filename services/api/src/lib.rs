//! Yovo API Library Crate
//!
//! This library contains the web-facing half of the Yovo voice advisor:
//! configuration, shared state, HTTP handlers, the WebSocket session
//! transport, and routing. The `api` binary is a thin wrapper around it.

pub mod config;
pub mod handlers;
pub mod models;
pub mod router;
pub mod state;
pub mod ws;
