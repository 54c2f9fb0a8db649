//! Websocket bridge between the operator console in the browser and the
//! match loop.
//!
//! The loop pushes console messages through a [`BroadcastConsole`] and drains
//! operator commands from the [`ConsoleBridge`] once per tick. The server only
//! relays text in both directions.

mod console;
mod routes;
mod server;

pub use console::BroadcastConsole;
pub use server::{router, serve, start, ConsoleBridge, ServerState, UiConfig};
