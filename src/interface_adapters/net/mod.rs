// Network adapter modules: per-socket connection handling and session fan-out.

pub mod client;
pub mod hub;

pub use client::ws_handler;
pub use hub::ConnectionHub;
