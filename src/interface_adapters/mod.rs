// Interface adapters: wire protocol, network handling and in-memory stores.

pub mod http;
pub mod net;
pub mod protocol;
pub mod routes;
pub mod state;
pub mod utils;
