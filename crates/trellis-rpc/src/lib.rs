//! Trellis RPC - Link engine bridge for editor hosts
//!
//! Exposes decorations, link resolution, autocomplete and the graph view
//! over line-delimited JSON-RPC 2.0, one session per connection.

pub mod error;
pub mod server;
pub mod session;
pub mod transport;

pub use error::{RpcError, RpcResult};
pub use server::RpcServer;
pub use session::{Session, SessionOptions};
pub use transport::{JsonRpcRequest, JsonRpcResponse, LineTransport};
