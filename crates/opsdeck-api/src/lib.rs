// opsdeck-api: Async HTTP + WebSocket client for the opsdeck admin backend

pub mod endpoints;
pub mod error;
pub mod models;
pub mod realtime;
pub mod rest;
pub mod transport;

pub use error::Error;
pub use realtime::{ChannelState, PushEvent, RealtimeHandle, ReconnectConfig, SequenceSource};
pub use rest::AdminClient;
pub use transport::{TlsMode, TransportConfig};
