//! Remote suggestion backend: wire protocol, transport and the
//! reconnecting client

pub mod client;
pub mod protocol;
pub mod state;
pub mod transport;

pub use client::{ConnectionObserver, NoopObserver, RemoteSuggestionClient, SuggestionBatch};
pub use protocol::{parse_inbound, Inbound, Outbound, RemoteEntry};
pub use state::{
    ConnectionEvent, ConnectionMachine, ConnectionPhase, Effect, ReconnectPolicy, CLOSE_ABNORMAL,
    CLOSE_NORMAL, CLOSE_NO_STATUS,
};
pub use transport::{ChannelEvent, Connector, DuplexChannel, WebSocketConnector};
