//! WebSocket lifecycle state and observable events.

/// Connection lifecycle state.
///
/// `Closed` is both the initial and the terminal state; in it every
/// internal handle (socket, cancellation source, receive-loop handle) is
/// released. Transitions are serialized: control calls assume
/// single-threaded sequencing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Closed,
    Connecting,
    Open,
    Closing,
}

/// Observable client events, each raised exactly once per occurrence.
///
/// Delivered on the broadcast channel returned by
/// [`WsClient::subscribe_events`](super::WsClient::subscribe_events), for
/// observers outside the callback/handler model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WsEvent {
    /// A connection attempt sequence has started.
    Connecting,
    /// The connection is open.
    Connected,
    /// A connect attempt failed; retrying. Raised once per attempt.
    Reconnecting { attempt: u32 },
    /// An orderly shutdown has started.
    Closing,
    /// The connection is fully closed and all handles are released.
    Closed,
    /// One text frame was received.
    TextReceived(String),
    /// One binary frame was received.
    BinaryReceived(Vec<u8>),
}
