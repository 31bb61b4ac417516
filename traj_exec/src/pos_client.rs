//! # Position Client
//!
//! Subscribes to the vehicle's position feed. Only used to acquire the origin of the trajectory.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    feed::PositionSample,
    net::{zmq, MonitoredSocket, MonitoredSocketError, NetParams, SocketOptions},
};

use crate::publisher::PositionFeed;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Maximum time a single poll blocks for, in milliseconds.
const POLL_TIMEOUT_MS: i32 = 100;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The position client
pub struct PosClient {
    socket: MonitoredSocket,
}

#[derive(Debug, thiserror::Error)]
pub enum PosClientError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not recieve a message from the position feed: {0}")]
    RecvError(zmq::Error),

    #[error("The position feed sent a message which was not valid UTF-8")]
    NonUtf8Message,

    #[error("Could not deserialize the position message: {0}")]
    DeserializeError(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PosClient {
    /// Create a new instance of the position client.
    ///
    /// This function will not block until the feed connects, so that waiting for it can be
    /// interrupted.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, PosClientError> {
        let socket_options = SocketOptions {
            block_on_first_connect: false,
            connect_timeout: 1000,
            heartbeat_ivl: 500,
            heartbeat_ttl: 1000,
            heartbeat_timeout: 1000,
            linger: 1,
            recv_timeout: POLL_TIMEOUT_MS,
            send_timeout: 10,
            subscriptions: vec![Vec::new()],
            ..Default::default()
        };

        let socket = MonitoredSocket::new(ctx, zmq::SUB, socket_options, &params.pos_endpoint)
            .map_err(PosClientError::SocketError)?;

        Ok(Self { socket })
    }

    /// Receive a single message, `None` if none arrived in time.
    fn recv(&self, flags: i32) -> Result<Option<PositionSample>, PosClientError> {
        let msg_str = match self.socket.recv_string(flags) {
            Ok(Ok(s)) => s,
            Ok(Err(_)) => return Err(PosClientError::NonUtf8Message),
            Err(zmq::Error::EAGAIN) => return Ok(None),
            Err(e) => return Err(PosClientError::RecvError(e)),
        };

        serde_json::from_str(&msg_str)
            .map(Some)
            .map_err(PosClientError::DeserializeError)
    }
}

impl PositionFeed for PosClient {
    type Error = PosClientError;

    /// Wait up to the poll timeout for a position, then drain anything already queued so the
    /// most recent reading is returned.
    fn poll_position(&mut self) -> Result<Option<PositionSample>, Self::Error> {
        let mut latest = match self.recv(0)? {
            Some(s) => s,
            None => return Ok(None),
        };

        while let Some(s) = self.recv(zmq::DONTWAIT)? {
            latest = s;
        }

        Ok(Some(latest))
    }

    fn is_connected(&self) -> bool {
        self.socket.connected()
    }
}
