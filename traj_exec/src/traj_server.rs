//! # Trajectory Server
//!
//! Publishes trajectory windows to the downstream consumer.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::info;

use comms_if::{
    net::{zmq, MonitoredSocket, MonitoredSocketError, NetParams, SocketOptions},
    traj::{TrajectoryMsg, TRAJ_TOPIC},
};

use crate::publisher::TrajectorySink;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Trajectory server
pub struct TrajServer {
    socket: MonitoredSocket,
}

/// A sink which writes trajectory windows to the log instead of the network.
#[derive(Debug, Default)]
pub struct LogSink {
    num_msgs: u64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TrajServerError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not send the trajectory: {0}")]
    SendError(zmq::Error),

    #[error("Could not serialize the trajectory: {0}")]
    SerializationError(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TrajServer {
    /// Create a new instance of the trajectory server.
    ///
    /// This function will not block until a subscriber connects.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, TrajServerError> {
        let socket_options = SocketOptions {
            block_on_first_connect: false,
            bind: true,
            connect_timeout: 1000,
            heartbeat_ivl: 500,
            heartbeat_ttl: 1000,
            heartbeat_timeout: 1000,
            linger: 1,
            recv_timeout: 10,
            send_timeout: 10,
            ..Default::default()
        };

        let socket = MonitoredSocket::new(ctx, zmq::PUB, socket_options, &params.traj_endpoint)
            .map_err(TrajServerError::SocketError)?;

        Ok(Self { socket })
    }
}

impl TrajectorySink for TrajServer {
    type Error = TrajServerError;

    fn send(&mut self, msg: &TrajectoryMsg) -> Result<(), Self::Error> {
        let msg_string =
            serde_json::to_string(msg).map_err(TrajServerError::SerializationError)?;

        self.socket
            .send(&format!("{} {}", TRAJ_TOPIC, msg_string), 0)
            .map_err(TrajServerError::SendError)
    }
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of windows logged so far.
    pub fn num_msgs(&self) -> u64 {
        self.num_msgs
    }
}

impl TrajectorySink for LogSink {
    type Error = std::convert::Infallible;

    fn send(&mut self, msg: &TrajectoryMsg) -> Result<(), Self::Error> {
        if let (Some(first), Some(last)) = (msg.points.first(), msg.points.last()) {
            info!(
                "[{}] window {}: {} points, t = {:.2} .. {:.2} s, head at [{:.3}, {:.3}, {:.3}] yaw {:.3}",
                msg.frame_id,
                msg.seq,
                msg.points.len(),
                first.time_from_start_s,
                last.time_from_start_s,
                first.positions[0],
                first.positions[1],
                first.positions[2],
                first.positions[3]
            );
        }

        self.num_msgs += 1;

        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
