//! # Trajectory Messages
//!
//! Messages streamed by the trajectory server. Each message carries a window of upcoming
//! trajectory points, successive windows overlapping one another.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Topic prefix of trajectory messages on the trajectory publisher.
pub const TRAJ_TOPIC: &str = "traj";

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A window of trajectory points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryMsg {
    /// Sequence number of the message, starting at zero for each run.
    pub seq: u64,

    /// UTC time at which the message was built.
    pub stamp: DateTime<Utc>,

    /// Identifier of the run which produced the trajectory.
    pub frame_id: String,

    /// The points in this window, in time order.
    pub points: Vec<TrajectoryPoint>,
}

/// A single point of a trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    /// `[x, y, z, yaw]` in meters and radians.
    pub positions: [f64; 4],

    /// `[vx, vy, vz]` in meters per second.
    pub velocities: [f64; 3],

    /// `[ax, ay, az]` in meters per second squared.
    pub accelerations: [f64; 3],

    /// Time of the point measured from the start of the trajectory, in seconds.
    pub time_from_start_s: f64,
}
