//! # Communications interface crate.
//!
//! Provides all common communications interfaces for the trajectory generation software.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Position feed messages, used to acquire the origin of a trajectory
pub mod feed;

/// Network module
pub mod net;

/// Trajectory messages published to the downstream consumer
pub mod traj;
