//! # Trajectory generation library.
//!
//! Turns a list of motion directives into a dense, time indexed trajectory which respects the
//! configured speed and acceleration limits, and streams it in overlapping look-ahead windows.
//!
//! The build phase runs once, offline:
//!     - [`path_builder`] discretises directives into raw positions,
//!     - [`differentiator`] derives heading, velocity and acceleration,
//!     - [`filter`] smooths and saturates the result,
//!
//! after which [`publisher`] streams the frozen trajectory.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Kinematic state differentiator - finite differences of the raw positions
pub mod differentiator;

/// Directive definitions
pub mod directive;

/// Smoothing and saturation filter chain
pub mod filter;

/// Trajectory generator - runs the build phase
pub mod generator;

/// Geometry primitives
pub mod geometry;

/// Heading policies and yaw resolution
pub mod heading;

/// Trajectory generation parameters
pub mod params;

/// Path segment builder - discretises directives
pub mod path_builder;

/// Position client - subscribes to the position feed
pub mod pos_client;

/// Step profiles used to size the steps of each segment
pub mod profile;

/// Publisher - streams windows of the trajectory
pub mod publisher;

/// Directive script loading
pub mod script;

/// Shutdown flag and signal handling
pub mod shutdown;

/// Trajectory states
pub mod state;

/// Trajectory server - publishes windows to the network
pub mod traj_server;
