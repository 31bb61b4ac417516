//! # Publisher
//!
//! Streams a frozen trajectory to a sink in overlapping look-ahead windows.
//!
//! The publisher first waits for an origin, either from the position feed or set directly
//! (`AwaitingOrigin`). Once the trajectory has been built from it, it emits one window per tick
//! at the output rate (`Streaming`) until the window containing the last sample has been sent
//! (`Complete`).

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use chrono::Utc;
use log::{debug, info, warn};
use nalgebra::Vector3;
use std::{
    fmt::Display,
    ops::Range,
    thread,
    time::{Duration, Instant},
};

use comms_if::{feed::PositionSample, traj::TrajectoryMsg};

use crate::{params::TrajGenParams, shutdown::ShutdownFlag, state::FrozenTrajectory};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A source of position readings.
pub trait PositionFeed {
    type Error: Display;

    /// Poll for the latest position.
    ///
    /// Implementations may block for a bounded time, returning `Ok(None)` if nothing arrived.
    fn poll_position(&mut self) -> Result<Option<PositionSample>, Self::Error>;

    /// Return true if the feed's source is connected.
    fn is_connected(&self) -> bool {
        true
    }
}

/// A consumer of trajectory windows.
pub trait TrajectorySink {
    type Error: Display;

    fn send(&mut self, msg: &TrajectoryMsg) -> Result<(), Self::Error>;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Acquires the origin, then streams the trajectory built from it.
pub struct Publisher {
    frame_id: String,

    window_samples: usize,

    step_samples: usize,

    period: Duration,

    pacing: Pacing,

    state: PublisherState,
}

/// Iterates over the sample ranges of successive windows.
///
/// Each window holds at most `window` samples and starts `step` samples after the previous one.
/// The last window always ends at the last sample.
#[derive(Debug, Clone)]
pub struct WindowCursor {
    total: usize,

    window: usize,

    step: usize,

    cursor: usize,

    done: bool,
}

/// What happened while streaming.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamReport {
    /// Number of windows built and handed to the sink
    pub num_ticks: u64,

    /// Number of windows the sink failed to send
    pub num_send_failures: u64,

    /// Number of ticks which took longer than the output period
    pub num_overruns: u64,

    /// True if the final window was reached, false if streaming was interrupted
    pub completed: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// How ticks are spaced in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pacing {
    /// Sleep out the remainder of each output period
    RealTime,

    /// Emit ticks back to back
    Unpaced,
}

/// State of the publisher.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PublisherState {
    AwaitingOrigin,
    Streaming,
    Complete,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PublisherError {
    #[error("Cannot stream from the {0:?} state")]
    NotStreaming(PublisherState),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl WindowCursor {
    pub fn new(total: usize, window: usize, step: usize) -> Self {
        Self {
            total,
            window: window.max(1),
            step: step.max(1),
            cursor: 0,
            done: total == 0,
        }
    }
}

impl Iterator for WindowCursor {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let start = self.cursor;
        let end = (start + self.window).min(self.total);

        if end >= self.total {
            self.done = true;
        } else {
            self.cursor = (start + self.step).min(self.total - 1);
        }

        Some(start..end)
    }
}

impl Publisher {
    /// Create a new publisher awaiting its origin.
    ///
    /// Window and step sizes come from the parameters, `frame_id` identifies the run in every
    /// message.
    pub fn new(params: &TrajGenParams, frame_id: String, pacing: Pacing) -> Self {
        Self {
            frame_id,
            window_samples: params.window_samples(),
            step_samples: params.output_step_samples(),
            period: util::time::period_from_frequency(params.output_rate_hz)
                .unwrap_or_else(|| Duration::from_millis(100)),
            pacing,
            state: PublisherState::AwaitingOrigin,
        }
    }

    pub fn state(&self) -> PublisherState {
        self.state
    }

    /// Use the given origin directly, without waiting on a feed.
    pub fn set_origin(&mut self, origin_m: Vector3<f64>) -> Vector3<f64> {
        info!(
            "Origin set at [{:.3}, {:.3}, {:.3}]",
            origin_m[0], origin_m[1], origin_m[2]
        );
        self.transition(PublisherState::Streaming);

        origin_m
    }

    /// Block until the feed provides a position, returning it as the origin.
    ///
    /// Each poll is bounded by the feed, the shutdown flag is checked between polls. Returns `None`
    /// if shutdown was requested first, in which case the publisher keeps awaiting its origin.
    pub fn await_origin<F>(&mut self, feed: &mut F, shutdown: &ShutdownFlag) -> Option<Vector3<f64>>
    where
        F: PositionFeed,
    {
        info!("Waiting for a position measurement...");

        let mut connected = false;

        while !shutdown.is_set() {
            if feed.is_connected() != connected {
                connected = !connected;
                if connected {
                    info!("Position feed connected");
                } else {
                    warn!("Position feed disconnected");
                }
            }

            match feed.poll_position() {
                Ok(Some(sample)) => return Some(self.set_origin(Vector3::from(sample.position_m))),
                Ok(None) => (),
                Err(e) => warn!("Error polling the position feed: {}", e),
            }
        }

        debug!("Shutdown requested while awaiting the origin");

        None
    }

    /// Stream the whole trajectory into the sink, returning early if shutdown is requested.
    ///
    /// The origin must have been acquired first.
    pub fn stream<S>(
        &mut self,
        traj: &FrozenTrajectory,
        sink: &mut S,
        shutdown: &ShutdownFlag,
    ) -> Result<StreamReport, PublisherError>
    where
        S: TrajectorySink,
    {
        if self.state != PublisherState::Streaming {
            return Err(PublisherError::NotStreaming(self.state));
        }

        let mut report = StreamReport::default();
        let states = traj.states();
        let total = states.len();

        info!(
            "Streaming {} samples in windows of {} every {} samples",
            total, self.window_samples, self.step_samples
        );

        for (seq, range) in WindowCursor::new(total, self.window_samples, self.step_samples)
            .enumerate()
        {
            let tick_start = Instant::now();

            if shutdown.is_set() {
                info!("Shutdown requested, stopping stream at window {}", seq);
                return Ok(report);
            }

            let is_last = range.end >= total;

            let msg = TrajectoryMsg {
                seq: seq as u64,
                stamp: Utc::now(),
                frame_id: self.frame_id.clone(),
                points: states[range].iter().map(|s| s.to_point()).collect(),
            };

            if let Err(e) = sink.send(&msg) {
                warn!("Could not send trajectory window {}: {}", seq, e);
                report.num_send_failures += 1;
            }

            report.num_ticks += 1;

            if is_last {
                break;
            }

            // ---- CYCLE MANAGEMENT ----

            if let Pacing::RealTime = self.pacing {
                let tick_dur = Instant::now() - tick_start;

                match self.period.checked_sub(tick_dur) {
                    Some(d) => thread::sleep(d),
                    None => {
                        warn!(
                            "Publish tick overran by {:.06} s",
                            tick_dur.as_secs_f64() - self.period.as_secs_f64()
                        );
                        report.num_overruns += 1;
                    }
                }
            }
        }

        self.transition(PublisherState::Complete);
        report.completed = true;

        info!(
            "Streaming complete: {} windows sent, {} send failures",
            report.num_ticks - report.num_send_failures,
            report.num_send_failures
        );

        Ok(report)
    }

    fn transition(&mut self, state: PublisherState) {
        debug!("Publisher state {:?} -> {:?}", self.state, state);
        self.state = state;
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
