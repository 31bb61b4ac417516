//! # Shutdown handling
//!
//! A shared flag raised when the user interrupts the executable. Long running loops check it
//! between iterations.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{info, warn};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A cloneable shutdown flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag {
    flag: Arc<AtomicBool>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ShutdownError {
    #[error("Could not start the signal handling runtime: {0}")]
    RuntimeError(std::io::Error),

    #[error("Could not spawn the signal handling thread: {0}")]
    SpawnError(std::io::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return true once shutdown has been requested.
    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Request shutdown.
    pub fn set(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Raise this flag when Ctrl-C is received.
    ///
    /// The signal is awaited on a single threaded runtime running on a background thread, which
    /// exits once the signal has been handled.
    pub fn raise_on_ctrl_c(&self) -> Result<(), ShutdownError> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ShutdownError::RuntimeError)?;

        let flag = self.clone();

        thread::Builder::new()
            .name("ctrl_c".into())
            .spawn(move || {
                rt.block_on(async {
                    match tokio::signal::ctrl_c().await {
                        Ok(()) => {
                            info!("Ctrl-C received, shutting down");
                            flag.set();
                        }
                        Err(e) => warn!("Could not listen for Ctrl-C: {}", e),
                    }
                })
            })
            .map_err(ShutdownError::SpawnError)?;

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
