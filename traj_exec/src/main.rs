//! Main trajectory generation executable entry point.
//!
//! # Architecture
//!
//! The executable runs through the following phases:
//!
//!     - Initialise the session, logging and parameters
//!     - Load the directive script
//!     - Acquire the origin, either from the command line or from the position feed
//!     - Build the trajectory, archiving it in the session
//!     - Stream the trajectory in look-ahead windows until complete or interrupted
//!
//! # Usage
//!
//! ```text
//! traj_exec <script> [--origin <x> <y> <z>] [--dry-run]
//! ```
//!
//! In dry-run mode windows are written to the log instead of the network, and are emitted as
//! fast as they can be built.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{info, warn};
use nalgebra::Vector3;
use std::path::PathBuf;
use structopt::StructOpt;

// Internal
use comms_if::net::NetParams;
use traj_lib::{
    generator::{BuildSummary, TrajectoryGenerator},
    params::TrajGenParams,
    pos_client::PosClient,
    publisher::{Pacing, Publisher, StreamReport},
    script,
    shutdown::ShutdownFlag,
    state::{FrozenTrajectory, StateRecord},
    traj_server::{LogSink, TrajServer},
};
use util::{
    archive::Archiver,
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "traj_exec", about = "Generate and stream a trajectory from a directive script")]
struct Args {
    /// Path to the directive script
    #[structopt(parse(from_os_str))]
    script: PathBuf,

    /// Use this origin instead of waiting for the position feed
    #[structopt(long, number_of_values = 3, allow_hyphen_values = true)]
    origin: Option<Vec<f64>>,

    /// Write windows to the log instead of publishing them
    #[structopt(long)]
    dry_run: bool,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let args = Args::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("traj_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Info, &session).wrap_err("Failed to initialise logging")?;

    info!("Trajectory Generation Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let params: TrajGenParams =
        util::params::load("traj_gen.toml").wrap_err("Could not load trajectory parameters")?;
    params
        .validate()
        .wrap_err("Invalid trajectory parameters")?;

    info!("Exec parameters loaded");

    // ---- LOAD SCRIPT ----

    info!("Loading script from {:?}", args.script);

    let directives = script::load(&args.script).wrap_err("Failed to load the directive script")?;

    info!("Loaded script contains {} directives\n", directives.len());

    // ---- SIGNAL HANDLING ----

    let shutdown = ShutdownFlag::new();
    shutdown
        .raise_on_ctrl_c()
        .wrap_err("Failed to install the Ctrl-C handler")?;

    // ---- INITIALISE NETWORK ----

    let zmq_ctx = comms_if::net::zmq::Context::new();

    let net_params: Option<NetParams> = if args.dry_run && args.origin.is_some() {
        None
    } else {
        Some(util::params::load("net.toml").wrap_err("Could not load net params")?)
    };

    // ---- ACQUIRE ORIGIN ----

    let frame_id = session
        .session_root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("traj_exec"));

    let pacing = if args.dry_run {
        Pacing::Unpaced
    } else {
        Pacing::RealTime
    };

    let mut publisher = Publisher::new(&params, frame_id, pacing);

    let origin_m = match (&args.origin, &net_params) {
        (Some(o), _) => {
            info!("Origin given on the command line");
            publisher.set_origin(Vector3::new(o[0], o[1], o[2]))
        }
        (None, Some(net_params)) => {
            let mut pos_client = PosClient::new(&zmq_ctx, net_params)
                .wrap_err("Failed to initialise the PosClient")?;
            info!("PosClient initialised");

            match publisher.await_origin(&mut pos_client, &shutdown) {
                Some(o) => o,
                None => {
                    info!("Shutdown before an origin was received");
                    session.exit();
                    return Ok(());
                }
            }
        }
        (None, None) => return Err(eyre!("No origin given and no position feed available")),
    };

    // ---- BUILD ----

    let traj = TrajectoryGenerator::new(&params)
        .build(origin_m, &directives)
        .wrap_err("Failed to build the trajectory")?;

    archive(&session, &traj, origin_m, directives.len());

    // ---- STREAM ----

    let report = match net_params {
        Some(ref net_params) if !args.dry_run => {
            let mut server = TrajServer::new(&zmq_ctx, net_params)
                .wrap_err("Failed to initialise the TrajServer")?;
            info!("TrajServer initialised");

            publisher.stream(&traj, &mut server, &shutdown)?
        }
        _ => {
            info!("Dry run, windows will be logged only");

            let mut sink = LogSink::new();
            let report = publisher.stream(&traj, &mut sink, &shutdown)?;
            info!("{} windows logged", sink.num_msgs());
            report
        }
    };

    info!("Publisher state: {:?}", publisher.state());
    log_report(&report);

    session.exit();

    Ok(())
}

/// Archive the built trajectory into the session.
///
/// Archiving failures are reported but do not stop the run.
fn archive(session: &Session, traj: &FrozenTrajectory, origin_m: Vector3<f64>, num: usize) {
    session.save(
        "arch/build_summary.json",
        BuildSummary::new(traj, origin_m, num),
    );

    let mut archiver = match Archiver::from_session(session, "states.csv") {
        Ok(a) => a,
        Err(e) => {
            warn!("Could not create the states archive: {}", e);
            return;
        }
    };

    for state in traj.states() {
        if let Err(e) = archiver.serialise(StateRecord::from(state)) {
            warn!("Could not archive the trajectory states: {}", e);
            return;
        }
    }

    match archiver.flush() {
        Ok(n) => info!("{} states archived", n),
        Err(e) => warn!("Could not flush the states archive: {}", e),
    }
}

fn log_report(report: &StreamReport) {
    if report.completed {
        info!("Trajectory streamed in {} windows", report.num_ticks);
    } else {
        warn!(
            "Streaming interrupted after {} windows",
            report.num_ticks
        );
    }

    if report.num_send_failures > 0 {
        warn!("{} windows could not be sent", report.num_send_failures);
    }

    if report.num_overruns > 0 {
        warn!("{} publish ticks overran", report.num_overruns);
    }
}
