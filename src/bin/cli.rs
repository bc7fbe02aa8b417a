//! Eye Tribe CLI Client
//!
//! Command-line interface for querying and calibrating a tracker server.

use std::thread;
use std::time::Duration;

use clap::{Parser, Subcommand};
use eyetribe::{Client, Config, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// Largest calibration grid accepted on the command line
const MAX_GRID: i64 = 16;

/// Eye Tribe CLI
#[derive(Parser, Debug)]
#[command(name = "eyetribe-cli")]
#[command(about = "CLI for The Eye Tribe tracker server")]
#[command(version)]
struct Args {
    /// Server host
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Server port
    #[arg(short, long, default_value = eyetribe::config::DEFAULT_PORT)]
    port: String,

    /// Heartbeat interval in ms (0 disables)
    #[arg(long, default_value = "250")]
    heartbeat_ms: u64,

    /// Give up waiting for a reply after this many ms (0 waits forever)
    #[arg(short, long, default_value = "5000")]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print every tracker status value
    Status,

    /// Print the latest gaze frame
    Frame,

    /// Print the last calibration result
    CalibResult,

    /// Run a calibration over a grid of screen points
    Calibrate {
        /// Points per row and column
        #[arg(short, long, default_value = "3", value_parser = clap::value_parser!(u32).range(1..=MAX_GRID))]
        grid: u32,

        /// Time spent on each point in ms
        #[arg(short, long, default_value = "1000")]
        dwell_ms: u64,
    },

    /// Abort the calibration in progress
    Abort,

    /// Clear the server calibration
    Clear,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,eyetribe=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .host(&args.host)
        .port(&args.port)
        .heartbeat_interval_ms(args.heartbeat_ms)
        .match_timeout_ms(args.timeout_ms)
        .build();

    let mut client = Client::from_config(config);
    if let Err(e) = client.connect_configured() {
        tracing::error!("Failed to connect to {}:{}: {}", args.host, args.port, e);
        std::process::exit(1);
    }

    let outcome = run(&mut client, args.command);
    client.close();

    if let Err(e) = outcome {
        tracing::error!("Command failed: {}", e);
        std::process::exit(1);
    }
}

fn run(client: &mut Client, command: Commands) -> Result<()> {
    match command {
        Commands::Status => {
            println!("Protocol version: {}", client.version()?);
            println!("Tracker state: {}", client.tracker_state()?);
            println!("Framerate: {}", client.framerate()?);
            println!("Is calibrated: {}", client.is_calibrated()?);
            println!("Is calibrating: {}", client.is_calibrating()?);
            println!("Screen index: {}", client.screen_index()?);
            println!("Screen resolution: {}x{}", client.screen_res_w()?, client.screen_res_h()?);
            println!(
                "Screen physical size: {:.3} m x {:.3} m",
                client.screen_psy_w()?,
                client.screen_psy_h()?
            );
        }
        Commands::Frame => print_json(&client.frame_data()?),
        Commands::CalibResult => print_json(&client.calib_result()?),
        Commands::Calibrate { grid, dwell_ms } => calibrate(client, grid, dwell_ms)?,
        Commands::Abort => println!("Aborted: {}", client.calib_abort()?),
        Commands::Clear => println!("Cleared: {}", client.calib_clear()?),
    }
    Ok(())
}

fn calibrate(client: &mut Client, grid: u32, dwell_ms: u64) -> Result<()> {
    let width = client.screen_res_w()?;
    let height = client.screen_res_h()?;
    let points = grid_points(grid, width, height);

    if !client.calib_start(points.len() as u32)? {
        println!("Server refused to start calibration");
        return Ok(());
    }

    for (x, y) in points {
        if !client.calib_point_start(x, y)? {
            println!("Point ({}, {}) rejected, aborting", x, y);
            client.calib_abort()?;
            return Ok(());
        }
        thread::sleep(Duration::from_millis(dwell_ms));

        let outcome = client.calib_point_end()?;
        println!("Point ({}, {}) done: {}", x, y, outcome.acknowledged);
        if let Some(result) = outcome.calibration_result {
            println!("Calibration result: {}", if result { "success" } else { "failure" });
        }
    }
    Ok(())
}

/// Evenly spaced `grid x grid` points inside the screen
fn grid_points(grid: u32, width: i64, height: i64) -> Vec<(i64, i64)> {
    let n = i64::from(grid.max(1));
    let mut points = Vec::with_capacity((n * n) as usize);
    for row in 1..=n {
        for col in 1..=n {
            points.push((width * col / (n + 1), height * row / (n + 1)));
        }
    }
    points
}

fn print_json(values: &eyetribe::protocol::Values) {
    match serde_json::to_string_pretty(values) {
        Ok(text) => println!("{}", text),
        Err(e) => tracing::error!("Cannot render reply: {}", e),
    }
}
