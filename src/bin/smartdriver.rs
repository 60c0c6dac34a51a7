//! Smartdriver CLI - replay recorded trips through the telemetry core
//!
//! Commands:
//! - replay: Run a recorded trip through both processors and report
//! - inspect: Validate and summarize a recorded trip file

use clap::{Parser, Subcommand};
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use smartdriver_core::{
    GpsTracker, InertialSample, LocationConfig, MotionConfig, MotionDetector, MotionEvent,
    MotionEventKind, MotionStats, ProfilerError, RecordedTrip, ReplaySource, TripSpeedStats,
    CORE_VERSION, PRODUCER_NAME,
};

/// Smartdriver - on-device compute core for driving telemetry
#[derive(Parser)]
#[command(name = "smartdriver")]
#[command(version = CORE_VERSION)]
#[command(about = "Replay recorded trips through the driving telemetry core", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a recorded trip through both processors and report
    Replay {
        /// Recorded trip JSON file (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Emit the report as JSON instead of text
        #[arg(long)]
        json: bool,

        /// Harsh-brake threshold override (m/s², negative)
        #[arg(long)]
        brake_threshold: Option<f32>,

        /// Rapid-acceleration threshold override (m/s²)
        #[arg(long)]
        accel_threshold: Option<f32>,

        /// Sharp-turn lateral threshold override (m/s²)
        #[arg(long)]
        turn_threshold: Option<f32>,

        /// Gyroscope turn threshold override (rad/s)
        #[arg(long)]
        gyro_threshold: Option<f32>,

        /// Event cooldown override (ms)
        #[arg(long)]
        cooldown_ms: Option<i64>,
    },

    /// Validate and summarize a recorded trip file
    Inspect {
        /// Recorded trip JSON file (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Emit the summary as JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), ProfilerError> {
    match cli.command {
        Commands::Replay {
            input,
            json,
            brake_threshold,
            accel_threshold,
            turn_threshold,
            gyro_threshold,
            cooldown_ms,
        } => {
            let mut config = MotionConfig::default();
            if let Some(threshold) = brake_threshold {
                config.harsh_brake_threshold = threshold;
            }
            if let Some(threshold) = accel_threshold {
                config.rapid_accel_threshold = threshold;
            }
            if let Some(threshold) = turn_threshold {
                config.sharp_turn_threshold = threshold;
            }
            if let Some(threshold) = gyro_threshold {
                config.gyro_turn_threshold = threshold;
            }
            if let Some(cooldown) = cooldown_ms {
                config.event_cooldown_ms = cooldown;
            }
            cmd_replay(&input, config, json)
        }

        Commands::Inspect { input, json } => cmd_inspect(&input, json),
    }
}

fn read_trip(input: &PathBuf) -> Result<RecordedTrip, ProfilerError> {
    let text = if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        std::fs::read_to_string(input)?
    };
    RecordedTrip::from_json(&text)
}

fn cmd_replay(input: &PathBuf, config: MotionConfig, json: bool) -> Result<(), ProfilerError> {
    let trip = read_trip(input)?;
    trip.validate()?;

    let tracker = GpsTracker::new(LocationConfig::default());
    let detector = MotionDetector::new(config);
    let source = ReplaySource::new(trip);

    let gps_stream = tracker.start_tracking(&source);
    let session_id = gps_stream.session_id();
    let fix_count = gps_stream.count();

    let motion_stream = detector.start_listening(&source);
    let events: Vec<MotionEvent> = motion_stream.collect();

    let report = TripReport {
        producer: PRODUCER_NAME.to_string(),
        version: CORE_VERSION.to_string(),
        session_id: session_id.to_string(),
        fixes_processed: fix_count,
        trip: tracker.stats(),
        motion: detector.stats(),
        events,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn cmd_inspect(input: &PathBuf, json: bool) -> Result<(), ProfilerError> {
    let trip = read_trip(input)?;
    trip.validate()?;

    let accel_samples = trip
        .samples
        .iter()
        .filter(|s| matches!(s, InertialSample::Accelerometer { .. }))
        .count();

    let summary = TripFileSummary {
        fixes: trip.fixes.len(),
        samples: trip.samples.len(),
        accelerometer_samples: accel_samples,
        gyroscope_samples: trip.samples.len() - accel_samples,
        duration_ms: trip.duration_ms(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Recorded Trip");
        println!("=============");
        println!("Fixes:                 {}", summary.fixes);
        println!("Accelerometer samples: {}", summary.accelerometer_samples);
        println!("Gyroscope samples:     {}", summary.gyroscope_samples);
        println!(
            "Recorded span:         {:.1} s",
            summary.duration_ms as f64 / 1000.0
        );
    }
    Ok(())
}

fn print_report(report: &TripReport) {
    let color = atty::is(atty::Stream::Stdout);

    println!("Trip Report ({} {})", report.producer, report.version);
    println!("Session: {}", report.session_id);
    println!();
    println!("Location");
    println!("  Fixes processed: {}", report.fixes_processed);
    println!("  Distance:        {:.1} m", report.trip.total_distance_m);
    println!("  Max speed:       {:.1} km/h", report.trip.max_speed_kmh);
    println!("  Avg speed:       {:.1} km/h", report.trip.average_speed_kmh);
    println!("  Speed stddev:    {:.1} km/h", report.trip.speed_stddev_kmh);
    println!();
    println!("Motion");
    println!("  Harsh brakes:        {}", report.motion.harsh_brakes);
    println!("  Rapid accelerations: {}", report.motion.rapid_accelerations);
    println!("  Sharp turns:         {}", report.motion.sharp_turns);
    println!("  Avg magnitude:       {:.2} m/s²", report.motion.avg_magnitude);
    println!("  Max magnitude:       {:.2} m/s²", report.motion.max_magnitude);

    if !report.events.is_empty() {
        println!();
        println!("Events");
        for event in &report.events {
            let when = event
                .timestamp_utc()
                .map(|ts| ts.format("%Y-%m-%d %H:%M:%S%.3f").to_string())
                .unwrap_or_else(|| format!("t={}ms", event.timestamp_ms));
            let label = event_label(event.kind, color);
            println!("  {when}  {label}  {:.2}", event.magnitude);
        }
    }
}

fn event_label(kind: MotionEventKind, color: bool) -> String {
    if !color {
        return kind.as_str().to_string();
    }
    let code = match kind {
        MotionEventKind::HarshBrake => "31",         // red
        MotionEventKind::RapidAcceleration => "33",  // yellow
        MotionEventKind::SharpTurn => "35",          // magenta
    };
    format!("\x1b[{code}m{}\x1b[0m", kind.as_str())
}

#[derive(serde::Serialize)]
struct TripReport {
    producer: String,
    version: String,
    session_id: String,
    fixes_processed: usize,
    trip: TripSpeedStats,
    motion: MotionStats,
    events: Vec<MotionEvent>,
}

#[derive(serde::Serialize)]
struct TripFileSummary {
    fixes: usize,
    samples: usize,
    accelerometer_samples: usize,
    gyroscope_samples: usize,
    duration_ms: i64,
}
