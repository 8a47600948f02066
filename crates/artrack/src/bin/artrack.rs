use std::error::Error;
use std::path::PathBuf;

use artrack::core::ManualClock;
use artrack::grid::{GridCalibration, GridParams, DEFAULT_POINTS_PATH};
use artrack::record::ExportError;
use artrack::replay::{finish_session, load_frames, replay};
use artrack::{EventOutcome, FixedPathDialog, OperatorEvent, Station, StationConfig, StationError};
use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use serde_json::json;

#[derive(Parser, Debug)]
#[command(name = "artrack", version, about = "Record, trim and export AR marker trajectories")]
struct Cli {
    /// Log level for the stderr logger (off, error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "info")]
    log_level: LevelFilter,

    /// Emit structured JSON logs (requires the `tracing` feature).
    #[arg(long, global = true)]
    json_log: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a JSON-lines detection log and export the trimmed session.
    Replay(ReplayArgs),
    /// Print the calibration grid overlay as JSON.
    Grid(GridArgs),
}

#[derive(Args, Debug)]
struct ReplayArgs {
    /// Detection log, one frame per line.
    log: PathBuf,

    /// Station config (JSON).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Trim window as two fractions of the session.
    #[arg(long, num_args = 2, value_names = ["BEGIN", "END"], allow_negative_numbers = true)]
    trim: Option<Vec<f64>>,

    /// Export destination. Without it nothing is written.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Record from the first frame to the last, ignoring the need for a
    /// record toggle in the log.
    #[arg(long)]
    record_all: bool,

    /// Omit the header line.
    #[arg(long)]
    no_header: bool,

    /// Prefix each row with the marker id.
    #[arg(long)]
    with_id: bool,
}

#[derive(Args, Debug)]
struct GridArgs {
    /// Corner file.
    #[arg(long, default_value = DEFAULT_POINTS_PATH)]
    points: PathBuf,

    #[arg(long, default_value_t = 2)]
    rows: u32,

    #[arg(long, default_value_t = 2)]
    cols: u32,
}

fn init_logging(level: LevelFilter, json: bool) -> Result<(), Box<dyn Error>> {
    #[cfg(feature = "tracing")]
    {
        let _ = level;
        artrack::core::init_tracing(json);
        let _ = tracing_log::LogTracer::init();
    }
    #[cfg(not(feature = "tracing"))]
    {
        if json {
            eprintln!("--json-log needs the `tracing` feature; using plain logs");
        }
        artrack::core::init_with_level(level)?;
    }
    Ok(())
}

fn run_replay(args: ReplayArgs) -> Result<(), Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => StationConfig::load_json(path)?,
        None => StationConfig::default(),
    };
    if args.no_header {
        config.export.header = false;
    }
    if args.with_id {
        config.export.include_marker_id = true;
    }

    let frames = load_frames(&args.log)?;
    let clock = ManualClock::new(frames.first().map_or(0.0, |f| f.time));
    let dialog = match &args.output {
        Some(path) => FixedPathDialog::new(path.clone()),
        None => FixedPathDialog::cancelling(),
    };
    let mut station = Station::new(&clock, config, dialog);

    if args.record_all {
        station.handle(OperatorEvent::RecordToggled)?;
    }
    let mut summary = replay(&mut station, &frames);
    let state = finish_session(&mut station);

    if let Some(trim) = args.trim.as_deref() {
        if let [begin, end] = *trim {
            station.handle(OperatorEvent::TrimChanged { begin, end })?;
        }
    }

    if args.output.is_some() {
        match station.handle(OperatorEvent::SaveRequested) {
            Ok(EventOutcome::Saved(export)) => summary.exports.push(export),
            Ok(_) => {}
            Err(StationError::Export(ExportError::NoDataAvailable)) => {
                log::warn!("{}", ExportError::NoDataAvailable);
            }
            Err(err) => return Err(err.into()),
        }
    }

    let tracker = station.tracker();
    let report = json!({
        "replay": summary,
        "state": state,
        "duration": tracker.session_duration(),
        "trim": tracker.session().trim(),
        "markers": tracker.registry().len(),
        "samples": tracker.registry().history_len(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_grid(args: GridArgs) -> Result<(), Box<dyn Error>> {
    let params = GridParams {
        rows: args.rows,
        cols: args.cols,
        ..GridParams::default()
    };
    let grid = GridCalibration::load_or_default(&args.points, params)?;
    let report = json!({
        "corners": grid.corners(),
        "params": grid.params(),
        "lines": grid.lines(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.log_level, cli.json_log)?;
    match cli.command {
        Command::Replay(args) => run_replay(args),
        Command::Grid(args) => run_grid(args),
    }
}
