//! CLI binary for the pole telemetry tools
//!
//! Replays radio and serial captures through the gateway and uplink node
//! logic, and classifies single accelerometer samples.

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use glob::glob;
use log::{debug, info, warn};
use pole_telemetry::{
    classify, export_records_csv, AccelSample, EnvReading, EnvironmentSource, ExportOptions,
    FileUploadSink, FixedEnvironment, FrameSource, GatewayNode, GpsRecord, LogDisplay, NoCamera,
    NodeConfig, QueuedFrames, RecordLog, RecordSink, ReplayEnvironment, ReplayRadio,
    SerialDemultiplexer, UplinkNode,
};
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

const DEFAULT_UPLOAD_DIR: &str = "uploads";

fn long_version() -> String {
    match (option_env!("VERGEN_GIT_SHA"), option_env!("VERGEN_GIT_COMMIT_DATE")) {
        (Some(sha), Some(date)) => format!("{} ({} {})", env!("CARGO_PKG_VERSION"), sha, date),
        _ => env!("CARGO_PKG_VERSION").to_string(),
    }
}

fn build_command() -> Command {
    Command::new("Pole Telemetry")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version())
        .about("Replay pole sensor network captures through the gateway and uplink node logic.")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("debug")
                .long("debug")
                .help("Enable debug output (RUST_LOG still takes precedence)")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("JSON node configuration; missing keys keep their defaults")
                .value_name("FILE")
                .global(true),
        )
        .subcommand(
            Command::new("gateway")
                .about("Feed a radio capture (one payload per line) through the gateway and emit the serial stream")
                .arg(
                    Arg::new("capture")
                        .help("Radio capture file")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("serial-out")
                        .long("serial-out")
                        .help("Write the multiplexed serial stream here (default: stdout)")
                        .value_name("FILE"),
                )
                .arg(
                    Arg::new("env-readings")
                        .long("env-readings")
                        .help("Environmental readings to replay, one JSON object per line")
                        .value_name("FILE"),
                ),
        )
        .subcommand(
            Command::new("uplink")
                .about("Demultiplex serial captures, mirror uploads to a directory and run clog confirmation")
                .arg(
                    Arg::new("files")
                        .help("Serial capture files; supports globbing")
                        .required(true)
                        .num_args(1..)
                        .index(1),
                )
                .arg(
                    Arg::new("output-dir")
                        .long("output-dir")
                        .help("Directory mirroring the upload store (default: ./uploads)")
                        .value_name("DIR"),
                )
                .arg(
                    Arg::new("frames")
                        .long("frames")
                        .help("Directory of raw grayscale frames used as camera captures, in name order")
                        .value_name("DIR"),
                )
                .arg(
                    Arg::new("csv")
                        .long("csv")
                        .help("Also export records to <capture>.env.csv and <capture>.gps.csv")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("classify")
                .about("Classify one accelerometer sample (in g) as MOVING or STATIONARY")
                .arg(
                    Arg::new("threshold")
                        .long("threshold")
                        .help("Allowed deviation from 1 g (default from config: 0.05)")
                        .value_parser(clap::value_parser!(f32))
                        .value_name("G"),
                )
                .arg(
                    Arg::new("axes")
                        .help("x y z acceleration in g")
                        .required(true)
                        .num_args(3)
                        .allow_negative_numbers(true)
                        .value_parser(clap::value_parser!(f32))
                        .index(1),
                ),
        )
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn load_config(matches: &ArgMatches) -> Result<NodeConfig> {
    match matches.get_one::<String>("config") {
        Some(path) => NodeConfig::from_json_file(Path::new(path))
            .with_context(|| format!("Failed to load config file: {path}")),
        None => Ok(NodeConfig::default()),
    }
}

/// Expand glob patterns; plain paths pass through unchanged
fn expand_input_paths(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        if pattern.contains('*') || pattern.contains('?') {
            let paths = glob(pattern)
                .with_context(|| format!("Invalid glob pattern '{pattern}'"))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .with_context(|| format!("Error expanding glob pattern '{pattern}'"))?;
            files.extend(paths.into_iter().filter(|p| p.is_file()));
        } else {
            files.push(PathBuf::from(pattern));
        }
    }
    Ok(files)
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).with_context(|| format!("Failed to open {path:?}"))?;
    BufReader::new(file)
        .lines()
        .collect::<io::Result<Vec<_>>>()
        .with_context(|| format!("Failed to read {path:?}"))
}

fn run_gateway(args: &ArgMatches, config: &NodeConfig) -> Result<()> {
    let capture = PathBuf::from(args.get_one::<String>("capture").context("capture is required")?);
    let packets: Vec<String> = read_lines(&capture)?
        .into_iter()
        .filter(|line| !line.trim().is_empty())
        .collect();
    info!("Replaying {} radio packets from {}", packets.len(), capture.display());

    let environment: Box<dyn EnvironmentSource> = match args.get_one::<String>("env-readings") {
        Some(path) => {
            let mut readings = Vec::new();
            for line in read_lines(Path::new(path))? {
                if line.trim().is_empty() {
                    continue;
                }
                let reading: EnvReading = serde_json::from_str(&line)
                    .with_context(|| format!("Bad environmental reading in {path}: {line}"))?;
                readings.push(reading);
            }
            Box::new(ReplayEnvironment::new(readings))
        }
        None => Box::new(FixedEnvironment::default()),
    };

    let serial: Box<dyn Write> = match args.get_one::<String>("serial-out") {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create serial output: {path}"))?,
        )),
        None => Box::new(io::stdout()),
    };

    let mut gateway = GatewayNode::start(
        ReplayRadio::new(packets),
        serial,
        environment,
        Box::new(LogDisplay),
        config.gateway,
    )
    .context("Gateway failed to start")?;

    let mut now_ms = 0u64;
    while gateway.state().receiver.radio().remaining() > 0 {
        now_ms += config.gateway.loop_delay_ms;
        let tick = gateway.tick(now_ms).context("Serial output failed")?;
        if let Some(task) = tick.task {
            debug!("{} ms: ran {}", now_ms, task);
        }
    }

    let stats = gateway.state().receiver.stats();
    info!(
        "Received {} packets: {} delivered, {} duplicates, {} rejected, {} ACKs sent",
        stats.received, stats.delivered, stats.duplicates, stats.rejected, stats.acks_sent
    );
    gateway.into_serial().flush()?;
    Ok(())
}

/// Feeds the uplink node and keeps a copy of each record for export
struct CaptureSink<'a, F: FrameSource> {
    node: &'a mut UplinkNode<F, FileUploadSink>,
    log: RecordLog,
}

impl<F: FrameSource> RecordSink for CaptureSink<'_, F> {
    fn on_environmental(&mut self, reading: &EnvReading) -> pole_telemetry::Result<()> {
        self.log.on_environmental(reading)?;
        self.node.on_environmental(reading)
    }

    fn on_positional(&mut self, record: &GpsRecord) -> pole_telemetry::Result<()> {
        self.log.on_positional(record)?;
        self.node.on_positional(record)
    }
}

fn run_uplink(args: &ArgMatches, config: &NodeConfig) -> Result<()> {
    let patterns: Vec<String> = args
        .get_many::<String>("files")
        .map(|files| files.cloned().collect())
        .unwrap_or_default();
    let files = expand_input_paths(&patterns)?;
    if files.is_empty() {
        anyhow::bail!("No serial capture files found for {patterns:?}");
    }

    let output_dir = args
        .get_one::<String>("output-dir")
        .cloned()
        .unwrap_or_else(|| DEFAULT_UPLOAD_DIR.to_string());
    let uploads = FileUploadSink::new(&output_dir)
        .with_context(|| format!("Failed to create upload directory: {output_dir}"))?;

    let frames: Box<dyn FrameSource> = match args.get_one::<String>("frames") {
        Some(dir) => Box::new(
            QueuedFrames::from_dir(Path::new(dir)).with_context(|| format!("Failed to load frames from {dir}"))?,
        ),
        None => Box::new(NoCamera),
    };

    let export_options = ExportOptions {
        csv: args.get_flag("csv"),
        output_dir: Some(output_dir.clone()),
    };

    let mut node = UplinkNode::new(frames, uploads, config.clog, config.upload.clone());

    for (index, path) in files.iter().enumerate() {
        if index > 0 {
            println!();
        }
        println!("Processing: {}", path.display());

        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };

        let mut sink = CaptureSink {
            node: &mut node,
            log: RecordLog::default(),
        };
        let stats = SerialDemultiplexer::new(BufReader::new(file))
            .run(&mut sink)
            .with_context(|| format!("Failed reading {path:?}"))?;
        println!(
            "  {} lines: {} environmental, {} positional, {} ignored, {} malformed",
            stats.lines, stats.environmental, stats.positional, stats.ignored, stats.malformed
        );

        let report = export_records_csv(&sink.log.records, path, &export_options)
            .with_context(|| format!("CSV export failed for {path:?}"))?;
        if let (Some(env), Some(gps)) = (report.env_csv_path, report.gps_csv_path) {
            println!("  Exported CSV to: {} and {}", env.display(), gps.display());
        }
    }

    let stats = node.stats();
    println!(
        "Uploads: {} environmental, {} positional, {} failed. Clog checks: {} confirmed, {} not confirmed, {} without frame",
        stats.environmental_uploads,
        stats.positional_uploads,
        stats.upload_failures,
        stats.confirmed,
        stats.not_confirmed,
        stats.no_sample
    );
    let uploads = node.into_uploads();
    println!(
        "Mirror at {}: {} documents, {} images",
        fs::canonicalize(uploads.root())
            .unwrap_or_else(|_| uploads.root().to_path_buf())
            .display(),
        uploads.documents(),
        uploads.blobs()
    );
    Ok(())
}

fn run_classify(args: &ArgMatches, config: &NodeConfig) -> Result<()> {
    let axes: Vec<f32> = args
        .get_many::<f32>("axes")
        .context("x y z are required")?
        .copied()
        .collect();
    let threshold = args
        .get_one::<f32>("threshold")
        .copied()
        .unwrap_or(config.motion.accel_threshold);
    if !(threshold > 0.0 && threshold < 1.0) {
        anyhow::bail!("Threshold must be between 0 and 1, got {threshold}");
    }

    let sample = AccelSample::new(axes[0], axes[1], axes[2]);
    let state = classify(&sample, threshold);
    println!("{state} (|a| = {:.4} g, threshold {threshold})", sample.magnitude());
    Ok(())
}

fn main() -> Result<()> {
    let matches = build_command().get_matches();
    init_logging(matches.get_flag("debug"));
    let config = load_config(&matches)?;
    debug!("Configuration: {config:?}");

    match matches.subcommand() {
        Some(("gateway", args)) => run_gateway(args, &config),
        Some(("uplink", args)) => run_uplink(args, &config),
        Some(("classify", args)) => run_classify(args, &config),
        _ => {
            build_command().print_help()?;
            println!();
            Ok(())
        }
    }
}
