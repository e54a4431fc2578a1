//! relative-slam-replay
//!
//! Replays a JSON-lines command script through the relative solver and prints
//! every result as one JSON document per line.
//!
//! # Usage
//!
//! ```bash
//! # With default config
//! cargo run --bin relative-slam-replay -- --script session.jsonl
//!
//! # With a config file, writing marker batches and global snapshots to files
//! cargo run --bin relative-slam-replay -- --config relative_slam.toml \
//!     --script session.jsonl --markers markers.jsonl --snapshots global.jsonl
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;

use relative_slam::engine::graph::{GlobalGraphOptimizer, GraphSnapshot};
use relative_slam::io::replay::{ReplayCommand, ReplayOutput, parse_script};
use relative_slam::{
    JsonLinesPublisher, KeyframeId, MarkerPublisher, Pose2D, RelativeSolver, SolverConfig,
};

#[derive(Parser)]
#[command(name = "relative-slam-replay")]
#[command(about = "Replay a relative pose graph session and print corrections and markers")]
struct Args {
    /// Solver configuration (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Command script (JSON lines)
    #[arg(short, long)]
    script: PathBuf,

    /// Also write marker batches to this file
    #[arg(long)]
    markers: Option<PathBuf>,

    /// Write global-optimization snapshots to this file
    #[arg(long)]
    snapshots: Option<PathBuf>,

    /// Keep going when a command fails
    #[arg(long)]
    keep_going: bool,
}

/// Records each snapshot and returns the spanning-tree poses unchanged.
struct SnapshotWriter {
    writer: BufWriter<File>,
}

impl GlobalGraphOptimizer for SnapshotWriter {
    fn optimize(&mut self, snapshot: &GraphSnapshot) -> Vec<(KeyframeId, Pose2D)> {
        let written = serde_json::to_writer(&mut self.writer, snapshot)
            .map_err(std::io::Error::from)
            .and_then(|_| self.writer.write_all(b"\n"))
            .and_then(|_| self.writer.flush());
        if let Err(e) = written {
            log::warn!("Failed to write global snapshot: {}", e);
        }
        snapshot.nodes.iter().map(|n| (n.id, n.pose)).collect()
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = SolverConfig::load_or_default(args.config.as_deref());
    let commands = parse_script(BufReader::new(File::open(&args.script)?))?;
    log::info!("Replaying {} commands from {}", commands.len(), args.script.display());

    let mut solver = RelativeSolver::new(config);
    if let Some(path) = &args.snapshots {
        solver.set_global_optimizer(Box::new(SnapshotWriter {
            writer: BufWriter::new(File::create(path)?),
        }));
    }

    let mut marker_sink = match &args.markers {
        Some(path) => Some(JsonLinesPublisher::new(BufWriter::new(File::create(path)?))),
        None => None,
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut failures = 0;

    for (line, command) in commands.iter().enumerate() {
        let output = match command.apply(&mut solver) {
            Ok(output) => output,
            Err(e) if args.keep_going => {
                log::warn!("Command {} ({:?}) failed: {}", line, command, e);
                failures += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        if let (Some(sink), Some(ReplayOutput::Markers { markers })) =
            (marker_sink.as_mut(), &output)
        {
            sink.publish(markers)?;
        }
        if let Some(output) = output {
            serde_json::to_writer(&mut out, &output)?;
            writeln!(out)?;
        }
        if matches!(command, ReplayCommand::LoopClosed) {
            log::info!("Loop closure signalled at command {}", line);
        }
    }

    log::info!(
        "Done: {} keyframes, {} edges ({} loop closures), {} failed commands",
        solver.graph().num_keyframes(),
        solver.graph().num_edges(),
        solver.graph().num_loop_closures(),
        failures
    );
    Ok(())
}
