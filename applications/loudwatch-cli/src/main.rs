/// Loudwatch - EBU R128 loudness records and graphs for WAV files
use clap::{Parser, Subcommand};
use loudwatch_cli::{analyze, graph, CliConfig, FrameSink, WavInput};
use loudwatch_core::ClockTime;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "loudwatch")]
#[command(about = "EBU R128 loudness records and graphs for WAV files", long_about = None)]
struct Cli {
    /// Configuration file path (default: ./loudwatch.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print loudness records as JSON lines
    Analyze {
        /// WAV file to measure
        wav: PathBuf,
        /// Time between two records in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,
        /// Also report loudness over this many milliseconds
        #[arg(long)]
        window_ms: Option<u32>,
        /// Report every measurement
        #[arg(long)]
        all: bool,
        /// Frames per input buffer
        #[arg(long)]
        buffer_frames: Option<usize>,
    },
    /// Render the loudness graph as PNG frames
    Graph {
        /// WAV file to render
        wav: PathBuf,
        /// Directory receiving frame-NNNNNN.png files
        #[arg(short, long)]
        out: PathBuf,
        #[arg(long)]
        width: Option<u32>,
        #[arg(long)]
        height: Option<u32>,
        /// Video frames per second
        #[arg(long)]
        fps: Option<u32>,
        /// Time span covered by the graph width in seconds
        #[arg(long)]
        timebase_secs: Option<u64>,
        /// Write only every n-th frame
        #[arg(long, default_value_t = 1)]
        every: u64,
        /// Frames per input buffer
        #[arg(long)]
        buffer_frames: Option<usize>,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "loudwatch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = CliConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze {
            wav,
            interval_ms,
            window_ms,
            all,
            buffer_frames,
        } => {
            if let Some(interval_ms) = interval_ms {
                config.analyzer.interval = ClockTime::from_mseconds(interval_ms);
            }
            if let Some(window_ms) = window_ms {
                config.analyzer.window = window_ms;
            }
            if all {
                let analyzer = &mut config.analyzer;
                analyzer.momentary = true;
                analyzer.shortterm = true;
                analyzer.global = true;
                analyzer.range = true;
                analyzer.sample_peak = true;
                analyzer.true_peak = true;
            }
            if let Some(buffer_frames) = buffer_frames {
                config.input.buffer_frames = buffer_frames;
            }
            config.validate()?;

            let mut input = WavInput::open(&wav, config.input.buffer_frames)?;
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            analyze::run(&mut input, config.analyzer, &mut out)?;
        }
        Commands::Graph {
            wav,
            out,
            width,
            height,
            fps,
            timebase_secs,
            every,
            buffer_frames,
        } => {
            if let Some(width) = width {
                config.video.width = width;
            }
            if let Some(height) = height {
                config.video.height = height;
            }
            if let Some(fps) = fps {
                config.video.fps = fps;
            }
            if let Some(timebase_secs) = timebase_secs {
                config.graph.timebase = ClockTime::from_seconds(timebase_secs);
            }
            if let Some(buffer_frames) = buffer_frames {
                config.input.buffer_frames = buffer_frames;
            }
            config.validate()?;
            graph::check_output_dir(&out)?;

            let mut input = WavInput::open(&wav, config.input.buffer_frames)?;
            let sink = FrameSink::new(out, every);
            graph::run(
                &mut input,
                config.graph,
                config.video.video_info(),
                &sink,
            )?;
        }
    }

    Ok(())
}
