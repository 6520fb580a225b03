// Vigil command line interface
// Reads detector output as JSON lines and turns it into spoken or tonal alerts

mod config;
mod input;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use config::AppConfig;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use vigil_alert::PipelineCoordinator;
use vigil_core::ChannelKind;
use vigil_eye::ScoreEngine;
use vigil_llm::{GoogleProvider, SceneDescriber};
use vigil_spk::{select_channel, AudioSink, CommandSink, DirectorySink, NullSink};

const START_MESSAGE: &str = "Sistema de asistencia iniciado";
const STOP_MESSAGE: &str = "Sistema de asistencia detenido";

#[derive(Parser)]
#[command(name = "vigil")]
#[command(about = "Threat scoring and audio alerts for object detections", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace), RUST_LOG takes precedence
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the alert pipeline over a stream of frames
    Run {
        /// JSON-lines input, "-" for stdin
        #[arg(long, short, default_value = "-")]
        input: String,

        /// Override the configured alert channel
        #[arg(long)]
        channel: Option<ChannelArg>,

        /// Write rendered audio clips to this directory
        #[arg(long, conflicts_with = "player")]
        audio_dir: Option<PathBuf>,

        /// Pipe rendered audio into this player command (e.g. "aplay -q")
        #[arg(long)]
        player: Option<String>,

        /// Use synthetic frame timestamps this many ms apart instead of the wall clock
        #[arg(long)]
        frame_interval_ms: Option<u64>,

        /// Print one JSON status line per frame on stdout
        #[arg(long)]
        report: bool,
    },

    /// Score frames and print the assessments, no audio
    Score {
        #[arg(long, short, default_value = "-")]
        input: String,
    },

    /// Describe the scene of the last frame with the remote service
    Describe {
        #[arg(long, short, default_value = "-")]
        input: String,

        /// One sentence instead of the structured analysis
        #[arg(long, conflicts_with = "question")]
        quick: bool,

        /// Ask a question about the scene
        #[arg(long)]
        question: Option<String>,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum ChannelArg {
    Speech,
    Tone,
    Silent,
}

impl From<ChannelArg> for ChannelKind {
    fn from(arg: ChannelArg) -> Self {
        match arg {
            ChannelArg::Speech => ChannelKind::Speech,
            ChannelArg::Tone => ChannelKind::Tone,
            ChannelArg::Silent => ChannelKind::Silent,
        }
    }
}

fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_json);

    let config = AppConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            input,
            channel,
            audio_dir,
            player,
            frame_interval_ms,
            report,
        } => {
            let mut config = config;
            if let Some(channel) = channel {
                config.core.channel = channel.into();
            }
            let sink = build_sink(audio_dir, player)?;
            run(config, &input, sink, frame_interval_ms.map(Duration::from_millis), report).await?;
        }
        Commands::Score { input } => {
            score(&config, &input).await?;
        }
        Commands::Describe { input, quick, question } => {
            describe(&config, &input, quick, question.as_deref()).await?;
        }
        Commands::Config => {
            print!("{}", config.to_toml_string()?);
        }
    }

    Ok(())
}

fn build_sink(audio_dir: Option<PathBuf>, player: Option<String>) -> anyhow::Result<Arc<dyn AudioSink>> {
    if let Some(dir) = audio_dir {
        return Ok(Arc::new(DirectorySink::new(dir)?));
    }

    if let Some(command) = player {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next().context("Player command is empty")?;
        return Ok(Arc::new(CommandSink::new(program, parts.collect())?));
    }

    Ok(Arc::new(NullSink))
}

/// Run frames through the pipeline until the input ends or Ctrl-C
async fn run(
    config: AppConfig,
    input_path: &str,
    sink: Arc<dyn AudioSink>,
    frame_interval: Option<Duration>,
    report: bool,
) -> anyhow::Result<()> {
    let (channel, kind) = select_channel(config.core.channel, &config.speech, &config.core.tone, sink.clone());
    if kind != config.core.channel {
        warn!("Configured channel {:?} unavailable, using {:?}", config.core.channel, kind);
    }

    let pipeline = PipelineCoordinator::from_config(&config.core, channel, sink)?;
    pipeline.dispatcher().start()?;
    info!(
        "Pipeline running (channel: {}, tone path: {})",
        pipeline.dispatcher().channel_name(),
        pipeline.has_beeper()
    );

    let started = Instant::now();
    pipeline.announce(START_MESSAGE, started);

    let mut lines = input::open(input_path).await?;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut frame_index: u64 = 0;
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read input")?,
            _ = &mut ctrl_c => {
                info!("Interrupted");
                break;
            }
        };
        let Some(line) = line else {
            debug!("End of input");
            break;
        };

        let frame = match input::parse_frame(&line) {
            Ok(Some(frame)) => frame,
            Ok(None) => continue,
            Err(e) => {
                warn!("Skipping malformed frame line: {}", e);
                continue;
            }
        };

        let now = match frame_interval {
            Some(interval) => started + interval.saturating_mul(frame_index.min(u32::MAX as u64) as u32),
            None => Instant::now(),
        };
        frame_index += 1;

        match pipeline.process_frame(&frame, now) {
            Ok(outcome) => {
                if report {
                    let top = outcome.top();
                    println!(
                        "{}",
                        json!({
                            "frame": frame_index,
                            "level": outcome.level,
                            "score": top.map(|a| a.danger_score),
                            "message": top.map(|a| a.message.as_str()),
                            "alerted": outcome.submitted.as_ref().map(|s| s.is_queued()).unwrap_or(false),
                            "beep_hz": outcome.tone.map(|t| t.frequency_hz),
                        })
                    );
                }
            }
            Err(e) => warn!("Frame {} rejected: {}", frame_index, e),
        }
    }

    pipeline.announce(STOP_MESSAGE, Instant::now());
    wait_for_drain(&pipeline, Duration::from_secs(10)).await;

    let shutdown = pipeline.dispatcher().shutdown().await;
    let stats = pipeline.dispatcher().stats();
    info!(
        "Processed {} frames: {} alerts rendered, {} failed, {} evicted, {} dropped, {} abandoned",
        frame_index, stats.rendered, stats.failed, stats.evicted, stats.dropped, shutdown.abandoned
    );
    Ok(())
}

/// Give queued alerts a chance to play before shutting down
async fn wait_for_drain(pipeline: &PipelineCoordinator, limit: Duration) {
    let deadline = Instant::now() + limit;
    while pipeline.dispatcher().pending() > 0 && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

async fn score(config: &AppConfig, input_path: &str) -> anyhow::Result<()> {
    let engine = ScoreEngine::new(config.core.scoring.clone())?;
    let mut lines = input::open(input_path).await?;

    while let Some(line) = lines.next_line().await? {
        let Some(frame) = input::parse_frame(&line)? else {
            continue;
        };
        frame.validate()?;
        let assessments = engine.assess_frame(&frame.to_detections(), frame.frame_width)?;
        println!("{}", serde_json::to_string(&assessments)?);
    }
    Ok(())
}

async fn describe(config: &AppConfig, input_path: &str, quick: bool, question: Option<&str>) -> anyhow::Result<()> {
    if !config.scene.enabled {
        anyhow::bail!("Scene description is disabled in the configuration");
    }

    let engine = ScoreEngine::new(config.core.scoring.clone())?;
    let mut lines = input::open(input_path).await?;
    let mut last_frame = None;
    while let Some(line) = lines.next_line().await? {
        if let Some(frame) = input::parse_frame(&line)? {
            last_frame = Some(frame);
        }
    }
    let frame = last_frame.context("No frames in input")?;
    frame.validate()?;
    let assessments = engine.assess_frame(&frame.to_detections(), frame.frame_width)?;

    let provider = GoogleProvider::new(&config.scene)?;
    let describer = SceneDescriber::new(Arc::new(provider), config.scene.clone())?;
    let summary = describer.summarize(&assessments);

    if let Some(question) = question {
        println!("{}", describer.answer_question(&summary, question).await?);
    } else if quick {
        println!("{}", describer.quick_description(&summary).await?);
    } else if let Some(description) = describer.analyze_scene(&summary, Instant::now()).await {
        println!("{}", serde_json::to_string_pretty(&description)?);
    }
    Ok(())
}
