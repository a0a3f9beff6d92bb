use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Local;
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;

use nisse::voice::{PlaybackStatus, mixer};
use nisse::{Config, CycleOutcome, Daemon, Pipeline, PromptComposer, logging, sensor};

/// Nisse - a motion-triggered talking Christmas elf
#[derive(Parser)]
#[command(name = "nisse", version, about)]
struct Cli {
    /// Path to the config file (default: ~/.config/nisse/config.toml)
    #[arg(short, long, env = "NISSE_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use the keyboard instead of the PIR sensor
    #[arg(long)]
    manual: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print composed prompts without calling any service
    Simulate {
        /// Number of prompts
        #[arg(short, long, default_value = "10")]
        count: usize,
        /// Seed for a reproducible run
        #[arg(short, long)]
        seed: Option<u64>,
    },
    /// Synthesize and play one phrase
    Say {
        /// Text to speak
        #[arg(default_value = "Ho ho ho! God jul!")]
        text: String,
    },
    /// Run one full cycle now, ignoring cooldown and active hours
    SpeakOnce,
    /// Tail the current log file
    Logs {
        /// Number of lines to show
        #[arg(short, long, default_value = "50")]
        lines: usize,
        /// Follow log output
        #[arg(short, long)]
        follow: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // The file logger needs the config, so config warnings go to stderr only
    let bootstrap = logging::bootstrap_subscriber(cli.verbose, std::io::stderr);
    let config = match tracing::subscriber::with_default(bootstrap, || {
        Config::load(cli.config.as_deref())
    }) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(Command::Logs { lines, follow }) = &cli.command {
        return match cmd_logs(&config, *lines, *follow) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("error: {e}");
                ExitCode::FAILURE
            }
        };
    }

    let _guard = match logging::init(&config.log_dir, cli.verbose) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    tracing::debug!(?config, "loaded configuration");

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::Simulate { count, seed } => {
                simulate(&config, count, seed);
                Ok(())
            }
            Command::Say { text } => say(&config, &text).await,
            Command::SpeakOnce => speak_once(&config).await,
            Command::Logs { lines, follow } => cmd_logs(&config, lines, follow),
        };
    }

    tracing::info!(
        sensor = ?config.sensor.kind,
        manual = cli.manual,
        active_hours = %config.gate.active_hours,
        "starting nisse"
    );

    let pipeline = build_pipeline(&config).await?;
    let sensor = sensor::open(&config.sensor, cli.manual);

    // Run until interrupted
    Daemon::new(&config.gate, sensor, pipeline).run().await;

    Ok(())
}

/// Validate credentials, set the volume, and wire up the pipeline
async fn build_pipeline(config: &Config) -> anyhow::Result<Pipeline> {
    let credentials = config.api_keys.require()?;

    if let Err(e) = mixer::set_volume(&config.mixer).await {
        tracing::warn!(error = %e, "could not set volume");
    }

    Ok(Pipeline::from_config(config, credentials)?)
}

/// Print composed prompts (the prompt-variety harness)
fn simulate(config: &Config, count: usize, seed: Option<u64>) {
    let composer = PromptComposer::new(config.theme.clone());
    let mut rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
    let today = Local::now().date_naive();

    for i in 1..=count {
        let prompt = composer.compose(&mut rng, today);
        println!("=== Prompt {i} ===");
        println!("Theme:  {}", prompt.theme_source);
        println!("Style:  {}", prompt.style);
        println!("Length: {}", prompt.length);
        println!("Names:  {}", if prompt.name_clause.is_some() { "yes" } else { "no" });
        println!("---");
        println!("{}", prompt.render());
        println!();
    }
}

/// Synthesize and play one phrase
async fn say(config: &Config, text: &str) -> anyhow::Result<()> {
    let pipeline = build_pipeline(config).await?;

    println!("Speaking: {text}");
    match pipeline.speak(text).await? {
        PlaybackStatus::Completed => println!("Done."),
        PlaybackStatus::ExitedWithCode(code) => println!("Player exited with code {code}."),
    }

    Ok(())
}

/// Run one full cycle immediately
async fn speak_once(config: &Config) -> anyhow::Result<()> {
    let pipeline = build_pipeline(config).await?;
    let mut rng = StdRng::from_entropy();

    match pipeline.run_cycle(&mut rng, Local::now().date_naive()).await {
        CycleOutcome::Played {
            utterance, elapsed, ..
        } => {
            println!("Nisse said: {utterance}");
            println!("Cycle took {:.1}s", elapsed.as_secs_f64());
            Ok(())
        }
        CycleOutcome::Aborted { stage, reason, .. } => {
            anyhow::bail!("cycle aborted before {stage}: {reason}")
        }
    }
}

fn cmd_logs(config: &Config, lines: usize, follow: bool) -> anyhow::Result<()> {
    let log_path = logging::latest_log_file(&config.log_dir).ok_or_else(|| {
        anyhow::anyhow!("no log file found in {}", config.log_dir.display())
    })?;

    let mut args = vec![format!("-n{lines}"), log_path.display().to_string()];
    if follow {
        args.insert(0, "-f".to_string());
    }

    let status = std::process::Command::new("tail").args(&args).status()?;

    if !status.success() {
        anyhow::bail!("tail exited with {status}");
    }

    Ok(())
}
