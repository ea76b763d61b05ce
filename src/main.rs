use anyhow::Result;
use clap::Parser;
use owo_colors::OwoColorize;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use voxnote::audio::load_recordings;
use voxnote::cli::{Cli, Commands, ConfigAction};
use voxnote::config::Config;
use voxnote::output;
use voxnote::pipeline::{self, Pipeline};
use voxnote::writer::NoteWriter;

#[tokio::main]
async fn main() -> Result<()> {
    // .env before anything reads the environment
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            files,
            combined,
            yes,
        } => {
            let config = load_config(cli.config.as_deref())?;
            run_process(config, &files, combined, yes).await?;
        }
        Commands::Config { action } => {
            handle_config_command(action, cli.config.as_deref())?;
        }
    }

    Ok(())
}

/// Diagnostics go to stderr; stdout stays reserved for command output.
/// RUST_LOG raises the level when debugging.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/voxnote/config.toml)
/// 3. Built-in defaults with environment variable overrides
fn load_config(custom_path: Option<&std::path::Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path)?
    } else {
        Config::load_or_default(&Config::default_path())?
    };

    Ok(config.with_env_overrides())
}

/// Run the full workflow: validate, load, confirm, process, report.
async fn run_process(
    config: Config,
    files: &[std::path::PathBuf],
    combined: bool,
    yes: bool,
) -> Result<()> {
    // Configuration errors are the only ones fatal to the whole invocation
    if let Err(e) = config.validate() {
        eprintln!("{}", format!("Error: {e}").red());
        std::process::exit(1);
    }
    let api_key = config.api_key()?;

    let (recordings, skipped) = load_recordings(files);
    output::render_skipped(&skipped);

    if recordings.is_empty() {
        eprintln!("{}", "Error: no valid recordings to process".red());
        std::process::exit(1);
    }

    output::render_queue(&recordings);
    output::render_cost(&pipeline::estimate_cost(&recordings));

    if !yes && !output::confirm("Proceed?") {
        println!("Aborted.");
        return Ok(());
    }

    // Catch an unwritable vault before spending money on API calls
    if let Some(vault) = config.vault.path.as_deref() {
        NoteWriter::new(vault, &config.vault.output_folder).verify_vault_access()?;
    }

    let pipeline = Pipeline::from_config(&config, &api_key)?;

    println!();
    let failed = if combined {
        let outcome = pipeline.process_combined(&recordings).await;
        output::render_outcome(&outcome);
        !outcome.succeeded
    } else {
        let outcomes = pipeline.process_batch(&recordings).await;
        for outcome in &outcomes {
            output::render_outcome(outcome);
        }
        let summary = pipeline::summarize(&outcomes);
        output::render_summary(&summary);
        summary.failed > 0
    };

    if failed {
        std::process::exit(1);
    }
    Ok(())
}

/// Handle configuration commands.
fn handle_config_command(
    action: ConfigAction,
    custom_path: Option<&std::path::Path>,
) -> Result<()> {
    let config_path = custom_path
        .map(std::path::PathBuf::from)
        .unwrap_or_else(Config::default_path);

    match action {
        ConfigAction::Show => {
            let config = Config::load_or_default(&config_path)?.with_env_overrides();
            match toml::to_string_pretty(&config) {
                Ok(rendered) => print!("{rendered}"),
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(1);
                }
            }
        }
        ConfigAction::Get { key } => {
            let config = Config::load_or_default(&config_path)?.with_env_overrides();
            match config.get_value(&key) {
                Ok(value) => println!("{value}"),
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(1);
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load_or_default(&config_path)?;
            if let Err(e) = config.set_value(&key, &value) {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
            config.save(&config_path)?;
            println!("Set {key} = {value}");
        }
    }
    Ok(())
}
