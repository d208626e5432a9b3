use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use clap_complete::generate;
use colored::Colorize;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use repo_digest_core::config::Config;
use repo_digest_core::report::{analyzer_from_config, generate_report};
use repo_digest_core::{build_model, DigestError, Result};

mod args;
use args::{Cli, Commands, ConfigAction, LogLevel, Shell};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    let base_dir = resolve_base_dir(cli.base_dir);

    let result = match cli.command {
        Some(Commands::Analyze {
            url,
            temp_dir,
            output,
        }) => handle_analyze(&base_dir, &url, temp_dir, output.as_deref()),
        Some(Commands::Report {
            url,
            temp_dir,
            output,
        }) => handle_report(&base_dir, &url, temp_dir, output),
        Some(Commands::Config { action }) => handle_config(action, &base_dir),
        Some(Commands::Completions { shell }) => {
            handle_completions(shell);
            Ok(())
        }
        None => {
            Cli::command().print_help().ok();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Analysis failed: {}", e);
            eprintln!("{} {}", "[ERROR]".red().bold(), e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

/// Timestamped, leveled logs on stderr; stdout is reserved for JSON
fn init_logging(level: LogLevel) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.as_filter())),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(true),
        )
        .init();
}

fn resolve_base_dir(cli_base: Option<PathBuf>) -> PathBuf {
    if let Some(base) = cli_base {
        return base;
    }

    if let Ok(base) = std::env::var("REPO_DIGEST_BASE") {
        return PathBuf::from(base);
    }

    dirs::home_dir()
        .map(|h| h.join(".repo-digest"))
        .unwrap_or_else(|| PathBuf::from(".repo-digest"))
}

fn handle_analyze(
    base_dir: &Path,
    url: &str,
    temp_dir: Option<PathBuf>,
    output: Option<&Path>,
) -> Result<()> {
    let config = Config::load(base_dir)?;
    let analyzer = analyzer_from_config(url, temp_dir, &config)?;
    let result = analyzer.analyze()?;
    let json = result.to_json_pretty()?;

    match output {
        Some(path) => {
            fs::write(path, json)?;
            eprintln!(
                "{} {} code, {} doc files -> {}",
                "Analyzed:".green(),
                result.code.len(),
                result.doc.len(),
                path.display()
            );
        }
        None => println!("{}", json),
    }

    Ok(())
}

fn handle_report(
    base_dir: &Path,
    url: &str,
    temp_dir: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load(base_dir)?;
    let model = build_model(&config.model)?;
    let analyzer = analyzer_from_config(url, temp_dir, &config)?;

    info!("Generating report for {}", url);
    let report = generate_report(analyzer, model, &config)?;

    let path = output.unwrap_or_else(|| config.output.path.clone());
    report.save(&path)?;
    println!("{} {}", "Saved:".green(), path.display());

    Ok(())
}

fn handle_config(action: ConfigAction, base_dir: &Path) -> Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load(base_dir)?;
            match config.get(&key) {
                Some(value) => {
                    println!("{}", value);
                }
                None => {
                    return Err(DigestError::ConfigKeyNotFound { key });
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load(base_dir)?;
            config.set(&key, &value)?;
            config.save(base_dir)?;
            println!("{} {} = {}", "Set:".green(), key, value);
        }
        ConfigAction::List => {
            let config = Config::load(base_dir)?;
            println!();
            for (key, value) in config.list() {
                println!("{} = {}", key.cyan(), value);
            }
            println!();
        }
        ConfigAction::Path => {
            let path = Config::path(base_dir);
            println!("{}", path.display());
        }
        ConfigAction::Init => {
            let path = Config::init(base_dir)?;
            println!("{} {}", "Initialized:".green(), path.display());
        }
    }

    Ok(())
}

fn handle_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let shell = match shell {
        Shell::Bash => clap_complete::Shell::Bash,
        Shell::Zsh => clap_complete::Shell::Zsh,
        Shell::Fish => clap_complete::Shell::Fish,
        Shell::PowerShell => clap_complete::Shell::PowerShell,
        Shell::Elvish => clap_complete::Shell::Elvish,
    };
    generate(shell, &mut cmd, "repo-digest", &mut io::stdout());
}
