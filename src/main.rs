// Secret Bootstrap - load secrets into the environment before an application starts
//
// This is the main entry point for the command-line tool.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use secret_bootstrap::config::BootstrapConfig;
use secret_bootstrap::environment::EnvironmentMap;
use secret_bootstrap::provider::InMemoryProvider;
use secret_bootstrap::{logging, Bootstrapper};
use std::process::{Command, ExitStatus};

/// Secret Bootstrap - load AWS Secrets Manager secrets into the environment
#[derive(Parser, Debug)]
#[command(name = "secret-bootstrap")]
#[command(version)]
#[command(about = "Load AWS Secrets Manager secrets into the environment", long_about = None)]
struct Cli {
    /// Path to a YAML configuration file (environment variables take precedence)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Read secrets from a JSON fixture file instead of AWS Secrets Manager
    #[arg(long, global = true)]
    fixture: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load secrets into the environment, then run a program
    Exec {
        /// Program and arguments, after `--`
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Print `export NAME='value'` lines for `eval`
    Export,

    /// List the variables that would be set (names only)
    List,
}

fn load_environment(config_path: Option<&str>, fixture: Option<&str>) -> Result<EnvironmentMap> {
    let mut config = BootstrapConfig::load(config_path)
        .with_context(|| "Failed to resolve configuration")?;

    // Single-threaded so the environment is only ever touched by this thread.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let outcome = match fixture {
        Some(path) => {
            let provider = InMemoryProvider::from_file(path)?;
            // The fixture file stands in for the region as provider location.
            config
                .region
                .get_or_insert_with(|| format!("fixture:{}", path));
            runtime.block_on(Bootstrapper::new(&config).run(&provider))?
        }
        None => runtime.block_on(secret_bootstrap::load(&config))?,
    };

    drop(runtime);
    Ok(outcome.into_environment())
}

fn run_exec(config_path: Option<&str>, fixture: Option<&str>, command: &[String]) -> Result<i32> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| anyhow::anyhow!("No program given"))?;

    let program_path = which::which(program)
        .with_context(|| format!("Program not found in PATH: {}", program))?;

    let env = load_environment(config_path, fixture)?;
    env.apply()?;

    // Ctrl+C reaches the child through the terminal; the parent waits for it.
    if let Err(e) = ctrlc::set_handler(|| {}) {
        tracing::warn!("Failed to set SIGINT handler: {}", e);
    }

    let status = Command::new(&program_path)
        .args(args)
        .status()
        .with_context(|| format!("Failed to execute: {}", program_path.display()))?;

    Ok(exit_code(status))
}

fn run_export(config_path: Option<&str>, fixture: Option<&str>) -> Result<()> {
    let env = load_environment(config_path, fixture)?;
    print!("{}", env.to_shell_exports());
    Ok(())
}

fn run_list(config_path: Option<&str>, fixture: Option<&str>) -> Result<()> {
    let env = load_environment(config_path, fixture)?;

    if env.is_empty() {
        println!("No variables would be set");
        return Ok(());
    }

    println!("🔐 Variables to load ({}):", env.len());
    for name in env.names() {
        println!("   - {}", name);
    }

    Ok(())
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

fn main() {
    logging::init();
    let cli = Cli::parse();

    let config = cli.config.as_deref();
    let fixture = cli.fixture.as_deref();

    let result = match &cli.command {
        Commands::Exec { command } => run_exec(config, fixture, command),
        Commands::Export => run_export(config, fixture).map(|_| 0),
        Commands::List => run_list(config, fixture).map(|_| 0),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("\nError: {:#}", e);
            eprintln!("\n⚠️  Secrets were not loaded.");
            std::process::exit(1);
        }
    }
}
