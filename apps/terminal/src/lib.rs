//! # Regi Terminal
//!
//! Line-oriented operator front end for a Regi POS register.
//!
//! ## Module Organization
//! ```text
//! regi_terminal/
//! ├── lib.rs          ◄─── You are here (startup & command loop)
//! ├── command.rs      ◄─── Input line parsing
//! ├── camera.rs       ◄─── stdin reader & keyboard-wedge camera
//! ├── display.rs      ◄─── State / cart / receipt rendering
//! └── error.rs        ◄─── TerminalError
//! ```
//!
//! ## Startup Sequence
//! 1. Initialize tracing (stderr, `RUST_LOG`)
//! 2. Load `RegisterConfig` and apply command-line overrides
//! 3. Start the stdin reader
//! 4. Build the `TransactionCoordinator`
//! 5. Run the command loop until `quit`, EOF or Ctrl-C

pub mod camera;
pub mod command;
pub mod display;
pub mod error;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use regi_register::{
    DisplaySettings, LookupOutcome, RegisterConfig, RegisterError, TransactionCoordinator,
};
use regi_scan::Camera;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::camera::{next_line, spawn_stdin_reader, LineSource, StdinCamera};
use crate::command::{Command, HELP};
use crate::display::{render_cart, render_receipt, render_state};
pub use crate::error::{TerminalError, TerminalResult};

/// Command-line arguments.
#[derive(Debug, Clone, Parser)]
#[command(name = "regi-terminal", version, about = "Regi POS operator terminal")]
pub struct Args {
    /// Config file (defaults to the platform config directory)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Backend base URL, e.g. http://localhost:8000/api
    #[arg(long)]
    pub api_url: Option<String>,

    /// Employee code sent with purchases
    #[arg(long)]
    pub employee: Option<String>,

    /// Write the effective configuration file and exit
    #[arg(long)]
    pub init_config: bool,
}

/// Runs the terminal until the operator quits.
pub async fn run(args: Args) -> TerminalResult<()> {
    init_tracing();

    info!(version = env!("CARGO_PKG_VERSION"), "Starting Regi POS terminal");

    let config = load_config(&args)?;

    if args.init_config {
        let path = config.save(args.config.clone())?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let lines = spawn_stdin_reader()?;
    let camera: Arc<dyn Camera> = Arc::new(StdinCamera::new(lines.clone()));
    let register = Arc::new(TransactionCoordinator::from_config(&config, camera)?);

    Terminal::new(register, lines, config.display.clone())
        .run()
        .await
}

/// Initializes the tracing subscriber, writing to stderr.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=regi=trace` - Show trace for regi crates only
/// - Default: `info,regi=debug`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,regi=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Config file, then environment, then command-line flags.
///
/// An explicit `--config` that cannot be loaded is an error; the default
/// location falls back to defaults with a warning.
fn load_config(args: &Args) -> TerminalResult<RegisterConfig> {
    let mut config = match &args.config {
        Some(path) => RegisterConfig::load(Some(path.clone()))?,
        None => RegisterConfig::load_or_default(None),
    };

    if let Some(url) = &args.api_url {
        config.backend.base_url = url.clone();
    }
    if let Some(code) = &args.employee {
        config.register.employee_code = Some(code.clone());
    }

    config.validate()?;
    debug!(base_url = %config.backend.base_url, "Configuration loaded");
    Ok(config)
}

// =============================================================================
// Command Loop
// =============================================================================

/// Wires operator input to one register.
pub struct Terminal {
    register: Arc<TransactionCoordinator>,
    lines: LineSource,
    display: DisplaySettings,
}

impl Terminal {
    pub fn new(
        register: Arc<TransactionCoordinator>,
        lines: LineSource,
        display: DisplaySettings,
    ) -> Self {
        Terminal {
            register,
            lines,
            display,
        }
    }

    /// Reads and executes commands until `quit`, EOF or Ctrl-C.
    pub async fn run(&self) -> TerminalResult<()> {
        println!("{}", HELP);

        loop {
            let line = tokio::select! {
                line = next_line(&self.lines) => line,
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted");
                    break;
                }
            };

            let Some(line) = line else {
                debug!("Input closed");
                break;
            };

            let command = match Command::parse(&line) {
                Ok(Some(Command::Quit)) => break,
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(e) => {
                    println!("{}", e);
                    continue;
                }
            };

            match self.execute(command).await {
                Ok(output) => println!("{}", output),
                Err(e) => {
                    error!(error = %e, "Command failed");
                    println!("Error: {}", e);
                }
            }
        }

        info!("Terminal closed");
        Ok(())
    }

    /// Executes one command and returns what to print.
    pub async fn execute(&self, command: Command) -> TerminalResult<String> {
        let output = match command {
            Command::Load(code) => match self.register.load_by_code(&code).await {
                Err(RegisterError::Busy) => RegisterError::Busy.user_message(),
                Err(e @ RegisterError::Validation(_)) => format!("Error: {}", e.user_message()),
                _ => self.render_state(),
            },
            Command::Scan => self.scan().await?,
            Command::Add => match self.register.add_loaded_product_to_cart() {
                Ok(Some(_)) => self.render_cart(),
                Ok(None) => "No product loaded. Look a product up first.".to_string(),
                Err(e) => format!("Error: {}", e.user_message()),
            },
            Command::Cart => self.render_cart(),
            Command::Buy => match self.register.submit_purchase().await {
                Ok(receipt) => render_receipt(&receipt, &self.display),
                Err(e) if e.is_retryable() => {
                    format!("Error: {} (cart kept, `buy` to retry)", e.user_message())
                }
                Err(e) => format!("Error: {}", e.user_message()),
            },
            Command::Reset => match self.register.reset() {
                Ok(()) => "New transaction.".to_string(),
                Err(e) => format!("Error: {}", e.user_message()),
            },
            Command::Help => HELP.to_string(),
            Command::Quit => String::new(),
        };

        Ok(output)
    }

    /// Runs one scan; Ctrl-C closes the scanner.
    ///
    /// The scan future is polled first, so by the time Ctrl-C is handled the
    /// session is registered and `cancel_scan` reaches it.
    async fn scan(&self) -> TerminalResult<String> {
        println!("Scan a code now (Ctrl-C to cancel).");

        let scan = self.register.load_by_scan();
        tokio::pin!(scan);

        let result = tokio::select! {
            biased;
            result = &mut scan => result,
            _ = tokio::signal::ctrl_c() => {
                let (result, ()) = tokio::join!(&mut scan, self.register.cancel_scan());
                result
            }
        };

        let output = match result {
            Ok(Some(LookupOutcome::Found(_) | LookupOutcome::NotFound { .. })) => {
                self.render_state()
            }
            Ok(None) => "Scan cancelled.".to_string(),
            Err(RegisterError::Busy) => RegisterError::Busy.user_message(),
            Err(e) => {
                warn!(error = %e, "Scan failed");
                self.render_state()
            }
        };

        Ok(output)
    }

    fn render_state(&self) -> String {
        render_state(&self.register.state(), &self.display)
    }

    fn render_cart(&self) -> String {
        render_cart(&self.register.cart(), &self.register.totals(), &self.display)
    }
}
