#![warn(missing_docs)]
//! # cipherdesk binary
//!
//! Command-line shell for cipherdesk: wake the service, encrypt/decrypt a
//! payload, and export the result.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use base64::Engine as _;
use cipherdesk_app::{
    AppConfig, AppError, DEFAULT_BASE_URL, Services, app_version, init_tracing, load_payload_file,
    refresh_service, rejection_alert, run_transform,
};
use cipherdesk_core::{CoreError, TransformOperation};
use cipherdesk_ui::{AppState, ClipboardSink, ExportError, copy_result, download_result};
use clap::{ArgGroup, Args, Parser, Subcommand};
use tracing::error;

#[derive(Parser, Debug)]
#[command(name = "cipherdesk", version, about = "Remote encrypt/decrypt client")]
struct Cli {
    #[arg(
        long,
        global = true,
        env = "CIPHERDESK_BASE_URL",
        default_value = DEFAULT_BASE_URL,
        help = "Base URL of the remote transform service"
    )]
    base_url: String,
    #[arg(long, global = true, env = "CIPHERDESK_PROBE_TIMEOUT_MS", default_value_t = 15_000)]
    probe_timeout_ms: u64,
    #[arg(long, global = true, env = "CIPHERDESK_RETRY_DELAY_MS", default_value_t = 2_000)]
    retry_delay_ms: u64,
    #[arg(long, global = true, help = "Print the final state snapshot as JSON")]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Wake the remote service and wait until it is ready.
    Refresh,
    /// Encrypt a payload.
    Encrypt(TransformArgs),
    /// Decrypt a payload.
    Decrypt(TransformArgs),
    /// Check a file against the payload alphabet without sending it.
    Check {
        #[arg(long)]
        file: PathBuf,
    },
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("input").required(true).args(["text", "file"])))]
struct TransformArgs {
    #[arg(long, help = "Payload typed on the command line (not alphabet-checked)")]
    text: Option<String>,
    #[arg(long, help = "Load payload from a file (alphabet-checked)")]
    file: Option<PathBuf>,
    #[arg(long, env = "CIPHERDESK_CODE", hide_env_values = true)]
    code: String,
    #[arg(long, help = "Directory to write result.txt into")]
    out: Option<PathBuf>,
    #[arg(long, help = "Copy the result to the terminal clipboard")]
    copy: bool,
}

/// Clipboard sink using the OSC 52 terminal escape sequence.
struct TerminalClipboard;

impl ClipboardSink for TerminalClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ExportError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(text.as_bytes());
        let mut stderr = std::io::stderr().lock();
        write!(stderr, "\x1b]52;c;{encoded}\x07")
            .and_then(|()| stderr.flush())
            .map_err(|error| ExportError::Clipboard(error.to_string()))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(error) = init_tracing() {
        eprintln!("cipherdesk: {error}");
    }

    match run(cli).await {
        Ok(code) => code,
        Err(error) => {
            error!(stage = "shell", action = "aborted", %error);
            eprintln!("cipherdesk: {error}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, AppError> {
    let mut state = AppState::new(app_version());
    let config = || AppConfig::new(&cli.base_url, cli.probe_timeout_ms, cli.retry_delay_ms);

    let exit = match cli.command {
        Commands::Check { ref file } => {
            if !load_or_alert(&mut state, file).await? {
                return Ok(ExitCode::FAILURE);
            }
            println!("ok: {} characters", state.payload.as_str().chars().count());
            ExitCode::SUCCESS
        }
        Commands::Refresh => {
            let services = Services::connect(&config()?)?;
            refresh_service(&mut state, &services.probe).await;
            println!("Refreshed Successfully!");
            ExitCode::SUCCESS
        }
        Commands::Encrypt(ref args) => {
            transform(&mut state, &config()?, TransformOperation::Encrypt, args).await?
        }
        Commands::Decrypt(ref args) => {
            transform(&mut state, &config()?, TransformOperation::Decrypt, args).await?
        }
    };

    if cli.json {
        println!("{}", state.snapshot_json()?);
    }

    Ok(exit)
}

async fn transform(
    state: &mut AppState,
    config: &AppConfig,
    operation: TransformOperation,
    args: &TransformArgs,
) -> Result<ExitCode, AppError> {
    state.set_code(args.code.as_str());
    match (&args.text, &args.file) {
        (Some(text), _) => state.edit_payload(text.as_str()),
        (None, Some(file)) => {
            if !load_or_alert(state, file).await? {
                return Ok(ExitCode::FAILURE);
            }
        }
        (None, None) => {
            return Err(AppError::Config("either --text or --file is required".to_string()));
        }
    }

    let services = Services::connect(config)?;
    let succeeded = run_transform(state, &services.transform, operation).await;
    println!("{}", state.result);

    if args.copy && copy_result(state, &mut TerminalClipboard)? {
        eprintln!("Copied to clipboard!");
    }
    if let Some(dir) = &args.out
        && let Some(path) = download_result(state, dir)?
    {
        eprintln!("wrote {}", path.display());
    }

    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Loads a payload file; prints the rejected character and returns `false`
/// when validation fails.
async fn load_or_alert(state: &mut AppState, file: &Path) -> Result<bool, AppError> {
    match load_payload_file(state, file).await {
        Ok(()) => Ok(true),
        Err(AppError::Validation(CoreError::DisallowedCharacter(rejected))) => {
            eprintln!("{}", rejection_alert(rejected));
            Ok(false)
        }
        Err(other) => Err(other),
    }
}
