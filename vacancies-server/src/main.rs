//! vacancies-server: signature gate for the vacancies service

use clap::Parser;
use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::signal;
use tracing::{error, info, warn};
use vacancies_core::auth::{sign, ApiToken, SigningFields};
use vacancies_server::logging::init_logging;
use vacancies_server::{AppState, Cli, Command, ServeArgs, SignArgs, VacanciesServer};

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Command::Sign(args) => match run_sign(&args) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error signing message: {}", e);
                ExitCode::FAILURE
            }
        },
        Command::GenToken => {
            println!("{}", ApiToken::generate().expose());
            ExitCode::SUCCESS
        }
        Command::Serve(args) => {
            if let Err(e) = init_logging(&cli.logging) {
                eprintln!("Error initializing logging: {}", e);
                return ExitCode::FAILURE;
            }

            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(e) => {
                    error!(error = %e, "Failed to create Tokio runtime");
                    return ExitCode::FAILURE;
                }
            };

            match runtime.block_on(run_serve(args)) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    error!(error = %e, "Server failed");
                    ExitCode::FAILURE
                }
            }
        }
    }
}

async fn run_serve(args: ServeArgs) -> anyhow::Result<()> {
    info!("Starting vacancies server v{}", env!("CARGO_PKG_VERSION"));
    info!("Bind address: {}", args.bind);
    match args.registry_url() {
        Some(url) => info!("Registry service: {}", url),
        None => info!("Registry service: not configured"),
    }

    let gate = args.build_gate()?;
    let state = AppState::new(gate);
    if args.signer_debug && !state.debug {
        warn!("SINGER_DEBUG is set but this build lacks the signature-debug feature; ignoring");
    }
    if state.debug {
        warn!("Signature debug mode is ON; rejection bodies echo signing inputs");
    }

    VacanciesServer::new(state)
        .serve(args.bind, shutdown_signal())
        .await?;

    info!("Server shutdown gracefully");
    Ok(())
}

fn run_sign(args: &SignArgs) -> anyhow::Result<()> {
    let time = if args.now {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs().to_string())
            .unwrap_or_default()
    } else {
        args.time.clone()
    };

    let project_id = args.project_id.to_string();
    let salt = Some(args.secret_key.as_str()).filter(|salt| !salt.is_empty());
    let message = SigningFields::new(&project_id, &args.service)
        .with_path_id(&args.items_id)
        .with_timestamp(&time)
        .canonical_message(salt);

    // The salt is server-side; do not echo it.
    let display = match salt {
        Some(salt) => message
            .strip_suffix(salt)
            .map(|head| format!("{}<secret key>", head))
            .unwrap_or_else(|| message.clone()),
        None => message.clone(),
    };

    println!("message:   {}", display);
    if !time.is_empty() {
        println!("time:      {}", time);
    }
    println!("signature: {}", sign(args.api_token.as_str(), &message)?);
    Ok(())
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
