use std::process::ExitCode;

use clap::{Parser, Subcommand};

use tamtam_auth::InstalledAppAuthenticator;
use tamtam_calendar::{upcoming_listing, CalendarSession, SessionSettings};
use tamtam_core::{AppError, Config};

#[derive(Parser)]
#[command(name = "tamtam", about = "TamTam reservation calendar", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Refresh and print upcoming events (default).
    List,
    /// Forget the cached Google token.
    SignOut,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli.command.unwrap_or(Command::List)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> Result<(), AppError> {
    tamtam_core::init()?;

    let (config, _) = Config::load_validated()?;
    tracing::info!(config_dir = %config.config_dir.display(), "Configuration loaded");

    let authenticator = InstalledAppAuthenticator::from_config(&config.auth)?;

    match command {
        Command::List => {
            let settings = SessionSettings::from_config(&config.calendar)?;
            let mut session = CalendarSession::initialize(settings, &authenticator).await?;
            let events = session.refresh_and_get().await?;
            print!("{}", upcoming_listing(events));
        }
        Command::SignOut => {
            authenticator.sign_out()?;
            tracing::info!(
                "Removed cached token at {}",
                authenticator.store().path().display()
            );
        }
    }

    Ok(())
}
