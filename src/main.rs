mod address;
mod api;
mod commands;
mod config;
mod credentials;
mod logging;
mod prompt;
mod render;

use std::io::Write;
use std::process::ExitCode;

use clap::Parser;

use self::api::{Credentials, DdiClient};
use self::commands::{Context, Status};
use self::config::{Args, Command, PasswordCommand, Settings};
use self::logging::Logger;

#[tokio::main]
async fn main() -> eyre::Result<ExitCode> {
    #[cfg(feature = "dotenv")]
    let dotenv = dotenvy::dotenv();

    let mut args = Args::parse();
    args.command.split_items()?;
    Logger::new(Settings::log_level(&args)).init()?;

    #[cfg(feature = "dotenv")]
    report_dotenv(dotenv);

    let settings = Settings::from_args(&args).await?;

    let status = match args.command {
        Command::Password(PasswordCommand::Set) => set_password(settings)?,
        command => {
            let ctx = connect(settings)?;
            let mut stdout = anstream::stdout().lock();
            let status = commands::run(&ctx, command, &mut stdout).await?;
            stdout.flush()?;
            status
        },
    };

    Ok(match status {
        Status::Success => ExitCode::SUCCESS,
        Status::Failed => ExitCode::FAILURE,
    })
}

/// Fills in anything still missing from the settings (prompting if need be) and opens a session.
fn connect(settings: Settings) -> eyre::Result<Context> {
    let server = prompt::text_or(settings.server, "Server")?;
    let username = prompt::text_or(settings.username, "Username")?;
    let password = credentials::resolve_password(settings.password, &username)?;

    let client = DdiClient::new(
        &server,
        &Credentials { username, password },
        settings.verify_tls,
        settings.timeout,
    )?;
    log::debug!("Using DDI server at {}", client.base_url());

    Ok(Context {
        client,
        json: settings.json,
        site_name: settings.site_name,
    })
}

#[cfg(feature = "dotenv")]
fn report_dotenv(result: dotenvy::Result<std::path::PathBuf>) {
    match result {
        Ok(path) => log::debug!("Loaded environment from {}", path.to_string_lossy()),
        Err(e) if e.not_found() => {},
        Err(e) => log::warn!("Failed to load .env file: {e}"),
    }
}

fn set_password(settings: Settings) -> eyre::Result<Status> {
    let username = prompt::text_or(settings.username, "Username")?;
    let password = prompt::new_password(&format!("ddi password for {username}"))?;
    credentials::store_password(&username, &password)?;
    println!("Password set for user: {username}");
    Ok(Status::Success)
}
