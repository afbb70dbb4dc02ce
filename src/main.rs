use anyhow::Result;
use dotenv::dotenv;
use log::{info, warn};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use campuswallet::ledger::StaticSession;
use campuswallet::utils::Logger;
use campuswallet::{DatabaseOperations, Settings, ShellHandler};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    Logger::log_operation_start("CampusWallet", "Initializing application");

    let settings = match Settings::new() {
        Ok(s) => {
            Logger::log_operation_success("Configuration", "Settings loaded successfully");
            s
        }
        Err(e) => {
            Logger::log_operation_failure("Configuration", &e.to_string());
            return Err(e);
        }
    };

    if let Err(e) = settings.validate() {
        Logger::log_operation_failure("Configuration validation", &e.to_string());
        return Err(e);
    }

    let db = match DatabaseOperations::new(&settings.database_url).await {
        Ok(db) => {
            Logger::log_operation_success("Database", "Database initialized successfully");
            db
        }
        Err(e) => {
            Logger::log_operation_failure("Database", &e.to_string());
            return Err(e.into());
        }
    };

    let session = Arc::new(StaticSession::new());
    if let Some(username) = &settings.session_user {
        match db.find_profile_by_username(username).await {
            Ok(profile) => session.sign_in(profile.id).await,
            Err(e) => warn!("Could not sign in {username}: {e}"),
        }
    }

    let shell = ShellHandler::new(db, session, &settings);

    info!("💳 CampusWallet ready");
    info!("  - Database: {}", settings.database_url);
    info!("  - Store timeout: {}s", settings.store_timeout);
    info!("  - Max retry attempts: {}", settings.max_retry_attempts);

    println!("Campus Wallet. Type /help for commands, /quit to leave.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match shell.handle_line(&line).await {
            Some(reply) if reply.is_empty() => {}
            Some(reply) => println!("{reply}"),
            None => break,
        }
    }

    Logger::log_operation_success("CampusWallet", "Shell closed");
    Ok(())
}
