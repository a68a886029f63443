//! Operator accounts - Entry Point
//!
//! Provisions the account store: loads configuration, creates the store with
//! its bootstrap administrator if needed, and reports the accounts it holds.
//!
//! Usage: `operator-accounts [path/to/config.toml]`

use log::{error, info, warn};
use std::path::Path;

use operator_accounts::config::AccountsConfig;
use operator_accounts::error::AccountsError;
use operator_accounts::error::handlers::{handle_error, user_message};
use operator_accounts::utils::logging::setup_logging;
use operator_accounts::AuthService;

#[tokio::main]
async fn main() {
    setup_logging();

    if let Err(e) = run().await {
        handle_error(&e);
        error!("{}", user_message(&e));
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AccountsError> {
    let config = match std::env::args().nth(1) {
        Some(path) => AccountsConfig::load_from(Path::new(&path))?,
        None => AccountsConfig::load()?,
    };

    info!("Using account store {}", config.store.path.display());

    let service = AuthService::new(&config)?;
    service.initialize().await?;

    let accounts = service.list_accounts().await?;
    info!("{} account(s) registered", accounts.len());
    for account in &accounts {
        info!(
            "  {:<20} {:<30} {}",
            account.username,
            account.display_name,
            if account.is_admin { "admin" } else { "operator" }
        );
    }

    if service
        .authenticate(&config.bootstrap.username, &config.bootstrap.credential)
        .await?
        .login_successful
    {
        warn!(
            "'{}' still uses the default credential; change it before going live",
            config.bootstrap.username
        );
    }

    Ok(())
}
