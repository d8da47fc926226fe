//! CLI smoke entry point.
//!
//! # Responsibility
//! - Open the configured catalog database and print one owner's catalog,
//!   or the owner keys that have a stored catalog.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Usage: `menu_cli <owner_key>` or `menu_cli --list`

use log::error;
use menu_core::db::open_db;
use menu_core::{core_version, init_logging, CatalogStore, CoreConfig, SqliteCatalogGateway};
use std::process::ExitCode;

fn main() -> ExitCode {
    let Some(arg) = std::env::args().nth(1) else {
        eprintln!("usage: menu_cli <owner_key> | --list");
        return ExitCode::FAILURE;
    };
    let command = match arg.trim() {
        "--list" => Command::List,
        owner_key => Command::Show(owner_key.to_string()),
    };

    match run(&command) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(message) => {
            error!("event=cli_run module=cli status=error error={message}");
            eprintln!("menu_cli {}: {message}", core_version());
            ExitCode::FAILURE
        }
    }
}

enum Command {
    Show(String),
    List,
}

fn run(command: &Command) -> Result<String, String> {
    let config = CoreConfig::from_env().map_err(|err| err.to_string())?;
    if let Some(log_dir) = config.log_dir.as_deref() {
        let log_dir = log_dir
            .to_str()
            .ok_or_else(|| format!("log dir is not UTF-8: {}", log_dir.display()))?;
        init_logging(config.log_level.as_str(), log_dir).map_err(|err| err.to_string())?;
    }

    let conn = open_db(&config.db_path).map_err(|err| err.to_string())?;
    let gateway = SqliteCatalogGateway::try_new(conn).map_err(|err| err.to_string())?;
    let owner_key = match command {
        Command::Show(owner_key) => owner_key,
        Command::List => {
            let keys = gateway.document_keys().map_err(|err| err.to_string())?;
            return Ok(keys.join("\n"));
        }
    };
    let store = CatalogStore::new(owner_key.as_str(), gateway);

    match store.load().map_err(|err| err.to_string())? {
        Some(catalog) => serde_json::to_string_pretty(&catalog).map_err(|err| err.to_string()),
        None => Ok(format!("no catalog for {owner_key}")),
    }
}
