//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `ledger_todo_core` linkage.
//! - Run one create transaction against an in-memory ledger.
//!
//! Usage: `ledger_todo_cli [LOG_DIR]`. Logs go to `LOG_DIR`, or to
//! `<temp>/ledger_todo` when no directory is given.

use ledger_todo_core::db::open_db_in_memory;
use ledger_todo_core::{
    core_version, default_log_level, init_logging, ping, Authority, CreateTodo, LedgerService,
    Session,
};
use std::error::Error;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("ledger_todo_core ping={}", ping());
    println!("ledger_todo_core version={}", core_version());

    let log_dir = log_dir(std::env::args_os().nth(1));
    if let Err(err) = init_logging(default_log_level(), &log_dir.to_string_lossy()) {
        eprintln!("ledger_todo_core logging failed: {err}");
        return ExitCode::FAILURE;
    }
    println!("ledger_todo_core log_dir={}", log_dir.display());

    match smoke_create() {
        Ok(document) => {
            println!("ledger_todo_core smoke_create={document}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("ledger_todo_core smoke_create failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn smoke_create() -> Result<String, Box<dyn Error>> {
    let mut conn = open_db_in_memory()?;
    let mut ledger = LedgerService::new(&mut conn);

    let identity = ledger.onboard_identity("cli", Authority::single("secp256k1", "cli-probe"))?;
    let session = Session::new(identity);
    let tx = session.create(&CreateTodo::new("smoke", "cli probe", "1970-01-01"));
    let receipt = ledger.submit(&session.sign(tx, "cli-probe"))?;

    Ok(receipt.state.to_document().to_string())
}

fn log_dir(arg: Option<OsString>) -> PathBuf {
    arg.map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("ledger_todo"))
}

#[cfg(test)]
mod tests {
    use super::{log_dir, smoke_create};
    use std::ffi::OsString;
    use std::path::PathBuf;

    #[test]
    fn log_dir_prefers_argument_over_temp_default() {
        assert_eq!(
            log_dir(Some(OsString::from("/var/log/todo"))),
            PathBuf::from("/var/log/todo")
        );
        assert!(log_dir(None).ends_with("ledger_todo"));
    }

    #[test]
    fn smoke_create_commits_a_todo() {
        let document = smoke_create().expect("smoke create should commit");
        assert!(document.contains("\"owner\""));
        assert!(document.contains("\"type\":\"todo.todo\""));
    }
}
