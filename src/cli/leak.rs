//! Leak check commands.

use crate::cli::args::{LeakCheckArgs, LeakCommand, ListArgs};
use crate::cli::print_output;
use crate::core::models::{LeakCheckRecord, NewLeakCheck};
use crate::error::Result;
use crate::render;
use crate::storage::{RecordStore, ResolvedConfig};

/// Execute leak subcommands.
///
/// # Errors
/// Returns an error if the arguments are invalid, the record database cannot
/// be opened, or the requested record does not exist.
pub fn execute(cmd: &LeakCommand, config: &ResolvedConfig) -> Result<()> {
    let output = match cmd {
        LeakCommand::Check(args) => {
            args.validate()?;
            let store = RecordStore::open(&config.database_path)?;
            let record = record_check(&store, args)?;
            render::render_leak_check(
                "leak check",
                &record,
                config.format,
                config.pretty,
                config.no_color,
            )?
        }
        LeakCommand::List(args) => {
            args.validate()?;
            let store = RecordStore::open(&config.database_path)?;
            let records = list_checks(&store, args)?;
            render::render_leak_checks(&records, config.format, config.pretty, config.no_color)?
        }
        LeakCommand::Show { id } => {
            let store = RecordStore::open(&config.database_path)?;
            let record = store.get_leak_check(*id)?;
            render::render_leak_check(
                "leak show",
                &record,
                config.format,
                config.pretty,
                config.no_color,
            )?
        }
    };

    print_output(&output);
    Ok(())
}

/// Classify validated readings and store the result.
///
/// # Errors
/// Returns an error if the INSERT fails.
pub fn record_check(store: &RecordStore, args: &LeakCheckArgs) -> Result<LeakCheckRecord> {
    let draft = NewLeakCheck::assess(args.to_input());
    let record = store.record_leak_check(draft)?;

    tracing::info!(
        id = record.id,
        delta = record.delta,
        leak_detected = record.leak_detected,
        confidence = %record.confidence,
        "Leak check recorded"
    );

    Ok(record)
}

/// Newest-first leak checks.
///
/// # Errors
/// Returns an error if the query fails.
pub fn list_checks(store: &RecordStore, args: &ListArgs) -> Result<Vec<LeakCheckRecord>> {
    store.list_leak_checks(args.limit)
}
