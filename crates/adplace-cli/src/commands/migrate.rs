//! Schema migration command

use adplace_store::migrations::applied_migrations;
use serde::Serialize;

use super::{print_json, CliResult, GlobalArgs};

#[derive(Serialize)]
struct MigrateReport {
    database: String,
    applied: Vec<String>,
}

/// Opening the store applies pending migrations; report what is recorded
pub fn execute(global: &GlobalArgs) -> CliResult {
    let store = global.open_store()?;
    let conn = store.pool().acquire(&global.op_context())?;

    print_json(&MigrateReport {
        database: store.pool().config().path.display().to_string(),
        applied: applied_migrations(&conn)?,
    })
}
