//! Dump rows as JSON lines

use clap::Args;
use minidb_core::ResultRow;
use serde_json::{Map, Value as JsonValue};

use super::StoreArgs;

#[derive(Debug, Args)]
pub struct DumpArgs {
    pub table: String,

    /// Stop after this many rows
    #[arg(long)]
    pub limit: Option<u64>,
}

pub fn execute(store_args: &StoreArgs, args: DumpArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store = store_args.open()?;

    for row in store.dump(&args.table, args.limit)? {
        println!("{}", serde_json::to_string(&row_to_json(&row)?)?);
    }

    store.close()?;
    Ok(())
}

/// Column names to values, in column order
fn row_to_json(row: &ResultRow) -> Result<JsonValue, serde_json::Error> {
    let mut object = Map::new();
    for (name, value) in row.values() {
        object.insert(name.clone(), serde_json::to_value(value)?);
    }
    Ok(JsonValue::Object(object))
}
