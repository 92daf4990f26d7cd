//! List tables

use clap::Args;

use super::StoreArgs;

#[derive(Debug, Args)]
pub struct TablesArgs {
    /// Print one JSON object per table
    #[arg(long)]
    pub json: bool,
}

pub fn execute(store_args: &StoreArgs, args: TablesArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store = store_args.open()?;

    for table in store.tables()? {
        if args.json {
            println!("{}", serde_json::to_string(&table)?);
            continue;
        }
        let columns: Vec<String> = table
            .columns
            .iter()
            .map(|c| format!("{} {}", c.name, c.declared_type))
            .collect();
        println!("{} ({})", table.name, columns.join(", "));
    }

    store.close()?;
    Ok(())
}
