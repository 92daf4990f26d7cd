//! Count rows

use clap::Args;

use super::StoreArgs;

#[derive(Debug, Args)]
pub struct CountArgs {
    pub table: String,
}

pub fn execute(store_args: &StoreArgs, args: CountArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store = store_args.open()?;
    println!("{}", store.count_rows(&args.table)?);
    store.close()?;
    Ok(())
}
