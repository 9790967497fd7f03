use std::collections::BTreeSet;
use std::path::PathBuf;

use clap::Args;
use rfv_core::config::{AppConfig, LoadOptions};
use rfv_core::{load_transactions_file, ApplicationError};

use crate::commands::CommandResult;

#[derive(Debug, Clone, Args)]
pub struct ValidateArgs {
    #[arg(long, help = "Purchase table to check")]
    pub input: PathBuf,
}

pub fn run(args: &ValidateArgs, options: LoadOptions) -> CommandResult {
    let result = (|| -> Result<(usize, usize), ApplicationError> {
        let config = AppConfig::load(options)?;
        let transactions = load_transactions_file(&args.input, &config.input.reader_options())?;
        let customers: BTreeSet<_> = transactions.iter().map(|t| &t.customer_id).collect();
        Ok((transactions.len(), customers.len()))
    })();

    match result {
        Ok((0, _)) => CommandResult::success(
            "validate",
            format!("`{}` has the required columns but no transactions", args.input.display()),
        ),
        Ok((rows, customers)) => CommandResult::success(
            "validate",
            format!(
                "`{}` passed validation: {rows} transactions from {customers} customers",
                args.input.display()
            ),
        ),
        Err(error) => CommandResult::from_error("validate", &error),
    }
}
