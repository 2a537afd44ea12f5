use epistat_warehouse::RawSourceTables;

use crate::cli::NormalizeArgs;
use crate::error::CliError;

use super::{CommandResult, Context};

pub fn run(args: &NormalizeArgs, context: &Context<'_>) -> Result<CommandResult, CliError> {
    let sources = RawSourceTables {
        facts: args
            .facts_table
            .clone()
            .unwrap_or_else(|| args.deaths_table.clone()),
        deaths: args.deaths_table.clone(),
        vaccinations: args.vaccinations_table.clone(),
    };

    let warehouse = context.warehouse()?;
    let report = warehouse.normalize(&sources, &context.request_id.to_string())?;

    let empty: Vec<_> = report
        .tables
        .iter()
        .filter(|table| table.row_count == 0)
        .map(|table| format!("{} was rebuilt from {} with 0 rows", table.table, table.source_table))
        .collect();

    let mut result = CommandResult::ok(serde_json::to_value(&report)?);
    for warning in empty {
        result = result.with_warning(warning);
    }
    Ok(result)
}
