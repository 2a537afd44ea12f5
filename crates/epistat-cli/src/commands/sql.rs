use epistat_warehouse::QueryGuardrails;

use crate::cli::SqlArgs;
use crate::error::CliError;

use super::{CommandResult, Context};

pub fn run(args: &SqlArgs, context: &Context<'_>) -> Result<CommandResult, CliError> {
    let query = args.query.trim();
    if query.is_empty() {
        return Err(CliError::Command(String::from("query must not be empty")));
    }

    let guardrails = QueryGuardrails {
        max_rows: args.max_rows,
        query_timeout_ms: args.query_timeout_ms,
    };
    let result = context
        .warehouse()?
        .execute_query(query, guardrails, args.write)?;

    let truncated = result.truncated;
    let row_count = result.row_count;
    let mut command_result = CommandResult::ok(serde_json::to_value(result)?);
    if truncated {
        command_result = command_result.with_warning(format!(
            "result truncated at {row_count} rows (use --max-rows to increase limit)"
        ));
    }

    Ok(command_result)
}
