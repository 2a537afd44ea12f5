use crate::error::CliError;

use super::{CommandResult, Context};

pub fn run(context: &Context<'_>) -> Result<CommandResult, CliError> {
    let tables = context.warehouse()?.schema()?;
    Ok(CommandResult::ok(serde_json::to_value(tables)?))
}
