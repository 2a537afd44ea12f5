use epistat_core::ReportView;
use serde::Serialize;

use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct ViewEntry {
    name: &'static str,
    sql_view: &'static str,
    description: &'static str,
}

pub fn run() -> Result<CommandResult, CliError> {
    let views: Vec<_> = ReportView::ALL
        .into_iter()
        .map(|view| ViewEntry {
            name: view.as_str(),
            sql_view: view.sql_view(),
            description: view.description(),
        })
        .collect();

    Ok(CommandResult::ok(serde_json::to_value(views)?))
}
