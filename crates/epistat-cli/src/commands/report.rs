use epistat_core::{LatestBy, ReportSet, ReportView};
use epistat_warehouse::QueryGuardrails;
use serde_json::{json, Value};

use crate::cli::{ReportArgs, ReportEngine};
use crate::error::CliError;

use super::{CommandResult, Context};

pub fn run(args: &ReportArgs, context: &Context<'_>) -> Result<CommandResult, CliError> {
    let guardrails = QueryGuardrails {
        max_rows: args.max_rows,
        query_timeout_ms: args.query_timeout_ms,
    };
    let warehouse = context.warehouse()?;

    let (rows, truncated) = match args.engine {
        ReportEngine::Warehouse => {
            let result = warehouse.report_view(args.view, guardrails)?;
            (result.records(), result.truncated)
        }
        ReportEngine::Memory => {
            if args.max_rows == 0 {
                return Err(CliError::Command(String::from(
                    "max_rows must be greater than zero",
                )));
            }
            let tables = warehouse.load_tables()?;
            let mut rows = match ReportSet::compute_view(&tables, args.view, LatestBy::Max)? {
                Value::Array(rows) => rows,
                other => vec![other],
            };
            let truncated = rows.len() > args.max_rows;
            rows.truncate(args.max_rows);
            (rows, truncated)
        }
    };

    let row_count = rows.len();
    let mut result = CommandResult::ok(report_payload(args.view, args.engine, rows, truncated));
    if truncated {
        result = result.with_warning(format!(
            "{} truncated at {row_count} rows (use --max-rows to increase limit)",
            args.view
        ));
    }
    Ok(result)
}

fn report_payload(view: ReportView, engine: ReportEngine, rows: Vec<Value>, truncated: bool) -> Value {
    let engine = match engine {
        ReportEngine::Warehouse => "warehouse",
        ReportEngine::Memory => "memory",
    };
    json!({
        "view": view.as_str(),
        "sql_view": view.sql_view(),
        "engine": engine,
        "row_count": rows.len(),
        "truncated": truncated,
        "rows": rows,
    })
}
