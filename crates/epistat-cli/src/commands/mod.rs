mod normalize;
mod report;
mod schema;
mod sql;
mod views;

use std::time::Instant;

use epistat_warehouse::{Warehouse, WarehouseConfig};
use serde_json::Value;
use tracing::debug;

use crate::cli::{Cli, Command};
use crate::error::CliError;
use crate::metadata::{Envelope, EnvelopeMeta, RequestId};

pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            warnings: Vec::new(),
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

/// Shared per-invocation state handed to each command.
pub struct Context<'a> {
    pub request_id: RequestId,
    cli: &'a Cli,
}

impl Context<'_> {
    /// Open the warehouse named by `--db`, or the default under `EPISTAT_HOME`.
    pub fn warehouse(&self) -> Result<Warehouse, CliError> {
        let mut config = WarehouseConfig::default();
        if let Some(path) = &self.cli.db {
            config.db_path = path.clone();
        }
        debug!(path = %config.db_path.display(), "opening warehouse");
        Ok(Warehouse::open(config)?)
    }
}

pub fn run(cli: &Cli) -> Result<Envelope<Value>, CliError> {
    let started = Instant::now();
    let context = Context {
        request_id: RequestId::new_v4(),
        cli,
    };

    let CommandResult { data, warnings } = match &cli.command {
        Command::Normalize(args) => normalize::run(args, &context)?,
        Command::Report(args) => report::run(args, &context)?,
        Command::Views => views::run()?,
        Command::Sql(args) => sql::run(args, &context)?,
        Command::Schema => schema::run(&context)?,
    };

    let latency_ms = started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64;
    let mut meta = EnvelopeMeta::new(context.request_id, latency_ms);
    for warning in warnings {
        meta.push_warning(warning);
    }

    Ok(Envelope { meta, data })
}
