use petclaims_db::{check_schema, init_schema, Capability, TABLES};

use crate::context::AdminContext;
use crate::operation::{AdminOperation, AdminOutput, OperationFuture, OperationInput};

/// Probe every expected table and column and print DDL for whatever is
/// missing. Nothing is changed.
pub struct CheckSchema;

impl AdminOperation for CheckSchema {
    fn name(&self) -> &'static str {
        "check-schema"
    }

    fn description(&self) -> &'static str {
        "Report missing tables/columns and the SQL to add them"
    }

    fn requires(&self) -> Option<Capability> {
        Some(Capability::Restricted)
    }

    fn run<'a>(&'a self, ctx: &'a AdminContext, _input: &'a OperationInput) -> OperationFuture<'a> {
        Box::pin(async move {
            let report = check_schema(ctx.db()?).await?;
            if report.is_complete() {
                return AdminOutput::new(format!("Schema complete ({} tables)", TABLES.len()))
                    .with_data(&report);
            }

            let summary = format!(
                "{} missing table(s), {} missing column(s)",
                report.missing_tables.len(),
                report.missing_columns.len()
            );
            let ddl = report.manual_ddl();
            let data = serde_json::json!({
                "missingTables": &report.missing_tables,
                "missingColumns": &report.missing_columns,
                "ddl": &ddl,
            });

            let output = AdminOutput::new(summary)
                .lines(report.missing_tables.iter().map(|t| format!("missing table  {}", t)))
                .lines(report.missing_columns.iter().map(|c| format!("missing column {}", c)))
                .line("")
                .line("Run the following in the database SQL editor:")
                .lines(ddl);
            output.with_data(&data)
        })
    }
}

/// Create the tables on a local development database.
pub struct InitSchema;

impl AdminOperation for InitSchema {
    fn name(&self) -> &'static str {
        "init-schema"
    }

    fn description(&self) -> &'static str {
        "Create missing tables (development databases only)"
    }

    fn requires(&self) -> Option<Capability> {
        Some(Capability::Elevated)
    }

    fn run<'a>(&'a self, ctx: &'a AdminContext, _input: &'a OperationInput) -> OperationFuture<'a> {
        Box::pin(async move {
            let db = ctx.db()?;
            init_schema(db).await?;
            let report = check_schema(db).await?;
            let tables: Vec<&str> = TABLES.iter().map(|t| t.name).collect();
            AdminOutput::new(format!("Initialized {} tables", tables.len()))
                .lines(tables.iter().map(|t| format!("  {}", t)))
                .with_data(&report)
        })
    }
}
