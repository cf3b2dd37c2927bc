use petclaims_db::{Capability, SqlPetRepository};

use crate::context::AdminContext;
use crate::operation::{AdminOperation, AdminOutput, OperationFuture, OperationInput};

/// `NULL` versus `""` per optional pet column. Empty strings break the claim
/// form filler, which only treats `NULL` as "not provided".
pub struct FindNullFields;

impl AdminOperation for FindNullFields {
    fn name(&self) -> &'static str {
        "find-null-fields"
    }

    fn description(&self) -> &'static str {
        "Count NULL and empty-string values in optional pet columns"
    }

    fn requires(&self) -> Option<Capability> {
        Some(Capability::Elevated)
    }

    fn run<'a>(&'a self, ctx: &'a AdminContext, _input: &'a OperationInput) -> OperationFuture<'a> {
        Box::pin(async move {
            let counts = SqlPetRepository::new(ctx.db()?.clone()).field_counts().await?;
            let dirty = counts.iter().filter(|c| c.empty_count > 0).count();

            AdminOutput::new(format!(
                "{} of {} optional column(s) hold empty strings",
                dirty,
                counts.len()
            ))
            .line(format!("{:<26} {:>6} {:>6}", "column", "null", "empty"))
            .lines(counts.iter().map(|c| {
                format!("{:<26} {:>6} {:>6}", c.column, c.null_count, c.empty_count)
            }))
            .with_data(&counts)
        })
    }
}

pub struct RepairEmptyStrings;

impl AdminOperation for RepairEmptyStrings {
    fn name(&self) -> &'static str {
        "repair-empty-strings"
    }

    fn description(&self) -> &'static str {
        "Set empty-string optional pet columns to NULL"
    }

    fn requires(&self) -> Option<Capability> {
        Some(Capability::Elevated)
    }

    fn run<'a>(&'a self, ctx: &'a AdminContext, input: &'a OperationInput) -> OperationFuture<'a> {
        Box::pin(async move {
            let repairs = SqlPetRepository::new(ctx.db()?.clone())
                .repair_empty_strings(input.dry_run)
                .await?;
            let total: u64 = repairs.iter().map(|r| r.rows).sum();

            let summary = match (input.dry_run, total) {
                (_, 0) => "Nothing to repair".to_string(),
                (true, n) => format!("Dry run: would set {} value(s) to NULL", n),
                (false, n) => format!("Set {} value(s) to NULL", n),
            };

            AdminOutput::new(summary)
                .lines(repairs.iter().map(|r| format!("  {:<26} {}", r.column, r.rows)))
                .with_data(&serde_json::json!({
                    "dryRun": input.dry_run,
                    "total": total,
                    "columns": &repairs,
                }))
        })
    }
}
