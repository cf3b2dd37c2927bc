//! The one interface every admin command implements.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use petclaims_common::services::BoxFuture;
use petclaims_db::Capability;
use serde::Serialize;
use tracing::info;

use crate::context::AdminContext;

pub type OperationFuture<'a> = BoxFuture<'a, AdminOutput, anyhow::Error>;

/// A named diagnostic or repair step: connect, query or mutate, report.
pub trait AdminOperation: Send + Sync {
    /// Command name, as typed on the command line.
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str {
        ""
    }

    /// Database tier the operation runs with; `None` means no database.
    fn requires(&self) -> Option<Capability>;

    fn run<'a>(&'a self, ctx: &'a AdminContext, input: &'a OperationInput) -> OperationFuture<'a>;
}

/// Flags shared by all operations. Each operation reads the ones it needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OperationInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medication_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dose_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_minutes: Option<i64>,
    pub dry_run: bool,
}

fn required<'a>(value: &'a Option<String>, flag: &str) -> Result<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => bail!("--{} is required", flag),
    }
}

impl OperationInput {
    pub fn email(&self) -> Result<&str> {
        required(&self.email, "email")
    }

    pub fn token(&self) -> Result<&str> {
        required(&self.token, "token")
    }

    pub fn medication_id(&self) -> Result<&str> {
        required(&self.medication_id, "medication-id")
    }

    pub fn dose_id(&self) -> Result<&str> {
        required(&self.dose_id, "dose-id")
    }
}

/// What an operation hands back: a one-line summary, optional detail lines
/// for humans and structured data for `--json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminOutput {
    pub summary: String,
    #[serde(skip)]
    pub details: Vec<String>,
    pub data: serde_json::Value,
}

impl AdminOutput {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            details: Vec::new(),
            data: serde_json::Value::Null,
        }
    }

    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.details.push(line.into());
        self
    }

    pub fn lines<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.details.extend(lines.into_iter().map(Into::into));
        self
    }

    pub fn with_data<T: Serialize>(mut self, data: &T) -> Result<Self> {
        self.data = serde_json::to_value(data).context("Failed to encode operation output")?;
        Ok(self)
    }
}

/// Open the database at the tier the operation asks for, then run it.
pub async fn execute(
    operation: &dyn AdminOperation,
    ctx: &AdminContext,
    input: &OperationInput,
) -> Result<AdminOutput> {
    let scoped = ctx.connect(operation.requires()).await?;
    info!(operation = operation.name(), "Running admin operation");
    operation.run(&scoped, input).await
}
