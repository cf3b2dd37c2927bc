use anyhow::{anyhow, Context, Result};
use petclaims_admin::output::{render_json, render_text};
use petclaims_admin::{cli, execute, find_operation, AdminContext, AdminOutput};
use std::process::ExitCode;
use tracing::Level;

async fn run(name: &str, input: &petclaims_admin::OperationInput) -> Result<AdminOutput> {
    let operation = find_operation(name).ok_or_else(|| anyhow!("Unknown operation '{}'", name))?;
    let config = petclaims_config::load_config().context("Failed to load configuration")?;
    let ctx = AdminContext::from_config(config)?;
    execute(operation.as_ref(), &ctx, input).await
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::parse();
    petclaims_common::logging::init_stderr(if cli.verbose { Level::DEBUG } else { Level::WARN });

    let json = cli.json;
    let (name, input) = cli.command.into_invocation();
    let result = run(name, &input).await;

    if json {
        println!("{}", render_json(name, &result));
    } else {
        match &result {
            Ok(output) => println!("{}", render_text(output)),
            Err(e) => eprintln!("Error: {:#}", e),
        }
    }

    if result.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
