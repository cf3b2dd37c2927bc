use chrono::NaiveDate;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};

use crate::operation::OperationInput;
use crate::operations::find_operation;

#[derive(Parser, Debug)]
#[command(name = "petclaims-admin")]
#[command(about = "Diagnostics and data repair for the PetClaims back office")]
pub struct Cli {
    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Log at debug level (to stderr)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    CheckSchema,

    InitSchema,

    InspectUser {
        #[arg(long)]
        email: String,
    },

    FindNullFields,

    RepairEmptyStrings {
        #[arg(long)]
        dry_run: bool,
    },

    CreateTestDose {
        #[arg(long)]
        medication_id: String,
        /// Schedule the dose this many minutes from now
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        in_minutes: i64,
    },

    CheckToken {
        #[arg(long)]
        token: String,
    },

    ConfirmToken {
        #[arg(long)]
        token: String,
    },

    ExpireStaleDoses,

    ActiveMedications {
        #[arg(long)]
        email: String,
        /// YYYY-MM-DD
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    SendTestSms {
        #[arg(long)]
        phone: String,
        #[arg(long)]
        message: String,
    },

    SendDoseReminder {
        #[arg(long)]
        dose_id: String,
    },

    DeleteTestData {
        #[arg(long)]
        email: String,
    },
}

/// The clap command with each subcommand's help taken from its
/// [`AdminOperation::description`](crate::AdminOperation::description).
pub fn command() -> clap::Command {
    let mut command = Cli::command();
    let names: Vec<String> = command
        .get_subcommands()
        .map(|sub| sub.get_name().to_string())
        .collect();
    for name in names {
        if let Some(operation) = find_operation(&name) {
            let about = operation.description();
            command = command.mut_subcommand(name, |sub| sub.about(about));
        }
    }
    command
}

/// Parse the process arguments, exiting with clap's usage message on error.
pub fn parse() -> Cli {
    let matches = command().get_matches();
    Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
}

impl Command {
    /// The registered operation name and its input.
    pub fn into_invocation(self) -> (&'static str, OperationInput) {
        let mut input = OperationInput::default();
        let name = match self {
            Command::CheckSchema => "check-schema",
            Command::InitSchema => "init-schema",
            Command::InspectUser { email } => {
                input.email = Some(email);
                "inspect-user"
            }
            Command::FindNullFields => "find-null-fields",
            Command::RepairEmptyStrings { dry_run } => {
                input.dry_run = dry_run;
                "repair-empty-strings"
            }
            Command::CreateTestDose {
                medication_id,
                in_minutes,
            } => {
                input.medication_id = Some(medication_id);
                input.in_minutes = Some(in_minutes);
                "create-test-dose"
            }
            Command::CheckToken { token } => {
                input.token = Some(token);
                "check-token"
            }
            Command::ConfirmToken { token } => {
                input.token = Some(token);
                "confirm-token"
            }
            Command::ExpireStaleDoses => "expire-stale-doses",
            Command::ActiveMedications { email, date } => {
                input.email = Some(email);
                input.date = date;
                "active-medications"
            }
            Command::SendTestSms { phone, message } => {
                input.phone = Some(phone);
                input.message = Some(message);
                "send-test-sms"
            }
            Command::SendDoseReminder { dose_id } => {
                input.dose_id = Some(dose_id);
                "send-dose-reminder"
            }
            Command::DeleteTestData { email } => {
                input.email = Some(email);
                "delete-test-data"
            }
        };
        (name, input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_every_subcommand_maps_to_a_registered_operation() {
        for sub in Cli::command().get_subcommands() {
            assert!(
                find_operation(sub.get_name()).is_some(),
                "no operation named {}",
                sub.get_name()
            );
        }
    }

    #[test]
    fn test_subcommand_help_comes_from_operation() {
        let command = command();
        for sub in command.get_subcommands() {
            let operation = find_operation(sub.get_name()).unwrap();
            assert!(!operation.description().is_empty(), "{}", sub.get_name());
            assert_eq!(
                sub.get_about().map(|about| about.to_string()),
                Some(operation.description().to_string())
            );
        }
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "petclaims-admin",
            "active-medications",
            "--email",
            "owner@example.com",
            "--date",
            "2025-03-14",
            "--json",
        ])
        .unwrap();
        assert!(cli.json);
        let (name, input) = cli.command.into_invocation();
        assert_eq!(name, "active-medications");
        assert_eq!(input.email.as_deref(), Some("owner@example.com"));
        assert_eq!(input.date, NaiveDate::from_ymd_opt(2025, 3, 14));

        let cli = Cli::try_parse_from(["petclaims-admin", "repair-empty-strings", "--dry-run"])
            .unwrap();
        assert!(!cli.json);
        assert_eq!(
            cli.command.into_invocation().1,
            OperationInput {
                dry_run: true,
                ..OperationInput::default()
            }
        );

        assert!(Cli::try_parse_from(["petclaims-admin", "check-token"]).is_err());
    }
}
