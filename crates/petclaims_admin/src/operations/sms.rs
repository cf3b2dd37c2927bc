use anyhow::bail;
use petclaims_db::Capability;
use petclaims_doses::send_dose_reminder;

use crate::context::AdminContext;
use crate::operation::{AdminOperation, AdminOutput, OperationFuture, OperationInput};

/// Push one message through the configured dispatcher and print the result.
pub struct SendTestSms;

impl AdminOperation for SendTestSms {
    fn name(&self) -> &'static str {
        "send-test-sms"
    }

    fn description(&self) -> &'static str {
        "Send one SMS through the configured provider"
    }

    fn requires(&self) -> Option<Capability> {
        None
    }

    fn run<'a>(&'a self, ctx: &'a AdminContext, input: &'a OperationInput) -> OperationFuture<'a> {
        Box::pin(async move {
            let phone = input.phone.as_deref().unwrap_or_default();
            let message = input.message.as_deref().unwrap_or_default();
            let result = ctx.sms()?.send_sms(phone, message).await;

            if !result.success {
                bail!(
                    "SMS to '{}' failed: {}",
                    result.phone_number,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }

            AdminOutput::new(format!("SMS sent to {}", result.phone_number))
                .line(format!(
                    "message id  {}",
                    result.message_id.as_deref().unwrap_or("-")
                ))
                .with_data(&result)
        })
    }
}

/// Compose and send the reminder for one dose, logging the attempt.
pub struct SendDoseReminder;

impl AdminOperation for SendDoseReminder {
    fn name(&self) -> &'static str {
        "send-dose-reminder"
    }

    fn description(&self) -> &'static str {
        "Send the reminder text for a dose if the owner opted in"
    }

    fn requires(&self) -> Option<Capability> {
        Some(Capability::Elevated)
    }

    fn run<'a>(&'a self, ctx: &'a AdminContext, input: &'a OperationInput) -> OperationFuture<'a> {
        Box::pin(async move {
            let report = send_dose_reminder(
                ctx.db()?,
                ctx.configured_sms(),
                ctx.settings(),
                input.dose_id()?,
                ctx.now(),
            )
            .await?;

            let summary = match (&report.skipped, &report.result) {
                (Some(reason), _) => format!("Reminder not sent: {}", reason),
                (None, Some(result)) if result.success => {
                    format!("Reminder sent to {}", result.phone_number)
                }
                (None, Some(result)) => format!(
                    "Reminder failed: {}",
                    result.error.as_deref().unwrap_or("unknown error")
                ),
                (None, None) => "Reminder not sent".to_string(),
            };

            if report.result.as_ref().is_some_and(|r| !r.success) {
                bail!(summary);
            }

            AdminOutput::new(summary)
                .line(format!("message  {}", report.message))
                .with_data(&report)
        })
    }
}
