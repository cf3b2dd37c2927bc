//! One-time dose confirmation links.
//!
//! A reminder carries a link with a single-use token and a short code. The
//! public side may look a token up and confirm it; the confirmation is one
//! conditional update, so a link works at most once.

pub mod doc;
pub mod error;
pub mod handlers;
pub mod logic;
pub mod reminder;
pub mod routes;

pub use error::DoseError;
pub use handlers::LINK_INVALID_MESSAGE;
pub use logic::{
    active_medications, active_on, confirm_dose, confirmation_link, create_dose,
    generate_short_code, issue_token, reminder_message, validate_token, ConfirmOutcome,
    DoseSettings, IssuedToken, PublicDose, TokenLookup, SHORT_CODE_ALPHABET,
};
pub use reminder::{send_dose_reminder, ReminderReport};
pub use routes::{routes, routes_with_repository};
