//! Repository for medication doses
//!
//! Doses are the only records the public (restricted) tier touches, so this is
//! the one repository behind a trait: the token flow is written against
//! [`DoseRepository`] and never sees the pool.

use crate::error::DbError;
use chrono::{DateTime, Utc};
use std::future::Future;

pub use petclaims_common::models::{Dose, DoseStatus};

/// Storage operations on `medication_doses`.
///
/// Methods marked *restricted* work on either capability tier; everything
/// else needs [`crate::Capability::Elevated`] and fails with
/// [`DbError::PermissionDenied`] otherwise.
pub trait DoseRepository {
    /// Insert a new dose.
    fn create(&self, dose: Dose) -> impl Future<Output = Result<Dose, DbError>> + Send;

    /// *Restricted.* The dose holding `token` while it is still `pending`.
    fn find_pending_by_token(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Option<Dose>, DbError>> + Send;

    /// *Restricted.* The dose holding `token`, whatever its status.
    fn find_by_token(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Option<Dose>, DbError>> + Send;

    fn find_by_id(&self, id: &str) -> impl Future<Output = Result<Option<Dose>, DbError>> + Send;

    /// Pending doses of one user, oldest scheduled first.
    fn list_pending_for_user(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Vec<Dose>, DbError>> + Send;

    /// *Restricted.* Move the dose holding `token` from `pending` to
    /// `confirmed` if its token is unexpired at `now`, in a single statement.
    ///
    /// Returns `true` when this call performed the transition. Two concurrent
    /// calls for the same token can never both return `true`.
    fn confirm_by_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<bool, DbError>> + Send;

    /// Mark every pending dose whose token expired at or before `now` as
    /// `expired`; returns how many changed.
    fn expire_stale(&self, now: DateTime<Utc>) -> impl Future<Output = Result<u64, DbError>> + Send;

    fn delete_for_user(&self, user_id: &str) -> impl Future<Output = Result<u64, DbError>> + Send;
}
