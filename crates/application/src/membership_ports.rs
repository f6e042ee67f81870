//! Ports shared by the membership application services.
//!
//! Repositories are implemented by the infrastructure crate against
//! PostgreSQL. The write operations that span tables (`submit`, `decide`,
//! `withdraw`) are specified as single atomic units: an adapter must commit
//! all of the listed side effects together or none of them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use gatehouse_core::AppResult;
use gatehouse_domain::{
    ApplicationId, ApplicationKind, ApplicationStatus, MembershipStage, ReviewDecision, Ticket,
    UserApplicationStatus, UserId,
};

// ---------------------------------------------------------------------------
// User profiles
// ---------------------------------------------------------------------------

/// User record with the denormalized per-kind status mirrors.
#[derive(Debug, Clone)]
pub struct MembershipProfile {
    /// Unique user identifier.
    pub id: UserId,
    /// Contact email, if the identity provider returned one.
    pub email: Option<String>,
    /// Display name shown on admin surfaces.
    pub display_name: String,
    /// Current tier in the admission pipeline.
    pub membership_stage: MembershipStage,
    /// Mirror flag, true iff `membership_stage` is `member`.
    pub is_member: bool,
    /// Mirror of the latest initial application's status.
    pub application_status: UserApplicationStatus,
    /// When the latest initial application was submitted.
    pub application_applied_at: Option<DateTime<Utc>>,
    /// When the latest initial application was decided.
    pub application_reviewed_at: Option<DateTime<Utc>>,
    /// Mirror of the latest full-membership application's status.
    pub full_membership_status: UserApplicationStatus,
    /// Ticket attached to the latest full-membership application.
    pub full_membership_ticket: Option<String>,
    /// When the latest full-membership application was submitted.
    pub full_membership_applied_at: Option<DateTime<Utc>>,
    /// When the latest full-membership application was decided.
    pub full_membership_reviewed_at: Option<DateTime<Utc>>,
}

/// Repository port for user profile persistence.
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// Finds a profile by user identifier.
    async fn find_profile(&self, user_id: UserId) -> AppResult<Option<MembershipProfile>>;

    /// Returns the existing profile for a subject or creates an applicant
    /// profile with empty mirrors. Used by the session bootstrap surface.
    async fn ensure_profile(
        &self,
        user_id: UserId,
        display_name: &str,
        email: Option<&str>,
    ) -> AppResult<MembershipProfile>;

    /// Lists user ids that hold at least one application of either kind,
    /// newest activity first. Feeds the consistency scan.
    async fn list_user_ids_with_applications(&self, limit: usize) -> AppResult<Vec<UserId>>;
}

// ---------------------------------------------------------------------------
// Applications
// ---------------------------------------------------------------------------

/// Stored application row of either kind.
#[derive(Debug, Clone)]
pub struct ApplicationRecord {
    /// Unique application identifier.
    pub id: ApplicationId,
    /// Owning user.
    pub user_id: UserId,
    /// Which pipeline this application belongs to.
    pub kind: ApplicationKind,
    /// Human-readable ticket (full-membership kind only).
    pub ticket: Option<String>,
    /// Free-form answers payload.
    pub answers: Value,
    /// Lifecycle status.
    pub status: ApplicationStatus,
    /// Submission time.
    pub submitted_at: DateTime<Utc>,
    /// Decision time, once reviewed.
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Reviewer, once reviewed.
    pub reviewer_id: Option<UserId>,
    /// Notes attached by the reviewer.
    pub admin_notes: Option<String>,
}

/// Input for a new application submission.
#[derive(Debug, Clone)]
pub struct NewApplicationSubmission {
    /// Applying user.
    pub user_id: UserId,
    /// Which pipeline the application enters.
    pub kind: ApplicationKind,
    /// Ticket to attach (full-membership kind).
    pub ticket: Option<Ticket>,
    /// Free-form answers payload.
    pub answers: Value,
}

/// Result of a successfully applied decision.
#[derive(Debug, Clone, Copy)]
pub struct DecisionOutcome {
    /// The decided application.
    pub application_id: ApplicationId,
    /// The applicant whose status changed.
    pub user_id: UserId,
    /// The decision that was applied.
    pub decision: ReviewDecision,
}

/// Filter for the admin review queue listing.
#[derive(Debug, Clone)]
pub struct ApplicationListFilter {
    /// Which pipeline to list.
    pub kind: ApplicationKind,
    /// Restrict to one lifecycle status, or list all.
    pub status: Option<ApplicationStatus>,
    /// Page size. Adapters clamp to a sane window.
    pub limit: usize,
    /// Page offset. Adapters cap to a sane window.
    pub offset: usize,
}

/// One page of the admin review queue.
#[derive(Debug, Clone)]
pub struct ApplicationPage {
    /// Applications on this page, newest first.
    pub applications: Vec<ApplicationRecord>,
    /// Total rows matching the filter across all pages.
    pub total: u64,
}

/// Repository port for application persistence.
///
/// Write methods are atomic units. `submit` inserts the row, updates the
/// owning user's mirror fields, and appends an audit entry in one
/// transaction. `decide` applies the conditional status transition together
/// with the user promotion, the access-grant upsert (full kind, approval
/// only), and the audit entry. `withdraw` deletes the pending row, resets
/// the mirror, and appends an audit entry.
#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    /// Inserts a new pending application.
    ///
    /// A concurrent duplicate that slips past the service pre-check is
    /// rejected by the storage uniqueness constraint and surfaces as
    /// `DuplicatePending`.
    async fn submit(&self, submission: NewApplicationSubmission) -> AppResult<ApplicationRecord>;

    /// Finds an application by identifier within one kind.
    async fn find_by_id(
        &self,
        kind: ApplicationKind,
        application_id: ApplicationId,
    ) -> AppResult<Option<ApplicationRecord>>;

    /// Returns the most recently submitted application for a user and kind.
    async fn find_latest_for_user(
        &self,
        kind: ApplicationKind,
        user_id: UserId,
    ) -> AppResult<Option<ApplicationRecord>>;

    /// Returns the full application history for a user and kind, newest
    /// first. Decided rows are immutable.
    async fn list_for_user(
        &self,
        kind: ApplicationKind,
        user_id: UserId,
    ) -> AppResult<Vec<ApplicationRecord>>;

    /// Applies a decision to a pending application.
    ///
    /// The status transition is a conditional update (`WHERE status =
    /// 'pending'`); when another reviewer committed first the update matches
    /// zero rows and the call fails with `AlreadyReviewed`. Any other
    /// in-transaction failure rolls back fully and surfaces as
    /// `TransactionFailed`, leaving the row pending.
    async fn decide(
        &self,
        kind: ApplicationKind,
        application_id: ApplicationId,
        reviewer_id: UserId,
        decision: ReviewDecision,
        admin_notes: Option<&str>,
    ) -> AppResult<DecisionOutcome>;

    /// Replaces the answers payload of the user's pending application.
    ///
    /// Fails with `NotFound` when the user has no application of this kind
    /// and `AlreadyReviewed` when the latest one is already decided.
    async fn amend_answers(
        &self,
        kind: ApplicationKind,
        user_id: UserId,
        answers: Value,
    ) -> AppResult<ApplicationRecord>;

    /// Withdraws the user's pending application, resetting the mirror to
    /// `not_applied`. Fails with `NotFound` when nothing is pending.
    async fn withdraw(&self, kind: ApplicationKind, user_id: UserId) -> AppResult<ApplicationId>;

    /// Lists applications for the admin review queue.
    async fn list(&self, filter: ApplicationListFilter) -> AppResult<ApplicationPage>;
}

// ---------------------------------------------------------------------------
// Access grants
// ---------------------------------------------------------------------------

/// Derived engagement record for an approved full member.
///
/// Not authoritative for membership status; the application table is.
#[derive(Debug, Clone)]
pub struct AccessGrant {
    /// Grant owner.
    pub user_id: UserId,
    /// First time the member used full-membership privileges.
    pub first_accessed_at: Option<DateTime<Utc>>,
    /// Number of recorded accesses.
    pub access_count: i64,
    /// When the grant was created (first approval).
    pub created_at: DateTime<Utc>,
}

/// Repository port for access-grant persistence.
///
/// Grant creation happens inside the decision transaction; this port only
/// covers reads and the engagement counter.
#[async_trait]
pub trait AccessGrantRepository: Send + Sync {
    /// Finds the grant for a user, if one exists.
    async fn find_for_user(&self, user_id: UserId) -> AppResult<Option<AccessGrant>>;

    /// Records one access: stamps `first_accessed_at` on the first call and
    /// increments the counter. Returns `None` when the user holds no grant.
    async fn record_access(&self, user_id: UserId) -> AppResult<Option<AccessGrant>>;
}

// ---------------------------------------------------------------------------
// Audit log
// ---------------------------------------------------------------------------

/// Audit log entry returned by queries.
#[derive(Debug, Clone)]
pub struct AuditLogEntry {
    /// Unique entry identifier.
    pub entry_id: String,
    /// Acting user subject.
    pub actor: String,
    /// Dotted action name, e.g. `membership.application.approved`.
    pub action: String,
    /// Resource category the action touched.
    pub resource_type: String,
    /// Identifier of the touched resource.
    pub resource_id: String,
    /// Structured action detail.
    pub detail: Option<Value>,
    /// UTC timestamp in RFC 3339 form.
    pub created_at: String,
}

/// Input for appending an audit log entry.
#[derive(Debug, Clone)]
pub struct NewAuditLogEntry {
    /// Acting user subject.
    pub actor: String,
    /// Dotted action name.
    pub action: String,
    /// Resource category the action touched.
    pub resource_type: String,
    /// Identifier of the touched resource.
    pub resource_id: String,
    /// Structured action detail.
    pub detail: Option<Value>,
}

/// Filter for audit log listings.
#[derive(Debug, Clone, Default)]
pub struct AuditLogQuery {
    /// Page size.
    pub limit: usize,
    /// Page offset.
    pub offset: usize,
    /// Restrict to one action name.
    pub action: Option<String>,
    /// Restrict to one actor subject.
    pub actor: Option<String>,
}

/// Repository port for the append-only audit log.
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Appends one entry. Entries are never mutated or deleted.
    async fn append(&self, entry: NewAuditLogEntry) -> AppResult<()>;

    /// Lists recent entries, newest first.
    async fn list_recent(&self, query: AuditLogQuery) -> AppResult<Vec<AuditLogEntry>>;
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// Port for outbound notifications. Dispatch is fire-and-forget: callers
/// log failures and never let delivery roll back a committed transition.
#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Sends a plain-text notification.
    async fn send(&self, to: &str, subject: &str, text_body: &str) -> AppResult<()>;
}
