//! Admin review service.
//!
//! Applies decisions to pending applications. Each decision is one
//! repository transaction guarded by a conditional status update, so two
//! concurrent reviewers can never both transition the same application:
//! the second one fails with `AlreadyReviewed`. The bulk coordinator fans
//! out to the same path per item and aggregates partial failure instead of
//! aborting the batch.

use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};

use gatehouse_core::{AppError, AppResult, UserIdentity};
use gatehouse_domain::{ApplicationId, ApplicationKind, ReviewDecision, UserId};

use crate::membership_ports::{
    ApplicationListFilter, ApplicationPage, ApplicationRepository, AuditLogRepository,
    DecisionOutcome, MembershipRepository, NewAuditLogEntry, NotificationService,
};


/// One failed item of a bulk review.
#[derive(Debug, Clone)]
pub struct BulkReviewFailure {
    /// The application that could not be decided.
    pub application_id: ApplicationId,
    /// Stable error tag, e.g. `AlreadyReviewed`.
    pub error_type: &'static str,
    /// Human-readable failure reason.
    pub message: String,
}

/// Aggregated result of a bulk review. Items are independent; callers may
/// retry exactly the failed subset.
#[derive(Debug, Clone, Default)]
pub struct BulkReviewOutcome {
    /// Applications that transitioned successfully.
    pub succeeded: Vec<ApplicationId>,
    /// Applications that failed, with reasons.
    pub failed: Vec<BulkReviewFailure>,
}

/// Application service for admin decisions on membership applications.
#[derive(Clone)]
pub struct ReviewService {
    applications: Arc<dyn ApplicationRepository>,
    profiles: Arc<dyn MembershipRepository>,
    audit_log: Arc<dyn AuditLogRepository>,
    notifications: Arc<dyn NotificationService>,
}

impl ReviewService {
    /// Creates a new review service.
    #[must_use]
    pub fn new(
        applications: Arc<dyn ApplicationRepository>,
        profiles: Arc<dyn MembershipRepository>,
        audit_log: Arc<dyn AuditLogRepository>,
        notifications: Arc<dyn NotificationService>,
    ) -> Self {
        Self {
            applications,
            profiles,
            audit_log,
            notifications,
        }
    }

    /// Applies a decision to one pending application.
    ///
    /// The decision string must be `approved` or `declined`. Re-reviewing
    /// an already-decided application fails with `AlreadyReviewed`; this is
    /// the idempotency guard against double-clicks and bulk races.
    pub async fn review(
        &self,
        reviewer: &UserIdentity,
        kind: ApplicationKind,
        application_id: ApplicationId,
        decision: &str,
        admin_notes: Option<&str>,
    ) -> AppResult<DecisionOutcome> {
        let decision = ReviewDecision::parse(decision)?;
        self.apply_decision(reviewer, kind, application_id, decision, admin_notes)
            .await
    }

    /// Applies the same decision to a batch of applications.
    ///
    /// Every id runs through its own transaction; one item's failure never
    /// aborts the rest, and the result is independent of processing order.
    pub async fn bulk_review(
        &self,
        reviewer: &UserIdentity,
        kind: ApplicationKind,
        application_ids: &[ApplicationId],
        decision: &str,
        admin_notes: Option<&str>,
    ) -> AppResult<BulkReviewOutcome> {
        if application_ids.is_empty() {
            return Err(AppError::Validation(
                "application id list must not be empty".to_owned(),
            ));
        }

        let decision = ReviewDecision::parse(decision)?;
        let mut outcome = BulkReviewOutcome::default();

        for application_id in application_ids {
            match self
                .apply_decision(reviewer, kind, *application_id, decision, admin_notes)
                .await
            {
                Ok(decided) => outcome.succeeded.push(decided.application_id),
                Err(error) => outcome.failed.push(BulkReviewFailure {
                    application_id: *application_id,
                    error_type: error.error_type(),
                    message: error.to_string(),
                }),
            }
        }

        let summary = NewAuditLogEntry {
            actor: reviewer.subject().to_owned(),
            action: "membership.review.bulk".to_owned(),
            resource_type: "application_batch".to_owned(),
            resource_id: format!("{}_batch", kind.as_str()),
            detail: Some(json!({
                "decision": decision.as_str(),
                "requested": application_ids.len(),
                "succeeded": outcome.succeeded.len(),
                "failed": outcome.failed.len(),
            })),
        };

        if let Err(error) = self.audit_log.append(summary).await {
            warn!(
                reviewer = reviewer.subject(),
                "failed to append bulk review summary audit entry: {error}"
            );
        }

        Ok(outcome)
    }

    /// Lists applications for the admin review queue.
    pub async fn list_applications(
        &self,
        filter: ApplicationListFilter,
    ) -> AppResult<ApplicationPage> {
        self.applications.list(filter).await
    }

    async fn apply_decision(
        &self,
        reviewer: &UserIdentity,
        kind: ApplicationKind,
        application_id: ApplicationId,
        decision: ReviewDecision,
        admin_notes: Option<&str>,
    ) -> AppResult<DecisionOutcome> {
        let reviewer_id = reviewer_id(reviewer)?;

        // Cheap precheck outside the transaction; the conditional update
        // inside `decide` re-checks under isolation and wins races.
        let application = self
            .applications
            .find_by_id(kind, application_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("application '{application_id}' not found"))
            })?;

        if !application.status.is_reviewable() {
            return Err(AppError::AlreadyReviewed(format!(
                "application '{application_id}' was already {}",
                application.status.as_str()
            )));
        }

        let outcome = self
            .applications
            .decide(kind, application_id, reviewer_id, decision, admin_notes)
            .await?;

        info!(
            application_id = %outcome.application_id,
            user_id = %outcome.user_id,
            reviewer = reviewer.subject(),
            decision = decision.as_str(),
            kind = kind.as_str(),
            "application decided"
        );

        self.notify_applicant(&outcome, kind).await;

        Ok(outcome)
    }

    /// Post-commit decision notification. Failures are logged and
    /// swallowed; a delivery failure must not undo a committed decision.
    async fn notify_applicant(&self, outcome: &DecisionOutcome, kind: ApplicationKind) {
        let profile = match self.profiles.find_profile(outcome.user_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => return,
            Err(error) => {
                warn!(
                    user_id = %outcome.user_id,
                    "failed to load applicant profile for notification: {error}"
                );
                return;
            }
        };

        let Some(email) = profile.email.as_deref() else {
            return;
        };

        let (subject, body) = match (kind, outcome.decision) {
            (ApplicationKind::FullMembership, ReviewDecision::Approved) => (
                "Welcome to full membership",
                "Your full-membership application was approved.",
            ),
            (ApplicationKind::FullMembership, ReviewDecision::Declined) => (
                "Your full-membership application",
                "Your full-membership application was declined. You may re-apply.",
            ),
            (ApplicationKind::Initial, ReviewDecision::Approved) => (
                "Your application was approved",
                "Your application was approved. You are now a pre-member.",
            ),
            (ApplicationKind::Initial, ReviewDecision::Declined) => (
                "Your application",
                "Your application was declined. You may re-apply.",
            ),
        };

        if let Err(error) = self.notifications.send(email, subject, body).await {
            warn!(
                user_id = %outcome.user_id,
                application_id = %outcome.application_id,
                "failed to send decision notification: {error}"
            );
        }
    }
}

fn reviewer_id(identity: &UserIdentity) -> AppResult<UserId> {
    UserId::parse(identity.subject())
        .map_err(|_| AppError::Unauthorized("session subject is not a valid user id".to_owned()))
}
