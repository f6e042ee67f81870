//! Read-side membership status services.
//!
//! The projection treats the application tables as the source of truth and
//! only reads the user mirrors for the fields that live there (stage,
//! membership flag). The consistency checker compares the two and reports
//! divergence as data; it never repairs.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use gatehouse_core::{AppError, AppResult, UserIdentity};
use gatehouse_domain::{
    ApplicationKind, ApplicationStatus, MembershipStage, UserApplicationStatus, UserId,
};

use crate::membership_ports::{
    AccessGrant, AccessGrantRepository, ApplicationRecord, ApplicationRepository,
    MembershipProfile, MembershipRepository,
};


/// User-facing projection of the full-membership pipeline.
#[derive(Debug, Clone)]
pub struct MembershipStatusView {
    /// The user the view describes.
    pub user_id: UserId,
    /// Latest application status, `NotApplied` when no row exists.
    pub status: UserApplicationStatus,
    /// Ticket of the latest application.
    pub ticket: Option<String>,
    /// Submission time of the latest application.
    pub applied_at: Option<DateTime<Utc>>,
    /// Decision time of the latest application.
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Reviewer notes on the latest application.
    pub admin_notes: Option<String>,
    /// Answers payload of the latest application.
    pub answers: Option<Value>,
    /// Current membership stage.
    pub membership_stage: MembershipStage,
}

/// Merged survey + membership projection.
#[derive(Debug, Clone)]
pub struct SurveyStatusView {
    /// Latest initial-application ("survey") status.
    pub survey_status: UserApplicationStatus,
    /// Latest full-membership application status.
    pub full_membership_status: UserApplicationStatus,
    /// Current membership stage.
    pub membership_stage: MembershipStage,
    /// Membership mirror flag.
    pub is_member: bool,
}

/// One field pair that disagrees.
#[derive(Debug, Clone)]
pub struct StatusDiscrepancy {
    /// The denormalized field under inspection.
    pub field: String,
    /// Value implied by the application table.
    pub expected: String,
    /// Value actually stored.
    pub actual: String,
}

/// Consistency diagnostic for one user.
#[derive(Debug, Clone)]
pub struct ConsistencyReport {
    /// The inspected user.
    pub user_id: UserId,
    /// True when no discrepancies were found.
    pub consistent: bool,
    /// The disagreeing field pairs.
    pub discrepancies: Vec<StatusDiscrepancy>,
}

/// Read-side service for status projections, the consistency checker, and
/// the access-grant engagement counter.
#[derive(Clone)]
pub struct StatusService {
    applications: Arc<dyn ApplicationRepository>,
    profiles: Arc<dyn MembershipRepository>,
    grants: Arc<dyn AccessGrantRepository>,
}

impl StatusService {
    /// Creates a new status service.
    #[must_use]
    pub fn new(
        applications: Arc<dyn ApplicationRepository>,
        profiles: Arc<dyn MembershipRepository>,
        grants: Arc<dyn AccessGrantRepository>,
    ) -> Self {
        Self {
            applications,
            profiles,
            grants,
        }
    }

    /// Returns the full-membership projection for `target`, defaulting to
    /// the caller. Reading another user's status requires the admin role.
    pub async fn full_membership_status(
        &self,
        identity: &UserIdentity,
        target: Option<UserId>,
    ) -> AppResult<MembershipStatusView> {
        let caller = caller_id(identity)?;
        let user_id = target.unwrap_or(caller);

        if user_id != caller && !identity.is_admin() {
            return Err(AppError::Forbidden(
                "reading another user's membership status requires the admin role".to_owned(),
            ));
        }

        let profile = self.require_profile(user_id).await?;
        let latest = self
            .applications
            .find_latest_for_user(ApplicationKind::FullMembership, user_id)
            .await?;

        Ok(project(&profile, latest))
    }

    /// Returns the merged survey + membership projection for the caller.
    pub async fn survey_status(&self, identity: &UserIdentity) -> AppResult<SurveyStatusView> {
        let user_id = caller_id(identity)?;
        let profile = self.require_profile(user_id).await?;

        let survey = self
            .applications
            .find_latest_for_user(ApplicationKind::Initial, user_id)
            .await?;
        let full = self
            .applications
            .find_latest_for_user(ApplicationKind::FullMembership, user_id)
            .await?;

        Ok(SurveyStatusView {
            survey_status: mirror_of(survey.as_ref()),
            full_membership_status: mirror_of(full.as_ref()),
            membership_stage: profile.membership_stage,
            is_member: profile.is_member,
        })
    }

    /// Records one use of full-membership privileges: stamps the first
    /// access and increments the engagement counter.
    pub async fn record_access(&self, identity: &UserIdentity) -> AppResult<AccessGrant> {
        let user_id = caller_id(identity)?;

        self.grants
            .record_access(user_id)
            .await?
            .ok_or_else(|| {
                AppError::IneligibleState(
                    "full membership has not been approved for this user".to_owned(),
                )
            })
    }

    /// Compares the denormalized status fields of one user against the
    /// application table. Read-only; discrepancies are reported as data,
    /// never thrown, and never auto-repaired.
    pub async fn check_consistency(&self, user_id: UserId) -> AppResult<ConsistencyReport> {
        let profile = self.require_profile(user_id).await?;

        let latest_initial = self
            .applications
            .find_latest_for_user(ApplicationKind::Initial, user_id)
            .await?;
        let full_history = self
            .applications
            .list_for_user(ApplicationKind::FullMembership, user_id)
            .await?;
        let latest_full = full_history.first().cloned();

        let mut discrepancies = Vec::new();

        let expected_initial = mirror_of(latest_initial.as_ref());
        if expected_initial != profile.application_status {
            discrepancies.push(StatusDiscrepancy {
                field: "users.application_status".to_owned(),
                expected: expected_initial.as_str().to_owned(),
                actual: profile.application_status.as_str().to_owned(),
            });
        }

        let expected_full = mirror_of(latest_full.as_ref());
        if expected_full != profile.full_membership_status {
            discrepancies.push(StatusDiscrepancy {
                field: "users.full_membership_status".to_owned(),
                expected: expected_full.as_str().to_owned(),
                actual: profile.full_membership_status.as_str().to_owned(),
            });
        }

        // membership_stage = member  <=>  an approved full application exists.
        let has_approved_full = full_history
            .iter()
            .any(|application| application.status == ApplicationStatus::Approved);
        let is_member_stage = profile.membership_stage == MembershipStage::Member;
        if has_approved_full != is_member_stage {
            discrepancies.push(StatusDiscrepancy {
                field: "users.membership_stage".to_owned(),
                expected: if has_approved_full {
                    MembershipStage::Member.as_str().to_owned()
                } else {
                    "applicant or pre_member".to_owned()
                },
                actual: profile.membership_stage.as_str().to_owned(),
            });
        }

        if profile.is_member != has_approved_full {
            discrepancies.push(StatusDiscrepancy {
                field: "users.is_member".to_owned(),
                expected: has_approved_full.to_string(),
                actual: profile.is_member.to_string(),
            });
        }

        if has_approved_full && self.grants.find_for_user(user_id).await?.is_none() {
            discrepancies.push(StatusDiscrepancy {
                field: "access_grants".to_owned(),
                expected: "grant row present".to_owned(),
                actual: "missing".to_owned(),
            });
        }

        Ok(ConsistencyReport {
            user_id,
            consistent: discrepancies.is_empty(),
            discrepancies,
        })
    }

    /// Runs the consistency check over users holding any application,
    /// bounded by `limit`.
    pub async fn check_all(&self, limit: usize) -> AppResult<Vec<ConsistencyReport>> {
        let user_ids = self
            .profiles
            .list_user_ids_with_applications(limit)
            .await?;

        let mut reports = Vec::with_capacity(user_ids.len());
        for user_id in user_ids {
            reports.push(self.check_consistency(user_id).await?);
        }

        Ok(reports)
    }

    async fn require_profile(&self, user_id: UserId) -> AppResult<MembershipProfile> {
        self.profiles
            .find_profile(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' not found")))
    }
}

fn caller_id(identity: &UserIdentity) -> AppResult<UserId> {
    UserId::parse(identity.subject())
        .map_err(|_| AppError::Unauthorized("session subject is not a valid user id".to_owned()))
}

fn mirror_of(application: Option<&ApplicationRecord>) -> UserApplicationStatus {
    match application.map(|record| record.status) {
        None => UserApplicationStatus::NotApplied,
        Some(ApplicationStatus::Pending) => UserApplicationStatus::Pending,
        Some(ApplicationStatus::Approved) => UserApplicationStatus::Approved,
        Some(ApplicationStatus::Declined) => UserApplicationStatus::Declined,
    }
}

fn project(
    profile: &MembershipProfile,
    latest: Option<ApplicationRecord>,
) -> MembershipStatusView {
    match latest {
        Some(application) => MembershipStatusView {
            user_id: profile.id,
            status: mirror_of(Some(&application)),
            ticket: application.ticket,
            applied_at: Some(application.submitted_at),
            reviewed_at: application.reviewed_at,
            admin_notes: application.admin_notes,
            answers: Some(application.answers),
            membership_stage: profile.membership_stage,
        },
        None => MembershipStatusView {
            user_id: profile.id,
            status: UserApplicationStatus::NotApplied,
            ticket: None,
            applied_at: None,
            reviewed_at: None,
            admin_notes: None,
            answers: None,
            membership_stage: profile.membership_stage,
        },
    }
}
