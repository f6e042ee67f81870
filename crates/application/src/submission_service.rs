//! Application submission service.
//!
//! Owns the write side of the applicant pipeline: eligibility checks,
//! duplicate-pending guards, amendments, and withdrawals. All precondition
//! checks run before the repository opens its transaction; the repository
//! commits the application row, the user's status mirror, and the audit
//! entry as one unit.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{info, warn};

use gatehouse_core::{AppError, AppResult, UserIdentity};
use gatehouse_domain::{
    ApplicationId, ApplicationKind, ApplicationStatus, MembershipStage, Ticket, UserId,
    validate_answers,
};

use crate::membership_ports::{
    ApplicationRecord, ApplicationRepository, MembershipProfile, MembershipRepository,
    NewApplicationSubmission, NotificationService,
};

#[cfg(test)]
mod tests;

/// Confirmation returned for a created application.
#[derive(Debug, Clone, Copy)]
pub struct SubmissionReceipt {
    /// Identifier of the created application.
    pub application_id: ApplicationId,
    /// Always `Pending` on creation.
    pub status: ApplicationStatus,
}

/// Application service for submitting, amending, and withdrawing
/// membership applications.
#[derive(Clone)]
pub struct SubmissionService {
    applications: Arc<dyn ApplicationRepository>,
    profiles: Arc<dyn MembershipRepository>,
    notifications: Arc<dyn NotificationService>,
}

impl SubmissionService {
    /// Creates a new submission service.
    #[must_use]
    pub fn new(
        applications: Arc<dyn ApplicationRepository>,
        profiles: Arc<dyn MembershipRepository>,
        notifications: Arc<dyn NotificationService>,
    ) -> Self {
        Self {
            applications,
            profiles,
            notifications,
        }
    }

    /// Submits an initial application for the authenticated user.
    ///
    /// Eligible when the user has no prior initial application or the most
    /// recent one was declined.
    pub async fn submit_initial(
        &self,
        identity: &UserIdentity,
        answers: Value,
    ) -> AppResult<SubmissionReceipt> {
        let user_id = caller_id(identity)?;
        validate_answers(&answers)?;

        let profile = self.require_profile(user_id).await?;

        if let Some(latest) = self
            .applications
            .find_latest_for_user(ApplicationKind::Initial, user_id)
            .await?
        {
            match latest.status {
                ApplicationStatus::Pending => {
                    return Err(AppError::DuplicatePending(
                        "an initial application is already awaiting review".to_owned(),
                    ));
                }
                ApplicationStatus::Approved => {
                    return Err(AppError::IneligibleState(
                        "the initial application was already approved".to_owned(),
                    ));
                }
                ApplicationStatus::Declined => {}
            }
        }

        let record = self
            .applications
            .submit(NewApplicationSubmission {
                user_id,
                kind: ApplicationKind::Initial,
                ticket: None,
                answers,
            })
            .await?;

        info!(
            user_id = %user_id,
            application_id = %record.id,
            "initial application submitted"
        );

        self.acknowledge(&profile, &record).await;

        Ok(SubmissionReceipt {
            application_id: record.id,
            status: record.status,
        })
    }

    /// Submits a full-membership application for the authenticated user.
    ///
    /// Requires the `pre_member` stage and a ticket. A declined prior
    /// application does not block re-submission; a pending or approved one
    /// does.
    pub async fn submit_full_membership(
        &self,
        identity: &UserIdentity,
        answers: Value,
        ticket: &str,
    ) -> AppResult<SubmissionReceipt> {
        let user_id = caller_id(identity)?;
        validate_answers(&answers)?;
        let ticket = Ticket::new(ticket)?;

        let profile = self.require_profile(user_id).await?;
        require_pre_member(&profile)?;

        if let Some(latest) = self
            .applications
            .find_latest_for_user(ApplicationKind::FullMembership, user_id)
            .await?
        {
            match latest.status {
                ApplicationStatus::Pending => {
                    return Err(AppError::DuplicatePending(
                        "a full-membership application is already awaiting review".to_owned(),
                    ));
                }
                ApplicationStatus::Approved => {
                    return Err(AppError::IneligibleState(
                        "the full-membership application was already approved".to_owned(),
                    ));
                }
                ApplicationStatus::Declined => {}
            }
        }

        self.create_full_membership(user_id, &profile, answers, ticket)
            .await
    }

    /// Re-applies for full membership after a decline.
    ///
    /// Stricter than `submit_full_membership`: the most recent application
    /// must exist and be declined. Always creates a new row; the declined
    /// row is retained unmodified.
    pub async fn reapply_full_membership(
        &self,
        identity: &UserIdentity,
        answers: Value,
        ticket: &str,
    ) -> AppResult<SubmissionReceipt> {
        let user_id = caller_id(identity)?;
        validate_answers(&answers)?;
        let ticket = Ticket::new(ticket)?;

        let profile = self.require_profile(user_id).await?;
        require_pre_member(&profile)?;

        let latest = self
            .applications
            .find_latest_for_user(ApplicationKind::FullMembership, user_id)
            .await?;

        match latest.map(|application| application.status) {
            Some(ApplicationStatus::Declined) => {}
            Some(ApplicationStatus::Pending) => {
                return Err(AppError::DuplicatePending(
                    "a full-membership application is already awaiting review".to_owned(),
                ));
            }
            Some(ApplicationStatus::Approved) | None => {
                return Err(AppError::IneligibleState(
                    "re-application requires a declined full-membership application".to_owned(),
                ));
            }
        }

        self.create_full_membership(user_id, &profile, answers, ticket)
            .await
    }

    /// Replaces the answers of the user's pending initial application.
    pub async fn amend_initial_answers(
        &self,
        identity: &UserIdentity,
        answers: Value,
    ) -> AppResult<ApplicationRecord> {
        let user_id = caller_id(identity)?;
        validate_answers(&answers)?;

        let record = self
            .applications
            .amend_answers(ApplicationKind::Initial, user_id, answers)
            .await?;

        info!(
            user_id = %user_id,
            application_id = %record.id,
            "initial application answers amended"
        );

        Ok(record)
    }

    /// Withdraws the user's pending initial application.
    pub async fn withdraw_initial(&self, identity: &UserIdentity) -> AppResult<ApplicationId> {
        let user_id = caller_id(identity)?;

        let application_id = self
            .applications
            .withdraw(ApplicationKind::Initial, user_id)
            .await?;

        info!(
            user_id = %user_id,
            application_id = %application_id,
            "initial application withdrawn"
        );

        Ok(application_id)
    }

    async fn create_full_membership(
        &self,
        user_id: UserId,
        profile: &MembershipProfile,
        answers: Value,
        ticket: Ticket,
    ) -> AppResult<SubmissionReceipt> {
        let record = self
            .applications
            .submit(NewApplicationSubmission {
                user_id,
                kind: ApplicationKind::FullMembership,
                ticket: Some(ticket),
                answers,
            })
            .await?;

        info!(
            user_id = %user_id,
            application_id = %record.id,
            ticket = record.ticket.as_deref().unwrap_or_default(),
            "full-membership application submitted"
        );

        self.acknowledge(profile, &record).await;

        Ok(SubmissionReceipt {
            application_id: record.id,
            status: record.status,
        })
    }

    /// Post-commit acknowledgement. Delivery failures are logged and
    /// swallowed; they never surface to the applicant.
    async fn acknowledge(&self, profile: &MembershipProfile, record: &ApplicationRecord) {
        let Some(email) = profile.email.as_deref() else {
            return;
        };

        let subject = match record.kind {
            ApplicationKind::Initial => "We received your application",
            ApplicationKind::FullMembership => "We received your full-membership application",
        };

        let body = json!({
            "applicationId": record.id.to_string(),
            "status": record.status.as_str(),
        });

        if let Err(error) = self
            .notifications
            .send(
                email,
                subject,
                &format!(
                    "Hello {},\n\nyour application is now awaiting review.\n\n{body}",
                    profile.display_name
                ),
            )
            .await
        {
            warn!(
                user_id = %profile.id,
                application_id = %record.id,
                "failed to send submission acknowledgement: {error}"
            );
        }
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

fn require_pre_member(profile: &MembershipProfile) -> AppResult<()> {
    match profile.membership_stage {
        MembershipStage::PreMember => Ok(()),
        MembershipStage::Member => Err(AppError::IneligibleState(
            "the user is already a full member".to_owned(),
        )),
        MembershipStage::Applicant => Err(AppError::IneligibleState(
            "full membership requires an approved initial application".to_owned(),
        )),
    }
}
