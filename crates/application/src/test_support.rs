//! Shared in-memory fakes for application service tests.
//!
//! `FakeMembershipStore` stands in for the relational store and reproduces
//! the semantics the Postgres adapters promise: single-pending uniqueness,
//! conditional decision updates, mirror writes joined to the owning
//! application write, and idempotent grant creation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::Mutex;

use gatehouse_core::{AppError, AppResult, UserIdentity};
use gatehouse_domain::{
    ApplicationId, ApplicationKind, ApplicationStatus, MembershipStage, ReviewDecision,
    UserApplicationStatus, UserId,
};

use crate::membership_ports::{
    AccessGrant, AccessGrantRepository, ApplicationListFilter, ApplicationPage,
    ApplicationRecord, ApplicationRepository, AuditLogEntry, AuditLogQuery, AuditLogRepository,
    DecisionOutcome, MembershipProfile, MembershipRepository, NewApplicationSubmission,
    NewAuditLogEntry, NotificationService,
};

#[derive(Default)]
pub(crate) struct MembershipState {
    pub(crate) profiles: HashMap<UserId, MembershipProfile>,
    pub(crate) applications: Vec<ApplicationRecord>,
    pub(crate) grants: HashMap<UserId, AccessGrant>,
    pub(crate) audit_entries: Vec<NewAuditLogEntry>,
    pub(crate) fail_decisions: bool,
}

/// In-memory stand-in for the relational store, implementing every
/// repository port against one shared state.
#[derive(Clone, Default)]
pub(crate) struct FakeMembershipStore {
    pub(crate) state: Arc<Mutex<MembershipState>>,
}

impl FakeMembershipStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Inserts a profile at the given stage with consistent mirrors and
    /// returns its id.
    pub(crate) async fn insert_profile(&self, stage: MembershipStage) -> UserId {
        let user_id = UserId::new();
        let profile = MembershipProfile {
            id: user_id,
            email: Some(format!("{user_id}@example.test")),
            display_name: format!("user-{user_id}"),
            membership_stage: stage,
            is_member: stage == MembershipStage::Member,
            application_status: match stage {
                MembershipStage::Applicant => UserApplicationStatus::NotApplied,
                MembershipStage::PreMember | MembershipStage::Member => {
                    UserApplicationStatus::Approved
                }
            },
            application_applied_at: None,
            application_reviewed_at: None,
            full_membership_status: match stage {
                MembershipStage::Member => UserApplicationStatus::Approved,
                _ => UserApplicationStatus::NotApplied,
            },
            full_membership_ticket: None,
            full_membership_applied_at: None,
            full_membership_reviewed_at: None,
        };
        self.state.lock().await.profiles.insert(user_id, profile);
        user_id
    }

    pub(crate) fn identity(&self, user_id: UserId) -> UserIdentity {
        UserIdentity::new(
            user_id.to_string(),
            format!("user-{user_id}"),
            Some(format!("{user_id}@example.test")),
            vec!["member".to_owned()],
        )
    }

    pub(crate) fn admin_identity(&self, user_id: UserId) -> UserIdentity {
        UserIdentity::new(
            user_id.to_string(),
            "Reviewer".to_owned(),
            None,
            vec!["admin".to_owned()],
        )
    }

    pub(crate) async fn set_fail_decisions(&self, fail: bool) {
        self.state.lock().await.fail_decisions = fail;
    }

    pub(crate) async fn audit_actions(&self) -> Vec<String> {
        self.state
            .lock()
            .await
            .audit_entries
            .iter()
            .map(|entry| entry.action.clone())
            .collect()
    }
}

#[async_trait]
impl MembershipRepository for FakeMembershipStore {
    async fn find_profile(&self, user_id: UserId) -> AppResult<Option<MembershipProfile>> {
        Ok(self.state.lock().await.profiles.get(&user_id).cloned())
    }

    async fn ensure_profile(
        &self,
        user_id: UserId,
        display_name: &str,
        email: Option<&str>,
    ) -> AppResult<MembershipProfile> {
        let mut state = self.state.lock().await;
        let profile = state.profiles.entry(user_id).or_insert(MembershipProfile {
            id: user_id,
            email: email.map(ToOwned::to_owned),
            display_name: display_name.to_owned(),
            membership_stage: MembershipStage::Applicant,
            is_member: false,
            application_status: UserApplicationStatus::NotApplied,
            application_applied_at: None,
            application_reviewed_at: None,
            full_membership_status: UserApplicationStatus::NotApplied,
            full_membership_ticket: None,
            full_membership_applied_at: None,
            full_membership_reviewed_at: None,
        });
        Ok(profile.clone())
    }

    async fn list_user_ids_with_applications(&self, limit: usize) -> AppResult<Vec<UserId>> {
        let state = self.state.lock().await;
        let mut seen = Vec::new();
        for application in &state.applications {
            if !seen.contains(&application.user_id) {
                seen.push(application.user_id);
            }
            if seen.len() >= limit {
                break;
            }
        }
        Ok(seen)
    }
}

#[async_trait]
impl ApplicationRepository for FakeMembershipStore {
    async fn submit(&self, submission: NewApplicationSubmission) -> AppResult<ApplicationRecord> {
        let mut state = self.state.lock().await;

        // Partial unique index stand-in: one pending row per user per kind.
        let duplicate = state.applications.iter().any(|application| {
            application.user_id == submission.user_id
                && application.kind == submission.kind
                && application.status == ApplicationStatus::Pending
        });
        if duplicate {
            return Err(AppError::DuplicatePending(
                "a pending application already exists".to_owned(),
            ));
        }

        let now = Utc::now();
        let record = ApplicationRecord {
            id: ApplicationId::new(),
            user_id: submission.user_id,
            kind: submission.kind,
            ticket: submission.ticket.as_ref().map(|t| t.as_str().to_owned()),
            answers: submission.answers,
            status: ApplicationStatus::Pending,
            submitted_at: now,
            reviewed_at: None,
            reviewer_id: None,
            admin_notes: None,
        };

        let profile = state
            .profiles
            .get_mut(&submission.user_id)
            .ok_or_else(|| AppError::Internal("profile missing in fake store".to_owned()))?;
        match submission.kind {
            ApplicationKind::Initial => {
                profile.application_status = UserApplicationStatus::Pending;
                profile.application_applied_at = Some(now);
            }
            ApplicationKind::FullMembership => {
                profile.full_membership_status = UserApplicationStatus::Pending;
                profile.full_membership_applied_at = Some(now);
                profile.full_membership_ticket = record.ticket.clone();
            }
        }

        state.audit_entries.push(NewAuditLogEntry {
            actor: submission.user_id.to_string(),
            action: format!("membership.{}.submitted", submission.kind.as_str()),
            resource_type: "application".to_owned(),
            resource_id: record.id.to_string(),
            detail: None,
        });

        state.applications.push(record.clone());
        Ok(record)
    }

    async fn find_by_id(
        &self,
        kind: ApplicationKind,
        application_id: ApplicationId,
    ) -> AppResult<Option<ApplicationRecord>> {
        let state = self.state.lock().await;
        Ok(state
            .applications
            .iter()
            .find(|application| application.kind == kind && application.id == application_id)
            .cloned())
    }

    async fn find_latest_for_user(
        &self,
        kind: ApplicationKind,
        user_id: UserId,
    ) -> AppResult<Option<ApplicationRecord>> {
        let state = self.state.lock().await;
        Ok(state
            .applications
            .iter()
            .rev()
            .find(|application| application.kind == kind && application.user_id == user_id)
            .cloned())
    }

    async fn list_for_user(
        &self,
        kind: ApplicationKind,
        user_id: UserId,
    ) -> AppResult<Vec<ApplicationRecord>> {
        let state = self.state.lock().await;
        Ok(state
            .applications
            .iter()
            .rev()
            .filter(|application| application.kind == kind && application.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn decide(
        &self,
        kind: ApplicationKind,
        application_id: ApplicationId,
        reviewer_id: UserId,
        decision: ReviewDecision,
        admin_notes: Option<&str>,
    ) -> AppResult<DecisionOutcome> {
        let mut state = self.state.lock().await;

        if state.fail_decisions {
            return Err(AppError::TransactionFailed(
                "simulated store abort".to_owned(),
            ));
        }

        let now = Utc::now();
        let Some(application) = state
            .applications
            .iter_mut()
            .find(|application| application.kind == kind && application.id == application_id)
        else {
            return Err(AppError::NotFound(format!(
                "application '{application_id}' not found"
            )));
        };

        // Conditional update stand-in: only a pending row transitions.
        if application.status != ApplicationStatus::Pending {
            return Err(AppError::AlreadyReviewed(format!(
                "application '{application_id}' was already {}",
                application.status.as_str()
            )));
        }

        application.status = decision.resulting_status();
        application.reviewed_at = Some(now);
        application.reviewer_id = Some(reviewer_id);
        application.admin_notes = admin_notes.map(ToOwned::to_owned);
        let user_id = application.user_id;

        let profile = state
            .profiles
            .get_mut(&user_id)
            .ok_or_else(|| AppError::Internal("profile missing in fake store".to_owned()))?;

        match (kind, decision) {
            (ApplicationKind::FullMembership, ReviewDecision::Approved) => {
                profile.membership_stage = MembershipStage::Member;
                profile.is_member = true;
                profile.full_membership_status = UserApplicationStatus::Approved;
                profile.full_membership_reviewed_at = Some(now);
                state.grants.entry(user_id).or_insert(AccessGrant {
                    user_id,
                    first_accessed_at: None,
                    access_count: 0,
                    created_at: now,
                });
            }
            (ApplicationKind::FullMembership, ReviewDecision::Declined) => {
                profile.full_membership_status = UserApplicationStatus::Declined;
                profile.full_membership_reviewed_at = Some(now);
            }
            (ApplicationKind::Initial, ReviewDecision::Approved) => {
                profile.application_status = UserApplicationStatus::Approved;
                profile.application_reviewed_at = Some(now);
                if profile.membership_stage == MembershipStage::Applicant {
                    profile.membership_stage = MembershipStage::PreMember;
                }
            }
            (ApplicationKind::Initial, ReviewDecision::Declined) => {
                profile.application_status = UserApplicationStatus::Declined;
                profile.application_reviewed_at = Some(now);
            }
        }

        state.audit_entries.push(NewAuditLogEntry {
            actor: reviewer_id.to_string(),
            action: format!("membership.{}.{}", kind.as_str(), decision.as_str()),
            resource_type: "application".to_owned(),
            resource_id: application_id.to_string(),
            detail: None,
        });

        Ok(DecisionOutcome {
            application_id,
            user_id,
            decision,
        })
    }

    async fn amend_answers(
        &self,
        kind: ApplicationKind,
        user_id: UserId,
        answers: Value,
    ) -> AppResult<ApplicationRecord> {
        let mut state = self.state.lock().await;
        let Some(application) = state
            .applications
            .iter_mut()
            .rev()
            .find(|application| application.kind == kind && application.user_id == user_id)
        else {
            return Err(AppError::NotFound(
                "no application found for user".to_owned(),
            ));
        };

        if application.status != ApplicationStatus::Pending {
            return Err(AppError::AlreadyReviewed(
                "the application was already decided".to_owned(),
            ));
        }

        application.answers = answers;
        Ok(application.clone())
    }

    async fn withdraw(&self, kind: ApplicationKind, user_id: UserId) -> AppResult<ApplicationId> {
        let mut state = self.state.lock().await;
        let Some(position) = state.applications.iter().position(|application| {
            application.kind == kind
                && application.user_id == user_id
                && application.status == ApplicationStatus::Pending
        }) else {
            return Err(AppError::NotFound(
                "no pending application to withdraw".to_owned(),
            ));
        };

        let removed = state.applications.remove(position);

        let profile = state
            .profiles
            .get_mut(&user_id)
            .ok_or_else(|| AppError::Internal("profile missing in fake store".to_owned()))?;
        match kind {
            ApplicationKind::Initial => {
                profile.application_status = UserApplicationStatus::NotApplied;
                profile.application_applied_at = None;
            }
            ApplicationKind::FullMembership => {
                profile.full_membership_status = UserApplicationStatus::NotApplied;
                profile.full_membership_applied_at = None;
                profile.full_membership_ticket = None;
            }
        }

        state.audit_entries.push(NewAuditLogEntry {
            actor: user_id.to_string(),
            action: format!("membership.{}.withdrawn", kind.as_str()),
            resource_type: "application".to_owned(),
            resource_id: removed.id.to_string(),
            detail: None,
        });

        Ok(removed.id)
    }

    async fn list(&self, filter: ApplicationListFilter) -> AppResult<ApplicationPage> {
        let state = self.state.lock().await;
        let matching: Vec<ApplicationRecord> = state
            .applications
            .iter()
            .rev()
            .filter(|application| {
                application.kind == filter.kind
                    && filter
                        .status
                        .is_none_or(|status| application.status == status)
            })
            .cloned()
            .collect();

        let total = matching.len() as u64;
        let applications = matching
            .into_iter()
            .skip(filter.offset)
            .take(filter.limit)
            .collect();

        Ok(ApplicationPage {
            applications,
            total,
        })
    }
}

#[async_trait]
impl AccessGrantRepository for FakeMembershipStore {
    async fn find_for_user(&self, user_id: UserId) -> AppResult<Option<AccessGrant>> {
        Ok(self.state.lock().await.grants.get(&user_id).cloned())
    }

    async fn record_access(&self, user_id: UserId) -> AppResult<Option<AccessGrant>> {
        let mut state = self.state.lock().await;
        let Some(grant) = state.grants.get_mut(&user_id) else {
            return Ok(None);
        };
        if grant.first_accessed_at.is_none() {
            grant.first_accessed_at = Some(Utc::now());
        }
        grant.access_count += 1;
        Ok(Some(grant.clone()))
    }
}

#[async_trait]
impl AuditLogRepository for FakeMembershipStore {
    async fn append(&self, entry: NewAuditLogEntry) -> AppResult<()> {
        self.state.lock().await.audit_entries.push(entry);
        Ok(())
    }

    async fn list_recent(&self, query: AuditLogQuery) -> AppResult<Vec<AuditLogEntry>> {
        let state = self.state.lock().await;
        Ok(state
            .audit_entries
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, entry)| {
                query
                    .action
                    .as_deref()
                    .is_none_or(|action| entry.action == action)
                    && query
                        .actor
                        .as_deref()
                        .is_none_or(|actor| entry.actor == actor)
            })
            .skip(query.offset)
            .take(query.limit)
            .map(|(index, entry)| AuditLogEntry {
                entry_id: index.to_string(),
                actor: entry.actor.clone(),
                action: entry.action.clone(),
                resource_type: entry.resource_type.clone(),
                resource_id: entry.resource_id.clone(),
                detail: entry.detail.clone(),
                created_at: Utc::now().to_rfc3339(),
            })
            .collect())
    }
}

/// Notification fake that records sends and can be switched to fail.
#[derive(Default)]
pub(crate) struct FakeNotificationService {
    pub(crate) sent: Mutex<Vec<(String, String)>>,
    pub(crate) fail: bool,
}

impl FakeNotificationService {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }
}

#[async_trait]
impl NotificationService for FakeNotificationService {
    async fn send(&self, to: &str, subject: &str, _text_body: &str) -> AppResult<()> {
        if self.fail {
            return Err(AppError::Internal("simulated delivery failure".to_owned()));
        }
        self.sent
            .lock()
            .await
            .push((to.to_owned(), subject.to_owned()));
        Ok(())
    }
}
