//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod application;
mod user;

pub use application::{
    ApplicationId, ApplicationKind, ApplicationStatus, ReviewDecision, TICKET_MAX_LENGTH, Ticket,
    validate_answers,
};
pub use user::{MembershipStage, UserApplicationStatus, UserId};
