//! Development seed data: a reviewer and users at each pipeline stage.
//! Idempotent; runs only when `DEV_SEED=true`.

use serde_json::json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use gatehouse_core::{AppError, AppResult};

const DEV_SEED_ADMIN_USER_ID: &str = "7f9d2b70-58d3-4be0-9f83-1c6a4f2f8a01";
const DEV_SEED_APPLICANT_USER_ID: &str = "b4f2a7aa-9a11-4f86-9a77-5d6e0b2c9d02";
const DEV_SEED_PRE_MEMBER_USER_ID: &str = "c1e8f3bc-2d45-4a09-8b1e-7a9c5d3e1f03";

pub async fn run(pool: &PgPool) -> AppResult<()> {
    let admin_id = parse_uuid_const(DEV_SEED_ADMIN_USER_ID, "DEV_SEED_ADMIN_USER_ID")?;
    let applicant_id = parse_uuid_const(DEV_SEED_APPLICANT_USER_ID, "DEV_SEED_APPLICANT_USER_ID")?;
    let pre_member_id =
        parse_uuid_const(DEV_SEED_PRE_MEMBER_USER_ID, "DEV_SEED_PRE_MEMBER_USER_ID")?;

    ensure_seed_user(pool, admin_id, "Seed Reviewer", "reviewer@gatehouse.local").await?;
    ensure_seed_user(pool, applicant_id, "Seed Applicant", "applicant@gatehouse.local").await?;
    ensure_seed_user(
        pool,
        pre_member_id,
        "Seed Pre-Member",
        "pre-member@gatehouse.local",
    )
    .await?;

    // The reviewer and the pre-member skip the early pipeline stages.
    sqlx::query(
        r#"
        UPDATE users
        SET membership_stage = 'pre_member', application_status = 'approved'
        WHERE id IN ($1, $2) AND membership_stage = 'applicant'
        "#,
    )
    .bind(admin_id)
    .bind(pre_member_id)
    .execute(pool)
    .await
    .map_err(|error| AppError::Internal(format!("failed to promote seed users: {error}")))?;

    // One pending full-membership application for the review queue.
    sqlx::query(
        r#"
        INSERT INTO full_membership_applications (user_id, ticket, answers)
        SELECT $1, $2, $3
        WHERE NOT EXISTS (
            SELECT 1 FROM full_membership_applications WHERE user_id = $1
        )
        "#,
    )
    .bind(pre_member_id)
    .bind("TCK-SEED-1")
    .bind(json!({"motivation": "seeded application for local review"}))
    .execute(pool)
    .await
    .map_err(|error| AppError::Internal(format!("failed to seed application: {error}")))?;

    sqlx::query(
        r#"
        UPDATE users
        SET full_membership_status = 'pending',
            full_membership_ticket = 'TCK-SEED-1',
            full_membership_applied_at = now()
        WHERE id = $1 AND full_membership_status = 'not_applied'
        "#,
    )
    .bind(pre_member_id)
    .execute(pool)
    .await
    .map_err(|error| AppError::Internal(format!("failed to mirror seed application: {error}")))?;

    info!(
        admin = DEV_SEED_ADMIN_USER_ID,
        applicant = DEV_SEED_APPLICANT_USER_ID,
        pre_member = DEV_SEED_PRE_MEMBER_USER_ID,
        "development seed data ensured"
    );

    Ok(())
}

async fn ensure_seed_user(
    pool: &PgPool,
    user_id: Uuid,
    display_name: &str,
    email: &str,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO users (id, email, display_name)
        VALUES ($1, $2, $3)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(email)
    .bind(display_name)
    .execute(pool)
    .await
    .map_err(|error| AppError::Internal(format!("failed to seed user: {error}")))?;

    Ok(())
}

fn parse_uuid_const(value: &str, name: &str) -> AppResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|error| AppError::Internal(format!("invalid {name} constant: {error}")))
}
