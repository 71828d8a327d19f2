use std::sync::Arc;

use chrono::{DateTime, Utc};
use shared::{
    clock::Clock,
    domain::{Flower, FlowerId, FlowerType, VaseId},
    error::{ApiError, ErrorCode},
    garden::{compose_garden, GardenView},
    lifecycle::{lifespan_days, sweep_expired},
    protocol::{AdminOverview, AdminStats, FlowerTypeOption},
};
use storage::Storage;
use tracing::{info, warn};

pub mod auth;

use auth::{AdminCredential, AdminSession, SessionKeys};

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
    pub clock: Arc<dyn Clock>,
    pub credential: AdminCredential,
    pub sessions: SessionKeys,
}

impl ApiContext {
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

pub async fn add_flower(ctx: &ApiContext, raw_type: &str) -> Result<Flower, ApiError> {
    let flower_type = raw_type
        .parse::<FlowerType>()
        .map_err(|e| ApiError::new(ErrorCode::InvalidType, e.to_string()))?;
    let flower = ctx
        .storage
        .insert_flower(flower_type, ctx.now())
        .await
        .map_err(internal)?;
    info!(flower_id = %flower.id, %flower_type, expires_at = %flower.expires_at, "flower added");
    Ok(flower)
}

/// Cuts a `new` flower and places it into one of the fixed vase slots.
///
/// A missing flower and a flower past `new` are reported the same way.
pub async fn trim_flower(
    ctx: &ApiContext,
    flower_id: FlowerId,
    vase_id: i64,
) -> Result<(), ApiError> {
    let vase_id = VaseId::slot(vase_id).ok_or_else(|| {
        ApiError::new(
            ErrorCode::Validation,
            format!("vase {vase_id} is not one of the shelf slots"),
        )
    })?;
    let trimmed = ctx
        .storage
        .trim_flower(flower_id, vase_id, ctx.now())
        .await
        .map_err(internal)?;
    if !trimmed {
        return Err(ApiError::new(
            ErrorCode::InvalidState,
            "flower is missing or already trimmed",
        ));
    }
    info!(%flower_id, %vase_id, "flower trimmed");
    Ok(())
}

/// Always succeeds; a vase without trimmed flowers is left as it is.
pub async fn change_water(ctx: &ApiContext, vase_id: i64) -> Result<u64, ApiError> {
    let refreshed = ctx
        .storage
        .change_water(VaseId(vase_id), ctx.now())
        .await
        .map_err(internal)?;
    info!(vase_id, refreshed, "water changed");
    Ok(refreshed)
}

/// Retires every flower past its expiry and returns the ids that moved.
pub async fn sweep(ctx: &ApiContext, now: DateTime<Utc>) -> Result<Vec<FlowerId>, ApiError> {
    let unretired = ctx.storage.list_unretired().await.map_err(internal)?;
    let expired = sweep_expired(&unretired, now);
    if !expired.is_empty() {
        let retired = ctx
            .storage
            .mark_expired(&expired)
            .await
            .map_err(internal)?;
        info!(retired, "expired flowers retired");
    }
    Ok(expired)
}

pub async fn garden_view(ctx: &ApiContext) -> Result<GardenView, ApiError> {
    let now = ctx.now();
    sweep(ctx, now).await?;
    let active = ctx.storage.list_active(now).await.map_err(internal)?;
    let untrimmed = ctx.storage.list_untrimmed(now).await.map_err(internal)?;
    Ok(compose_garden(&active, &untrimmed, now))
}

pub async fn admin_stats(ctx: &ApiContext) -> Result<AdminStats, ApiError> {
    let now = ctx.now();
    Ok(AdminStats {
        total_flowers: ctx.storage.count_flowers().await.map_err(internal)?,
        active_flowers: ctx.storage.count_active(now).await.map_err(internal)?,
        flowers_in_vases: ctx.storage.count_in_vases(now).await.map_err(internal)?,
    })
}

pub fn flower_type_options() -> Vec<FlowerTypeOption> {
    FlowerType::ALL
        .into_iter()
        .map(|kind| FlowerTypeOption {
            value: kind.as_str().to_string(),
            display_name: kind.display_name().to_string(),
            lifespan_days: lifespan_days(kind),
        })
        .collect()
}

pub async fn admin_overview(
    ctx: &ApiContext,
    _session: &AdminSession,
    added_flower_id: Option<FlowerId>,
) -> Result<AdminOverview, ApiError> {
    Ok(AdminOverview {
        stats: admin_stats(ctx).await?,
        flower_types: flower_type_options(),
        added_flower_id,
    })
}

/// Checks the admin password and mints a session token on success.
pub fn admin_login(ctx: &ApiContext, password: &str) -> Result<String, ApiError> {
    if !ctx.credential.verify(password) {
        warn!("admin login rejected");
        return Err(ApiError::new(ErrorCode::Unauthorized, "wrong password"));
    }
    let token = ctx
        .sessions
        .issue(ctx.now())
        .map_err(|e| ApiError::new(ErrorCode::Internal, format!("session mint failed: {e}")))?;
    info!("admin session opened");
    Ok(token)
}

pub fn authorize_admin(ctx: &ApiContext, token: Option<&str>) -> Result<AdminSession, ApiError> {
    token
        .and_then(|token| ctx.sessions.verify(token, ctx.now()))
        .ok_or_else(|| ApiError::new(ErrorCode::Unauthorized, "admin session required"))
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, err.to_string())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
