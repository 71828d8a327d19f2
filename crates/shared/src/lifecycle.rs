//! Derived freshness state for flowers and vases.
//!
//! Nothing here reads the wall clock: every function takes `now` explicitly, so
//! callers decide what "now" means (the request clock in the server, a fixed
//! instant in tests).

use std::fmt;

use chrono::{DateTime, Duration, Utc};

use crate::domain::{Flower, FlowerId, FlowerStatus, FlowerType};

pub const WATER_CHANGE_INTERVAL_HOURS: i64 = 24;

pub fn lifespan_days(flower_type: FlowerType) -> i64 {
    match flower_type {
        FlowerType::Peony => 5,
        FlowerType::Tulip => 7,
        FlowerType::Alstroemeria => 10,
        FlowerType::Chrysanthemum => 14,
        FlowerType::Lily => 8,
    }
}

pub fn lifespan(flower_type: FlowerType) -> Duration {
    Duration::days(lifespan_days(flower_type))
}

pub fn expires_at(flower_type: FlowerType, created_at: DateTime<Utc>) -> DateTime<Utc> {
    created_at + lifespan(flower_type)
}

pub fn water_change_interval() -> Duration {
    Duration::hours(WATER_CHANGE_INTERVAL_HOURS)
}

pub fn is_active(flower: &Flower, now: DateTime<Utc>) -> bool {
    flower.status != FlowerStatus::Expired && flower.expires_at > now
}

pub fn is_untrimmed(flower: &Flower, now: DateTime<Utc>) -> bool {
    flower.status == FlowerStatus::New && flower.expires_at > now
}

/// The instant the flower's water was last known fresh.
pub fn last_watered_at(flower: &Flower) -> DateTime<Utc> {
    flower
        .water_changed_at
        .or(flower.trimmed_at)
        .unwrap_or(flower.created_at)
}

/// Earliest water reference among the trimmed flowers of one vase, plus the
/// fixed interval. `None` when the vase holds no trimmed flower.
pub fn next_water_change_time<'a, I>(vase: I) -> Option<DateTime<Utc>>
where
    I: IntoIterator<Item = &'a Flower>,
{
    vase.into_iter()
        .filter(|flower| flower.status == FlowerStatus::Trimmed)
        .map(last_watered_at)
        .min()
        .map(|earliest| earliest + water_change_interval())
}

pub fn needs_water_change<'a, I>(vase: I, now: DateTime<Utc>) -> bool
where
    I: IntoIterator<Item = &'a Flower>,
{
    next_water_change_time(vase).is_some_and(|due| now >= due)
}

/// Ids of flowers past their expiry that have not been retired yet.
pub fn sweep_expired<'a, I>(flowers: I, now: DateTime<Utc>) -> Vec<FlowerId>
where
    I: IntoIterator<Item = &'a Flower>,
{
    flowers
        .into_iter()
        .filter(|flower| {
            flower.status.can_transition_to(FlowerStatus::Expired) && flower.expires_at <= now
        })
        .map(|flower| flower.id)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRemaining {
    NoData,
    Expired,
    Left(Duration),
}

impl fmt::Display for TimeRemaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeRemaining::NoData => f.write_str("no data"),
            TimeRemaining::Expired => f.write_str("expired"),
            TimeRemaining::Left(left) => {
                let total_seconds = left.num_seconds();
                let days = total_seconds / 86_400;
                let hours = (total_seconds % 86_400) / 3_600;
                let minutes = (total_seconds % 3_600) / 60;
                if days > 0 {
                    write!(f, "{days}d {hours}h")
                } else {
                    write!(f, "{hours}h {minutes}m")
                }
            }
        }
    }
}

pub fn time_remaining(target: Option<DateTime<Utc>>, now: DateTime<Utc>) -> TimeRemaining {
    match target {
        None => TimeRemaining::NoData,
        Some(target) if now >= target => TimeRemaining::Expired,
        Some(target) => TimeRemaining::Left(target - now),
    }
}

#[cfg(test)]
#[path = "tests/lifecycle_tests.rs"]
mod tests;
