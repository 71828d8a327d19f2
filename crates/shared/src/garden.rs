//! Per-vase display model handed to whatever renders the garden page.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    domain::{Flower, FlowerId, FlowerStatus, FlowerType, VaseId},
    lifecycle::{
        is_active, is_untrimmed, needs_water_change, next_water_change_time, time_remaining,
    },
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowerView {
    pub id: FlowerId,
    pub flower_type: FlowerType,
    pub display_name: String,
    pub status: FlowerStatus,
    pub vase_id: Option<VaseId>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub time_remaining: String,
}

impl FlowerView {
    pub fn new(flower: &Flower, now: DateTime<Utc>) -> Self {
        Self {
            id: flower.id,
            flower_type: flower.flower_type,
            display_name: flower.flower_type.display_name().to_string(),
            status: flower.status,
            vase_id: flower.vase_id,
            created_at: flower.created_at,
            expires_at: flower.expires_at,
            time_remaining: time_remaining(Some(flower.expires_at), now).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaseView {
    pub id: VaseId,
    pub flowers: Vec<FlowerView>,
    pub has_flowers: bool,
    pub needs_water: bool,
    pub next_water_change: Option<DateTime<Utc>>,
    pub water_change_in: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GardenView {
    pub vases: Vec<VaseView>,
    pub untrimmed_flowers: Vec<FlowerView>,
    pub now: DateTime<Utc>,
}

pub fn compose_vase(vase_id: VaseId, active: &[Flower], now: DateTime<Utc>) -> VaseView {
    let in_vase: Vec<&Flower> = active
        .iter()
        .filter(|flower| flower.vase_id == Some(vase_id) && is_active(flower, now))
        .collect();
    let next_water_change = next_water_change_time(in_vase.iter().copied());

    VaseView {
        id: vase_id,
        has_flowers: !in_vase.is_empty(),
        needs_water: needs_water_change(in_vase.iter().copied(), now),
        next_water_change,
        water_change_in: time_remaining(next_water_change, now).to_string(),
        flowers: in_vase
            .into_iter()
            .map(|flower| FlowerView::new(flower, now))
            .collect(),
    }
}

/// Groups `active` flowers into the fixed vase slots. Flowers whose vase is
/// not one of the slots, or that are no longer live at `now`, are left out.
pub fn compose_garden(active: &[Flower], untrimmed: &[Flower], now: DateTime<Utc>) -> GardenView {
    GardenView {
        vases: VaseId::SLOTS
            .into_iter()
            .map(|vase_id| compose_vase(vase_id, active, now))
            .collect(),
        untrimmed_flowers: untrimmed
            .iter()
            .filter(|flower| is_untrimmed(flower, now))
            .map(|flower| FlowerView::new(flower, now))
            .collect(),
        now,
    }
}

#[cfg(test)]
#[path = "tests/garden_tests.rs"]
mod tests;
