use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(FlowerId);
id_newtype!(VaseId);

impl VaseId {
    /// The fixed vase slots on the shelf, in display order.
    pub const SLOTS: [VaseId; 3] = [VaseId(1), VaseId(2), VaseId(3)];

    pub fn slot(raw: i64) -> Option<Self> {
        let vase = Self(raw);
        vase.is_slot().then_some(vase)
    }

    pub fn is_slot(self) -> bool {
        Self::SLOTS.contains(&self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowerType {
    Peony,
    Tulip,
    Alstroemeria,
    Chrysanthemum,
    Lily,
}

impl FlowerType {
    pub const ALL: [FlowerType; 5] = [
        FlowerType::Peony,
        FlowerType::Tulip,
        FlowerType::Alstroemeria,
        FlowerType::Chrysanthemum,
        FlowerType::Lily,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FlowerType::Peony => "peony",
            FlowerType::Tulip => "tulip",
            FlowerType::Alstroemeria => "alstroemeria",
            FlowerType::Chrysanthemum => "chrysanthemum",
            FlowerType::Lily => "lily",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            FlowerType::Peony => "Peonies",
            FlowerType::Tulip => "Tulips",
            FlowerType::Alstroemeria => "Alstroemerias",
            FlowerType::Chrysanthemum => "Chrysanthemums",
            FlowerType::Lily => "Lilies",
        }
    }
}

impl fmt::Display for FlowerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown flower type '{0}'")]
pub struct UnknownFlowerType(pub String);

impl FromStr for FlowerType {
    type Err = UnknownFlowerType;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == raw)
            .ok_or_else(|| UnknownFlowerType(raw.to_string()))
    }
}

/// Forward-only freshness state: `new -> trimmed -> expired`, or `new -> expired`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowerStatus {
    New,
    Trimmed,
    Expired,
}

impl FlowerStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FlowerStatus::New => "new",
            FlowerStatus::Trimmed => "trimmed",
            FlowerStatus::Expired => "expired",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "new" => Some(FlowerStatus::New),
            "trimmed" => Some(FlowerStatus::Trimmed),
            "expired" => Some(FlowerStatus::Expired),
            _ => None,
        }
    }

    pub fn can_transition_to(self, next: FlowerStatus) -> bool {
        matches!(
            (self, next),
            (FlowerStatus::New, FlowerStatus::Trimmed)
                | (FlowerStatus::New, FlowerStatus::Expired)
                | (FlowerStatus::Trimmed, FlowerStatus::Expired)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flower {
    pub id: FlowerId,
    pub flower_type: FlowerType,
    pub vase_id: Option<VaseId>,
    pub status: FlowerStatus,
    pub trimmed_at: Option<DateTime<Utc>>,
    pub water_changed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
