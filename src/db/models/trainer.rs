use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use time::OffsetDateTime;
use validator::Validate;

use super::dates;

/// One session a trainer worked, cached on the trainer for history lookups.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroomingTaken {
    pub grooming_id: Uuid,
    pub month: Option<String>,
    pub company_name: Option<String>,
    pub subject: Option<String>,
    pub deal_name: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trainer {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub subject: String,
    #[sqlx(skip)]
    #[serde(default)]
    pub grooming_taken: Vec<GroomingTaken>,
    #[serde(with = "dates")]
    pub created_at: OffsetDateTime,
    #[serde(with = "dates")]
    pub updated_at: OffsetDateTime,
}

impl Trainer {
    pub fn has_taken(&self, grooming_id: Uuid) -> bool {
        self.grooming_taken
            .iter()
            .any(|entry| entry.grooming_id == grooming_id)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewTrainer {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub subject: String,
}

/// Fields left out keep their stored value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateTrainer {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    #[validate(length(min = 1))]
    pub subject: Option<String>,
}
