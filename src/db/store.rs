//! Storage seams for trainers and grooming sessions.
//!
//! Services only see these traits; PostgreSQL and the in-memory store both
//! implement them.

use async_trait::async_trait;
use sqlx::types::Uuid;
use time::OffsetDateTime;

use super::error::DbResult;
use super::models::{
    Grooming, GroomingDetails, GroomingTaken, NewGrooming, NewTrainer, Trainer, UpdateTrainer,
};

#[async_trait]
pub trait TrainerStore: Send + Sync {
    async fn create_trainer(&self, new_trainer: &NewTrainer) -> DbResult<Trainer>;
    async fn get_trainer_by_id(&self, id: Uuid) -> DbResult<Option<Trainer>>;
    async fn list_trainers(&self) -> DbResult<Vec<Trainer>>;
    async fn find_trainers_by_ids(&self, ids: &[Uuid]) -> DbResult<Vec<Trainer>>;
    /// Exact, case-sensitive name match.
    async fn find_trainers_by_names(&self, names: &[String]) -> DbResult<Vec<Trainer>>;
    /// Case-insensitive substring match on the name.
    async fn find_trainers_by_name_fragment(&self, fragment: &str) -> DbResult<Vec<Trainer>>;
    async fn update_trainer(&self, id: Uuid, update: &UpdateTrainer) -> DbResult<Option<Trainer>>;
    async fn delete_trainer(&self, id: Uuid) -> DbResult<Option<Trainer>>;

    /// Appends `entry` to the trainer's history unless an entry for the same
    /// grooming id is already there. Returns whether a row was appended.
    async fn push_grooming_taken(&self, trainer_id: Uuid, entry: &GroomingTaken) -> DbResult<bool>;

    /// Removes every history entry for `grooming_id` from the given trainers.
    async fn pull_grooming_taken(&self, trainer_ids: &[Uuid], grooming_id: Uuid) -> DbResult<u64>;

    async fn ping(&self) -> DbResult<()>;
}

#[async_trait]
pub trait GroomingStore: Send + Sync {
    async fn create_grooming(&self, new_grooming: &NewGrooming) -> DbResult<Grooming>;
    async fn get_grooming_by_id(&self, id: Uuid) -> DbResult<Option<Grooming>>;
    async fn find_groomings(&self, filter: &GroomingFilter) -> DbResult<Vec<Grooming>>;
    /// Overwrites every stored field of the session.
    async fn replace_grooming(&self, id: Uuid, record: &NewGrooming) -> DbResult<Option<Grooming>>;
    async fn delete_grooming(&self, id: Uuid) -> DbResult<Option<Grooming>>;
}

/// Text fields that `/search` may filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    CompanyName,
    Skills,
    Subject,
    Mode,
    PlacedStudents,
    RejectedStudents,
    Reasons,
    DealName,
    TargetGivenByDt,
    Position,
    AddedByHr,
}

impl SearchField {
    pub fn from_query_key(key: &str) -> Option<Self> {
        let field = match key {
            "companyName" => SearchField::CompanyName,
            "skills" => SearchField::Skills,
            "subject" => SearchField::Subject,
            "mode" => SearchField::Mode,
            "placedStudents" => SearchField::PlacedStudents,
            "rejectedStudents" => SearchField::RejectedStudents,
            "reasons" => SearchField::Reasons,
            "dealName" => SearchField::DealName,
            "targetGivenByDt" => SearchField::TargetGivenByDt,
            "position" => SearchField::Position,
            "addedByHR" => SearchField::AddedByHr,
            _ => return None,
        };
        Some(field)
    }

    pub fn column(self) -> &'static str {
        match self {
            SearchField::CompanyName => "company_name",
            SearchField::Skills => "skills",
            SearchField::Subject => "subject",
            SearchField::Mode => "mode",
            SearchField::PlacedStudents => "placed_students",
            SearchField::RejectedStudents => "rejected_students",
            SearchField::Reasons => "reasons",
            SearchField::DealName => "deal_name",
            SearchField::TargetGivenByDt => "target_given_by_dt",
            SearchField::Position => "position",
            SearchField::AddedByHr => "added_by_hr",
        }
    }

    /// List fields match when any element matches.
    pub fn is_list(self) -> bool {
        matches!(
            self,
            SearchField::Skills
                | SearchField::PlacedStudents
                | SearchField::RejectedStudents
                | SearchField::Reasons
        )
    }

    pub fn values(self, details: &GroomingDetails) -> Vec<&str> {
        fn list(items: &[String]) -> Vec<&str> {
            items.iter().map(String::as_str).collect()
        }

        match self {
            SearchField::CompanyName => vec![details.company_name.as_str()],
            SearchField::Skills => list(&details.skills),
            SearchField::Subject => details.subject.as_deref().into_iter().collect(),
            SearchField::Mode => vec![details.mode.as_str()],
            SearchField::PlacedStudents => list(&details.placed_students),
            SearchField::RejectedStudents => list(&details.rejected_students),
            SearchField::Reasons => list(&details.reasons),
            SearchField::DealName => details.deal_name.as_deref().into_iter().collect(),
            SearchField::TargetGivenByDt => {
                details.target_given_by_dt.as_deref().into_iter().collect()
            }
            SearchField::Position => details.position.as_deref().into_iter().collect(),
            SearchField::AddedByHr => details.added_by_hr.as_deref().into_iter().collect(),
        }
    }
}

/// Conjunction of optional conditions over the session collection.
#[derive(Debug, Clone, Default)]
pub struct GroomingFilter {
    /// `Some(None)` matches sessions recorded without a deal name.
    pub deal_name: Option<Option<String>>,
    /// Matches sessions whose trainer list shares at least one id.
    /// An empty set matches nothing.
    pub any_trainer: Option<Vec<Uuid>>,
    pub subject_trainer: Option<Uuid>,
    pub requirement_from: Option<OffsetDateTime>,
    pub requirement_to: Option<OffsetDateTime>,
    /// Case-insensitive substring conditions.
    pub contains: Vec<(SearchField, String)>,
}

impl GroomingFilter {
    pub fn matches(&self, grooming: &Grooming) -> bool {
        let details = &grooming.details;

        if let Some(deal_name) = &self.deal_name {
            if &details.deal_name != deal_name {
                return false;
            }
        }
        if let Some(ids) = &self.any_trainer {
            if !grooming.trainers.iter().any(|id| ids.contains(id)) {
                return false;
            }
        }
        if let Some(subject_trainer) = self.subject_trainer {
            if grooming.subject_trainer != Some(subject_trainer) {
                return false;
            }
        }
        if let Some(from) = self.requirement_from {
            if details.date_of_requirement < from {
                return false;
            }
        }
        if let Some(to) = self.requirement_to {
            if details.date_of_requirement > to {
                return false;
            }
        }

        self.contains.iter().all(|(field, needle)| {
            let needle = needle.to_lowercase();
            field
                .values(details)
                .iter()
                .any(|value| value.to_lowercase().contains(&needle))
        })
    }
}

/// Escapes `%`, `_` and `\` so user text is matched literally by LIKE.
pub fn like_pattern(fragment: &str) -> String {
    let mut pattern = String::with_capacity(fragment.len() + 2);
    pattern.push('%');
    for ch in fragment.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
