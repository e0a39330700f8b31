use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use time::OffsetDateTime;
use validator::Validate;

use super::dates;
use super::trainer::Trainer;

pub const DEFAULT_TIME_INTERVAL: i32 = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "grooming_mode")]
pub enum GroomingMode {
    Online,
    Offline,
    #[default]
    #[serde(rename = "Not Scheduled")]
    #[sqlx(rename = "Not Scheduled")]
    NotScheduled,
}

impl GroomingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            GroomingMode::Online => "Online",
            GroomingMode::Offline => "Offline",
            GroomingMode::NotScheduled => "Not Scheduled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundType {
    Telephonic,
    #[serde(rename = "Online Test")]
    OnlineTest,
    Aptitude,
    #[serde(rename = "Technical Written")]
    TechnicalWritten,
    #[serde(rename = "Face to Face")]
    FaceToFace,
    #[serde(rename = "Managerial Round")]
    ManagerialRound,
    #[serde(rename = "HR")]
    Hr,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundStatus {
    #[default]
    Pending,
    Completed,
    Ongoing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewRound {
    pub round_type: Option<RoundType>,
    #[serde(default)]
    pub status: RoundStatus,
    pub remarks: Option<String>,
}

/// Everything about a session except its identity and trainer references.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroomingDetails {
    pub company_name: String,
    #[serde(with = "dates")]
    pub date_of_requirement: OffsetDateTime,
    #[serde(default, with = "dates::option")]
    pub date_of_interview: Option<OffsetDateTime>,
    pub skills: Vec<String>,
    pub subject: Option<String>,
    pub time_interval: i32,
    pub grooming_days: Option<i32>,
    pub mode: GroomingMode,
    pub total_students: i32,
    pub attended_students: Option<i32>,
    pub placed_students: Vec<String>,
    pub rejected_students: Vec<String>,
    pub reasons: Vec<String>,
    pub deal_name: Option<String>,
    pub target_given_by_dt: Option<String>,
    pub position: Option<String>,
    pub no_of_students_schedule: Option<i32>,
    #[serde(rename = "addedByHR")]
    pub added_by_hr: Option<String>,
    pub schedule_update_in_software: bool,
    #[serde(default, with = "dates::option")]
    pub schedule_receive_date_from_dt: Option<OffsetDateTime>,
    #[sqlx(json)]
    pub interview_rounds: Vec<InterviewRound>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grooming {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub trainers: Vec<Uuid>,
    pub subject_trainer: Option<Uuid>,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub details: GroomingDetails,
    #[serde(with = "dates")]
    pub created_at: OffsetDateTime,
    #[serde(with = "dates")]
    pub updated_at: OffsetDateTime,
}

impl Grooming {
    /// Delivering trainers plus the subject trainer, without duplicates.
    pub fn associated_trainers(&self) -> Vec<Uuid> {
        let mut ids = self.trainers.clone();
        if let Some(subject_trainer) = self.subject_trainer {
            ids.push(subject_trainer);
        }
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

/// A session as written to storage.
#[derive(Debug, Clone)]
pub struct NewGrooming {
    pub trainers: Vec<Uuid>,
    pub subject_trainer: Option<Uuid>,
    pub details: GroomingDetails,
}

/// A session with its trainer references expanded to full records.
///
/// References whose trainer has since been deleted are reported in
/// `unresolved_trainers` instead of failing the read.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedGrooming {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub trainers: Vec<Trainer>,
    pub subject_trainer: Option<Trainer>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unresolved_trainers: Vec<Uuid>,
    #[serde(flatten)]
    pub details: GroomingDetails,
    #[serde(with = "dates")]
    pub created_at: OffsetDateTime,
    #[serde(with = "dates")]
    pub updated_at: OffsetDateTime,
}

impl PopulatedGrooming {
    pub fn assemble(grooming: Grooming, known: &HashMap<Uuid, Trainer>) -> Self {
        let mut unresolved_trainers = Vec::new();
        let mut trainers = Vec::with_capacity(grooming.trainers.len());
        for id in &grooming.trainers {
            match known.get(id) {
                Some(trainer) => trainers.push(trainer.clone()),
                None => unresolved_trainers.push(*id),
            }
        }

        let subject_trainer = grooming.subject_trainer.and_then(|id| {
            let found = known.get(&id).cloned();
            if found.is_none() && !unresolved_trainers.contains(&id) {
                unresolved_trainers.push(id);
            }
            found
        });

        Self {
            id: grooming.id,
            trainers,
            subject_trainer,
            unresolved_trainers,
            details: grooming.details,
            created_at: grooming.created_at,
            updated_at: grooming.updated_at,
        }
    }
}

/// Request body for creating or fully replacing a session.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GroomingInput {
    #[validate(length(min = 1))]
    pub company_name: String,
    #[serde(deserialize_with = "dates::deserialize")]
    pub date_of_requirement: OffsetDateTime,
    #[serde(default, deserialize_with = "dates::option::deserialize")]
    pub date_of_interview: Option<OffsetDateTime>,
    pub skills: Vec<String>,
    #[serde(default)]
    pub trainer_names: Vec<String>,
    pub subject: Option<String>,
    pub subject_trainer_name: Option<String>,
    #[validate(range(min = 0))]
    pub grooming_days: Option<i32>,
    #[validate(range(min = 0))]
    pub time_interval: Option<i32>,
    pub mode: Option<GroomingMode>,
    #[validate(range(min = 0))]
    pub total_students: i32,
    #[validate(range(min = 0))]
    pub attended_students: Option<i32>,
    #[serde(default)]
    pub placed_students: Vec<String>,
    #[serde(default)]
    pub rejected_students: Vec<String>,
    #[serde(default)]
    pub reasons: Vec<String>,
    pub deal_name: Option<String>,
    pub target_given_by_dt: Option<String>,
    pub position: Option<String>,
    #[validate(range(min = 0))]
    pub no_of_students_schedule: Option<i32>,
    #[serde(rename = "addedByHR")]
    pub added_by_hr: Option<String>,
    pub schedule_update_in_software: Option<bool>,
    #[serde(default, deserialize_with = "dates::option::deserialize")]
    pub schedule_receive_date_from_dt: Option<OffsetDateTime>,
    #[serde(default)]
    pub interview_rounds: Vec<InterviewRound>,
}

impl GroomingInput {
    /// Non-empty subject trainer name, if one was given.
    pub fn subject_trainer_name(&self) -> Option<&str> {
        self.subject_trainer_name
            .as_deref()
            .filter(|name| !name.is_empty())
    }

    pub fn into_details(self) -> GroomingDetails {
        GroomingDetails {
            company_name: self.company_name,
            date_of_requirement: self.date_of_requirement,
            date_of_interview: self.date_of_interview,
            skills: self.skills,
            subject: self.subject,
            time_interval: self.time_interval.unwrap_or(DEFAULT_TIME_INTERVAL),
            grooming_days: self.grooming_days,
            mode: self.mode.unwrap_or_default(),
            total_students: self.total_students,
            attended_students: self.attended_students,
            placed_students: self.placed_students,
            rejected_students: self.rejected_students,
            reasons: self.reasons,
            deal_name: self.deal_name,
            target_given_by_dt: self.target_given_by_dt,
            position: self.position,
            no_of_students_schedule: self.no_of_students_schedule,
            added_by_hr: self.added_by_hr,
            schedule_update_in_software: self.schedule_update_in_software.unwrap_or(false),
            schedule_receive_date_from_dt: self.schedule_receive_date_from_dt,
            interview_rounds: self.interview_rounds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    fn minimal_body() -> serde_json::Value {
        json!({
            "companyName": "Acme",
            "dateOfRequirement": "2025-10-15",
            "skills": ["Java"],
            "totalStudents": 12
        })
    }

    #[test]
    fn input_defaults_mode_and_interval() {
        let input: GroomingInput = serde_json::from_value(minimal_body()).unwrap();
        let details = input.into_details();
        assert_eq!(details.mode, GroomingMode::NotScheduled);
        assert_eq!(details.time_interval, DEFAULT_TIME_INTERVAL);
        assert!(!details.schedule_update_in_software);
        assert_eq!(details.date_of_requirement, datetime!(2025-10-15 00:00 UTC));
    }

    #[test]
    fn input_reads_wire_names() {
        let mut body = minimal_body();
        body["mode"] = json!("Not Scheduled");
        body["addedByHR"] = json!("Priya");
        body["interviewRounds"] = json!([{ "roundType": "Face to Face", "remarks": "went well" }]);
        let input: GroomingInput = serde_json::from_value(body).unwrap();
        assert_eq!(input.added_by_hr.as_deref(), Some("Priya"));
        assert_eq!(input.interview_rounds[0].round_type, Some(RoundType::FaceToFace));
        assert_eq!(input.interview_rounds[0].status, RoundStatus::Pending);
    }

    #[test]
    fn input_without_required_fields_is_rejected() {
        let body = json!({ "companyName": "Acme", "skills": [] });
        assert!(serde_json::from_value::<GroomingInput>(body).is_err());
    }

    #[test]
    fn empty_subject_trainer_name_counts_as_absent() {
        let mut body = minimal_body();
        body["subjectTrainerName"] = json!("");
        let input: GroomingInput = serde_json::from_value(body).unwrap();
        assert_eq!(input.subject_trainer_name(), None);
    }
}
