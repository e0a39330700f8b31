use async_trait::async_trait;
use sqlx::types::{Json, Uuid};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::error::DbResult;
use crate::db::models::{Grooming, NewGrooming};
use crate::db::store::{like_pattern, GroomingFilter, GroomingStore};

const GROOMING_COLUMNS: &str = r#"
    id, trainers, subject_trainer, company_name, date_of_requirement, date_of_interview,
    skills, subject, time_interval, grooming_days, mode, total_students, attended_students,
    placed_students, rejected_students, reasons, deal_name, target_given_by_dt, position,
    no_of_students_schedule, added_by_hr, schedule_update_in_software,
    schedule_receive_date_from_dt, interview_rounds, created_at, updated_at
"#;

#[derive(Clone)]
pub struct PgGroomingRepository {
    pool: PgPool,
}

impl PgGroomingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Appends the filter as `AND ...` clauses to a query that already has a
/// `WHERE` clause.
fn push_filter(query: &mut QueryBuilder<'_, Postgres>, filter: &GroomingFilter) {
    match &filter.deal_name {
        Some(Some(deal_name)) => {
            query.push(" AND deal_name = ").push_bind(deal_name.clone());
        }
        Some(None) => {
            query.push(" AND deal_name IS NULL");
        }
        None => {}
    }
    if let Some(ids) = &filter.any_trainer {
        query.push(" AND trainers && ").push_bind(ids.clone());
    }
    if let Some(subject_trainer) = filter.subject_trainer {
        query.push(" AND subject_trainer = ").push_bind(subject_trainer);
    }
    if let Some(from) = filter.requirement_from {
        query.push(" AND date_of_requirement >= ").push_bind(from);
    }
    if let Some(to) = filter.requirement_to {
        query.push(" AND date_of_requirement <= ").push_bind(to);
    }
    for (field, needle) in &filter.contains {
        let column = field.column();
        if field.is_list() {
            query
                .push(format!(" AND EXISTS (SELECT 1 FROM unnest({column}) AS item WHERE item ILIKE "))
                .push_bind(like_pattern(needle))
                .push(")");
        } else {
            query
                .push(format!(" AND {column}::text ILIKE "))
                .push_bind(like_pattern(needle));
        }
    }
}

#[async_trait]
impl GroomingStore for PgGroomingRepository {
    async fn create_grooming(&self, new_grooming: &NewGrooming) -> DbResult<Grooming> {
        let details = &new_grooming.details;
        let grooming = sqlx::query_as::<_, Grooming>(&format!(
            r#"
            INSERT INTO groomings (
                id, trainers, subject_trainer, company_name, date_of_requirement, date_of_interview,
                skills, subject, time_interval, grooming_days, mode, total_students, attended_students,
                placed_students, rejected_students, reasons, deal_name, target_given_by_dt, position,
                no_of_students_schedule, added_by_hr, schedule_update_in_software,
                schedule_receive_date_from_dt, interview_rounds
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                    $18, $19, $20, $21, $22, $23, $24)
            RETURNING {GROOMING_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&new_grooming.trainers)
        .bind(new_grooming.subject_trainer)
        .bind(&details.company_name)
        .bind(details.date_of_requirement)
        .bind(details.date_of_interview)
        .bind(&details.skills)
        .bind(&details.subject)
        .bind(details.time_interval)
        .bind(details.grooming_days)
        .bind(details.mode)
        .bind(details.total_students)
        .bind(details.attended_students)
        .bind(&details.placed_students)
        .bind(&details.rejected_students)
        .bind(&details.reasons)
        .bind(&details.deal_name)
        .bind(&details.target_given_by_dt)
        .bind(&details.position)
        .bind(details.no_of_students_schedule)
        .bind(&details.added_by_hr)
        .bind(details.schedule_update_in_software)
        .bind(details.schedule_receive_date_from_dt)
        .bind(Json(&details.interview_rounds))
        .fetch_one(&self.pool)
        .await?;
        Ok(grooming)
    }

    async fn get_grooming_by_id(&self, id: Uuid) -> DbResult<Option<Grooming>> {
        let grooming = sqlx::query_as::<_, Grooming>(&format!(
            "SELECT {GROOMING_COLUMNS} FROM groomings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(grooming)
    }

    async fn find_groomings(&self, filter: &GroomingFilter) -> DbResult<Vec<Grooming>> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {GROOMING_COLUMNS} FROM groomings WHERE TRUE"
        ));
        push_filter(&mut query, filter);
        query.push(" ORDER BY created_at, id");

        let groomings = query
            .build_query_as::<Grooming>()
            .fetch_all(&self.pool)
            .await?;
        Ok(groomings)
    }

    async fn replace_grooming(&self, id: Uuid, record: &NewGrooming) -> DbResult<Option<Grooming>> {
        let details = &record.details;
        let grooming = sqlx::query_as::<_, Grooming>(&format!(
            r#"
            UPDATE groomings
            SET
                trainers = $2,
                subject_trainer = $3,
                company_name = $4,
                date_of_requirement = $5,
                date_of_interview = $6,
                skills = $7,
                subject = $8,
                time_interval = $9,
                grooming_days = $10,
                mode = $11,
                total_students = $12,
                attended_students = $13,
                placed_students = $14,
                rejected_students = $15,
                reasons = $16,
                deal_name = $17,
                target_given_by_dt = $18,
                position = $19,
                no_of_students_schedule = $20,
                added_by_hr = $21,
                schedule_update_in_software = $22,
                schedule_receive_date_from_dt = $23,
                interview_rounds = $24,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {GROOMING_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&record.trainers)
        .bind(record.subject_trainer)
        .bind(&details.company_name)
        .bind(details.date_of_requirement)
        .bind(details.date_of_interview)
        .bind(&details.skills)
        .bind(&details.subject)
        .bind(details.time_interval)
        .bind(details.grooming_days)
        .bind(details.mode)
        .bind(details.total_students)
        .bind(details.attended_students)
        .bind(&details.placed_students)
        .bind(&details.rejected_students)
        .bind(&details.reasons)
        .bind(&details.deal_name)
        .bind(&details.target_given_by_dt)
        .bind(&details.position)
        .bind(details.no_of_students_schedule)
        .bind(&details.added_by_hr)
        .bind(details.schedule_update_in_software)
        .bind(details.schedule_receive_date_from_dt)
        .bind(Json(&details.interview_rounds))
        .fetch_optional(&self.pool)
        .await?;
        Ok(grooming)
    }

    async fn delete_grooming(&self, id: Uuid) -> DbResult<Option<Grooming>> {
        let grooming = sqlx::query_as::<_, Grooming>(&format!(
            "DELETE FROM groomings WHERE id = $1 RETURNING {GROOMING_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(grooming)
    }
}
