use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::types::Uuid;
use sqlx::PgPool;

use crate::db::error::DbResult;
use crate::db::models::{GroomingTaken, NewTrainer, Trainer, UpdateTrainer};
use crate::db::store::{like_pattern, TrainerStore};

const TRAINER_COLUMNS: &str = "id, name, subject, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct GroomingTakenRow {
    trainer_id: Uuid,
    #[sqlx(flatten)]
    entry: GroomingTaken,
}

#[derive(Clone)]
pub struct PgTrainerRepository {
    pool: PgPool,
}

impl PgTrainerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads the session history of every trainer in `trainers`.
    async fn with_history(&self, mut trainers: Vec<Trainer>) -> DbResult<Vec<Trainer>> {
        if trainers.is_empty() {
            return Ok(trainers);
        }

        let ids: Vec<Uuid> = trainers.iter().map(|t| t.id).collect();
        let rows = sqlx::query_as::<_, GroomingTakenRow>(
            r#"
            SELECT trainer_id, grooming_id, month, company_name, subject, deal_name
            FROM trainer_grooming_taken
            WHERE trainer_id = ANY($1)
            ORDER BY seq
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut history: HashMap<Uuid, Vec<GroomingTaken>> = HashMap::new();
        for row in rows {
            history.entry(row.trainer_id).or_default().push(row.entry);
        }
        for trainer in &mut trainers {
            trainer.grooming_taken = history.remove(&trainer.id).unwrap_or_default();
        }

        Ok(trainers)
    }

    async fn with_history_one(&self, trainer: Option<Trainer>) -> DbResult<Option<Trainer>> {
        match trainer {
            Some(trainer) => Ok(self.with_history(vec![trainer]).await?.pop()),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl TrainerStore for PgTrainerRepository {
    async fn create_trainer(&self, new_trainer: &NewTrainer) -> DbResult<Trainer> {
        let trainer = sqlx::query_as::<_, Trainer>(&format!(
            "INSERT INTO trainers (id, name, subject) VALUES ($1, $2, $3) RETURNING {TRAINER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&new_trainer.name)
        .bind(&new_trainer.subject)
        .fetch_one(&self.pool)
        .await?;
        Ok(trainer)
    }

    async fn get_trainer_by_id(&self, id: Uuid) -> DbResult<Option<Trainer>> {
        let trainer = sqlx::query_as::<_, Trainer>(&format!(
            "SELECT {TRAINER_COLUMNS} FROM trainers WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        self.with_history_one(trainer).await
    }

    async fn list_trainers(&self) -> DbResult<Vec<Trainer>> {
        let trainers = sqlx::query_as::<_, Trainer>(&format!(
            "SELECT {TRAINER_COLUMNS} FROM trainers ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;
        self.with_history(trainers).await
    }

    async fn find_trainers_by_ids(&self, ids: &[Uuid]) -> DbResult<Vec<Trainer>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let trainers = sqlx::query_as::<_, Trainer>(&format!(
            "SELECT {TRAINER_COLUMNS} FROM trainers WHERE id = ANY($1) ORDER BY created_at, id"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        self.with_history(trainers).await
    }

    async fn find_trainers_by_names(&self, names: &[String]) -> DbResult<Vec<Trainer>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let trainers = sqlx::query_as::<_, Trainer>(&format!(
            "SELECT {TRAINER_COLUMNS} FROM trainers WHERE name = ANY($1) ORDER BY created_at, id"
        ))
        .bind(names)
        .fetch_all(&self.pool)
        .await?;
        self.with_history(trainers).await
    }

    async fn find_trainers_by_name_fragment(&self, fragment: &str) -> DbResult<Vec<Trainer>> {
        let trainers = sqlx::query_as::<_, Trainer>(&format!(
            "SELECT {TRAINER_COLUMNS} FROM trainers WHERE name ILIKE $1 ORDER BY created_at, id"
        ))
        .bind(like_pattern(fragment))
        .fetch_all(&self.pool)
        .await?;
        self.with_history(trainers).await
    }

    async fn update_trainer(&self, id: Uuid, update: &UpdateTrainer) -> DbResult<Option<Trainer>> {
        let trainer = sqlx::query_as::<_, Trainer>(&format!(
            r#"
            UPDATE trainers
            SET
                name = COALESCE($1, name),
                subject = COALESCE($2, subject),
                updated_at = NOW()
            WHERE id = $3
            RETURNING {TRAINER_COLUMNS}
            "#
        ))
        .bind(&update.name)
        .bind(&update.subject)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        self.with_history_one(trainer).await
    }

    async fn delete_trainer(&self, id: Uuid) -> DbResult<Option<Trainer>> {
        let Some(trainer) = self.get_trainer_by_id(id).await? else {
            return Ok(None);
        };
        let deleted = sqlx::query("DELETE FROM trainers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok((deleted.rows_affected() > 0).then_some(trainer))
    }

    async fn push_grooming_taken(&self, trainer_id: Uuid, entry: &GroomingTaken) -> DbResult<bool> {
        // Selecting from trainers keeps a push to a deleted trainer a no-op
        // instead of a foreign key violation.
        let result = sqlx::query(
            r#"
            INSERT INTO trainer_grooming_taken
                (trainer_id, grooming_id, month, company_name, subject, deal_name)
            SELECT id, $2, $3, $4, $5, $6 FROM trainers WHERE id = $1
            ON CONFLICT (trainer_id, grooming_id) DO NOTHING
            "#,
        )
        .bind(trainer_id)
        .bind(entry.grooming_id)
        .bind(&entry.month)
        .bind(&entry.company_name)
        .bind(&entry.subject)
        .bind(&entry.deal_name)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn pull_grooming_taken(&self, trainer_ids: &[Uuid], grooming_id: Uuid) -> DbResult<u64> {
        if trainer_ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            "DELETE FROM trainer_grooming_taken WHERE grooming_id = $1 AND trainer_id = ANY($2)",
        )
        .bind(grooming_id)
        .bind(trainer_ids)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> DbResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
