//! Session lifecycle and trainer history propagation.
//!
//! Every mutation runs in three steps: resolve and validate (any failure
//! aborts the request), write the session record, then bring each affected
//! trainer's `groomingTaken` history in line with it. The steps are not
//! atomic. History updates are applied trainer by trainer; a failure there
//! is logged and the request still succeeds, leaving that trainer's history
//! stale until the session is written again.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use sqlx::types::Uuid;
use tracing::{debug, error, info, instrument, warn};

use crate::db::dates;
use crate::db::{
    Grooming, GroomingFilter, GroomingInput, GroomingStore, GroomingTaken, NewGrooming,
    PopulatedGrooming, SearchField, Trainer,
};
use crate::error::{AppError, AppResult};
use crate::modules::trainers::TrainerDirectory;

#[derive(Clone)]
pub struct GroomingService {
    store: Arc<dyn GroomingStore>,
    directory: TrainerDirectory,
}

impl GroomingService {
    pub fn new(store: Arc<dyn GroomingStore>, directory: TrainerDirectory) -> Self {
        Self { store, directory }
    }

    /// Creates a session for the named trainers and records it in their
    /// histories.
    ///
    /// The subject trainer's name is resolved together with the delivering
    /// trainers, so a subject trainer always ends up in the session's trainer
    /// list and receives a history entry.
    #[instrument(skip_all, fields(company = %input.company_name, deal = ?input.deal_name))]
    pub async fn create(&self, input: GroomingInput) -> AppResult<PopulatedGrooming> {
        let names = distinct_names(
            input
                .trainer_names
                .iter()
                .map(String::as_str)
                .chain(input.subject_trainer_name()),
        );
        let resolved = self.directory.resolve_names(&names).await?;
        if resolved.is_empty() {
            return Err(AppError::UnknownTrainers(
                "No matching trainers found.".to_string(),
            ));
        }

        let trainer_ids: Vec<Uuid> = resolved.iter().map(|t| t.id).collect();
        let subject_trainer = input
            .subject_trainer_name()
            .and_then(|name| resolved.iter().find(|t| t.name == name))
            .map(|t| t.id);

        self.ensure_deal_is_free(input.deal_name.as_deref(), &trainer_ids)
            .await?;

        let record = NewGrooming {
            trainers: trainer_ids,
            subject_trainer,
            details: input.into_details(),
        };
        let grooming = self.store.create_grooming(&record).await?;
        info!(grooming_id = %grooming.id, trainers = grooming.trainers.len(), "Grooming session created");

        self.record_in_histories(&grooming).await;
        self.populate(grooming).await
    }

    /// Replaces every field of a session and re-syncs trainer histories.
    ///
    /// Only `trainerNames` decide the new trainer list. The subject trainer is
    /// looked up across the whole directory and is not given a history entry
    /// unless also named in `trainerNames`.
    #[instrument(skip(self, input), fields(company = %input.company_name))]
    pub async fn update(&self, id: Uuid, input: GroomingInput) -> AppResult<PopulatedGrooming> {
        let previous = self
            .store
            .get_grooming_by_id(id)
            .await?
            .ok_or_else(grooming_not_found)?;

        let names = distinct_names(input.trainer_names.iter().map(String::as_str));
        let trainer_ids: Vec<Uuid> = self
            .directory
            .resolve_names(&names)
            .await?
            .iter()
            .map(|t| t.id)
            .collect();
        let subject_trainer = match input.subject_trainer_name() {
            Some(name) => self.directory.first_named(name).await?.map(|t| t.id),
            None => None,
        };

        let record = NewGrooming {
            trainers: trainer_ids,
            subject_trainer,
            details: input.into_details(),
        };
        let grooming = self
            .store
            .replace_grooming(id, &record)
            .await?
            .ok_or_else(grooming_not_found)?;
        info!(grooming_id = %id, trainers = grooming.trainers.len(), "Grooming session replaced");

        self.forget_in_histories(id, &previous.associated_trainers())
            .await;
        self.record_in_histories(&grooming).await;
        self.populate(grooming).await
    }

    /// Deletes a session and drops it from every associated trainer's history.
    /// Returns the record as it was before deletion.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> AppResult<Grooming> {
        let grooming = self
            .store
            .delete_grooming(id)
            .await?
            .ok_or_else(grooming_not_found)?;
        info!(grooming_id = %id, "Grooming session deleted");

        self.forget_in_histories(id, &grooming.associated_trainers())
            .await;
        Ok(grooming)
    }

    pub async fn list(&self) -> AppResult<Vec<PopulatedGrooming>> {
        let groomings = self.store.find_groomings(&GroomingFilter::default()).await?;
        self.populate_all(groomings).await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<PopulatedGrooming> {
        let grooming = self
            .store
            .get_grooming_by_id(id)
            .await?
            .ok_or_else(grooming_not_found)?;
        self.populate(grooming).await
    }

    /// Field-by-field search.
    ///
    /// `trainerName` keeps sessions delivered by any trainer whose name
    /// contains the value; `subjectTrainerName` keeps sessions whose subject
    /// trainer is the first such match, and is ignored when nothing matches.
    /// Every other key is a case-insensitive substring match on that field.
    #[instrument(skip(self))]
    pub async fn search(&self, params: &BTreeMap<String, String>) -> AppResult<Vec<PopulatedGrooming>> {
        let mut filter = GroomingFilter::default();

        for (key, value) in params {
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                "trainerName" => {
                    let ids = self
                        .directory
                        .matching(value)
                        .await?
                        .iter()
                        .map(|t| t.id)
                        .collect();
                    filter.any_trainer = Some(ids);
                }
                "subjectTrainerName" => {
                    match self.directory.matching(value).await?.first() {
                        Some(trainer) => filter.subject_trainer = Some(trainer.id),
                        None => debug!(name = %value, "No subject trainer matched, filter ignored"),
                    }
                }
                other => {
                    let field = SearchField::from_query_key(other).ok_or_else(|| {
                        AppError::Validation(format!("Unsupported search field '{other}'"))
                    })?;
                    filter.contains.push((field, value.clone()));
                }
            }
        }

        let groomings = self.store.find_groomings(&filter).await?;
        if groomings.is_empty() {
            return Err(AppError::NotFound(
                "No matching grooming sessions found".to_string(),
            ));
        }
        self.populate_all(groomings).await
    }

    /// A missing deal name collides with sessions that also have none.
    async fn ensure_deal_is_free(
        &self,
        deal_name: Option<&str>,
        trainer_ids: &[Uuid],
    ) -> AppResult<()> {
        let filter = GroomingFilter {
            deal_name: Some(deal_name.map(str::to_string)),
            any_trainer: Some(trainer_ids.to_vec()),
            ..GroomingFilter::default()
        };
        let existing = self.store.find_groomings(&filter).await?;
        if existing.is_empty() {
            return Ok(());
        }

        warn!(deal = ?deal_name, existing = existing.len(), "Duplicate deal for selected trainers");
        Err(AppError::Conflict(format!(
            "Grooming for deal '{}' already exists for one or more selected trainers.",
            deal_name.unwrap_or_default()
        )))
    }

    /// Appends the session to each of its trainers' histories, skipping
    /// trainers that already list it.
    async fn record_in_histories(&self, grooming: &Grooming) {
        let entry = history_entry(grooming);
        for trainer_id in &grooming.trainers {
            match self.directory.record_grooming(*trainer_id, &entry).await {
                Ok(true) => {}
                Ok(false) => debug!(%trainer_id, grooming_id = %grooming.id, "History entry already present or trainer missing"),
                Err(err) => error!(%trainer_id, grooming_id = %grooming.id, error = %err, "Failed to record grooming in trainer history"),
            }
        }
    }

    async fn forget_in_histories(&self, grooming_id: Uuid, trainer_ids: &[Uuid]) {
        if trainer_ids.is_empty() {
            return;
        }
        match self.directory.forget_grooming(trainer_ids, grooming_id).await {
            Ok(removed) => debug!(%grooming_id, removed, "Removed grooming from trainer histories"),
            Err(err) => error!(%grooming_id, error = %err, "Failed to remove grooming from trainer histories"),
        }
    }

    async fn populate(&self, grooming: Grooming) -> AppResult<PopulatedGrooming> {
        let mut populated = self.populate_all(vec![grooming]).await?;
        populated.pop().ok_or_else(grooming_not_found)
    }

    async fn populate_all(&self, groomings: Vec<Grooming>) -> AppResult<Vec<PopulatedGrooming>> {
        let mut ids: Vec<Uuid> = groomings
            .iter()
            .flat_map(|g| g.associated_trainers())
            .collect();
        ids.sort_unstable();
        ids.dedup();

        let known: HashMap<Uuid, Trainer> = self
            .directory
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|t| (t.id, t))
            .collect();

        Ok(groomings
            .into_iter()
            .map(|g| {
                let populated = PopulatedGrooming::assemble(g, &known);
                if !populated.unresolved_trainers.is_empty() {
                    warn!(grooming_id = %populated.id, missing = ?populated.unresolved_trainers, "Session references deleted trainers");
                }
                populated
            })
            .collect())
    }
}

fn history_entry(grooming: &Grooming) -> GroomingTaken {
    let details = &grooming.details;
    GroomingTaken {
        grooming_id: grooming.id,
        month: Some(dates::month_label(details.date_of_requirement)),
        company_name: Some(details.company_name.clone()),
        subject: details.subject.clone(),
        deal_name: details.deal_name.clone(),
    }
}

/// Non-empty names in first-seen order, without repeats.
fn distinct_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut distinct: Vec<String> = Vec::new();
    for name in names {
        if !name.is_empty() && !distinct.iter().any(|seen| seen == name) {
            distinct.push(name.to_string());
        }
    }
    distinct
}

fn grooming_not_found() -> AppError {
    AppError::NotFound("Grooming session not found".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::db::NewTrainer;
    use serde_json::json;

    struct Fixture {
        service: GroomingService,
        directory: TrainerDirectory,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let directory = TrainerDirectory::new(store.clone());
        Fixture {
            service: GroomingService::new(store, directory.clone()),
            directory,
        }
    }

    impl Fixture {
        async fn trainer(&self, name: &str) -> Trainer {
            self.directory
                .create(&NewTrainer {
                    name: name.to_string(),
                    subject: "Java".to_string(),
                })
                .await
                .unwrap()
        }

        async fn history(&self, id: Uuid) -> Vec<GroomingTaken> {
            self.directory.get(id).await.unwrap().grooming_taken
        }
    }

    fn input(deal: &str, trainers: &[&str]) -> GroomingInput {
        serde_json::from_value(json!({
            "companyName": "Acme",
            "dateOfRequirement": "2025-10-15",
            "skills": ["Java", "SQL"],
            "trainerNames": trainers,
            "subject": "Backend",
            "totalStudents": 20,
            "dealName": deal,
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn create_records_one_history_entry_per_trainer() {
        let fx = fixture();
        let alice = fx.trainer("Alice").await;
        let bob = fx.trainer("Bob").await;

        let grooming = fx.service.create(input("Deal1", &["Alice", "Bob", "Alice"])).await.unwrap();

        let mut ids: Vec<_> = grooming.trainers.iter().map(|t| t.id).collect();
        ids.sort();
        let mut expected = vec![alice.id, bob.id];
        expected.sort();
        assert_eq!(ids, expected);

        for trainer in [&alice, &bob] {
            let history = fx.history(trainer.id).await;
            assert_eq!(history.len(), 1);
            assert_eq!(history[0].grooming_id, grooming.id);
            assert_eq!(history[0].month.as_deref(), Some("October 2025"));
            assert_eq!(history[0].company_name.as_deref(), Some("Acme"));
            assert_eq!(history[0].deal_name.as_deref(), Some("Deal1"));
        }
    }

    #[tokio::test]
    async fn create_without_known_trainers_fails() {
        let fx = fixture();
        let err = fx.service.create(input("Deal1", &["Nobody"])).await.unwrap_err();
        assert!(matches!(err, AppError::UnknownTrainers(_)));

        let err = fx.service.create(input("Deal1", &[])).await.unwrap_err();
        assert!(matches!(err, AppError::UnknownTrainers(_)));
    }

    #[tokio::test]
    async fn duplicate_deal_for_same_trainer_conflicts() {
        let fx = fixture();
        fx.trainer("Alice").await;
        fx.trainer("Bob").await;

        fx.service.create(input("Deal1", &["Alice"])).await.unwrap();

        let err = fx.service.create(input("Deal1", &["Alice"])).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        fx.service.create(input("Deal1", &["Bob"])).await.unwrap();
        fx.service.create(input("Deal2", &["Alice"])).await.unwrap();
    }

    #[tokio::test]
    async fn missing_deal_name_conflicts_with_other_deal_less_sessions() {
        let fx = fixture();
        fx.trainer("Alice").await;
        fx.trainer("Bob").await;

        let mut first = input("", &["Alice"]);
        first.deal_name = None;
        fx.service.create(first).await.unwrap();

        let mut second = input("", &["Alice"]);
        second.deal_name = None;
        let err = fx.service.create(second).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let mut other_trainer = input("", &["Bob"]);
        other_trainer.deal_name = None;
        fx.service.create(other_trainer).await.unwrap();
        fx.service.create(input("Deal1", &["Alice"])).await.unwrap();
    }

    #[tokio::test]
    async fn create_includes_subject_trainer_in_trainer_list() {
        let fx = fixture();
        let alice = fx.trainer("Alice").await;
        let carol = fx.trainer("Carol").await;

        let mut body = input("Deal1", &["Alice"]);
        body.subject_trainer_name = Some("Carol".to_string());
        let grooming = fx.service.create(body).await.unwrap();

        assert_eq!(grooming.subject_trainer.as_ref().map(|t| t.id), Some(carol.id));
        assert_eq!(grooming.trainers.len(), 2);
        assert_eq!(fx.history(alice.id).await.len(), 1);
        assert_eq!(fx.history(carol.id).await.len(), 1);
    }

    #[tokio::test]
    async fn update_moves_history_between_trainers() {
        let fx = fixture();
        let alice = fx.trainer("Alice").await;
        let bob = fx.trainer("Bob").await;
        let carol = fx.trainer("Carol").await;

        let created = fx.service.create(input("Deal1", &["Alice", "Bob"])).await.unwrap();

        let mut replacement = input("Deal9", &["Bob", "Carol"]);
        replacement.company_name = "Globex".to_string();
        replacement.date_of_requirement = dates::parse("2025-11-02").unwrap();
        let updated = fx.service.update(created.id, replacement).await.unwrap();

        assert!(fx.history(alice.id).await.is_empty());
        for trainer in [&bob, &carol] {
            let history = fx.history(trainer.id).await;
            assert_eq!(history.len(), 1);
            assert_eq!(history[0].grooming_id, updated.id);
            assert_eq!(history[0].company_name.as_deref(), Some("Globex"));
            assert_eq!(history[0].month.as_deref(), Some("November 2025"));
            assert_eq!(history[0].deal_name.as_deref(), Some("Deal9"));
        }
    }

    #[tokio::test]
    async fn update_resolves_subject_trainer_without_history_entry() {
        let fx = fixture();
        let alice = fx.trainer("Alice").await;
        let dana = fx.trainer("Dana").await;

        let created = fx.service.create(input("Deal1", &["Alice"])).await.unwrap();

        let mut replacement = input("Deal1", &["Alice"]);
        replacement.subject_trainer_name = Some("Dana".to_string());
        let updated = fx.service.update(created.id, replacement).await.unwrap();

        assert_eq!(updated.subject_trainer.as_ref().map(|t| t.id), Some(dana.id));
        assert_eq!(updated.trainers.len(), 1);
        assert_eq!(fx.history(alice.id).await.len(), 1);
        assert!(fx.history(dana.id).await.is_empty());
    }

    #[tokio::test]
    async fn update_clears_previous_subject_trainer_history() {
        let fx = fixture();
        let alice = fx.trainer("Alice").await;
        let carol = fx.trainer("Carol").await;

        let mut body = input("Deal1", &["Alice"]);
        body.subject_trainer_name = Some("Carol".to_string());
        let created = fx.service.create(body).await.unwrap();
        assert_eq!(fx.history(carol.id).await.len(), 1);

        fx.service.update(created.id, input("Deal1", &["Alice"])).await.unwrap();

        assert!(fx.history(carol.id).await.is_empty());
        assert_eq!(fx.history(alice.id).await.len(), 1);
    }

    #[tokio::test]
    async fn update_of_missing_session_is_not_found() {
        let fx = fixture();
        fx.trainer("Alice").await;
        let err = fx
            .service
            .update(Uuid::new_v4(), input("Deal1", &["Alice"]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_removes_every_reference() {
        let fx = fixture();
        let alice = fx.trainer("Alice").await;
        let bob = fx.trainer("Bob").await;

        let keep = fx.service.create(input("Deal1", &["Alice"])).await.unwrap();
        let gone = fx.service.create(input("Deal2", &["Alice", "Bob"])).await.unwrap();

        let snapshot = fx.service.delete(gone.id).await.unwrap();
        assert_eq!(snapshot.id, gone.id);

        let alice_history = fx.history(alice.id).await;
        assert_eq!(alice_history.len(), 1);
        assert_eq!(alice_history[0].grooming_id, keep.id);
        assert!(fx.history(bob.id).await.is_empty());

        let err = fx.service.get(gone.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn deleted_trainer_shows_as_unresolved() {
        let fx = fixture();
        let alice = fx.trainer("Alice").await;
        fx.trainer("Bob").await;

        let created = fx.service.create(input("Deal1", &["Alice", "Bob"])).await.unwrap();
        fx.directory.delete(alice.id).await.unwrap();

        let fetched = fx.service.get(created.id).await.unwrap();
        assert_eq!(fetched.trainers.len(), 1);
        assert_eq!(fetched.unresolved_trainers, vec![alice.id]);
    }

    #[tokio::test]
    async fn search_by_trainer_fragment() {
        let fx = fixture();
        fx.trainer("Alice").await;
        fx.trainer("Bob").await;

        let by_alice = fx.service.create(input("Deal1", &["Alice"])).await.unwrap();
        fx.service.create(input("Deal2", &["Bob"])).await.unwrap();

        let params = BTreeMap::from([("trainerName".to_string(), "ali".to_string())]);
        let found = fx.service.search(&params).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, by_alice.id);

        let params = BTreeMap::from([("trainerName".to_string(), "zed".to_string())]);
        let err = fx.service.search(&params).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn search_by_subject_trainer_fragment() {
        let fx = fixture();
        fx.trainer("Bob").await;
        let carol = fx.trainer("Carol").await;

        let mut with_subject = input("Deal1", &["Bob"]);
        with_subject.subject_trainer_name = Some("Carol".to_string());
        let with_subject = fx.service.create(with_subject).await.unwrap();
        fx.service.create(input("Deal2", &["Bob"])).await.unwrap();

        let params = BTreeMap::from([("subjectTrainerName".to_string(), "CAR".to_string())]);
        let found = fx.service.search(&params).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, with_subject.id);
        assert_eq!(found[0].subject_trainer.as_ref().map(|t| t.id), Some(carol.id));

        let params = BTreeMap::from([("subjectTrainerName".to_string(), "zed".to_string())]);
        let found = fx.service.search(&params).await.unwrap();
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn search_by_text_fields_ignores_case() {
        let fx = fixture();
        fx.trainer("Alice").await;
        let created = fx.service.create(input("Deal1", &["Alice"])).await.unwrap();

        let params = BTreeMap::from([
            ("companyName".to_string(), "acm".to_string()),
            ("skills".to_string(), "sql".to_string()),
        ]);
        let found = fx.service.search(&params).await.unwrap();
        assert_eq!(found[0].id, created.id);

        let params = BTreeMap::from([("totalStudents".to_string(), "20".to_string())]);
        let err = fx.service.search(&params).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn distinct_names_drop_blanks_and_repeats() {
        let names = distinct_names(["Alice", "", "Bob", "Alice"]);
        assert_eq!(names, ["Alice", "Bob"]);
    }
}
