use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use time::OffsetDateTime;
use tracing::instrument;

use crate::db::dates;
use crate::db::{Grooming, GroomingFilter, GroomingStore};
use crate::error::AppResult;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallStats {
    pub total_requirements: u64,
    pub total_groomings_done: u64,
    pub total_companies: u64,
    pub total_placed: f64,
    pub total_rejected: f64,
    pub total_attended: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthStats {
    pub requirements: u64,
    pub groomings_done: u64,
    pub placed: f64,
    pub rejected: f64,
    pub attended: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroomingReport {
    pub overall: OverallStats,
    /// Keyed by `YYYY-MM` of the requirement date.
    pub month_wise: BTreeMap<String, MonthStats>,
    pub all_sessions: Vec<Grooming>,
}

impl GroomingReport {
    pub fn from_groomings(groomings: Vec<Grooming>) -> Self {
        let mut overall = OverallStats::default();
        let mut companies = HashSet::new();
        let mut month_wise: BTreeMap<String, MonthStats> = BTreeMap::new();

        for grooming in &groomings {
            let details = &grooming.details;
            let placed = leading_count(&details.placed_students);
            let rejected = leading_count(&details.rejected_students);
            let attended = i64::from(details.attended_students.unwrap_or(0));
            let done = details.date_of_interview.is_some();

            overall.total_requirements += 1;
            overall.total_groomings_done += u64::from(done);
            overall.total_placed += placed;
            overall.total_rejected += rejected;
            overall.total_attended += attended;
            companies.insert(details.company_name.as_str());

            let month = month_wise
                .entry(dates::month_key(details.date_of_requirement))
                .or_default();
            month.requirements += 1;
            month.groomings_done += u64::from(done);
            month.placed += placed;
            month.rejected += rejected;
            month.attended += attended;
        }
        overall.total_companies = companies.len() as u64;

        Self {
            overall,
            month_wise,
            all_sessions: groomings,
        }
    }
}

/// Reads the first list entry as a head count; the rest of the list is
/// ignored. Missing or non-numeric entries count as zero.
pub fn leading_count(list: &[String]) -> f64 {
    list.first()
        .map(|first| first.trim())
        .filter(|first| !first.is_empty())
        .and_then(parse_count)
        .filter(|count| count.is_finite())
        .unwrap_or(0.0)
}

/// Decimal or exponent notation, plus unsigned `0x`, `0o` and `0b` integers.
fn parse_count(raw: &str) -> Option<f64> {
    let radix = match raw.get(..2) {
        Some("0x" | "0X") => 16,
        Some("0o" | "0O") => 8,
        Some("0b" | "0B") => 2,
        _ => return raw.parse::<f64>().ok(),
    };
    let digits = &raw[2..];
    if digits.starts_with('+') {
        return None;
    }
    u128::from_str_radix(digits, radix)
        .ok()
        .map(|count| count as f64)
}

/// Overall and per-month statistics over the session collection.
#[derive(Clone)]
pub struct ReportAggregator {
    store: Arc<dyn GroomingStore>,
}

impl ReportAggregator {
    pub fn new(store: Arc<dyn GroomingStore>) -> Self {
        Self { store }
    }

    /// Both bounds are optional and inclusive on the requirement date.
    #[instrument(skip(self))]
    pub async fn compute(
        &self,
        start: Option<OffsetDateTime>,
        end: Option<OffsetDateTime>,
    ) -> AppResult<GroomingReport> {
        let filter = GroomingFilter {
            requirement_from: start,
            requirement_to: end,
            ..GroomingFilter::default()
        };
        let groomings = self.store.find_groomings(&filter).await?;
        Ok(GroomingReport::from_groomings(groomings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::db::{GroomingInput, NewGrooming};
    use serde_json::json;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn record(company: &str, date: &str, placed: &[&str], interviewed: bool) -> NewGrooming {
        let mut body = json!({
            "companyName": company,
            "dateOfRequirement": date,
            "skills": ["Java"],
            "totalStudents": 10,
            "attendedStudents": 4,
            "placedStudents": placed,
            "rejectedStudents": ["1", "99"],
        });
        if interviewed {
            body["dateOfInterview"] = json!(date);
        }
        let input: GroomingInput = serde_json::from_value(body).unwrap();
        NewGrooming {
            trainers: Vec::new(),
            subject_trainer: None,
            details: input.into_details(),
        }
    }

    async fn seeded(records: Vec<NewGrooming>) -> ReportAggregator {
        let store = Arc::new(MemoryStore::new());
        for record in &records {
            store.create_grooming(record).await.unwrap();
        }
        ReportAggregator::new(store)
    }

    #[test]
    fn leading_count_reads_only_the_first_entry() {
        assert_eq!(leading_count(&strings(&["3", "100"])), 3.0);
        assert_eq!(leading_count(&strings(&[" 2 "])), 2.0);
        assert_eq!(leading_count(&strings(&["x"])), 0.0);
        assert_eq!(leading_count(&strings(&[""])), 0.0);
        assert_eq!(leading_count(&[]), 0.0);
    }

    #[test]
    fn leading_count_accepts_prefixed_integers() {
        assert_eq!(leading_count(&strings(&["0x10"])), 16.0);
        assert_eq!(leading_count(&strings(&["0o17"])), 15.0);
        assert_eq!(leading_count(&strings(&["0b101"])), 5.0);
        assert_eq!(leading_count(&strings(&["0x"])), 0.0);
        assert_eq!(leading_count(&strings(&["-0x10"])), 0.0);
        assert_eq!(leading_count(&strings(&["0x+10"])), 0.0);
        assert_eq!(leading_count(&strings(&["1e2"])), 100.0);
    }

    #[tokio::test]
    async fn non_numeric_first_entries_count_as_zero() {
        let report = seeded(vec![
            record("Acme", "2025-10-02", &["2"], true),
            record("Acme", "2025-10-10", &["3"], false),
            record("Globex", "2025-10-20", &["x"], true),
        ])
        .await
        .compute(None, None)
        .await
        .unwrap();

        let october = &report.month_wise["2025-10"];
        assert_eq!(october.requirements, 3);
        assert_eq!(october.placed, 5.0);
        assert_eq!(october.rejected, 3.0);
        assert_eq!(october.attended, 12);
        assert_eq!(october.groomings_done, 2);

        assert_eq!(report.overall.total_requirements, 3);
        assert_eq!(report.overall.total_companies, 2);
        assert_eq!(report.overall.total_placed, 5.0);
        assert_eq!(report.overall.total_groomings_done, 2);
        assert_eq!(report.all_sessions.len(), 3);
    }

    #[tokio::test]
    async fn date_range_is_inclusive() {
        let aggregator = seeded(vec![
            record("Acme", "2025-10-01", &["1"], false),
            record("Acme", "2025-10-15", &["1"], false),
            record("Acme", "2025-11-01", &["1"], false),
        ])
        .await;

        let report = aggregator
            .compute(
                Some(dates::parse("2025-10-01").unwrap()),
                Some(dates::parse("2025-10-31").unwrap()),
            )
            .await
            .unwrap();

        assert_eq!(report.overall.total_requirements, 2);
        assert_eq!(report.month_wise.keys().collect::<Vec<_>>(), ["2025-10"]);
    }

    #[tokio::test]
    async fn months_are_bucketed_separately() {
        let report = seeded(vec![
            record("Acme", "2025-09-30", &["1"], false),
            record("Acme", "2025-10-01", &["2"], false),
        ])
        .await
        .compute(None, None)
        .await
        .unwrap();

        let keys: Vec<_> = report.month_wise.keys().cloned().collect();
        assert_eq!(keys, ["2025-09", "2025-10"]);
        assert_eq!(report.month_wise["2025-09"].placed, 1.0);
        assert_eq!(report.month_wise["2025-10"].placed, 2.0);
    }
}
