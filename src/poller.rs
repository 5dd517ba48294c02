//! Poll loop — query the library, write a note for each new completed book,
//! sleep, repeat.
//!
//! State lives in the `Poller` (the `ProcessedSet`), not in globals, and each
//! record yields its own `RecordOutcome`: a failure is logged and the loop
//! moves on. A failed record is not marked processed, so it is retried on the
//! next cycle. Nothing is persisted: a restart forgets what was processed.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use crate::config::Settings;
use crate::notion::{NotionApi, SourceRecord};
use crate::processing::summarizer::SummaryGenerator;
use crate::shutdown::Shutdown;
use crate::{reader, writer, NoteError, NoteResult};

/// Source ids already turned into a note during this process lifetime.
#[derive(Debug, Default, Clone)]
pub struct ProcessedSet {
    ids: HashSet<String>,
}

impl ProcessedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Returns `false` if the id was already present.
    pub fn insert(&mut self, id: &str) -> bool {
        self.ids.insert(id.to_string())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[derive(Debug)]
pub enum RecordOutcome {
    /// A note page exists. `append_error` is set when its body is truncated;
    /// the id is still marked processed so no second page is created.
    Created {
        source_id: String,
        title: String,
        note_id: String,
        append_error: Option<NoteError>,
    },
    AlreadyProcessed {
        source_id: String,
    },
    Failed {
        source_id: String,
        error: NoteError,
    },
}

#[derive(Debug, Default)]
pub struct CycleReport {
    pub fetched: usize,
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
    pub outcomes: Vec<RecordOutcome>,
}

impl CycleReport {
    fn record(&mut self, outcome: RecordOutcome) {
        match &outcome {
            RecordOutcome::Created { .. } => self.created += 1,
            RecordOutcome::AlreadyProcessed { .. } => self.skipped += 1,
            RecordOutcome::Failed { .. } => self.failed += 1,
        }
        self.outcomes.push(outcome);
    }
}

pub struct Poller<'a> {
    notion: &'a dyn NotionApi,
    generator: &'a dyn SummaryGenerator,
    library_db_id: String,
    notes_db_id: String,
    settings: Settings,
    processed: ProcessedSet,
}

impl<'a> Poller<'a> {
    pub fn new(
        notion: &'a dyn NotionApi,
        generator: &'a dyn SummaryGenerator,
        library_db_id: &str,
        notes_db_id: &str,
        settings: Settings,
    ) -> Self {
        Self {
            notion,
            generator,
            library_db_id: library_db_id.to_string(),
            notes_db_id: notes_db_id.to_string(),
            settings,
            processed: ProcessedSet::new(),
        }
    }

    pub fn processed(&self) -> &ProcessedSet {
        &self.processed
    }

    /// One cycle: fetch, then handle each record in order.
    ///
    /// Errors only when the library query itself fails; per-record failures
    /// are reported in the `CycleReport`.
    pub fn run_cycle(&mut self) -> NoteResult<CycleReport> {
        tracing::info!("Checking for new completed books...");
        let records = reader::fetch_records(self.notion, &self.library_db_id, &self.settings)?;

        let mut report = CycleReport {
            fetched: records.len(),
            ..CycleReport::default()
        };

        for fetched in records {
            let outcome = match fetched {
                Ok(record) => self.process_record(&record),
                Err(error) => {
                    let source_id = match &error {
                        NoteError::MalformedRecord { id, .. } => id.clone(),
                        _ => "<unknown>".to_string(),
                    };
                    tracing::warn!(source_id = %source_id, error = %error, "Skipping unreadable record");
                    RecordOutcome::Failed { source_id, error }
                }
            };
            report.record(outcome);
        }

        Ok(report)
    }

    fn process_record(&mut self, record: &SourceRecord) -> RecordOutcome {
        if self.processed.contains(&record.id) {
            tracing::debug!(source_id = %record.id, "Already processed, skipping");
            return RecordOutcome::AlreadyProcessed {
                source_id: record.id.clone(),
            };
        }

        match writer::create_note(
            self.notion,
            self.generator,
            record,
            &self.notes_db_id,
            &self.settings,
        ) {
            Ok(written) => {
                self.processed.insert(&record.id);
                match &written.append_error {
                    None => tracing::info!(
                        title = %record.title,
                        note_id = %written.page_id,
                        "Created note for book"
                    ),
                    Some(e) => tracing::warn!(
                        title = %record.title,
                        note_id = %written.page_id,
                        error = %e,
                        "Created note for book with truncated body"
                    ),
                }
                RecordOutcome::Created {
                    source_id: record.id.clone(),
                    title: record.title.clone(),
                    note_id: written.page_id,
                    append_error: written.append_error,
                }
            }
            Err(error) => {
                tracing::error!(
                    source_id = %record.id,
                    title = %record.title,
                    error = %error,
                    "Failed to create note, will retry next cycle"
                );
                RecordOutcome::Failed {
                    source_id: record.id.clone(),
                    error,
                }
            }
        }
    }

    /// Run cycles until `shutdown` is requested.
    ///
    /// A failed query is logged and retried after the normal interval.
    pub fn run(&mut self, shutdown: &Shutdown) {
        self.run_with_interval(shutdown, self.settings.poll_interval());
    }

    pub fn run_with_interval(&mut self, shutdown: &Shutdown, interval: Duration) {
        tracing::info!(
            interval_secs = interval.as_secs(),
            library = %self.library_db_id,
            notes = %self.notes_db_id,
            "Poll loop started"
        );

        let mut cycles = 0u64;
        while !shutdown.is_requested() {
            cycles += 1;
            let cycle_start = Instant::now();
            match self.run_cycle() {
                Ok(report) => tracing::info!(
                    cycle = cycles,
                    fetched = report.fetched,
                    created = report.created,
                    skipped = report.skipped,
                    failed = report.failed,
                    processed_total = self.processed.len(),
                    duration_ms = cycle_start.elapsed().as_millis() as u64,
                    "Cycle complete"
                ),
                Err(e) => tracing::error!(cycle = cycles, error = %e, "Library query failed"),
            }

            if shutdown.sleep(interval) {
                break;
            }
        }

        tracing::info!(cycles = cycles, "Poll loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{FakeNotion, PageBuilder, ScriptedSummaries};
    use serde_json::Value;

    fn library(ids_titles: &[(&str, &str)]) -> Vec<Vec<Value>> {
        vec![ids_titles
            .iter()
            .map(|(id, title)| PageBuilder::new(id, title).status("Completed").build())
            .collect()]
    }

    fn poller<'a>(notion: &'a FakeNotion, summaries: &'a ScriptedSummaries) -> Poller<'a> {
        Poller::new(notion, summaries, "lib", "notes", Settings::default())
    }

    #[test]
    fn test_processed_set_insert_once() {
        let mut set = ProcessedSet::new();
        assert!(set.is_empty());
        assert!(set.insert("a"));
        assert!(!set.insert("a"));
        assert!(set.contains("a"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_cycle_creates_one_note_per_record() {
        let notion = FakeNotion::with_pages(library(&[("b1", "Dune"), ("b2", "Emma")]));
        let summaries = ScriptedSummaries::new();
        let mut poller = poller(&notion, &summaries);

        let report = poller.run_cycle().unwrap();
        assert_eq!(report.fetched, 2);
        assert_eq!(report.created, 2);
        assert_eq!(notion.created().len(), 2);
        assert_eq!(notion.created()[0]["parent"]["database_id"], "notes");
        assert!(poller.processed().contains("b1"));
        assert!(poller.processed().contains("b2"));
    }

    #[test]
    fn test_second_cycle_writes_nothing_new() {
        let notion = FakeNotion::with_pages(library(&[("b1", "Dune")]));
        let summaries = ScriptedSummaries::new();
        let mut poller = poller(&notion, &summaries);

        poller.run_cycle().unwrap();
        let report = poller.run_cycle().unwrap();
        assert_eq!(report.created, 0);
        assert_eq!(report.skipped, 1);
        assert_eq!(notion.created().len(), 1);
        assert_eq!(summaries.calls(), vec!["Dune"]);
    }

    #[test]
    fn test_duplicate_id_within_cycle_written_once() {
        let notion = FakeNotion::with_pages(library(&[("b1", "Dune"), ("b1", "Dune")]));
        let summaries = ScriptedSummaries::new();
        let report = poller(&notion, &summaries).run_cycle().unwrap();
        assert_eq!(report.created, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(notion.created().len(), 1);
    }

    #[test]
    fn test_new_record_in_later_cycle_is_picked_up() {
        let notion = FakeNotion::with_pages(library(&[("b1", "Dune")]));
        let summaries = ScriptedSummaries::new();
        let mut poller = poller(&notion, &summaries);
        poller.run_cycle().unwrap();

        notion.set_pages(library(&[("b1", "Dune"), ("b2", "Emma")]));
        let report = poller.run_cycle().unwrap();
        assert_eq!(report.created, 1);
        assert_eq!(summaries.calls(), vec!["Dune", "Emma"]);
    }

    #[test]
    fn test_failed_record_isolated_and_retried() {
        let notion = FakeNotion::with_pages(library(&[("b1", "Dune"), ("b2", "Emma"), ("b3", "Walden")]));
        let summaries = ScriptedSummaries::new();
        summaries.fail_for("Emma");
        let mut poller = poller(&notion, &summaries);

        let report = poller.run_cycle().unwrap();
        assert_eq!(report.created, 2);
        assert_eq!(report.failed, 1);
        assert!(matches!(
            &report.outcomes[1],
            RecordOutcome::Failed { source_id, .. } if source_id == "b2"
        ));
        assert!(!poller.processed().contains("b2"));

        summaries.heal("Emma");
        let report = poller.run_cycle().unwrap();
        assert_eq!(report.created, 1);
        assert_eq!(report.skipped, 2);
        assert_eq!(notion.created().len(), 3);
    }

    #[test]
    fn test_failed_append_marks_record_processed() {
        let notion = FakeNotion::with_pages(library(&[("b1", "Dune")]));
        notion.fail_appends(true);
        let body = (0..150).map(|i| format!("{:05}", i)).collect::<Vec<_>>().join("\n");
        let summaries = ScriptedSummaries::with_body(&body);
        let settings = Settings {
            max_block_len: 5,
            ..Settings::default()
        };
        let mut poller = Poller::new(&notion, &summaries, "lib", "notes", settings);

        let report = poller.run_cycle().unwrap();
        assert_eq!(report.created, 1);
        assert!(matches!(
            &report.outcomes[0],
            RecordOutcome::Created { note_id, append_error: Some(_), .. } if note_id == "note-1"
        ));
        assert!(poller.processed().contains("b1"));

        for _ in 0..2 {
            let report = poller.run_cycle().unwrap();
            assert_eq!(report.skipped, 1);
        }
        assert_eq!(notion.created().len(), 1, "one page per source id");
        assert_eq!(summaries.calls(), vec!["Dune"]);
    }

    #[test]
    fn test_malformed_record_reported_not_fatal() {
        let mut pages = library(&[("b1", "Dune"), ("b2", "x")]);
        pages[0][1]["properties"]["Name"]["title"] = serde_json::json!([]);
        let notion = FakeNotion::with_pages(pages);
        let summaries = ScriptedSummaries::new();

        let report = poller(&notion, &summaries).run_cycle().unwrap();
        assert_eq!(report.created, 1);
        assert_eq!(report.failed, 1);
        assert!(matches!(
            &report.outcomes[1],
            RecordOutcome::Failed { source_id, error: NoteError::MalformedRecord { .. } } if source_id == "b2"
        ));
    }

    #[test]
    fn test_query_failure_is_cycle_error() {
        let notion = FakeNotion::with_pages(library(&[("b1", "Dune")]));
        notion.fail_queries(true);
        let summaries = ScriptedSummaries::new();
        let mut poller = poller(&notion, &summaries);
        assert!(poller.run_cycle().is_err());
        assert!(poller.processed().is_empty());
        assert!(summaries.calls().is_empty());
    }

    #[test]
    fn test_run_stops_on_shutdown_without_waiting() {
        let notion = FakeNotion::with_pages(library(&[("b1", "Dune")]));
        let summaries = ScriptedSummaries::new();
        let mut poller = poller(&notion, &summaries);

        let shutdown = Shutdown::new();
        shutdown.request();
        let start = Instant::now();
        poller.run(&shutdown);
        assert!(start.elapsed() < Duration::from_secs(1));
        assert!(notion.queries().is_empty(), "no cycle after shutdown");
    }

    #[test]
    fn test_run_many_cycles_without_real_delay() {
        let notion = FakeNotion::with_pages(library(&[("b1", "Dune"), ("b2", "Emma")]));
        let summaries = ScriptedSummaries::new();
        let mut poller = poller(&notion, &summaries);

        let shutdown = Shutdown::new();
        let remote = shutdown.clone();
        let stopper = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(200));
            remote.request();
        });
        poller.run_with_interval(&shutdown, Duration::ZERO);
        stopper.join().unwrap();

        assert!(notion.queries().len() > 1, "several cycles ran");
        assert_eq!(notion.created().len(), 2);
    }
}
