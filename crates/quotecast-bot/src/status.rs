//! `quotecast status`: inspect the on-disk corpus and run-state marker.

use std::collections::BTreeSet;
use std::path::Path;

use quotecast_core::DataPaths;
use quotecast_store::{CorpusStore, RunStateMarker};

/// Snapshot of a data directory.
#[derive(Debug)]
pub struct StatusReport {
    pub corpus_valid: bool,
    pub quotes: usize,
    pub distinct_tags: usize,
    pub untagged: usize,
    pub marker_present: bool,
    pub errors: Vec<String>,
}

/// Inspect `data_dir` without modifying anything.
pub fn inspect(data_dir: &Path) -> StatusReport {
    let paths = DataPaths::layout(data_dir);
    let store = CorpusStore::new(&paths.corpus_file);
    let marker = RunStateMarker::new(&paths.marker_file);

    let mut report = StatusReport {
        corpus_valid: false,
        quotes: 0,
        distinct_tags: 0,
        untagged: 0,
        marker_present: marker.is_present(),
        errors: Vec::new(),
    };

    if !store.exists() {
        report
            .errors
            .push(format!("Corpus file not found: {}", store.path().display()));
        return report;
    }

    match store.load() {
        Ok(quotes) => {
            let tags: BTreeSet<&str> = quotes
                .iter()
                .flat_map(|q| q.tags.iter().map(|t| t.as_str()))
                .collect();
            report.corpus_valid = true;
            report.quotes = quotes.len();
            report.distinct_tags = tags.len();
            report.untagged = quotes.iter().filter(|q| q.tags.is_empty()).count();
        }
        Err(e) if e.is_parse() => {
            report.errors.push(format!("Corpus file is malformed: {}", e));
        }
        Err(e) => {
            report
                .errors
                .push(format!("Failed to load {}: {}", store.path().display(), e));
        }
    }

    report
}

pub fn print_report(report: &StatusReport) {
    println!("=== Quotecast Status ===");
    println!();
    println!("Corpus valid:       {}", if report.corpus_valid { "YES" } else { "NO" });
    println!("Quotes remaining:   {}", report.quotes);
    println!("Distinct tags:      {}", report.distinct_tags);
    println!("Untagged quotes:    {}", report.untagged);
    println!(
        "Ingestion:          {}",
        if report.marker_present { "completed" } else { "pending" }
    );

    if !report.errors.is_empty() {
        println!();
        println!("Errors:");
        for e in &report.errors {
            println!("  - {}", e);
        }
    }
}
