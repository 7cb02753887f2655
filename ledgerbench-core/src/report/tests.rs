//! Tests for report collection and analysis

use super::*;
use crate::config::ExperimentTables;
use crate::eval::{evaluate, ExpectedPattern};
use crate::journal::{CallJournal, EventParams, ToolClass};
use crate::metrics::{aggregate, AggregatedMetrics};
use crate::runner::{ResultsStore, TrialSummary};
use std::collections::BTreeMap;

fn summary(config: &str, run_id: &str, correct: bool) -> TrialSummary {
    let journal = CallJournal::new(run_id);
    let method = if correct { "withdraw" } else { "deposit" };
    journal.append(ToolClass::NamedOperations, method, EventParams::named("A", 1.0), true);
    let events = journal.export_events();
    let evaluation = evaluate(&events, &ExpectedPattern::parse(["withdraw(A,1.0)"]).unwrap());

    TrialSummary {
        run_id: run_id.to_string(),
        config: config.to_string(),
        prompt: "P1".to_string(),
        scenario: "A".to_string(),
        used_llm: true,
        model: Some("m".to_string()),
        attempts: 1,
        llm_response_text: "ok".to_string(),
        error: None,
        tools_used: journal.tools_used(),
        events_count: events.len(),
        events,
        evaluation,
    }
}

fn metrics(correct: usize, total: usize, usage: &[(&str, usize)]) -> AggregatedMetrics {
    AggregatedMetrics {
        total_runs: total,
        correct_runs: correct,
        correctness_ratio: correct as f64 / total as f64,
        consistent: correct == total,
        tool_usage: usage.iter().map(|(k, v)| (k.to_string(), *v)).collect::<BTreeMap<_, _>>(),
    }
}

#[test]
fn test_collect_and_save() {
    let dir = tempfile::tempdir().unwrap();
    let store = ResultsStore::new(dir.path());
    store.save_aggregated("CONF1-P1-A", &metrics(2, 2, &[("NamedOperations", 2)]));
    store.save_aggregated("CONF2-P1-A", &metrics(1, 2, &[("SingleDispatch", 2)]));
    std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let report = ExperimentReport::collect(dir.path()).unwrap();
    assert_eq!(report.len(), 2);
    assert_eq!(report.get("CONF2-P1-A").unwrap().correct_runs, 1);

    let path = report.save(dir.path()).unwrap();
    assert!(path.ends_with("final-experiment-report.json"));
    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved["CONF1-P1-A"]["correctnessRatio"], 1.0);

    // The final report itself is not mistaken for an aggregate
    assert_eq!(ExperimentReport::collect(dir.path()).unwrap(), report);
}

#[test]
fn test_render_summary() {
    let mut report = ExperimentReport::new();
    report.insert("CONF1-P1-A", metrics(1, 4, &[("NamedOperations", 4)]));

    let text = report.render_summary();
    assert!(text.contains("Config: CONF1-P1-A"));
    assert!(text.contains("Correctness: 25.00%"));
    assert!(text.contains("Consistent: false"));
    assert!(text.contains("Tool Usage: {NamedOperations=4}"));
}

#[test]
fn test_analyze_problem_cases() {
    let dir = tempfile::tempdir().unwrap();
    let store = ResultsStore::new(dir.path());
    let tables = ExperimentTables::default();

    let runs: Vec<TrialSummary> = (1..=5)
        .map(|n| summary("CONF3", &format!("run-{n:04}-xxxxxxxx"), n == 1))
        .collect();
    for (i, run) in runs.iter().enumerate() {
        store.save_summary(run, i + 1);
    }
    store.save_aggregated("CONF3-P1-A", &aggregate(&runs));
    store.save_aggregated(
        "CONF1-P1-A",
        &metrics(3, 3, &[("NamedOperations", 3)]),
    );
    store.save_aggregated(
        "CONF4-P1-A",
        &metrics(3, 3, &[("NamedOperations", 1), ("SingleDispatch", 3)]),
    );

    let analysis = analyze(dir.path(), &tables).unwrap();
    assert_eq!(analysis.rows.len(), 3);

    let conf1 = &analysis.rows[0];
    assert_eq!(conf1.config, "CONF1");
    assert_eq!(conf1.approach, "NamedOperations");
    assert_eq!(conf1.correctness(), "3/3 (100.0%)");

    let conf3 = &analysis.rows[1];
    assert_eq!(conf3.approach, "NamedOperations");
    assert_eq!(conf3.correctness(), "1/5 (20.0%)");
    assert_eq!(analysis.rows[2].approach, "NamedOperations/SingleDispatch");

    assert_eq!(analysis.problems.len(), 1);
    let case = &analysis.problems[0];
    assert_eq!(case.row.combination_id(), "CONF3-P1-A");
    assert_eq!(case.incorrect_count, 4);
    assert_eq!(case.incorrect_runs.len(), 3);
    assert_eq!(case.incorrect_runs[0].run_id, "run-0002-xxxxxxxx");
    assert_eq!(case.incorrect_runs[0].mismatches, vec!["Expected not found: withdraw(A,1.0)"]);

    let text = analysis.render();
    assert!(text.contains("RESULTS TABLE"));
    assert!(text.contains("CONF3-P1-A"));
    assert!(text.contains("Incorrect runs: 4"));
    assert!(text.contains("Run run-0002..."));
}

#[test]
fn test_analyze_without_problems() {
    let dir = tempfile::tempdir().unwrap();
    let store = ResultsStore::new(dir.path());
    store.save_aggregated("CONF2-P2-B", &metrics(2, 2, &[("SingleDispatch", 2)]));

    let analysis = analyze(dir.path(), &ExperimentTables::default()).unwrap();
    assert!(analysis.problems.is_empty());
    assert_eq!(analysis.rows[0].approach, "SingleDispatch");
    assert!(analysis.render().contains("No problem cases"));
}

#[test]
fn test_missing_directory_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(ExperimentReport::collect(dir.path().join("missing")).is_err());
}
