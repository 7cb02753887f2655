//! End-to-end experiment tests
//!
//! These drive the experiment runner with an in-process agent that answers a
//! prompt by calling whichever facade the trial exposes, then check the files
//! left in the results directory and the analysis built from them.

use async_trait::async_trait;
use ledgerbench_core::config::{
    ExperimentTables, LedgerbenchConfig, PromptDefinition, ScenarioDefinition, ToolConfiguration,
};
use ledgerbench_core::eval::ExpectedPattern;
use ledgerbench_core::journal::ToolClass;
use ledgerbench_core::llm::{Agent, AgentError};
use ledgerbench_core::operation::OperationType;
use ledgerbench_core::prelude::*;
use ledgerbench_core::tools::{Toolbox, DISPATCH_TOOL_NAME};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Withdraws 10 from A1 through the first facade on offer.
/// When `skip_dispatch` is set it answers without calling the dispatch tool.
struct TellerAgent {
    skip_dispatch: bool,
    calls: AtomicUsize,
}

impl TellerAgent {
    fn new() -> Self {
        Self {
            skip_dispatch: false,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Agent for TellerAgent {
    async fn respond(&self, _model: &str, prompt: &str, toolbox: &Toolbox) -> std::result::Result<String, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !prompt.contains("A1") {
            return Ok("Nothing to do.".to_string());
        }

        match toolbox.classes().first() {
            Some(ToolClass::NamedOperations) => {
                let _ = toolbox.invoke("withdraw", &json!({"accountNumber": "A1", "value": 10}));
            }
            Some(ToolClass::SingleDispatch) if !self.skip_dispatch => {
                let _ = toolbox.invoke(
                    DISPATCH_TOOL_NAME,
                    &json!({"type": "WITHDRAW", "accountNumber": "A1", "value": 10}),
                );
            }
            _ => {}
        }
        Ok("Done.".to_string())
    }

    async fn health_check(&self) -> std::result::Result<(), AgentError> {
        Ok(())
    }

    fn provider(&self) -> &str {
        "teller"
    }
}

fn test_config(results: &TempDir) -> LedgerbenchConfig {
    let mut config = LedgerbenchConfig::default();
    config.run.results_dir = results.path().to_path_buf();
    config.run.runs_per_combination = 2;
    config.run.cooldown = Duration::ZERO;
    config.agent.retry_delay = Duration::ZERO;
    config.experiment = ExperimentTables {
        configurations: vec![
            ToolConfiguration::new("CONF1", vec![ToolClass::NamedOperations]),
            ToolConfiguration::new("CONF2", vec![ToolClass::SingleDispatch]),
        ],
        prompts: vec![PromptDefinition {
            id: "Q1".to_string(),
            text: "Withdraw 10 from A1.".to_string(),
            scenarios: vec![
                ScenarioDefinition::new(
                    "A",
                    ScenarioRule::AlwaysSucceed,
                    ExpectedPattern::parse(["withdraw(A1,10.0)"]).unwrap(),
                ),
                ScenarioDefinition::new(
                    "B",
                    ScenarioRule::fail_on_target(OperationType::Withdraw, "A1"),
                    ExpectedPattern::parse(["withdraw(A1,10.0)->FAILED"]).unwrap(),
                ),
            ],
        }],
    };
    config.validate().unwrap();
    config
}

#[tokio::test]
async fn test_full_experiment_writes_artifacts() {
    let results = TempDir::new().expect("Failed to create temp dir");
    let agent = Arc::new(TellerAgent::new());
    let runner = ExperimentRunner::new(test_config(&results), agent.clone());

    runner.check_backend().await.unwrap();
    let report = runner.run(&ResumePoint::from_start()).await.unwrap();

    // 2 configurations x 2 scenarios x 2 runs
    assert_eq!(agent.calls.load(Ordering::SeqCst), 8);
    assert_eq!(report.len(), 4);
    for (combination, metrics) in report.iter() {
        assert_eq!(metrics.total_runs, 2, "{}", combination);
        assert_eq!(metrics.correct_runs, 2, "{}", combination);
        assert!(metrics.consistent);
    }
    assert_eq!(report.get("CONF2-Q1-B").unwrap().tool_usage["SingleDispatch"], 2);

    let store = runner.store();
    assert!(store.acceptance_path().exists());
    assert!(store.report_path().exists());
    assert!(store.aggregated_path("CONF1-Q1-A").exists());
    assert!(store.summary_path("CONF2-Q1-B", 2).exists());

    let acceptance = std::fs::read_to_string(store.acceptance_path()).unwrap();
    assert!(acceptance.contains("Q1B:"));
    assert!(acceptance.contains("  - withdraw(A1,10.0)->FAILED"));

    let summaries = store.load_summaries("CONF1-Q1-B").unwrap();
    assert_eq!(summaries.len(), 2);
    for summary in &summaries {
        assert!(summary.used_llm);
        assert_eq!(summary.evaluation.observed_ops, vec!["withdraw(A1,10.0)->FAILED"]);
        assert!(store.journal_path(&summary.run_id).exists());
    }

    // The on-disk report matches the one returned
    assert_eq!(ExperimentReport::collect(store.dir()).unwrap(), report);
}

#[tokio::test]
async fn test_resume_skips_earlier_combinations() {
    let results = TempDir::new().expect("Failed to create temp dir");
    let agent = Arc::new(TellerAgent::new());
    let runner = ExperimentRunner::new(test_config(&results), agent.clone());

    let resume = ResumePoint {
        config: Some("conf2".to_string()),
        prompt: None,
        scenario: Some("Q1B".to_string()),
    };
    let report = runner.run(&resume).await.unwrap();

    assert_eq!(agent.calls.load(Ordering::SeqCst), 2);
    let combinations: Vec<&str> = report.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(combinations, vec!["CONF2-Q1-B"]);
    assert!(!runner.store().aggregated_path("CONF1-Q1-A").exists());
}

#[tokio::test]
async fn test_unknown_resume_point_is_rejected() {
    let results = TempDir::new().expect("Failed to create temp dir");
    let runner = ExperimentRunner::new(test_config(&results), Arc::new(TellerAgent::new()));

    let resume = ResumePoint {
        config: Some("CONF9".to_string()),
        ..ResumePoint::default()
    };
    let err = runner.run(&resume).await.unwrap_err();
    assert!(err.to_string().contains("Unknown configuration: CONF9"));
    assert!(!runner.store().acceptance_path().exists());
}

#[tokio::test]
async fn test_analysis_reports_problem_cases() {
    let results = TempDir::new().expect("Failed to create temp dir");
    let config = test_config(&results);
    let tables = config.experiment.clone();
    let agent = Arc::new(TellerAgent {
        skip_dispatch: true,
        calls: AtomicUsize::new(0),
    });
    ExperimentRunner::new(config, agent)
        .run(&ResumePoint::from_start())
        .await
        .unwrap();

    let analysis = analyze(results.path(), &tables).unwrap();
    assert_eq!(analysis.rows.len(), 4);

    let dispatch_rows: Vec<_> = analysis.rows.iter().filter(|r| r.config == "CONF2").collect();
    assert!(dispatch_rows.iter().all(|r| r.correctness() == "0/2 (0.0%)"));
    assert!(dispatch_rows.iter().all(|r| r.approach == "SingleDispatch"));

    assert_eq!(analysis.problems.len(), 2);
    let case = &analysis.problems[0];
    assert_eq!(case.row.combination_id(), "CONF2-Q1-A");
    assert_eq!(case.incorrect_count, 2);
    assert!(case.incorrect_runs[0].observed_ops.is_empty());
    assert_eq!(
        case.incorrect_runs[0].mismatches,
        vec!["Expected not found: withdraw(A1,10.0)"]
    );

    let text = analysis.render();
    assert!(text.contains("PROBLEM CASES"));
    assert!(text.contains("NO_TOOLS_USED=2"));
}
