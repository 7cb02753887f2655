//! Tests for trial orchestration, resume points and artifacts

use super::*;
use crate::config::ExperimentTables;
use crate::journal::ToolClass;
use crate::llm::{Agent, AgentError, FallbackPolicy};
use crate::metrics::NO_TOOLS_USED;
use crate::tools::Toolbox;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// Agent that performs a fixed list of tool calls, after failing on some models
struct ScriptedAgent {
    calls: Vec<(&'static str, Value)>,
    failing_models: Vec<&'static str>,
}

impl ScriptedAgent {
    fn new(calls: Vec<(&'static str, Value)>) -> Self {
        Self {
            calls,
            failing_models: Vec::new(),
        }
    }

    fn failing_on(mut self, models: &[&'static str]) -> Self {
        self.failing_models = models.to_vec();
        self
    }
}

#[async_trait]
impl Agent for ScriptedAgent {
    async fn respond(&self, model: &str, _prompt: &str, toolbox: &Toolbox) -> Result<String, AgentError> {
        if self.failing_models.iter().any(|m| *m == model) {
            return Err(AgentError::Transport(format!("{} is not loaded", model)));
        }
        for (name, args) in &self.calls {
            let _ = toolbox.invoke(name, args);
        }
        Ok("All done.".to_string())
    }

    async fn health_check(&self) -> Result<(), AgentError> {
        Ok(())
    }

    fn provider(&self) -> &str {
        "scripted"
    }
}

/// Agent that never answers
struct HangingAgent;

#[async_trait]
impl Agent for HangingAgent {
    async fn respond(&self, _model: &str, _prompt: &str, _toolbox: &Toolbox) -> Result<String, AgentError> {
        tokio::time::sleep(Duration::from_secs(24 * 3600)).await;
        Ok(String::new())
    }

    async fn health_check(&self) -> Result<(), AgentError> {
        Err(AgentError::Transport("connection refused".to_string()))
    }

    fn provider(&self) -> &str {
        "hanging"
    }
}

fn call(name: &'static str, account: &str, value: f64) -> (&'static str, Value) {
    (name, json!({"accountNumber": account, "value": value}))
}

fn policy() -> FallbackPolicy {
    FallbackPolicy::new(vec!["a".to_string(), "b".to_string()])
        .with_retries_per_model(2)
        .with_retry_delay(Duration::from_secs(3))
}

fn runner(agent: impl Agent + 'static) -> TrialRunner {
    TrialRunner::new(Arc::new(agent), policy(), Duration::from_secs(300))
}

fn plan<'a>(tables: &'a ExperimentTables, config: &str, scenario: &str) -> TrialPlan<'a> {
    let (prompt, scenario) = tables.scenario(scenario).unwrap();
    TrialPlan::new(tables.configuration(config).unwrap(), prompt, scenario)
}

#[tokio::test]
async fn test_correct_trial() {
    let tables = ExperimentTables::default();
    let agent = ScriptedAgent::new(vec![
        call("withdraw", "BC12345", 1000.0),
        call("deposit", "ND87632", 1000.0),
        call("taxes", "BC12345", 1.5),
    ]);

    let summary = runner(agent).run(&plan(&tables, "CONF1", "P1A")).await;

    assert!(summary.used_llm);
    assert_eq!(summary.model.as_deref(), Some("a"));
    assert_eq!(summary.attempts, 1);
    assert_eq!(summary.llm_response_text, "All done.");
    assert_eq!(summary.error, None);
    assert_eq!(summary.combination_id(), "CONF1-P1-A");
    assert_eq!(summary.tools_used, vec!["NamedOperations"]);
    assert_eq!(summary.events_count, 3);
    assert!(summary.events.iter().all(|e| e.run_id == summary.run_id));
    assert!(summary.evaluation.correct);
    assert_eq!(summary.evaluation.sequence_accuracy, 1.0);
}

#[tokio::test]
async fn test_failed_deposit_is_recorded() {
    let tables = ExperimentTables::default();
    let agent = ScriptedAgent::new(vec![
        call("withdraw", "BC12345", 1000.0),
        call("deposit", "ND87632", 1000.0),
        call("returnValue", "BC12345", 1000.0),
    ]);

    let summary = runner(agent).run(&plan(&tables, "CONF1", "P1B")).await;

    assert!(!summary.events[1].result);
    assert_eq!(summary.evaluation.observed_ops[1], "deposit(ND87632,1000.0)->FAILED");
    assert!(summary.evaluation.correct);
}

#[tokio::test]
async fn test_pair_failure_graded_in_either_order() {
    let tables = ExperimentTables::default();

    // Prompt order: AG7340H first, so it is the one that fails
    let prompt_order = ScriptedAgent::new(vec![
        call("withdraw", "AG7340H", 600.0),
        call("withdraw", "TG23986Q", 700.0),
        call("returnValue", "TG23986Q", 700.0),
    ]);
    let summary = runner(prompt_order).run(&plan(&tables, "CONF1", "P3B")).await;
    assert_eq!(
        summary.evaluation.observed_ops,
        vec![
            "withdraw(AG7340H,600.0)->FAILED",
            "withdraw(TG23986Q,700.0)",
            "returnValue(TG23986Q,700.0)",
        ]
    );
    assert!(summary.evaluation.correct, "mismatches: {:?}", summary.evaluation.mismatches);

    let reversed = ScriptedAgent::new(vec![
        call("withdraw", "TG23986Q", 700.0),
        call("withdraw", "AG7340H", 600.0),
        call("returnValue", "AG7340H", 600.0),
    ]);
    let summary = runner(reversed).run(&plan(&tables, "CONF1", "P3B")).await;
    assert_eq!(summary.evaluation.observed_ops[0], "withdraw(TG23986Q,700.0)->FAILED");
    assert!(summary.evaluation.correct, "mismatches: {:?}", summary.evaluation.mismatches);

    // Stopping after the failure without returning the money is still wrong
    let no_return = ScriptedAgent::new(vec![call("withdraw", "AG7340H", 600.0)]);
    let summary = runner(no_return).run(&plan(&tables, "CONF1", "P3B")).await;
    assert!(!summary.evaluation.correct);
    assert_eq!(summary.evaluation.mismatches.len(), 1);
}

#[tokio::test]
async fn test_dispatch_configuration_rejects_named_tools() {
    let tables = ExperimentTables::default();
    let agent = ScriptedAgent::new(vec![
        call("withdraw", "BC12345", 1000.0),
        (
            "executeOperation",
            json!({"type": "WITHDRAW", "accountNumber": "BC12345", "value": 1000}),
        ),
    ]);

    let summary = runner(agent).run(&plan(&tables, "CONF2", "P1A")).await;

    assert_eq!(summary.events_count, 1);
    assert_eq!(summary.events[0].tool_class, ToolClass::SingleDispatch);
    assert_eq!(summary.tools_used, vec!["SingleDispatch"]);
    assert!(!summary.evaluation.correct);
}

#[tokio::test(start_paused = true)]
async fn test_fallback_model_recorded() {
    let tables = ExperimentTables::default();
    let agent = ScriptedAgent::new(vec![call("withdraw", "BC12345", 1000.0)]).failing_on(&["a"]);

    let summary = runner(agent).run(&plan(&tables, "CONF1", "P1A")).await;

    assert!(summary.used_llm);
    assert_eq!(summary.model.as_deref(), Some("b"));
    assert_eq!(summary.attempts, 3);
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_agent_still_summarized() {
    let tables = ExperimentTables::default();
    let agent = ScriptedAgent::new(Vec::new()).failing_on(&["a", "b"]);

    let summary = runner(agent).run(&plan(&tables, "CONF3", "P2B")).await;

    assert!(!summary.used_llm);
    assert_eq!(summary.model, None);
    assert_eq!(summary.attempts, 4);
    assert!(summary.llm_response_text.starts_with(ERROR_RESPONSE_PREFIX));
    assert!(summary.error.as_deref().unwrap().contains("b is not loaded"));
    assert_eq!(summary.tools_used, vec![NO_TOOLS_USED]);
    assert_eq!(summary.events_count, 0);
    assert!(!summary.evaluation.correct);
    assert_eq!(summary.evaluation.mismatches.len(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_invocation_deadline() {
    let tables = ExperimentTables::default();
    let trials = TrialRunner::new(Arc::new(HangingAgent), policy(), Duration::from_secs(5));

    let summary = trials.run(&plan(&tables, "CONF1", "P3A")).await;

    assert!(!summary.used_llm);
    assert_eq!(summary.attempts, 1);
    assert_eq!(
        summary.error.as_deref(),
        Some("Model response timed out after 5s")
    );
}

#[test]
fn test_plans_in_table_order() {
    let tables = ExperimentTables::default();
    let all = plans(&tables);
    assert_eq!(all.len(), 24);
    assert_eq!(all[0].combination_id(), "CONF1-P1-A");
    assert_eq!(all[1].combination_id(), "CONF1-P1-B");
    assert_eq!(all[2].combination_id(), "CONF1-P2-A");
    assert_eq!(all[23].combination_id(), "CONF4-P3-B");
}

#[test]
fn test_resume_point() {
    let tables = ExperimentTables::default();
    let all = plans(&tables);

    let resume = ResumePoint {
        config: Some("conf2".to_string()),
        prompt: Some("P3".to_string()),
        scenario: None,
    };
    assert!(resume.validate(&tables).is_ok());
    let start = all.iter().position(|p| resume.matches(p)).unwrap();
    assert_eq!(all[start].combination_id(), "CONF2-P3-A");

    let resume = ResumePoint {
        scenario: Some("B".to_string()),
        ..Default::default()
    };
    let start = all.iter().position(|p| resume.matches(p)).unwrap();
    assert_eq!(all[start].combination_id(), "CONF1-P1-B");

    let resume = ResumePoint {
        config: Some("CONF3".to_string()),
        scenario: Some("p2b".to_string()),
        ..Default::default()
    };
    assert!(resume.validate(&tables).is_ok());
    let start = all.iter().position(|p| resume.matches(p)).unwrap();
    assert_eq!(all[start].combination_id(), "CONF3-P2-B");

    assert!(ResumePoint::from_start().is_from_start());
    assert!(ResumePoint::from_start().matches(&all[0]));

    let unknown = ResumePoint {
        config: Some("CONF9".to_string()),
        ..Default::default()
    };
    let err = unknown.validate(&tables).unwrap_err();
    assert!(err.to_string().contains("Unknown configuration: CONF9"));

    let unknown = ResumePoint {
        scenario: Some("Z".to_string()),
        ..Default::default()
    };
    assert!(unknown.validate(&tables).is_err());
}

#[tokio::test]
async fn test_backend_check_maps_error() {
    let mut config = crate::config::LedgerbenchConfig::default();
    config.backend.base_url = "http://ollama.invalid:11434".to_string();
    let runner = ExperimentRunner::new(config, Arc::new(HangingAgent));

    let err = runner.check_backend().await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Inference backend unavailable at http://ollama.invalid:11434: Transport error: connection refused"
    );
}

#[tokio::test]
async fn test_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = ResultsStore::new(dir.path().join("results"));
    let tables = ExperimentTables::default();
    let trials = runner(ScriptedAgent::new(vec![call("withdraw", "BC12345", 1000.0)]));
    let combination = plan(&tables, "CONF1", "P1A");

    let mut written = Vec::new();
    for run_number in [2, 10, 1] {
        let trial = trials.execute(&combination).await;
        assert!(store.save_journal(&trial.journal));
        assert!(store.save_summary(&trial.summary, run_number));
        assert!(store.journal_path(&trial.summary.run_id).exists());
        written.push((run_number, trial.summary));
    }
    written.sort_by_key(|(n, _)| *n);

    let loaded = store.load_summaries("CONF1-P1-A").unwrap();
    let expected: Vec<TrialSummary> = written.into_iter().map(|(_, s)| s).collect();
    assert_eq!(loaded, expected);
    assert!(store.load_summaries("CONF1-P1-B").unwrap().is_empty());

    assert!(store.save_acceptance(&tables.acceptance_table()));
    let listing = std::fs::read_to_string(store.acceptance_path()).unwrap();
    assert!(listing.starts_with("Acceptance criteria"));
    assert!(listing.contains("P3B:\n  - withdraw(AG7340H,600.0)->FAILED OR withdraw(TG23986Q,700.0)->FAILED"));
}

#[test]
fn test_store_write_failure_is_tolerated() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, "file").unwrap();

    let store = ResultsStore::new(&blocker);
    let tables = ExperimentTables::default();
    assert!(!store.save_acceptance(&tables.acceptance_table()));
}
