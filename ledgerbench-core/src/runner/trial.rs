//! Single trial orchestration

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{PromptDefinition, ScenarioDefinition, ToolConfiguration};
use crate::eval::{evaluate, EvaluationResult};
use crate::journal::{CallJournal, Event};
use crate::llm::{invoke_with_fallback, Agent, AgentError, FallbackPolicy};
use crate::metrics::NO_TOOLS_USED;
use crate::scenario::ScenarioMachine;
use crate::tools::{Toolbox, TrialContext};

/// Prefix of the response text recorded for a failed invocation
pub const ERROR_RESPONSE_PREFIX: &str = "[ERROR] ";

/// One (configuration, prompt, scenario) combination
#[derive(Debug, Clone, Copy)]
pub struct TrialPlan<'a> {
    pub configuration: &'a ToolConfiguration,
    pub prompt: &'a PromptDefinition,
    pub scenario: &'a ScenarioDefinition,
}

impl<'a> TrialPlan<'a> {
    pub fn new(
        configuration: &'a ToolConfiguration,
        prompt: &'a PromptDefinition,
        scenario: &'a ScenarioDefinition,
    ) -> Self {
        Self {
            configuration,
            prompt,
            scenario,
        }
    }

    /// `CONF-PROMPT-SUFFIX`, e.g. `CONF1-P2-B`
    pub fn combination_id(&self) -> String {
        format!(
            "{}-{}-{}",
            self.configuration.id, self.prompt.id, self.scenario.suffix
        )
    }

    /// Scenario id, e.g. `P2B`
    pub fn scenario_id(&self) -> String {
        self.prompt.scenario_id(self.scenario)
    }
}

/// Per-trial artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialSummary {
    pub run_id: String,

    /// Tool configuration id
    pub config: String,

    /// Prompt id
    pub prompt: String,

    /// Scenario suffix
    pub scenario: String,

    /// Whether the agent produced an answer
    pub used_llm: bool,

    /// Model that answered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Agent attempts made, fallback included
    #[serde(default)]
    pub attempts: u32,

    /// Final answer, or `[ERROR] ...` when the invocation failed
    pub llm_response_text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Facade names in first-use order, `NO_TOOLS_USED` when none
    pub tools_used: Vec<String>,

    pub events: Vec<Event>,

    pub evaluation: EvaluationResult,

    pub events_count: usize,
}

impl TrialSummary {
    /// `CONF-PROMPT-SUFFIX` of the trial
    pub fn combination_id(&self) -> String {
        format!("{}-{}-{}", self.config, self.prompt, self.scenario)
    }
}

/// Summary plus the journal it was built from
#[derive(Debug)]
pub struct CompletedTrial {
    pub summary: TrialSummary,
    pub journal: Arc<CallJournal>,
}

/// Runs trials against an agent
pub struct TrialRunner {
    agent: Arc<dyn Agent>,
    policy: FallbackPolicy,
    invocation_timeout: Duration,
}

impl TrialRunner {
    pub fn new(agent: Arc<dyn Agent>, policy: FallbackPolicy, invocation_timeout: Duration) -> Self {
        Self {
            agent,
            policy,
            invocation_timeout,
        }
    }

    /// Run one trial and summarize it
    pub async fn run(&self, plan: &TrialPlan<'_>) -> TrialSummary {
        self.execute(plan).await.summary
    }

    /// Run one trial, keeping its journal.
    ///
    /// Every trial gets a fresh run id, scenario machine and journal. Agent
    /// failures do not propagate: the trial is summarized as failed.
    pub async fn execute(&self, plan: &TrialPlan<'_>) -> CompletedTrial {
        let run_id = Uuid::new_v4().to_string();
        let combination = plan.combination_id();

        let machine = Arc::new(ScenarioMachine::new(
            plan.scenario_id(),
            plan.scenario.rule.clone(),
        ));
        let journal = Arc::new(CallJournal::new(run_id.clone()));
        let ctx = TrialContext::new(machine, journal.clone());
        let toolbox = Toolbox::for_classes(&plan.configuration.facades, &ctx);

        info!(run_id = %run_id, combination = %combination, "Starting trial");

        let attempts = AtomicU32::new(0);
        let outcome = {
            let agent = self.agent.as_ref();
            let prompt = plan.prompt.text.as_str();
            let toolbox = &toolbox;
            let attempts = &attempts;

            let invocation = invoke_with_fallback(&self.policy, move |model| async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                agent.respond(&model, prompt, toolbox).await
            });

            match tokio::time::timeout(self.invocation_timeout, invocation).await {
                Ok(result) => result,
                Err(_) => Err(AgentError::Timeout(self.invocation_timeout)),
            }
        };
        let attempts = attempts.load(Ordering::SeqCst);

        let (used_llm, model, llm_response_text, error) = match outcome {
            Ok(invocation) => (true, Some(invocation.model), invocation.value, None),
            Err(e) => {
                warn!(run_id = %run_id, combination = %combination, error = %e, "Agent invocation failed");
                (
                    false,
                    None,
                    format!("{}{}", ERROR_RESPONSE_PREFIX, e),
                    Some(e.to_string()),
                )
            }
        };

        let events = journal.export_events();
        let mut tools_used = journal.tools_used();
        if tools_used.is_empty() {
            warn!(run_id = %run_id, "Agent did not use any tools");
            tools_used.push(NO_TOOLS_USED.to_string());
        }

        let evaluation = evaluate(&events, &plan.scenario.expected);
        info!(
            run_id = %run_id,
            combination = %combination,
            correct = evaluation.correct,
            events = events.len(),
            tools = ?tools_used,
            "Trial completed"
        );

        let summary = TrialSummary {
            run_id,
            config: plan.configuration.id.clone(),
            prompt: plan.prompt.id.clone(),
            scenario: plan.scenario.suffix.clone(),
            used_llm,
            model,
            attempts,
            llm_response_text,
            error,
            tools_used,
            events_count: events.len(),
            events,
            evaluation,
        };

        CompletedTrial { summary, journal }
    }
}
