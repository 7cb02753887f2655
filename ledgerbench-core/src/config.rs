//! Configuration types for Ledgerbench

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{LedgerbenchError, Result};
use crate::eval::{AcceptanceTable, ExpectedPattern, PatternElement};
use crate::journal::{JournalFormat, ToolClass};
use crate::llm::FallbackPolicy;
use crate::operation::OperationType;
use crate::scenario::ScenarioRule;

/// Default location of the Ollama server
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Main configuration for an experiment
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct LedgerbenchConfig {
    /// Inference backend
    pub backend: BackendConfig,

    /// Model selection and invocation limits
    pub agent: AgentConfig,

    /// Trial repetition and output
    pub run: RunConfig,

    /// Tool configurations, prompts and scenarios
    pub experiment: ExperimentTables,
}

/// Inference backend configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackendConfig {
    /// Ollama base URL
    pub base_url: String,

    /// Sampling temperature (0.0 for reproducible runs)
    pub temperature: f32,

    /// Timeout of one HTTP request to the backend
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Maximum model turns that request tools before giving up
    pub max_tool_turns: usize,

    /// Timeout of the startup availability check
    #[serde(with = "humantime_serde")]
    pub health_timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: 0.0,
            request_timeout: Duration::from_secs(300),
            max_tool_turns: 25,
            health_timeout: Duration::from_secs(5),
        }
    }
}

/// Model fallback and invocation deadline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AgentConfig {
    /// Models in preference order
    pub models: Vec<String>,

    /// Attempts per model
    pub retries_per_model: u32,

    /// Wait between attempts on the same model
    #[serde(with = "humantime_serde")]
    pub retry_delay: Duration,

    /// Deadline for one whole invocation, fallback included
    #[serde(with = "humantime_serde")]
    pub invocation_timeout: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        let policy = FallbackPolicy::default();
        Self {
            models: policy.models,
            retries_per_model: policy.retries_per_model,
            retry_delay: policy.retry_delay,
            invocation_timeout: Duration::from_secs(300),
        }
    }
}

impl AgentConfig {
    /// Fallback policy described by this configuration
    pub fn fallback_policy(&self) -> FallbackPolicy {
        FallbackPolicy::new(self.models.clone())
            .with_retries_per_model(self.retries_per_model)
            .with_retry_delay(self.retry_delay)
    }
}

/// Trial repetition configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunConfig {
    /// Trials per (configuration, prompt, scenario) combination
    pub runs_per_combination: usize,

    /// Pause between successive trials
    #[serde(with = "humantime_serde")]
    pub cooldown: Duration,

    /// Where artifacts are written
    pub results_dir: PathBuf,

    /// Format of the per-trial journal files
    pub journal_format: JournalFormat,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            runs_per_combination: 10,
            cooldown: Duration::from_secs(1),
            results_dir: PathBuf::from("results"),
            journal_format: JournalFormat::Json,
        }
    }
}

/// Named set of facades exposed to the agent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolConfiguration {
    pub id: String,

    /// Facades in registration order
    pub facades: Vec<ToolClass>,
}

impl ToolConfiguration {
    pub fn new(id: impl Into<String>, facades: Vec<ToolClass>) -> Self {
        Self {
            id: id.into(),
            facades,
        }
    }
}

/// One scenario variant of a prompt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioDefinition {
    /// Suffix appended to the prompt id (`A`, `B`, ...)
    pub suffix: String,

    #[serde(default)]
    pub rule: ScenarioRule,

    /// Operations a correct agent performs
    pub expected: ExpectedPattern,
}

impl ScenarioDefinition {
    pub fn new(suffix: impl Into<String>, rule: ScenarioRule, expected: ExpectedPattern) -> Self {
        Self {
            suffix: suffix.into(),
            rule,
            expected,
        }
    }
}

/// Instruction given to the agent and its scenario variants
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromptDefinition {
    pub id: String,
    pub text: String,
    pub scenarios: Vec<ScenarioDefinition>,
}

impl PromptDefinition {
    /// Scenario id, e.g. `P1B`
    pub fn scenario_id(&self, scenario: &ScenarioDefinition) -> String {
        format!("{}{}", self.id, scenario.suffix)
    }
}

/// Immutable experiment tables
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExperimentTables {
    pub configurations: Vec<ToolConfiguration>,
    pub prompts: Vec<PromptDefinition>,
}

impl Default for ExperimentTables {
    fn default() -> Self {
        Self {
            configurations: vec![
                ToolConfiguration::new("CONF1", vec![ToolClass::NamedOperations]),
                ToolConfiguration::new("CONF2", vec![ToolClass::SingleDispatch]),
                ToolConfiguration::new(
                    "CONF3",
                    vec![ToolClass::NamedOperations, ToolClass::SingleDispatch],
                ),
                ToolConfiguration::new(
                    "CONF4",
                    vec![ToolClass::SingleDispatch, ToolClass::NamedOperations],
                ),
            ],
            prompts: default_prompts(),
        }
    }
}

impl ExperimentTables {
    pub fn configuration(&self, id: &str) -> Option<&ToolConfiguration> {
        self.configurations.iter().find(|c| c.id == id)
    }

    pub fn prompt(&self, id: &str) -> Option<&PromptDefinition> {
        self.prompts.iter().find(|p| p.id == id)
    }

    /// Look up a scenario by its full id (`P2B`)
    pub fn scenario(&self, scenario_id: &str) -> Option<(&PromptDefinition, &ScenarioDefinition)> {
        self.prompts.iter().find_map(|prompt| {
            prompt
                .scenarios
                .iter()
                .find(|s| prompt.scenario_id(s) == scenario_id)
                .map(|s| (prompt, s))
        })
    }

    /// Rule of a scenario; unknown ids always succeed
    pub fn scenario_rule(&self, scenario_id: &str) -> ScenarioRule {
        match self.scenario(scenario_id) {
            Some((_, scenario)) => scenario.rule.clone(),
            None => {
                tracing::warn!(scenario = %scenario_id, "Unknown scenario, all operations will succeed");
                ScenarioRule::AlwaysSucceed
            }
        }
    }

    /// One scenario's rule and expected operations, in the listing format
    pub fn render_scenario(&self, scenario_id: &str) -> String {
        let mut out = format!("{}: {}\n", scenario_id, self.scenario_rule(scenario_id).describe());
        if let Some(pattern) = self.acceptance_table().get(scenario_id) {
            for element in pattern {
                out.push_str(&format!("  - {}\n", element));
            }
        }
        out
    }

    /// Expected patterns keyed by scenario id, in table order
    pub fn acceptance_table(&self) -> AcceptanceTable {
        self.prompts
            .iter()
            .flat_map(|prompt| {
                prompt
                    .scenarios
                    .iter()
                    .map(move |s| (prompt.scenario_id(s), s.expected.clone()))
            })
            .collect()
    }
}

const PROMPT1: &str = "Transfer 1000 from account BC12345 to the account ND87632 by withdrawing from the first and depositing into the second. If both operations are successful, change 1.50 from the first account. If not, return the value to the account and don't charge the tax.";
const PROMPT2: &str = "Execute withdrawal operations of 500 from account BC3456A one at a time. Repeat until a failure is received, or until this operation has been executed 5 times. Deposit the total value withdrawn in account FG62495S and pay a tax of 10% of the value deposited in the account FG62495S.";
const PROMPT3: &str = "Withdraw 600 from account AG7340H and 700 from account TG23986Q. If one of the operations is not successful, return the value to the other account and don't execute anything else. If both operations are successful, perform a deposit of the summed value into account WS2754T and perform a payment of 1200 in this same account.";

fn literals(ops: &[&str]) -> ExpectedPattern {
    ops.iter().map(|op| PatternElement::literal(*op)).collect::<Vec<_>>().into()
}

fn default_prompts() -> Vec<PromptDefinition> {
    let mut p2a = vec!["withdraw(BC3456A,500.0)"; 5];
    p2a.extend(["deposit(FG62495S,2500.0)", "taxes(FG62495S,250.0)"]);
    let mut p2b = vec!["withdraw(BC3456A,500.0)"; 3];
    p2b.extend(["deposit(FG62495S,1500.0)", "taxes(FG62495S,150.0)"]);

    vec![
        PromptDefinition {
            id: "P1".to_string(),
            text: PROMPT1.to_string(),
            scenarios: vec![
                ScenarioDefinition::new(
                    "A",
                    ScenarioRule::AlwaysSucceed,
                    literals(&[
                        "withdraw(BC12345,1000.0)",
                        "deposit(ND87632,1000.0)",
                        "taxes(BC12345,1.5)",
                    ]),
                ),
                ScenarioDefinition::new(
                    "B",
                    ScenarioRule::fail_on_target(OperationType::Deposit, "ND87632"),
                    literals(&[
                        "withdraw(BC12345,1000.0)",
                        "deposit(ND87632,1000.0)->FAILED",
                        "returnValue(BC12345,1000.0)",
                    ]),
                ),
            ],
        },
        PromptDefinition {
            id: "P2".to_string(),
            text: PROMPT2.to_string(),
            scenarios: vec![
                ScenarioDefinition::new(
                    "A",
                    ScenarioRule::AlwaysSucceed,
                    literals(&p2a),
                ),
                ScenarioDefinition::new(
                    "B",
                    ScenarioRule::fail_after_threshold(OperationType::Withdraw, "BC3456A", 3),
                    literals(&p2b),
                ),
            ],
        },
        PromptDefinition {
            id: "P3".to_string(),
            text: PROMPT3.to_string(),
            scenarios: vec![
                ScenarioDefinition::new(
                    "A",
                    ScenarioRule::AlwaysSucceed,
                    literals(&[
                        "withdraw(AG7340H,600.0)",
                        "withdraw(TG23986Q,700.0)",
                        "deposit(WS2754T,1300.0)",
                        "payment(WS2754T,1200.0)",
                    ]),
                ),
                ScenarioDefinition::new(
                    "B",
                    ScenarioRule::first_of_pair_fails(
                        OperationType::Withdraw,
                        "AG7340H",
                        "TG23986Q",
                    ),
                    ExpectedPattern::new(vec![
                        PatternElement::any_of([
                            "withdraw(AG7340H,600.0)->FAILED",
                            "withdraw(TG23986Q,700.0)->FAILED",
                        ]),
                        PatternElement::method("returnValue", "<the one that succeeded>, <value>"),
                    ]),
                ),
            ],
        },
    ]
}

impl LedgerbenchConfig {
    /// Load configuration from file and environment variables.
    ///
    /// Loads in this order:
    /// 1. Default configuration
    /// 2. `ledgerbench.toml` in the working directory
    /// 3. File named by `LEDGERBENCH_CONFIG_PATH`
    /// 4. `LEDGERBENCH_` environment variables (`LEDGERBENCH_RUN__COOLDOWN=2s`)
    /// 5. `OLLAMA_BASE_URL` for the backend URL
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is invalid or the result fails validation.
    pub fn load() -> Result<Self> {
        use figment::{
            Figment,
            providers::{Env, Format, Serialized, Toml},
        };

        let mut figment = Figment::from(Serialized::defaults(LedgerbenchConfig::default()))
            .merge(Toml::file("ledgerbench.toml"));

        // Check for custom config path
        if let Ok(path) = std::env::var("LEDGERBENCH_CONFIG_PATH") {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment
            .merge(
                Env::prefixed("LEDGERBENCH_")
                    .ignore(&["CONFIG_PATH"])
                    .split("__"),
            )
            .merge(
                Env::raw()
                    .only(&["OLLAMA_BASE_URL"])
                    .map(|_| "backend.base_url".into()),
            );

        let config: LedgerbenchConfig = figment.extract().map_err(|e| {
            LedgerbenchError::Configuration(format!("Failed to load configuration: {}", e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path, on top of the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        use figment::{
            Figment,
            providers::{Format, Serialized, Toml},
        };

        let config: LedgerbenchConfig =
            Figment::from(Serialized::defaults(LedgerbenchConfig::default()))
                .merge(Toml::file(path.as_ref()))
                .extract()
                .map_err(|e| {
                    LedgerbenchError::Configuration(format!(
                        "Failed to load configuration file {}: {}",
                        path.as_ref().display(),
                        e
                    ))
                })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(LedgerbenchError::Configuration(msg));

        if self.run.runs_per_combination == 0 {
            return invalid("run.runs_per_combination must be at least 1".to_string());
        }
        if self.agent.models.is_empty() {
            return invalid("agent.models must name at least one model".to_string());
        }
        if self.backend.max_tool_turns == 0 {
            return invalid("backend.max_tool_turns must be at least 1".to_string());
        }
        if self.experiment.configurations.is_empty() {
            return invalid("experiment.configurations must not be empty".to_string());
        }

        let mut ids = HashSet::new();
        for configuration in &self.experiment.configurations {
            if !ids.insert(configuration.id.as_str()) {
                return invalid(format!("Duplicate configuration id: {}", configuration.id));
            }
            if configuration.facades.is_empty() {
                return invalid(format!("Configuration {} has no facades", configuration.id));
            }
        }

        let mut ids = HashSet::new();
        for prompt in &self.experiment.prompts {
            if !ids.insert(prompt.id.as_str()) {
                return invalid(format!("Duplicate prompt id: {}", prompt.id));
            }
            let mut suffixes = HashSet::new();
            for scenario in &prompt.scenarios {
                if !suffixes.insert(scenario.suffix.as_str()) {
                    return invalid(format!(
                        "Duplicate scenario {} in prompt {}",
                        scenario.suffix, prompt.id
                    ));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tables() {
        let config = LedgerbenchConfig::default();
        assert!(config.validate().is_ok());

        let tables = &config.experiment;
        assert_eq!(tables.configurations.len(), 4);
        assert_eq!(
            tables.configuration("CONF4").unwrap().facades,
            vec![ToolClass::SingleDispatch, ToolClass::NamedOperations]
        );
        assert_eq!(tables.prompts.len(), 3);
        assert_eq!(tables.acceptance_table().len(), 6);
        assert_eq!(tables.acceptance_table().get("P2A").unwrap().len(), 7);
        assert_eq!(tables.acceptance_table().get("P2B").unwrap().len(), 5);
        assert_eq!(config.run.runs_per_combination, 10);
        assert_eq!(config.agent.fallback_policy().max_attempts(), 6);
    }

    #[test]
    fn test_scenario_rules() {
        let tables = ExperimentTables::default();
        assert_eq!(tables.scenario_rule("P1A"), ScenarioRule::AlwaysSucceed);
        assert_eq!(
            tables.scenario_rule("P2B"),
            ScenarioRule::fail_after_threshold(OperationType::Withdraw, "BC3456A", 3)
        );
        assert_eq!(tables.scenario_rule("P9Z"), ScenarioRule::AlwaysSucceed);
    }

    #[test]
    fn test_render_scenario() {
        let tables = ExperimentTables::default();

        let known = tables.render_scenario("P2B");
        assert!(known.starts_with("P2B: WITHDRAW on BC3456A fails after 3 attempts\n"));
        assert_eq!(known.lines().filter(|l| l.starts_with("  - ")).count(), 5);

        assert_eq!(tables.render_scenario("P9Z"), "P9Z: every call succeeds\n");
    }

    #[test]
    fn test_load_layers() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "ledgerbench.toml",
                r#"
                [run]
                runs_per_combination = 3
                cooldown = "250ms"

                [agent]
                models = ["qwen3:14b"]
            "#,
            )?;
            jail.set_env("LEDGERBENCH_AGENT__RETRIES_PER_MODEL", "4");
            jail.set_env("OLLAMA_BASE_URL", "http://gpu-box:11434");

            let config = LedgerbenchConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.run.runs_per_combination, 3);
            assert_eq!(config.run.cooldown, Duration::from_millis(250));
            assert_eq!(config.agent.models, vec!["qwen3:14b"]);
            assert_eq!(config.agent.retries_per_model, 4);
            assert_eq!(config.backend.base_url, "http://gpu-box:11434");
            // Untouched sections keep their defaults
            assert_eq!(config.experiment, ExperimentTables::default());
            Ok(())
        });
    }

    #[test]
    fn test_custom_experiment_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "custom.toml",
                r#"
                [[experiment.configurations]]
                id = "ONLY"
                facades = ["SingleDispatch"]

                [[experiment.prompts]]
                id = "Q1"
                text = "Withdraw 10 from A1."

                [[experiment.prompts.scenarios]]
                suffix = "A"
                expected = ["withdraw(A1,10.0)"]

                [[experiment.prompts.scenarios]]
                suffix = "B"
                rule = { kind = "fail_on_target", operation = "WITHDRAW" }
                expected = ["withdraw(A1,10.0)->FAILED"]
            "#,
            )?;

            let config = LedgerbenchConfig::from_file("custom.toml").map_err(|e| e.to_string())?;
            let tables = &config.experiment;
            assert_eq!(tables.configurations.len(), 1);
            assert_eq!(tables.scenario_rule("Q1A"), ScenarioRule::AlwaysSucceed);
            assert_eq!(
                tables.scenario_rule("Q1B"),
                ScenarioRule::FailOnTarget {
                    operation: OperationType::Withdraw,
                    account: None
                }
            );
            Ok(())
        });
    }

    #[test]
    fn test_validation() {
        let mut config = LedgerbenchConfig::default();
        config.run.runs_per_combination = 0;
        assert!(config.validate().is_err());

        let mut config = LedgerbenchConfig::default();
        config.agent.models.clear();
        assert!(config.validate().is_err());

        let mut config = LedgerbenchConfig::default();
        config.experiment.configurations[1].id = "CONF1".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Duplicate configuration id: CONF1"));

        let mut config = LedgerbenchConfig::default();
        config.experiment.configurations[0].facades.clear();
        assert!(config.validate().is_err());
    }
}
