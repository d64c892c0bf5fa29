//! Named, independent test scenarios and the runner that executes them.
//!
//! Every scenario gets a fresh session; one scenario failing never
//! affects another.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{error, info};

use crate::config::Config;
use crate::driver::{Connector, Page};
use crate::errors::{DriverError, ErrorKind, ProbeError};
use crate::radio::RadioDisambiguator;
use crate::resolver::FieldResolver;
use crate::session::Session;
use crate::waiter::Waiter;

/// What a scenario does on the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Write `text` into the field labelled `label` and read it back
    FillField { label: String, text: String },
    /// Select the radio associated with `token`
    SelectRadio { token: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scenario {
    pub name: String,
    pub step: Step,
}

impl Scenario {
    pub fn fill(name: &str, label: &str, text: &str) -> Self {
        Scenario {
            name: name.to_string(),
            step: Step::FillField {
                label: label.to_string(),
                text: text.to_string(),
            },
        }
    }

    pub fn select_radio(name: &str, token: &str) -> Self {
        Scenario {
            name: name.to_string(),
            step: Step::SelectRadio {
                token: token.to_string(),
            },
        }
    }

    /// Execute the step against an already prepared page
    pub async fn run<P: Page>(&self, page: &P, config: &Config) -> Result<(), ProbeError> {
        match &self.step {
            Step::FillField { label, text } => {
                FieldResolver::new(page, Waiter::new(config.wait))
                    .fill_field(label, text)
                    .await?;
            }
            Step::SelectRadio { token } => {
                RadioDisambiguator::new(page, config.radio.clone())
                    .select(token)
                    .await?;
            }
        }
        Ok(())
    }
}

/// The suite run against the practice form
pub fn default_suite() -> Vec<Scenario> {
    vec![
        Scenario::fill("first_name_input", "First Name", "Ananya"),
        Scenario::fill("email_input", "Email", "test@example.com"),
        Scenario::select_radio("gender_radio", "male"),
    ]
}

/// Result of one scenario
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioOutcome {
    pub name: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub duration_ms: u64,
}

/// Results of a whole run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub passed: usize,
    pub failed: usize,
    pub scenarios: Vec<ScenarioOutcome>,
}

impl RunReport {
    pub fn new(scenarios: Vec<ScenarioOutcome>) -> Self {
        let passed = scenarios.iter().filter(|o| o.passed).count();
        RunReport {
            passed,
            failed: scenarios.len() - passed,
            scenarios,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// 0 iff every scenario passed
    pub fn exit_code(&self) -> i32 {
        if self.all_passed() { 0 } else { 1 }
    }

    /// One line per scenario plus a summary line
    pub fn render_simple(&self) -> String {
        let mut out = String::new();
        for outcome in &self.scenarios {
            if outcome.passed {
                out.push_str(&format!("PASS {} ({} ms)\n", outcome.name, outcome.duration_ms));
            } else {
                out.push_str(&format!(
                    "FAIL {} ({} ms): {}\n",
                    outcome.name,
                    outcome.duration_ms,
                    outcome.message.as_deref().unwrap_or("unknown error")
                ));
            }
        }
        out.push_str(&format!("{} passed, {} failed\n", self.passed, self.failed));
        out
    }
}

/// Run one scenario in its own session, always tearing the session down.
///
/// A panic inside the scenario is re-raised after teardown.
pub async fn run_scenario<C: Connector>(
    connector: &C,
    config: &Config,
    scenario: &Scenario,
) -> ScenarioOutcome {
    let start = Instant::now();
    info!("Running scenario {}", scenario.name);

    let result = match Session::setup(connector, &config.session).await {
        Ok(mut session) => {
            let result = match session.page() {
                Some(page) => AssertUnwindSafe(scenario.run(page, config))
                    .catch_unwind()
                    .await,
                None => Ok(Err(
                    DriverError::Connection("session already closed".to_string()).into(),
                )),
            };
            session.teardown().await;
            match result {
                Ok(result) => result,
                Err(panic) => {
                    error!("Scenario {} panicked", scenario.name);
                    std::panic::resume_unwind(panic);
                }
            }
        }
        Err(e) => Err(e),
    };

    let duration_ms = start.elapsed().as_millis() as u64;
    match result {
        Ok(()) => {
            info!("Scenario {} passed", scenario.name);
            ScenarioOutcome {
                name: scenario.name.clone(),
                passed: true,
                kind: None,
                message: None,
                duration_ms,
            }
        }
        Err(e) => {
            error!("Scenario {} failed: {}", scenario.name, e);
            ScenarioOutcome {
                name: scenario.name.clone(),
                passed: false,
                kind: Some(e.kind()),
                message: Some(e.to_string()),
                duration_ms,
            }
        }
    }
}

/// Run every scenario in order, each independently
pub async fn run_suite<C: Connector>(
    connector: &C,
    config: &Config,
    scenarios: &[Scenario],
) -> RunReport {
    let mut outcomes = Vec::with_capacity(scenarios.len());
    for scenario in scenarios {
        outcomes.push(run_scenario(connector, config, scenario).await);
    }
    RunReport::new(outcomes)
}

#[cfg(test)]
#[path = "scenario_test.rs"]
mod scenario_test;
