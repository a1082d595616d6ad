//! Player-owned automation.
//!
//! An [`Agent`] names a behavior; the [`BehaviorRegistry`] resolves that name
//! to a [`Behavior`] strategy and [`agent_system`] runs every active agent
//! once per tick, subject to its throttle.
//!
//! | Behavior            | Agent type    | Does                                      |
//! |---------------------|---------------|-------------------------------------------|
//! | `Idle`              | any           | nothing; parks the agent                  |
//! | `AutoBuilder`       | Builder       | assigns its builder to queued buildings   |
//! | `ResourceFerry`     | ResourceFerry | moves one resource between two stations   |
//! | `ProductionMonitor` | Custom        | raises low-stock alerts                   |

pub mod behaviors;
mod executor;
mod registry;

pub use executor::*;
pub use registry::BehaviorRegistry;

use crate::context::TickContext;
use crate::error::{Result, SimError};
use crate::model::{Agent, AgentState, AgentType};
use async_trait::async_trait;
use serde::de::DeserializeOwned;

/// Outcome of one behavior run.
#[derive(Debug, Clone, PartialEq)]
pub struct BehaviorResult {
    pub success: bool,
    pub message: String,
    pub next_state: AgentState,
    /// Seconds before the agent should run again.
    pub delay_seconds: Option<f64>,
    /// Structured payload for the agent log, as JSON text.
    pub log_data: Option<String>,
}

impl BehaviorResult {
    pub fn success(message: impl Into<String>, next_state: AgentState) -> Self {
        Self {
            success: true,
            message: message.into(),
            next_state,
            delay_seconds: None,
            log_data: None,
        }
    }

    /// A failed run. The agent stays in `Error` until resumed.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            next_state: AgentState::Error,
            delay_seconds: None,
            log_data: None,
        }
    }

    pub fn idle(message: impl Into<String>) -> Self {
        Self::success(message, AgentState::Idle)
    }

    pub fn with_delay(mut self, seconds: f64) -> Self {
        self.delay_seconds = Some(seconds);
        self
    }

    pub fn with_log_data(mut self, data: impl Into<String>) -> Self {
        self.log_data = Some(data.into());
        self
    }
}

/// A named automation strategy.
#[async_trait]
pub trait Behavior: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn supported_types(&self) -> &'static [AgentType];

    /// Reject malformed JSON or missing required fields.
    fn validate_config(&self, config: Option<&str>) -> Result<()>;

    async fn can_execute(&self, agent: &Agent, ctx: &TickContext) -> Result<bool>;

    async fn execute(&self, agent: &Agent, ctx: &mut TickContext) -> Result<BehaviorResult>;

    fn supports(&self, agent_type: AgentType) -> bool {
        self.supported_types().contains(&agent_type)
    }
}

/// Parse a behavior's JSON config. Blank input yields the default config.
pub(crate) fn parse_config<T: DeserializeOwned + Default>(
    behavior: &str,
    raw: Option<&str>,
) -> Result<T> {
    match raw.map(str::trim) {
        None | Some("") => Ok(T::default()),
        Some(json) => serde_json::from_str(json).map_err(|e| SimError::InvalidBehaviorConfig {
            behavior: behavior.to_string(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(default)]
    struct Sample {
        limit: u32,
    }

    #[test]
    fn test_blank_config_is_default() {
        let parsed: Sample = parse_config("Sample", Some("   ")).unwrap();
        assert_eq!(parsed, Sample::default());
        let parsed: Sample = parse_config("Sample", None).unwrap();
        assert_eq!(parsed.limit, 0);
    }

    #[test]
    fn test_malformed_config_names_behavior() {
        let err = parse_config::<Sample>("Sample", Some("{not json")).unwrap_err();
        assert!(err.to_string().contains("'Sample'"));
        assert!(err.is_validation());
    }

    #[test]
    fn test_result_builders() {
        let r = BehaviorResult::idle("nothing").with_delay(30.0);
        assert!(r.success);
        assert_eq!(r.next_state, AgentState::Idle);
        assert_eq!(r.delay_seconds, Some(30.0));
        assert_eq!(BehaviorResult::error("x").next_state, AgentState::Error);
    }
}
