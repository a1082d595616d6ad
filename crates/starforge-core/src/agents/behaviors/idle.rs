use crate::agents::{Behavior, BehaviorResult};
use crate::context::TickContext;
use crate::error::Result;
use crate::model::{Agent, AgentType};
use async_trait::async_trait;

/// Seconds an idle agent asks to be left alone.
pub const IDLE_BACKOFF_SECONDS: f64 = 30.0;

/// Does nothing. Also the fallback for unknown behavior names.
#[derive(Debug, Default, Clone, Copy)]
pub struct Idle;

#[async_trait]
impl Behavior for Idle {
    fn name(&self) -> &'static str {
        "Idle"
    }

    fn description(&self) -> &'static str {
        "Agent does nothing"
    }

    fn supported_types(&self) -> &'static [AgentType] {
        &[AgentType::Builder, AgentType::ResourceFerry, AgentType::Custom]
    }

    fn validate_config(&self, _config: Option<&str>) -> Result<()> {
        Ok(())
    }

    async fn can_execute(&self, _agent: &Agent, _ctx: &TickContext) -> Result<bool> {
        Ok(true)
    }

    async fn execute(&self, _agent: &Agent, _ctx: &mut TickContext) -> Result<BehaviorResult> {
        Ok(BehaviorResult::idle("Agent is idle").with_delay(IDLE_BACKOFF_SECONDS))
    }
}
