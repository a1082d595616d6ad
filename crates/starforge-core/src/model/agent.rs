use super::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentType {
    Builder,
    ResourceFerry,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentState {
    Idle,
    Active,
    Paused,
    Error,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub game_id: GameId,
    pub player_id: PlayerId,
    pub name: String,
    pub agent_type: AgentType,
    pub state: AgentState,
    pub behavior_name: Option<String>,
    /// Behavior-specific JSON, kept as text and parsed by the behavior.
    pub config: Option<String>,
    pub builder_id: Option<BuilderId>,
    /// Reserved; no behavior reads it yet.
    pub spaceship_id: Option<ShipId>,
    pub last_execution_time: Option<DateTime<Utc>>,
    /// Set from a behavior's requested delay; the agent is skipped until then.
    pub next_execution_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentLog {
    pub id: LogId,
    pub agent_id: AgentId,
    pub level: LogLevel,
    pub message: String,
    /// Optional structured payload as JSON text.
    pub data: Option<String>,
    pub at: DateTime<Utc>,
}
