use crate::agents::{parse_config, Behavior, BehaviorResult};
use crate::context::TickContext;
use crate::error::{Result, SimError};
use crate::model::{Agent, AgentState, AgentType, SystemId};
use crate::systems::ensure_station;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use starforge_logic::resources::ResourceKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceFerryConfig {
    pub source_system_id: Option<SystemId>,
    pub target_system_id: Option<SystemId>,
    pub resource_type: String,
    pub min_amount: f64,
    pub max_amount: f64,
    pub ferry_interval_seconds: f64,
}

impl Default for ResourceFerryConfig {
    fn default() -> Self {
        Self {
            source_system_id: None,
            target_system_id: None,
            resource_type: "Iron".to_string(),
            min_amount: 100.0,
            max_amount: 500.0,
            ferry_interval_seconds: 300.0,
        }
    }
}

impl ResourceFerryConfig {
    fn invalid(reason: impl Into<String>) -> SimError {
        SimError::InvalidBehaviorConfig {
            behavior: "ResourceFerry".to_string(),
            reason: reason.into(),
        }
    }

    pub fn resource(&self) -> Result<ResourceKind> {
        ResourceKind::parse(&self.resource_type)
            .ok_or_else(|| Self::invalid(format!("unknown resource type '{}'", self.resource_type)))
    }

    fn check(&self) -> Result<(SystemId, SystemId)> {
        let (Some(source), Some(target)) = (self.source_system_id, self.target_system_id) else {
            return Err(Self::invalid("source_system_id and target_system_id are required"));
        };
        if source == target {
            return Err(Self::invalid("source and target systems must differ"));
        }
        if self.min_amount < 0.0 || self.max_amount < self.min_amount {
            return Err(Self::invalid(format!(
                "amounts must satisfy 0 <= min_amount <= max_amount (got {} and {})",
                self.min_amount, self.max_amount
            )));
        }
        if self.ferry_interval_seconds < 0.0 {
            return Err(Self::invalid("ferry_interval_seconds must not be negative"));
        }
        self.resource()?;
        Ok((source, target))
    }
}

/// Moves one resource from the player's station in one system to their
/// station in another, creating the destination station on first use.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResourceFerry;

#[async_trait]
impl Behavior for ResourceFerry {
    fn name(&self) -> &'static str {
        "ResourceFerry"
    }

    fn description(&self) -> &'static str {
        "Transports resources between space stations"
    }

    fn supported_types(&self) -> &'static [AgentType] {
        &[AgentType::ResourceFerry]
    }

    fn validate_config(&self, config: Option<&str>) -> Result<()> {
        if config.map_or(true, |c| c.trim().is_empty()) {
            return Err(ResourceFerryConfig::invalid(
                "configuration is required for ResourceFerry",
            ));
        }
        parse_config::<ResourceFerryConfig>(self.name(), config)?.check()?;
        Ok(())
    }

    async fn can_execute(&self, agent: &Agent, _ctx: &TickContext) -> Result<bool> {
        let config: ResourceFerryConfig = parse_config(self.name(), agent.config.as_deref())?;
        Ok(config.check().is_ok())
    }

    async fn execute(&self, agent: &Agent, ctx: &mut TickContext) -> Result<BehaviorResult> {
        let config: ResourceFerryConfig = parse_config(self.name(), agent.config.as_deref())?;
        let (source_id, target_id) = config.check()?;
        let kind = config.resource()?;
        let interval = config.ferry_interval_seconds;

        let Some(mut source) = ctx.store.find_station(&agent.player_id, source_id).await? else {
            return Ok(BehaviorResult::error("Source space station not found"));
        };
        let target_in_game = match ctx.store.get_system(target_id).await? {
            Some(system) => ctx
                .store
                .get_galaxy(system.galaxy_id)
                .await?
                .map_or(false, |g| g.game_id == agent.game_id),
            None => false,
        };
        if !target_in_game {
            return Ok(BehaviorResult::error("Target system not found"));
        }
        let (mut target, created) =
            ensure_station(ctx.store.as_ref(), ctx.game_id, &agent.player_id, target_id).await?;
        if created {
            log::info!(
                "Ferry agent {} created station {} in system {}",
                agent.id,
                target.id,
                target_id
            );
        }

        let available = source.resources.get(kind);
        if available < config.min_amount {
            return Ok(BehaviorResult::success(
                format!(
                    "Source station has insufficient {} ({:.1} < {})",
                    kind.name(),
                    available,
                    config.min_amount
                ),
                AgentState::Active,
            )
            .with_delay(interval));
        }

        let moved = source.resources.take(kind, available.min(config.max_amount));
        target.resources.add(kind, moved);
        ctx.store.update_station(&source).await?;
        ctx.store.update_station(&target).await?;

        Ok(BehaviorResult::success(
            format!(
                "Ferried {:.1} {} from system {} to {}",
                moved,
                kind.name(),
                source_id,
                target_id
            ),
            AgentState::Active,
        )
        .with_delay(interval))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: ResourceFerryConfig =
            parse_config("ResourceFerry", Some(r#"{"source_system_id":1,"target_system_id":2}"#))
                .unwrap();
        assert_eq!(config.resource().unwrap(), ResourceKind::Iron);
        assert_eq!(config.min_amount, 100.0);
        assert_eq!(config.max_amount, 500.0);
        assert_eq!(config.ferry_interval_seconds, 300.0);
        assert_eq!(config.check().unwrap(), (1, 2));
    }

    #[test]
    fn test_config_is_required() {
        assert!(ResourceFerry.validate_config(None).is_err());
        assert!(ResourceFerry.validate_config(Some("  ")).is_err());
        let err = ResourceFerry
            .validate_config(Some(r#"{"source_system_id":1}"#))
            .unwrap_err();
        assert!(err.to_string().contains("required"));
    }

    #[test]
    fn test_rejects_bad_values() {
        for json in [
            r#"{"source_system_id":1,"target_system_id":1}"#,
            r#"{"source_system_id":1,"target_system_id":2,"resource_type":"gold"}"#,
            r#"{"source_system_id":1,"target_system_id":2,"min_amount":600}"#,
        ] {
            assert!(ResourceFerry.validate_config(Some(json)).is_err(), "{}", json);
        }
        assert!(ResourceFerry
            .validate_config(Some(
                r#"{"source_system_id":1,"target_system_id":2,"resource_type":"fuel"}"#
            ))
            .is_ok());
    }
}
