use crate::agents::{parse_config, Behavior, BehaviorResult};
use crate::context::TickContext;
use crate::error::{Result, SimError};
use crate::model::{Agent, AgentState, AgentType, Building, PlanetId};
use crate::systems::resolve_square;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use starforge_logic::resources::BuildingType;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoBuilderConfig {
    /// Only build on these planets. Empty means anywhere.
    pub planet_ids: Vec<PlanetId>,
    /// Building type names, most wanted first.
    pub priority_building_types: Vec<String>,
    /// Cap on the player's busy builders. 0 means unlimited.
    pub max_concurrent_buildings: u32,
}

impl AutoBuilderConfig {
    fn priorities(&self) -> Result<Vec<BuildingType>> {
        self.priority_building_types
            .iter()
            .map(|name| {
                BuildingType::parse(name).ok_or_else(|| SimError::InvalidBehaviorConfig {
                    behavior: "AutoBuilder".to_string(),
                    reason: format!("unknown building type '{}'", name),
                })
            })
            .collect()
    }
}

/// Keeps the agent's builder working through the player's queued buildings.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoBuilder;

#[async_trait]
impl Behavior for AutoBuilder {
    fn name(&self) -> &'static str {
        "AutoBuilder"
    }

    fn description(&self) -> &'static str {
        "Automatically assigns builders to construct queued buildings"
    }

    fn supported_types(&self) -> &'static [AgentType] {
        &[AgentType::Builder]
    }

    fn validate_config(&self, config: Option<&str>) -> Result<()> {
        parse_config::<AutoBuilderConfig>(self.name(), config)?.priorities()?;
        Ok(())
    }

    async fn can_execute(&self, agent: &Agent, ctx: &TickContext) -> Result<bool> {
        let Some(builder_id) = agent.builder_id else {
            return Ok(false);
        };
        Ok(ctx.store.get_builder(builder_id).await?.is_some())
    }

    async fn execute(&self, agent: &Agent, ctx: &mut TickContext) -> Result<BehaviorResult> {
        let config: AutoBuilderConfig = parse_config(self.name(), agent.config.as_deref())?;
        let priorities = config.priorities()?;

        let Some(builder_id) = agent.builder_id else {
            return Ok(BehaviorResult::error("Agent does not have a builder assigned"));
        };
        let Some(mut builder) = ctx.store.get_builder(builder_id).await? else {
            return Ok(BehaviorResult::error("Builder not found"));
        };
        if !builder.is_available {
            return Ok(BehaviorResult::success(
                "Builder is currently busy",
                AgentState::Active,
            ));
        }

        // Builders cannot leave their planet.
        let mut candidates: Vec<Building> = Vec::new();
        for building in ctx.store.list_buildings(ctx.game_id).await? {
            if building.is_complete
                || building.player_id != agent.player_id
                || building.assigned_builder_id.is_some()
            {
                continue;
            }
            let Some(location) = resolve_square(ctx.store.as_ref(), building.grid_square_id).await?
            else {
                continue;
            };
            let planet_id = location.planet.id;
            if planet_id != builder.planet_id
                || (!config.planet_ids.is_empty() && !config.planet_ids.contains(&planet_id))
            {
                continue;
            }
            candidates.push(building);
        }
        candidates.sort_by_key(|b| (b.created_at, b.id));

        let chosen = priorities
            .iter()
            .find_map(|t| candidates.iter().position(|b| b.building_type == *t))
            .or(if candidates.is_empty() { None } else { Some(0) });
        let Some(index) = chosen else {
            return Ok(BehaviorResult::idle("No buildings awaiting construction"));
        };

        if config.max_concurrent_buildings > 0 {
            let busy = ctx
                .store
                .list_builders(ctx.game_id, &agent.player_id)
                .await?
                .iter()
                .filter(|b| !b.is_available)
                .count();
            if busy >= config.max_concurrent_buildings as usize {
                return Ok(BehaviorResult::success(
                    format!(
                        "Max concurrent buildings limit reached ({})",
                        config.max_concurrent_buildings
                    ),
                    AgentState::Active,
                ));
            }
        }

        let mut building = candidates.swap_remove(index);
        builder.assign(building.id);
        building.assigned_builder_id = Some(builder.id);
        building.construction_start_time = Some(ctx.now);
        ctx.store.update_builder(&builder).await?;
        ctx.store.update_building(&building).await?;

        Ok(BehaviorResult::success(
            format!(
                "Assigned builder to construct {} at building {}",
                building.building_type.name(),
                building.id
            ),
            AgentState::Active,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_and_names() {
        let config: AutoBuilderConfig = parse_config("AutoBuilder", Some("{}")).unwrap();
        assert_eq!(config, AutoBuilderConfig::default());

        let config: AutoBuilderConfig = parse_config(
            "AutoBuilder",
            Some(r#"{"planet_ids":[3],"priority_building_types":["farm","IronMiner"]}"#),
        )
        .unwrap();
        assert_eq!(
            config.priorities().unwrap(),
            vec![BuildingType::Farm, BuildingType::IronMiner]
        );
    }

    #[test]
    fn test_rejects_unknown_building_type() {
        let err = AutoBuilder
            .validate_config(Some(r#"{"priority_building_types":["Spaceport"]}"#))
            .unwrap_err();
        assert!(err.to_string().contains("Spaceport"));
    }

    #[test]
    fn test_config_is_optional() {
        assert!(AutoBuilder.validate_config(None).is_ok());
        assert!(AutoBuilder.validate_config(Some("[1,2]")).is_err());
    }
}
