use crate::agents::{parse_config, Behavior, BehaviorResult};
use crate::context::TickContext;
use crate::error::{Result, SimError};
use crate::model::{Agent, AgentState, AgentType, SpaceStation};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use starforge_logic::resources::ResourceKind;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductionMonitorConfig {
    pub monitored_resources: Vec<String>,
    /// Resource name to the stock level below which an alert is raised.
    pub alert_thresholds: BTreeMap<String, f64>,
    pub check_interval_seconds: f64,
}

impl Default for ProductionMonitorConfig {
    fn default() -> Self {
        Self {
            monitored_resources: Vec::new(),
            alert_thresholds: BTreeMap::new(),
            check_interval_seconds: 60.0,
        }
    }
}

impl ProductionMonitorConfig {
    fn threshold(&self, resource: &str) -> Option<f64> {
        self.alert_thresholds
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(resource))
            .map(|(_, t)| *t)
    }

    fn check(&self) -> Result<()> {
        for name in self.monitored_resources.iter().chain(self.alert_thresholds.keys()) {
            if ResourceKind::parse(name).is_none() {
                return Err(SimError::InvalidBehaviorConfig {
                    behavior: "ProductionMonitor".to_string(),
                    reason: format!("unknown resource type '{}'", name),
                });
            }
        }
        Ok(())
    }

    /// Low-stock alerts for one station.
    pub fn alerts_for(&self, station: &SpaceStation) -> Vec<String> {
        let mut alerts = Vec::new();
        for resource in &self.monitored_resources {
            let (Some(kind), Some(threshold)) = (ResourceKind::parse(resource), self.threshold(resource))
            else {
                continue;
            };
            let amount = station.resources.get(kind);
            if amount < threshold {
                alerts.push(format!(
                    "Station {}: {} low ({:.1} < {})",
                    station.name, resource, amount, threshold
                ));
            }
        }
        alerts
    }
}

/// Watches the player's stations and reports resources running low.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProductionMonitor;

#[async_trait]
impl Behavior for ProductionMonitor {
    fn name(&self) -> &'static str {
        "ProductionMonitor"
    }

    fn description(&self) -> &'static str {
        "Monitors resource production and sends alerts"
    }

    fn supported_types(&self) -> &'static [AgentType] {
        &[AgentType::Custom]
    }

    fn validate_config(&self, config: Option<&str>) -> Result<()> {
        parse_config::<ProductionMonitorConfig>(self.name(), config)?.check()
    }

    async fn can_execute(&self, _agent: &Agent, _ctx: &TickContext) -> Result<bool> {
        Ok(true)
    }

    async fn execute(&self, agent: &Agent, ctx: &mut TickContext) -> Result<BehaviorResult> {
        let config: ProductionMonitorConfig = parse_config(self.name(), agent.config.as_deref())?;

        let mut alerts = Vec::new();
        for station in ctx.store.list_stations(ctx.game_id, &agent.player_id).await? {
            alerts.extend(config.alerts_for(&station));
        }
        for alert in &alerts {
            log::warn!("Agent {}: {}", agent.id, alert);
        }

        let result = if alerts.is_empty() {
            BehaviorResult::success("All monitored resources above thresholds", AgentState::Active)
        } else {
            BehaviorResult::success(
                format!("Found {} resource alert(s)", alerts.len()),
                AgentState::Active,
            )
            .with_log_data(serde_json::json!({ "alerts": alerts }).to_string())
        };
        Ok(result.with_delay(config.check_interval_seconds))
    }
}
