use super::behaviors::{AutoBuilder, Idle, ProductionMonitor, ResourceFerry};
use super::Behavior;
use std::collections::HashMap;
use std::sync::Arc;

/// Case-insensitive lookup from behavior name to strategy.
#[derive(Clone)]
pub struct BehaviorRegistry {
    behaviors: HashMap<String, Arc<dyn Behavior>>,
    fallback: Arc<dyn Behavior>,
}

impl std::fmt::Debug for BehaviorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.behaviors.values().map(|b| b.name()).collect();
        names.sort_unstable();
        f.debug_struct("BehaviorRegistry")
            .field("behaviors", &names)
            .finish()
    }
}

impl Default for BehaviorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl BehaviorRegistry {
    /// An empty registry. Unknown names resolve to `Idle`.
    pub fn new() -> Self {
        Self {
            behaviors: HashMap::new(),
            fallback: Arc::new(Idle),
        }
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(Idle));
        registry.register(Arc::new(AutoBuilder));
        registry.register(Arc::new(ResourceFerry));
        registry.register(Arc::new(ProductionMonitor));
        registry
    }

    /// Add or replace a behavior under its own name.
    pub fn register(&mut self, behavior: Arc<dyn Behavior>) {
        self.behaviors
            .insert(behavior.name().to_ascii_lowercase(), behavior);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Behavior>> {
        self.behaviors
            .get(&name.trim().to_ascii_lowercase())
            .cloned()
    }

    /// The named behavior, or `Idle` when the name is unset or unknown.
    pub fn resolve(&self, name: Option<&str>) -> Arc<dyn Behavior> {
        name.and_then(|n| self.get(n))
            .unwrap_or_else(|| Arc::clone(&self.fallback))
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.behaviors.values().map(|b| b.name()).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = BehaviorRegistry::with_builtins();
        assert_eq!(registry.get("autobuilder").unwrap().name(), "AutoBuilder");
        assert_eq!(registry.get(" RESOURCEFERRY ").unwrap().name(), "ResourceFerry");
        assert!(registry.get("Teleporter").is_none());
    }

    #[test]
    fn test_unknown_or_missing_falls_back_to_idle() {
        let registry = BehaviorRegistry::with_builtins();
        assert_eq!(registry.resolve(None).name(), "Idle");
        assert_eq!(registry.resolve(Some("Teleporter")).name(), "Idle");
        assert_eq!(
            registry.resolve(Some("productionmonitor")).name(),
            "ProductionMonitor"
        );
    }

    #[test]
    fn test_builtin_names() {
        assert_eq!(
            BehaviorRegistry::with_builtins().names(),
            vec!["AutoBuilder", "Idle", "ProductionMonitor", "ResourceFerry"]
        );
    }
}
