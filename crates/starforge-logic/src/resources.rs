//! Resource kinds, resource bundles and building types.

use serde::{Deserialize, Serialize};

/// The four extractable resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    #[serde(alias = "iron")]
    Iron,
    #[serde(alias = "copper")]
    Copper,
    #[serde(alias = "fuel")]
    Fuel,
    #[serde(alias = "soil")]
    Soil,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [Self::Iron, Self::Copper, Self::Fuel, Self::Soil];

    pub fn name(self) -> &'static str {
        match self {
            Self::Iron => "Iron",
            Self::Copper => "Copper",
            Self::Fuel => "Fuel",
            Self::Soil => "Soil",
        }
    }

    /// Case-insensitive lookup by name.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(name.trim()))
    }
}

/// Amounts of each resource held by a station or charged as a cost.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Resources {
    pub iron: f64,
    pub copper: f64,
    pub fuel: f64,
    pub soil: f64,
}

impl Resources {
    pub fn new(iron: f64, copper: f64, fuel: f64, soil: f64) -> Self {
        Self {
            iron,
            copper,
            fuel,
            soil,
        }
    }

    pub fn get(&self, kind: ResourceKind) -> f64 {
        match kind {
            ResourceKind::Iron => self.iron,
            ResourceKind::Copper => self.copper,
            ResourceKind::Fuel => self.fuel,
            ResourceKind::Soil => self.soil,
        }
    }

    fn slot(&mut self, kind: ResourceKind) -> &mut f64 {
        match kind {
            ResourceKind::Iron => &mut self.iron,
            ResourceKind::Copper => &mut self.copper,
            ResourceKind::Fuel => &mut self.fuel,
            ResourceKind::Soil => &mut self.soil,
        }
    }

    pub fn add(&mut self, kind: ResourceKind, amount: f64) {
        *self.slot(kind) += amount;
    }

    /// Remove up to `amount`, never going below zero. Returns what was taken.
    pub fn take(&mut self, kind: ResourceKind, amount: f64) -> f64 {
        let slot = self.slot(kind);
        let taken = amount.max(0.0).min(*slot);
        *slot -= taken;
        taken
    }

    pub fn add_all(&mut self, other: &Resources) {
        for kind in ResourceKind::ALL {
            self.add(kind, other.get(kind));
        }
    }

    /// Whether every component is at least the matching component of `cost`.
    pub fn covers(&self, cost: &Resources) -> bool {
        ResourceKind::ALL
            .into_iter()
            .all(|k| self.get(k) >= cost.get(k))
    }

    /// Subtract `cost` if affordable. Returns false and leaves `self`
    /// untouched otherwise.
    pub fn try_pay(&mut self, cost: &Resources) -> bool {
        if !self.covers(cost) {
            return false;
        }
        for kind in ResourceKind::ALL {
            *self.slot(kind) -= cost.get(kind);
        }
        true
    }
}

/// Surface structures players place on grid squares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingType {
    IronMiner,
    CopperMiner,
    FuelMiner,
    Farm,
}

impl BuildingType {
    pub const ALL: [BuildingType; 4] = [
        Self::IronMiner,
        Self::CopperMiner,
        Self::FuelMiner,
        Self::Farm,
    ];

    /// The grid resource this building extracts.
    pub fn resource(self) -> ResourceKind {
        match self {
            Self::IronMiner => ResourceKind::Iron,
            Self::CopperMiner => ResourceKind::Copper,
            Self::FuelMiner => ResourceKind::Fuel,
            Self::Farm => ResourceKind::Soil,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::IronMiner => "IronMiner",
            Self::CopperMiner => "CopperMiner",
            Self::FuelMiner => "FuelMiner",
            Self::Farm => "Farm",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|b| b.name().eq_ignore_ascii_case(name.trim()))
    }
}
