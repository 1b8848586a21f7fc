use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::garage::{MaintenanceType, PowertrainType};

pub mod catalog;
pub mod engine;
#[cfg(test)]
mod engine_tests;

pub use catalog::SERVICE_TEMPLATES;
pub use engine::ServiceTemplateEngine;

/// Urgency of a service template.
///
/// Variants are declared from most to least urgent, so the derived `Ord`
/// sorts the most urgent services first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServicePriority {
    /// Safety-related, must be done
    Critical,
    /// Important for vehicle health
    High,
    /// Regular maintenance
    Medium,
    /// Optional or cosmetic
    Low,
}

impl fmt::Display for ServicePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServicePriority::Critical => write!(f, "Critical"),
            ServicePriority::High => write!(f, "High"),
            ServicePriority::Medium => write!(f, "Medium"),
            ServicePriority::Low => write!(f, "Low"),
        }
    }
}

/// Estimated cost of a service in whole dollars, `low <= high`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CostRange {
    pub low: u32,
    pub high: u32,
}

impl CostRange {
    pub const fn new(low: u32, high: u32) -> Self {
        assert!(low <= high, "cost range low bound exceeds high bound");
        Self { low, high }
    }
}

impl fmt::Display for CostRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}-${}", self.low, self.high)
    }
}

/// A recurring service from the static catalog.
///
/// Templates are not tied to a vehicle; they are matched by powertrain
/// and maintenance type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceTemplate {
    pub name: &'static str,
    pub maintenance_type: MaintenanceType,
    pub description: &'static str,
    pub interval_miles: u32,
    pub interval_months: u32,
    pub powertrain_types: &'static [PowertrainType],
    pub estimated_cost: CostRange,
    pub priority: ServicePriority,
    pub notes: Option<&'static str>,
}

impl ServiceTemplate {
    pub fn applies_to(&self, powertrain_type: PowertrainType) -> bool {
        self.powertrain_types.contains(&powertrain_type)
    }
}

/// When a vehicle was last serviced.
///
/// The default is "never serviced": zero miles at the Unix epoch, which
/// makes every date-based interval overdue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastService {
    pub mileage: u32,
    pub date: DateTime<Utc>,
}

impl LastService {
    pub fn never() -> Self {
        Self {
            mileage: 0,
            date: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    pub fn at(mileage: u32, date: DateTime<Utc>) -> Self {
        Self { mileage, date }
    }
}

impl Default for LastService {
    fn default() -> Self {
        Self::never()
    }
}
