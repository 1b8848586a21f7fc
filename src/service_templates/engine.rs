use chrono::{DateTime, Utc};

use super::{CostRange, LastService, SERVICE_TEMPLATES, ServicePriority, ServiceTemplate};
use crate::garage::{MaintenanceType, OilType, PowertrainType};

/// Length of the approximate month used for date-based intervals.
///
/// Recency is measured in 30-day blocks rather than calendar months.
pub const DAYS_PER_MONTH: i64 = 30;
const MILLIS_PER_MONTH: i64 = DAYS_PER_MONTH * 24 * 60 * 60 * 1000;

/// Vehicles at least this old always get the short gas oil interval.
pub const OLD_ENGINE_AGE_YEARS: u32 = 15;
const SHORT_OIL_INTERVAL_MILES: u32 = 3000;
const HYBRID_OIL_INTERVAL_MILES: u32 = 10000;

/// Engine that matches service templates against a vehicle's powertrain and
/// service history.
///
/// Every query is a pure function of its arguments and the catalog. The
/// engine holds no mutable state and can be shared freely between threads.
/// The current time is always passed in by the caller.
#[derive(Debug, Clone, Copy)]
pub struct ServiceTemplateEngine<'a> {
    catalog: &'a [ServiceTemplate],
}

impl ServiceTemplateEngine<'static> {
    /// Create an engine over the built-in [`SERVICE_TEMPLATES`] catalog.
    pub fn new() -> Self {
        Self {
            catalog: SERVICE_TEMPLATES,
        }
    }
}

impl Default for ServiceTemplateEngine<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> ServiceTemplateEngine<'a> {
    /// Create an engine over a caller-supplied catalog.
    pub fn with_catalog(catalog: &'a [ServiceTemplate]) -> Self {
        Self { catalog }
    }

    /// The full catalog in declaration order.
    pub fn templates(&self) -> &'a [ServiceTemplate] {
        self.catalog
    }

    /// All templates applicable to `powertrain_type`, in catalog order.
    pub fn templates_for_powertrain(
        &self,
        powertrain_type: PowertrainType,
    ) -> Vec<&'a ServiceTemplate> {
        self.catalog
            .iter()
            .filter(|template| template.applies_to(powertrain_type))
            .collect()
    }

    /// All templates of a maintenance category regardless of powertrain.
    pub fn templates_by_type(&self, maintenance_type: MaintenanceType) -> Vec<&'a ServiceTemplate> {
        self.catalog
            .iter()
            .filter(|template| template.maintenance_type == maintenance_type)
            .collect()
    }

    /// Whether `template` is due given the mileage and the last service.
    ///
    /// A template is due once either interval has elapsed. Miles since the
    /// last service may be negative after an odometer correction, in which
    /// case only the date interval can trigger.
    pub fn is_due(
        template: &ServiceTemplate,
        current_mileage: u32,
        last_service: &LastService,
        now: DateTime<Utc>,
    ) -> bool {
        let miles_since = i64::from(current_mileage) - i64::from(last_service.mileage);
        let months_since = months_between(last_service.date, now);

        miles_since >= i64::from(template.interval_miles)
            || months_since >= i64::from(template.interval_months)
    }

    /// Services due for a vehicle, most urgent first.
    ///
    /// Templates of equal priority keep their catalog order. Passing
    /// [`LastService::never`] makes every template due by date alone.
    ///
    /// # Arguments
    /// * `powertrain_type` - Powertrain of the vehicle
    /// * `current_mileage` - Current odometer reading
    /// * `last_service` - Mileage and date of the last service
    /// * `now` - Reference time for date-based intervals
    pub fn recommended_services(
        &self,
        powertrain_type: PowertrainType,
        current_mileage: u32,
        last_service: &LastService,
        now: DateTime<Utc>,
    ) -> Vec<&'a ServiceTemplate> {
        let mut due: Vec<_> = self
            .templates_for_powertrain(powertrain_type)
            .into_iter()
            .filter(|template| Self::is_due(template, current_mileage, last_service, now))
            .collect();
        Self::sort_by_priority(&mut due);
        due
    }

    /// Most urgent first. The sort is stable, so equal priorities keep
    /// their catalog order.
    pub fn sort_by_priority(templates: &mut [&ServiceTemplate]) {
        templates.sort_by_key(|template| template.priority);
    }

    /// The critical subset of [`Self::recommended_services`], same order.
    pub fn critical_overdue_services(
        &self,
        powertrain_type: PowertrainType,
        current_mileage: u32,
        last_service: &LastService,
        now: DateTime<Utc>,
    ) -> Vec<&'a ServiceTemplate> {
        self.recommended_services(powertrain_type, current_mileage, last_service, now)
            .into_iter()
            .filter(|template| template.priority == ServicePriority::Critical)
            .collect()
    }

    /// Oil change interval in miles, or 0 when the powertrain needs none.
    pub fn calculate_oil_change_interval(
        powertrain_type: PowertrainType,
        oil_type: Option<OilType>,
        vehicle_age_years: u32,
    ) -> u32 {
        match powertrain_type {
            PowertrainType::Electric | PowertrainType::Hydrogen => 0,
            PowertrainType::Hybrid => HYBRID_OIL_INTERVAL_MILES,
            PowertrainType::Diesel => match oil_type {
                Some(OilType::Conventional) | None => 5000,
                Some(OilType::SyntheticBlend) => 7500,
                Some(OilType::FullSynthetic) => 10000,
            },
            PowertrainType::Gas => {
                let base_interval = match oil_type {
                    Some(OilType::Conventional) | None => SHORT_OIL_INTERVAL_MILES,
                    Some(OilType::SyntheticBlend) => 5000,
                    Some(OilType::FullSynthetic) => 7500,
                };
                if vehicle_age_years >= OLD_ENGINE_AGE_YEARS {
                    base_interval.min(SHORT_OIL_INTERVAL_MILES)
                } else {
                    base_interval
                }
            }
        }
    }

    /// Odometer reading at which the next oil change is due.
    ///
    /// Returns `None` for powertrains without oil changes. The projection
    /// depends only on the last oil change, not on the current mileage.
    pub fn next_oil_change_mileage(
        powertrain_type: PowertrainType,
        _current_mileage: u32,
        last_oil_change_mileage: u32,
        oil_type: Option<OilType>,
        vehicle_age_years: u32,
    ) -> Option<u32> {
        match Self::calculate_oil_change_interval(powertrain_type, oil_type, vehicle_age_years) {
            0 => None,
            interval => Some(last_oil_change_mileage.saturating_add(interval)),
        }
    }

    /// Cheapest cost range among templates matching both the maintenance
    /// category and the powertrain.
    ///
    /// Cheapest means the lowest `low` bound; the first template in catalog
    /// order wins a tie.
    pub fn estimated_cost(
        &self,
        maintenance_type: MaintenanceType,
        powertrain_type: PowertrainType,
    ) -> Option<CostRange> {
        self.catalog
            .iter()
            .filter(|template| {
                template.maintenance_type == maintenance_type
                    && template.applies_to(powertrain_type)
            })
            .map(|template| template.estimated_cost)
            .reduce(|cheapest, cost| {
                if cost.low < cheapest.low {
                    cost
                } else {
                    cheapest
                }
            })
    }
}

/// Whole 30-day blocks from `since` to `now`, truncated toward zero.
fn months_between(since: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - since).num_milliseconds() / MILLIS_PER_MONTH
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 9, 30, 0).unwrap()
    }

    fn names(templates: &[&ServiceTemplate]) -> Vec<&'static str> {
        templates.iter().map(|t| t.name).collect()
    }

    #[test]
    fn test_new_engine_uses_builtin_catalog() {
        let engine = ServiceTemplateEngine::new();
        assert_eq!(engine.templates().len(), SERVICE_TEMPLATES.len());
        assert!(engine.templates().len() >= 20);
    }

    #[test]
    fn test_templates_for_electric() {
        let engine = ServiceTemplateEngine::new();
        let electric = engine.templates_for_powertrain(PowertrainType::Electric);
        let electric_names = names(&electric);

        assert!(electric_names.contains(&"EV Thermal Management"));
        assert!(electric_names.contains(&"Hybrid Brake Service"));
        assert!(
            electric
                .iter()
                .all(|t| t.maintenance_type != MaintenanceType::OilChange),
            "Electric vehicles have no oil change templates"
        );
    }

    #[test]
    fn test_templates_by_type() {
        let engine = ServiceTemplateEngine::new();
        let oil = engine.templates_by_type(MaintenanceType::OilChange);
        assert_eq!(
            names(&oil),
            vec![
                "Conventional Oil Change",
                "Synthetic Oil Change",
                "Diesel Oil Change",
                "Hybrid Oil Change"
            ]
        );
        assert!(engine.templates_by_type(MaintenanceType::Repair).is_empty());
    }

    #[test]
    fn test_months_between_truncates() {
        let start = now();
        assert_eq!(months_between(start, start + Duration::days(29)), 0);
        assert_eq!(months_between(start, start + Duration::days(30)), 1);
        assert_eq!(months_between(start, start + Duration::days(365)), 12);
        assert_eq!(months_between(start + Duration::days(45), start), -1);
    }

    #[test]
    fn test_nothing_due_right_after_service() {
        let engine = ServiceTemplateEngine::new();
        for powertrain_type in PowertrainType::ALL {
            let due = engine.recommended_services(
                powertrain_type,
                42000,
                &LastService::at(42000, now()),
                now(),
            );
            assert!(due.is_empty(), "{powertrain_type} should have nothing due");
        }
    }

    #[test]
    fn test_mileage_threshold_triggers_due() {
        let engine = ServiceTemplateEngine::new();
        let last = LastService::at(10000, now());
        let due = engine.recommended_services(PowertrainType::Gas, 16000, &last, now());

        // 6000 miles elapsed: rotation, multi-point inspection and conventional oil
        assert_eq!(
            names(&due),
            vec![
                "Conventional Oil Change",
                "Tire Rotation",
                "Multi-Point Inspection"
            ]
        );
    }

    #[test]
    fn test_date_threshold_triggers_due() {
        let engine = ServiceTemplateEngine::new();
        let last = LastService::at(20000, now() - Duration::days(DAYS_PER_MONTH * 6));
        let due = engine.recommended_services(PowertrainType::Electric, 20000, &last, now());

        assert_eq!(names(&due), vec!["Tire Rotation", "Multi-Point Inspection"]);
    }

    #[test]
    fn test_odometer_rollback_only_triggers_by_date() {
        let engine = ServiceTemplateEngine::new();
        let recent = LastService::at(90000, now() - Duration::days(1));
        assert!(
            engine
                .recommended_services(PowertrainType::Gas, 1000, &recent, now())
                .is_empty()
        );

        let stale = LastService::at(90000, now() - Duration::days(400));
        let due = engine.recommended_services(PowertrainType::Gas, 1000, &stale, now());
        assert!(!due.is_empty());
        assert!(due.iter().all(|t| t.interval_months <= 13));
    }

    #[test]
    fn test_recommended_services_sorted_by_priority() {
        let engine = ServiceTemplateEngine::new();
        let due = engine.recommended_services(
            PowertrainType::Gas,
            100000,
            &LastService::never(),
            now(),
        );
        assert_eq!(due.len(), engine.templates_for_powertrain(PowertrainType::Gas).len());
        for pair in due.windows(2) {
            assert!(pair[0].priority <= pair[1].priority);
        }
        assert_eq!(due[0].name, "Brake Pad Inspection");
        assert_eq!(due.last().map(|t| t.name), Some("Cabin Air Filter"));
    }

    #[test]
    fn test_sort_by_priority_is_stable() {
        let engine = ServiceTemplateEngine::new();
        let mut templates = engine.templates_for_powertrain(PowertrainType::Hybrid);
        templates.reverse();
        ServiceTemplateEngine::sort_by_priority(&mut templates);

        assert_eq!(templates[0].priority, ServicePriority::Critical);
        for pair in templates.windows(2) {
            assert!(pair[0].priority <= pair[1].priority);
        }
        // reversed input, so equal priorities come out in reverse catalog order
        let critical: Vec<_> = templates
            .iter()
            .filter(|t| t.priority == ServicePriority::Critical)
            .map(|t| t.name)
            .collect();
        let mut expected: Vec<_> = engine
            .templates_for_powertrain(PowertrainType::Hybrid)
            .into_iter()
            .filter(|t| t.priority == ServicePriority::Critical)
            .map(|t| t.name)
            .collect();
        expected.reverse();
        assert_eq!(critical, expected);
    }

    #[test]
    fn test_critical_overdue_services() {
        let engine = ServiceTemplateEngine::new();
        let critical = engine.critical_overdue_services(
            PowertrainType::Hybrid,
            5000,
            &LastService::never(),
            now(),
        );
        assert_eq!(
            names(&critical),
            vec![
                "Brake Pad Inspection",
                "Hybrid Brake Service",
                "Tire Replacement",
                "Annual Safety Inspection"
            ]
        );
    }

    #[test]
    fn test_oil_change_interval_table() {
        use crate::garage::OilType::*;
        use crate::garage::PowertrainType::*;

        let cases = [
            (Gas, None, 5, 3000),
            (Gas, Some(Conventional), 5, 3000),
            (Gas, Some(SyntheticBlend), 5, 5000),
            (Gas, Some(FullSynthetic), 5, 7500),
            (Gas, Some(FullSynthetic), 14, 7500),
            (Gas, Some(FullSynthetic), 15, 3000),
            (Gas, Some(FullSynthetic), 20, 3000),
            (Diesel, None, 5, 5000),
            (Diesel, Some(Conventional), 30, 5000),
            (Diesel, Some(SyntheticBlend), 5, 7500),
            (Diesel, Some(FullSynthetic), 30, 10000),
            (Hybrid, None, 5, 10000),
            (Hybrid, Some(Conventional), 25, 10000),
            (Electric, Some(FullSynthetic), 5, 0),
            (Hydrogen, None, 5, 0),
        ];
        for (powertrain_type, oil_type, age, expected) in cases {
            assert_eq!(
                ServiceTemplateEngine::calculate_oil_change_interval(powertrain_type, oil_type, age),
                expected,
                "{powertrain_type} {oil_type:?} age {age}"
            );
        }
    }

    #[test]
    fn test_next_oil_change_mileage() {
        assert_eq!(
            ServiceTemplateEngine::next_oil_change_mileage(
                PowertrainType::Electric,
                50000,
                40000,
                None,
                3
            ),
            None
        );
        assert_eq!(
            ServiceTemplateEngine::next_oil_change_mileage(
                PowertrainType::Gas,
                50000,
                48000,
                Some(OilType::SyntheticBlend),
                3
            ),
            Some(53000)
        );
        assert_eq!(
            ServiceTemplateEngine::next_oil_change_mileage(
                PowertrainType::Diesel,
                0,
                u32::MAX - 10,
                None,
                3
            ),
            Some(u32::MAX)
        );
    }

    #[test]
    fn test_estimated_cost() {
        let engine = ServiceTemplateEngine::new();
        assert_eq!(
            engine.estimated_cost(MaintenanceType::OilChange, PowertrainType::Gas),
            Some(CostRange::new(25, 50))
        );
        assert_eq!(
            engine.estimated_cost(MaintenanceType::OilChange, PowertrainType::Hybrid),
            Some(CostRange::new(45, 75))
        );
        assert_eq!(
            engine.estimated_cost(MaintenanceType::OilChange, PowertrainType::Electric),
            None
        );
        assert_eq!(
            engine.estimated_cost(MaintenanceType::Repair, PowertrainType::Gas),
            None
        );
    }

    #[test]
    fn test_estimated_cost_tie_keeps_first_template() {
        static CATALOG: &[ServiceTemplate] = &[
            ServiceTemplate {
                name: "First",
                maintenance_type: MaintenanceType::Inspection,
                description: "",
                interval_miles: 1000,
                interval_months: 1,
                powertrain_types: &[PowertrainType::Gas],
                estimated_cost: CostRange::new(10, 20),
                priority: ServicePriority::Low,
                notes: None,
            },
            ServiceTemplate {
                name: "Second",
                maintenance_type: MaintenanceType::Inspection,
                description: "",
                interval_miles: 1000,
                interval_months: 1,
                powertrain_types: &[PowertrainType::Gas],
                estimated_cost: CostRange::new(10, 90),
                priority: ServicePriority::Low,
                notes: None,
            },
        ];
        let engine = ServiceTemplateEngine::with_catalog(CATALOG);
        assert_eq!(
            engine.estimated_cost(MaintenanceType::Inspection, PowertrainType::Gas),
            Some(CostRange::new(10, 20))
        );
    }
}
