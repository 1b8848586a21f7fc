#[cfg(test)]
mod engine_property_tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use proptest::prelude::*;

    use crate::garage::{MaintenanceType, OilType, PowertrainType};
    use crate::service_templates::{
        LastService, SERVICE_TEMPLATES, ServicePriority, ServiceTemplate, ServiceTemplateEngine,
    };

    fn powertrain_type() -> impl Strategy<Value = PowertrainType> {
        prop_oneof![
            Just(PowertrainType::Gas),
            Just(PowertrainType::Diesel),
            Just(PowertrainType::Hybrid),
            Just(PowertrainType::Electric),
            Just(PowertrainType::Hydrogen),
        ]
    }

    fn oil_type() -> impl Strategy<Value = Option<OilType>> {
        prop_oneof![
            Just(None),
            Just(Some(OilType::Conventional)),
            Just(Some(OilType::SyntheticBlend)),
            Just(Some(OilType::FullSynthetic)),
        ]
    }

    fn maintenance_type() -> impl Strategy<Value = MaintenanceType> {
        proptest::sample::select(MaintenanceType::ALL.to_vec())
    }

    fn reference_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()
    }

    /// Last service somewhere in the past ten years, or never
    fn last_service() -> impl Strategy<Value = LastService> {
        prop_oneof![
            Just(LastService::never()),
            (0u32..200_000, 0i64..3650).prop_map(|(mileage, days_ago)| {
                LastService::at(mileage, reference_now() - Duration::days(days_ago))
            }),
        ]
    }

    fn catalog_index(template: &ServiceTemplate) -> usize {
        SERVICE_TEMPLATES
            .iter()
            .position(|t| std::ptr::eq(t, template))
            .expect("template comes from the built-in catalog")
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_templates_for_powertrain_matches_catalog(powertrain in powertrain_type()) {
            let engine = ServiceTemplateEngine::new();
            let templates = engine.templates_for_powertrain(powertrain);

            let expected: Vec<&str> = SERVICE_TEMPLATES
                .iter()
                .filter(|t| t.powertrain_types.contains(&powertrain))
                .map(|t| t.name)
                .collect();
            let actual: Vec<&str> = templates.iter().map(|t| t.name).collect();

            prop_assert_eq!(actual, expected);
        }

        #[test]
        fn prop_recommended_services_sorted_and_stable(
            powertrain in powertrain_type(),
            current_mileage in 0u32..300_000,
            last in last_service(),
        ) {
            let engine = ServiceTemplateEngine::new();
            let due = engine.recommended_services(powertrain, current_mileage, &last, reference_now());

            for pair in due.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                prop_assert!(a.priority <= b.priority);
                if a.priority == b.priority {
                    prop_assert!(
                        catalog_index(a) < catalog_index(b),
                        "{} should precede {}", a.name, b.name
                    );
                }
            }
        }

        #[test]
        fn prop_recommended_services_are_due(
            powertrain in powertrain_type(),
            current_mileage in 0u32..300_000,
            last in last_service(),
        ) {
            let engine = ServiceTemplateEngine::new();
            let now = reference_now();
            let due = engine.recommended_services(powertrain, current_mileage, &last, now);

            for template in engine.templates_for_powertrain(powertrain) {
                let is_due = ServiceTemplateEngine::is_due(template, current_mileage, &last, now);
                let listed = due.iter().any(|t| std::ptr::eq(*t, template));
                prop_assert_eq!(is_due, listed, "{}", template.name);
            }
        }

        #[test]
        fn prop_never_serviced_mileage_bound(powertrain in powertrain_type(), current_mileage in 0u32..300_000) {
            let engine = ServiceTemplateEngine::new();
            let due = engine.recommended_services(
                powertrain,
                current_mileage,
                &LastService::never(),
                reference_now(),
            );

            for template in engine.templates_for_powertrain(powertrain) {
                if template.interval_miles <= current_mileage {
                    prop_assert!(due.iter().any(|t| t.name == template.name));
                }
            }
        }

        #[test]
        fn prop_critical_is_ordered_subset(
            powertrain in powertrain_type(),
            current_mileage in 0u32..300_000,
            last in last_service(),
        ) {
            let engine = ServiceTemplateEngine::new();
            let now = reference_now();
            let due = engine.recommended_services(powertrain, current_mileage, &last, now);
            let critical = engine.critical_overdue_services(powertrain, current_mileage, &last, now);

            let expected: Vec<&str> = due
                .iter()
                .filter(|t| t.priority == ServicePriority::Critical)
                .map(|t| t.name)
                .collect();
            let actual: Vec<&str> = critical.iter().map(|t| t.name).collect();
            prop_assert_eq!(actual, expected);
        }

        #[test]
        fn prop_queries_are_pure(
            powertrain in powertrain_type(),
            kind in maintenance_type(),
            current_mileage in 0u32..300_000,
            last in last_service(),
            oil in oil_type(),
            age in 0u32..40,
        ) {
            let engine = ServiceTemplateEngine::new();
            let now = reference_now();

            prop_assert_eq!(
                engine.templates_for_powertrain(powertrain),
                engine.templates_for_powertrain(powertrain)
            );
            prop_assert_eq!(engine.templates_by_type(kind), engine.templates_by_type(kind));
            prop_assert_eq!(
                engine.recommended_services(powertrain, current_mileage, &last, now),
                engine.recommended_services(powertrain, current_mileage, &last, now)
            );
            prop_assert_eq!(
                engine.critical_overdue_services(powertrain, current_mileage, &last, now),
                engine.critical_overdue_services(powertrain, current_mileage, &last, now)
            );
            prop_assert_eq!(
                ServiceTemplateEngine::calculate_oil_change_interval(powertrain, oil, age),
                ServiceTemplateEngine::calculate_oil_change_interval(powertrain, oil, age)
            );
            prop_assert_eq!(
                ServiceTemplateEngine::next_oil_change_mileage(powertrain, current_mileage, last.mileage, oil, age),
                ServiceTemplateEngine::next_oil_change_mileage(powertrain, current_mileage, last.mileage, oil, age)
            );
            prop_assert_eq!(
                engine.estimated_cost(kind, powertrain),
                engine.estimated_cost(kind, powertrain)
            );
        }

        #[test]
        fn prop_oil_interval_zero_without_combustion(oil in oil_type(), age in 0u32..100) {
            prop_assert_eq!(
                ServiceTemplateEngine::calculate_oil_change_interval(PowertrainType::Electric, oil, age),
                0
            );
            prop_assert_eq!(
                ServiceTemplateEngine::calculate_oil_change_interval(PowertrainType::Hydrogen, oil, age),
                0
            );
            prop_assert_eq!(
                ServiceTemplateEngine::next_oil_change_mileage(PowertrainType::Electric, 50000, 40000, oil, age),
                None
            );
        }

        #[test]
        fn prop_old_gas_engines_capped(oil in oil_type(), age in 15u32..100) {
            prop_assert_eq!(
                ServiceTemplateEngine::calculate_oil_change_interval(PowertrainType::Gas, oil, age),
                3000
            );
        }

        #[test]
        fn prop_next_oil_change_adds_interval(
            powertrain in powertrain_type(),
            last_mileage in 0u32..500_000,
            oil in oil_type(),
            age in 0u32..40,
        ) {
            let interval = ServiceTemplateEngine::calculate_oil_change_interval(powertrain, oil, age);
            let next = ServiceTemplateEngine::next_oil_change_mileage(powertrain, last_mileage, last_mileage, oil, age);
            if interval == 0 {
                prop_assert_eq!(next, None);
            } else {
                prop_assert_eq!(next, Some(last_mileage + interval));
            }
        }

        #[test]
        fn prop_estimated_cost_is_cheapest_match(kind in maintenance_type(), powertrain in powertrain_type()) {
            let engine = ServiceTemplateEngine::new();
            let matching: Vec<_> = engine
                .templates_by_type(kind)
                .into_iter()
                .filter(|t| t.applies_to(powertrain))
                .collect();

            match engine.estimated_cost(kind, powertrain) {
                None => prop_assert!(matching.is_empty()),
                Some(cost) => {
                    prop_assert!(matching.iter().all(|t| t.estimated_cost.low >= cost.low));
                    let first_cheapest = matching
                        .iter()
                        .find(|t| t.estimated_cost.low == cost.low)
                        .map(|t| t.estimated_cost);
                    prop_assert_eq!(first_cheapest, Some(cost));
                }
            }
        }
    }

    #[test]
    fn test_zero_elapsed_yields_nothing_due() {
        let engine = ServiceTemplateEngine::new();
        let now = reference_now();
        for powertrain in PowertrainType::ALL {
            for mileage in [0, 12_345, 250_000] {
                let due = engine.recommended_services(
                    powertrain,
                    mileage,
                    &LastService::at(mileage, now),
                    now,
                );
                assert!(due.is_empty());
            }
        }
    }
}
