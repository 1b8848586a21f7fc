// Per-vehicle service overview built from the real service history

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::garage::types::{MaintenanceRecord, MaintenanceType, Vehicle};
use crate::service_templates::{
    LastService, ServicePriority, ServiceTemplate, ServiceTemplateEngine,
};

/// What a vehicle needs right now.
#[derive(Debug, Clone, Serialize)]
pub struct VehicleServiceStatus<'a> {
    pub vehicle_id: String,
    pub vehicle_name: String,
    pub current_mileage: u32,
    /// Due templates, most urgent first
    pub due_services: Vec<&'a ServiceTemplate>,
    /// Critical subset of `due_services`, same order
    pub critical_services: Vec<&'a ServiceTemplate>,
    /// `None` for powertrains without oil changes
    pub next_oil_change_mileage: Option<u32>,
}

/// Most recent record of a type for a vehicle; the first one wins a date tie.
fn latest_record<'r>(
    records: &'r [MaintenanceRecord],
    vehicle_id: &str,
    maintenance_type: MaintenanceType,
) -> Option<&'r MaintenanceRecord> {
    records
        .iter()
        .filter(|r| r.vehicle_id == vehicle_id && r.maintenance_type == maintenance_type)
        .fold(None, |latest: Option<&MaintenanceRecord>, record| match latest {
            Some(current) if current.service_date >= record.service_date => Some(current),
            _ => Some(record),
        })
}

impl<'a> VehicleServiceStatus<'a> {
    /// Evaluate every applicable template against the vehicle's own history.
    ///
    /// Each template is checked against the most recent record of its
    /// maintenance type. Types never serviced count from zero miles at the
    /// Unix epoch. `records` may contain other vehicles' records.
    pub fn evaluate(
        vehicle: &Vehicle,
        records: &[MaintenanceRecord],
        engine: &ServiceTemplateEngine<'a>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut due_services: Vec<&'a ServiceTemplate> = engine
            .templates_for_powertrain(vehicle.powertrain_type)
            .into_iter()
            .filter(|template| {
                let last_service = latest_record(records, &vehicle.id, template.maintenance_type)
                    .map(|r| LastService::at(r.mileage, r.service_date))
                    .unwrap_or_default();
                ServiceTemplateEngine::is_due(template, vehicle.current_mileage, &last_service, now)
            })
            .collect();
        ServiceTemplateEngine::sort_by_priority(&mut due_services);

        let critical_services = due_services
            .iter()
            .copied()
            .filter(|template| template.priority == ServicePriority::Critical)
            .collect();

        let last_oil_change = latest_record(records, &vehicle.id, MaintenanceType::OilChange);
        let next_oil_change_mileage = ServiceTemplateEngine::next_oil_change_mileage(
            vehicle.powertrain_type,
            vehicle.current_mileage,
            last_oil_change.map_or(0, |r| r.mileage),
            last_oil_change.and_then(|r| r.oil_type),
            vehicle.age_years(now),
        );

        Self {
            vehicle_id: vehicle.id.clone(),
            vehicle_name: vehicle.display_name(),
            current_mileage: vehicle.current_mileage,
            due_services,
            critical_services,
            next_oil_change_mileage,
        }
    }

    /// Miles left before the next oil change, negative once overdue
    pub fn miles_until_oil_change(&self) -> Option<i64> {
        self.next_oil_change_mileage
            .map(|next| i64::from(next) - i64::from(self.current_mileage))
    }

    pub fn needs_attention(&self) -> bool {
        !self.critical_services.is_empty()
    }
}
