// Garage module
// Vehicles, their service history and per-type schedules, plus the
// workflows that keep the three consistent

pub mod overview;
pub mod storage;
pub mod types;

use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::errors::MaintainerError;
use crate::service_templates::ServiceTemplateEngine;

// Re-export commonly used types
pub use overview::VehicleServiceStatus;
pub use storage::{FileBasedStorage, GarageStorage};
pub use types::{
    MaintenanceRecord, MaintenanceSchedule, MaintenanceType, OilType, PowertrainType, Vehicle,
};

/// Find an active vehicle by exact id, VIN, or unique id prefix.
///
/// Removed vehicles are never returned, even on an exact id match.
pub fn find_vehicle<S: GarageStorage + ?Sized>(
    storage: &S,
    key: &str,
) -> Result<Vehicle, MaintainerError> {
    if let Some(vehicle) = storage.load_vehicle(key)?.filter(|v| v.is_active) {
        return Ok(vehicle);
    }
    if let Some(vehicle) = storage.vehicle_by_vin(key)? {
        return Ok(vehicle);
    }

    let mut matches = storage
        .list_vehicles()?
        .into_iter()
        .filter(|v| !key.is_empty() && v.id.starts_with(key));
    match (matches.next(), matches.next()) {
        (Some(vehicle), None) => Ok(vehicle),
        (Some(_), Some(_)) => Err(MaintainerError::InvalidUserInput {
            field: "vehicle".to_string(),
            reason: format!("id prefix {} matches more than one vehicle", key),
        }),
        _ => Err(MaintainerError::VehicleNotFound {
            id: key.to_string(),
        }),
    }
}

/// Save edits to an existing vehicle
pub fn update_vehicle<S: GarageStorage + ?Sized>(
    storage: &mut S,
    vehicle: &Vehicle,
    now: DateTime<Utc>,
) -> Result<(), MaintainerError> {
    vehicle.validate(now)?;
    if storage.load_vehicle(&vehicle.id)?.is_none() {
        return Err(MaintainerError::VehicleNotFound {
            id: vehicle.id.clone(),
        });
    }

    let mut updated = vehicle.clone();
    updated.updated_at = now;
    storage.save_vehicle(&updated)
}

/// Log a completed service.
///
/// Stores the record, moves the vehicle odometer to the service mileage and
/// advances the vehicle's schedule for that maintenance type, if any.
pub fn log_service<S: GarageStorage + ?Sized>(
    storage: &mut S,
    record: &MaintenanceRecord,
    now: DateTime<Utc>,
) -> Result<(), MaintainerError> {
    record.validate()?;
    if storage.load_vehicle(&record.vehicle_id)?.is_none() {
        return Err(MaintainerError::VehicleNotFound {
            id: record.vehicle_id.clone(),
        });
    }

    storage.save_record(record)?;
    storage.update_mileage(&record.vehicle_id, record.mileage, now)?;

    if let Some(mut schedule) =
        storage.schedule_by_type(&record.vehicle_id, record.maintenance_type)?
    {
        schedule.record_service(record.mileage, record.service_date, now);
        debug!(
            "Advanced {} schedule of {} to {:?} mi / {:?}",
            schedule.maintenance_type,
            schedule.vehicle_id,
            schedule.next_due_mileage,
            schedule.next_due_date
        );
        storage.save_schedule(&schedule)?;
    }

    info!(
        "Logged {} for vehicle {} at {} mi",
        record.maintenance_type, record.vehicle_id, record.mileage
    );
    Ok(())
}

/// Correct an existing record.
///
/// The vehicle odometer is reset to the mileage of its most recent service.
pub fn update_service<S: GarageStorage + ?Sized>(
    storage: &mut S,
    record: &MaintenanceRecord,
    now: DateTime<Utc>,
) -> Result<(), MaintainerError> {
    record.validate()?;
    if storage.load_record(&record.id)?.is_none() {
        return Err(MaintainerError::RecordNotFound {
            id: record.id.clone(),
        });
    }

    let mut updated = record.clone();
    updated.updated_at = now;
    storage.save_record(&updated)?;

    if let Some(mileage) = storage.latest_service_mileage(&record.vehicle_id)? {
        storage.update_mileage(&record.vehicle_id, mileage, now)?;
    }
    info!("Updated record {}", record.id);
    Ok(())
}

/// Delete a record on user request. Schedules and the odometer are left as
/// they are.
pub fn delete_service<S: GarageStorage + ?Sized>(
    storage: &mut S,
    id: &str,
) -> Result<MaintenanceRecord, MaintainerError> {
    let record = storage
        .load_record(id)?
        .ok_or_else(|| MaintainerError::RecordNotFound { id: id.to_string() })?;
    storage.delete_record(id)?;
    Ok(record)
}

/// Create schedules for a vehicle from the template catalog.
///
/// One schedule per maintenance type, taken from the first applicable
/// template in catalog order. Types that already have a schedule are left
/// alone. Returns the schedules that were created.
pub fn seed_default_schedules<S: GarageStorage + ?Sized>(
    storage: &mut S,
    vehicle: &Vehicle,
    engine: &ServiceTemplateEngine<'_>,
    now: DateTime<Utc>,
) -> Result<Vec<MaintenanceSchedule>, MaintainerError> {
    let mut created: Vec<MaintenanceSchedule> = Vec::new();

    for template in engine.templates_for_powertrain(vehicle.powertrain_type) {
        let taken = created
            .iter()
            .any(|s| s.maintenance_type == template.maintenance_type);
        if taken
            || storage
                .schedule_by_type(&vehicle.id, template.maintenance_type)?
                .is_some()
        {
            continue;
        }

        let schedule = MaintenanceSchedule::from_template(
            uuid::Uuid::new_v4().to_string(),
            vehicle.id.clone(),
            template,
            now,
        );
        storage.save_schedule(&schedule)?;
        created.push(schedule);
    }

    info!(
        "Seeded {} schedules for {}",
        created.len(),
        vehicle.display_name()
    );
    Ok(created)
}
