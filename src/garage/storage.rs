// Storage implementation for vehicles, service records and schedules

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::errors::MaintainerError;
use crate::garage::types::{MaintenanceRecord, MaintenanceSchedule, MaintenanceType, Vehicle};

const VEHICLES_FILE: &str = "vehicles.json";
const RECORDS_FILE: &str = "records.jsonl";
const SCHEDULES_FILE: &str = "schedules.json";

/// Trait defining the interface for garage persistence.
///
/// Writes are "last write wins": saving an entity whose id already exists
/// replaces it.
pub trait GarageStorage {
    /// Insert or replace a vehicle
    fn save_vehicle(&mut self, vehicle: &Vehicle) -> Result<(), MaintainerError>;

    /// Load a vehicle by id, including inactive ones
    fn load_vehicle(&self, id: &str) -> Result<Option<Vehicle>, MaintainerError>;

    /// Active vehicles, most recently created first
    fn list_vehicles(&self) -> Result<Vec<Vehicle>, MaintainerError>;

    /// Soft-delete a vehicle; its history is kept
    fn delete_vehicle(&mut self, id: &str, now: DateTime<Utc>) -> Result<(), MaintainerError>;

    /// Set the odometer reading of a vehicle
    fn update_mileage(
        &mut self,
        id: &str,
        mileage: u32,
        now: DateTime<Utc>,
    ) -> Result<(), MaintainerError>;

    /// Insert or replace a maintenance record
    fn save_record(&mut self, record: &MaintenanceRecord) -> Result<(), MaintainerError>;

    fn load_record(&self, id: &str) -> Result<Option<MaintenanceRecord>, MaintainerError>;

    /// Records of a vehicle, most recent service first
    fn records_for_vehicle(
        &self,
        vehicle_id: &str,
    ) -> Result<Vec<MaintenanceRecord>, MaintainerError>;

    /// Every record, most recent service first
    fn all_records(&self) -> Result<Vec<MaintenanceRecord>, MaintainerError>;

    fn delete_record(&mut self, id: &str) -> Result<(), MaintainerError>;

    /// Insert or replace a schedule, keeping one schedule per vehicle and type
    fn save_schedule(&mut self, schedule: &MaintenanceSchedule) -> Result<(), MaintainerError>;

    /// Enabled schedules of a vehicle
    fn schedules_for_vehicle(
        &self,
        vehicle_id: &str,
    ) -> Result<Vec<MaintenanceSchedule>, MaintainerError>;

    fn schedule_by_type(
        &self,
        vehicle_id: &str,
        maintenance_type: MaintenanceType,
    ) -> Result<Option<MaintenanceSchedule>, MaintainerError>;

    fn delete_schedule(&mut self, id: &str) -> Result<(), MaintainerError>;

    /// Enabled schedules with a next-due mileage or date, across all vehicles
    fn upcoming_schedules(&self) -> Result<Vec<MaintenanceSchedule>, MaintainerError>;

    /// Most recent record of a type for a vehicle
    fn last_record_of_type(
        &self,
        vehicle_id: &str,
        maintenance_type: MaintenanceType,
    ) -> Result<Option<MaintenanceRecord>, MaintainerError> {
        Ok(self
            .records_for_vehicle(vehicle_id)?
            .into_iter()
            .find(|record| record.maintenance_type == maintenance_type))
    }

    /// Active vehicle with the given VIN, compared ignoring ASCII case
    fn vehicle_by_vin(&self, vin: &str) -> Result<Option<Vehicle>, MaintainerError> {
        let vin = vin.trim();
        Ok(self.list_vehicles()?.into_iter().find(|vehicle| {
            vehicle
                .vin
                .as_deref()
                .is_some_and(|stored| !vin.is_empty() && stored.trim().eq_ignore_ascii_case(vin))
        }))
    }

    /// Mileage of the most recent service of a vehicle
    fn latest_service_mileage(&self, vehicle_id: &str) -> Result<Option<u32>, MaintainerError> {
        Ok(self
            .records_for_vehicle(vehicle_id)?
            .first()
            .map(|record| record.mileage))
    }
}

/// File-based implementation of garage storage.
///
/// Vehicles and schedules are JSON arrays, records are JSON lines. The whole
/// store is loaded at open and each mutation rewrites the affected file.
pub struct FileBasedStorage {
    /// Base directory for the store files
    storage_path: PathBuf,
    vehicles: Vec<Vehicle>,
    records: Vec<MaintenanceRecord>,
    schedules: Vec<MaintenanceSchedule>,
}

impl FileBasedStorage {
    /// Open (or create) a store in `storage_path`
    pub fn new(storage_path: PathBuf) -> Result<Self, MaintainerError> {
        if !storage_path.exists() {
            fs::create_dir_all(&storage_path).map_err(|e| MaintainerError::StorageIOError {
                path: storage_path.display().to_string(),
                source: e,
            })?;
        }

        let vehicles = read_json_array(&storage_path.join(VEHICLES_FILE))?;
        let records = read_json_lines(&storage_path.join(RECORDS_FILE))?;
        let schedules = read_json_array(&storage_path.join(SCHEDULES_FILE))?;
        debug!(
            "Opened garage at {:?}: {} vehicles, {} records, {} schedules",
            storage_path,
            vehicles.len(),
            records.len(),
            schedules.len()
        );

        Ok(Self {
            storage_path,
            vehicles,
            records,
            schedules,
        })
    }

    /// Open the store in the default application data directory
    pub fn new_default() -> Result<Self, MaintainerError> {
        Self::new(Self::default_storage_path()?)
    }

    /// Default location of the store
    pub fn default_storage_path() -> Result<PathBuf, MaintainerError> {
        let app_data_dir = dirs::data_dir().ok_or(MaintainerError::NoDataDir)?;
        Ok(app_data_dir.join("maintainer"))
    }

    /// Get the storage directory path
    pub fn storage_path(&self) -> &Path {
        &self.storage_path
    }

    fn persist_vehicles(&self, vehicles: &[Vehicle]) -> Result<(), MaintainerError> {
        write_json_array(&self.storage_path.join(VEHICLES_FILE), vehicles)
    }

    fn persist_records(&self, records: &[MaintenanceRecord]) -> Result<(), MaintainerError> {
        let path = self.storage_path.join(RECORDS_FILE);
        serde_jsonlines::write_json_lines(&path, records).map_err(|e| {
            MaintainerError::StorageIOError {
                path: path.display().to_string(),
                source: e,
            }
        })
    }

    fn persist_schedules(&self, schedules: &[MaintenanceSchedule]) -> Result<(), MaintainerError> {
        write_json_array(&self.storage_path.join(SCHEDULES_FILE), schedules)
    }

    /// Apply `change` to a copy of one vehicle and persist before committing
    fn modify_vehicle(
        &mut self,
        id: &str,
        change: impl FnOnce(&mut Vehicle),
    ) -> Result<(), MaintainerError> {
        let index = self
            .vehicles
            .iter()
            .position(|vehicle| vehicle.id == id)
            .ok_or_else(|| MaintainerError::VehicleNotFound { id: id.to_string() })?;
        let mut vehicles = self.vehicles.clone();
        change(&mut vehicles[index]);
        self.persist_vehicles(&vehicles)?;
        self.vehicles = vehicles;
        Ok(())
    }
}

/// Insert `item` or replace the element with the same id
fn upsert<T: Clone>(items: &mut Vec<T>, item: &T, same_id: impl FnMut(&T) -> bool) {
    match items.iter().position(same_id) {
        Some(index) => items[index] = item.clone(),
        None => items.push(item.clone()),
    }
}

fn read_json_array<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, MaintainerError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path).map_err(|e| MaintainerError::StorageIOError {
        path: path.display().to_string(),
        source: e,
    })?;
    if content.trim().is_empty() {
        warn!("Store file {:?} is empty, starting fresh", path);
        return Ok(Vec::new());
    }
    serde_json::from_str(&content).map_err(|e| MaintainerError::StorageSerializeError {
        path: path.display().to_string(),
        source: e,
    })
}

fn write_json_array<T: Serialize>(path: &Path, items: &[T]) -> Result<(), MaintainerError> {
    let content =
        serde_json::to_string_pretty(items).map_err(|e| MaintainerError::StorageSerializeError {
            path: path.display().to_string(),
            source: e,
        })?;
    fs::write(path, content).map_err(|e| MaintainerError::StorageIOError {
        path: path.display().to_string(),
        source: e,
    })
}

fn read_json_lines<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, MaintainerError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    serde_jsonlines::json_lines(path)
        .and_then(|lines| lines.collect::<io::Result<Vec<T>>>())
        .map_err(|e| MaintainerError::StorageIOError {
            path: path.display().to_string(),
            source: e,
        })
}

/// Newest service first; records on the same date keep insertion order
fn sort_by_service_date_desc(records: &mut [MaintenanceRecord]) {
    records.sort_by(|a, b| b.service_date.cmp(&a.service_date));
}

// Mutations stage a copy of the affected collection and only replace the
// in-memory state once the copy is on disk.
impl GarageStorage for FileBasedStorage {
    fn save_vehicle(&mut self, vehicle: &Vehicle) -> Result<(), MaintainerError> {
        let mut vehicles = self.vehicles.clone();
        upsert(&mut vehicles, vehicle, |v| v.id == vehicle.id);
        self.persist_vehicles(&vehicles)?;
        self.vehicles = vehicles;
        info!("Saved vehicle {} ({})", vehicle.id, vehicle.display_name());
        Ok(())
    }

    fn load_vehicle(&self, id: &str) -> Result<Option<Vehicle>, MaintainerError> {
        Ok(self.vehicles.iter().find(|v| v.id == id).cloned())
    }

    fn list_vehicles(&self) -> Result<Vec<Vehicle>, MaintainerError> {
        let mut vehicles: Vec<Vehicle> = self
            .vehicles
            .iter()
            .filter(|v| v.is_active)
            .cloned()
            .collect();
        vehicles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(vehicles)
    }

    fn delete_vehicle(&mut self, id: &str, now: DateTime<Utc>) -> Result<(), MaintainerError> {
        self.modify_vehicle(id, |vehicle| {
            vehicle.is_active = false;
            vehicle.updated_at = now;
        })?;
        info!("Deactivated vehicle {}", id);
        Ok(())
    }

    fn update_mileage(
        &mut self,
        id: &str,
        mileage: u32,
        now: DateTime<Utc>,
    ) -> Result<(), MaintainerError> {
        self.modify_vehicle(id, |vehicle| {
            if mileage < vehicle.current_mileage {
                warn!(
                    "Odometer for {} goes back from {} to {}",
                    id, vehicle.current_mileage, mileage
                );
            }
            vehicle.current_mileage = mileage;
            vehicle.updated_at = now;
        })
    }

    fn save_record(&mut self, record: &MaintenanceRecord) -> Result<(), MaintainerError> {
        let mut records = self.records.clone();
        upsert(&mut records, record, |r| r.id == record.id);
        self.persist_records(&records)?;
        self.records = records;
        info!(
            "Saved {} record {} for vehicle {}",
            record.maintenance_type, record.id, record.vehicle_id
        );
        Ok(())
    }

    fn load_record(&self, id: &str) -> Result<Option<MaintenanceRecord>, MaintainerError> {
        Ok(self.records.iter().find(|r| r.id == id).cloned())
    }

    fn records_for_vehicle(
        &self,
        vehicle_id: &str,
    ) -> Result<Vec<MaintenanceRecord>, MaintainerError> {
        let mut records: Vec<MaintenanceRecord> = self
            .records
            .iter()
            .filter(|r| r.vehicle_id == vehicle_id)
            .cloned()
            .collect();
        sort_by_service_date_desc(&mut records);
        Ok(records)
    }

    fn all_records(&self) -> Result<Vec<MaintenanceRecord>, MaintainerError> {
        let mut records = self.records.clone();
        sort_by_service_date_desc(&mut records);
        Ok(records)
    }

    fn delete_record(&mut self, id: &str) -> Result<(), MaintainerError> {
        if !self.records.iter().any(|r| r.id == id) {
            debug!("No record {} to delete", id);
            return Ok(());
        }
        let records: Vec<MaintenanceRecord> =
            self.records.iter().filter(|r| r.id != id).cloned().collect();
        self.persist_records(&records)?;
        self.records = records;
        info!("Deleted record {}", id);
        Ok(())
    }

    fn save_schedule(&mut self, schedule: &MaintenanceSchedule) -> Result<(), MaintainerError> {
        let mut schedules: Vec<MaintenanceSchedule> = self
            .schedules
            .iter()
            .filter(|s| {
                s.id == schedule.id
                    || s.vehicle_id != schedule.vehicle_id
                    || s.maintenance_type != schedule.maintenance_type
            })
            .cloned()
            .collect();
        if schedules.len() != self.schedules.len() {
            debug!(
                "Replacing existing {} schedule for vehicle {}",
                schedule.maintenance_type, schedule.vehicle_id
            );
        }
        upsert(&mut schedules, schedule, |s| s.id == schedule.id);
        self.persist_schedules(&schedules)?;
        self.schedules = schedules;
        Ok(())
    }

    fn schedules_for_vehicle(
        &self,
        vehicle_id: &str,
    ) -> Result<Vec<MaintenanceSchedule>, MaintainerError> {
        Ok(self
            .schedules
            .iter()
            .filter(|s| s.vehicle_id == vehicle_id && s.is_enabled)
            .cloned()
            .collect())
    }

    fn schedule_by_type(
        &self,
        vehicle_id: &str,
        maintenance_type: MaintenanceType,
    ) -> Result<Option<MaintenanceSchedule>, MaintainerError> {
        Ok(self
            .schedules
            .iter()
            .find(|s| s.vehicle_id == vehicle_id && s.maintenance_type == maintenance_type)
            .cloned())
    }

    fn delete_schedule(&mut self, id: &str) -> Result<(), MaintainerError> {
        if !self.schedules.iter().any(|s| s.id == id) {
            debug!("No schedule {} to delete", id);
            return Ok(());
        }
        let schedules: Vec<MaintenanceSchedule> =
            self.schedules.iter().filter(|s| s.id != id).cloned().collect();
        self.persist_schedules(&schedules)?;
        self.schedules = schedules;
        Ok(())
    }

    fn upcoming_schedules(&self) -> Result<Vec<MaintenanceSchedule>, MaintainerError> {
        Ok(self
            .schedules
            .iter()
            .filter(|s| s.is_upcoming())
            .cloned()
            .collect())
    }
}
