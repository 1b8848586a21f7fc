// Core data structures for vehicles and their service history

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Months, Utc};
use log::warn;
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::MaintainerError;
use crate::service_templates::ServiceTemplate;

/// Normalize a user or stored enum name: `full-synthetic` and
/// `Full Synthetic` both become `FULL_SYNTHETIC`.
fn normalize_variant_name(raw: &str) -> String {
    raw.trim().to_ascii_uppercase().replace(['-', ' '], "_")
}

/// Powertrain of a vehicle. Drives which service templates apply.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PowertrainType {
    #[default]
    Gas,
    Diesel,
    Hybrid,
    Electric,
    Hydrogen,
}

impl PowertrainType {
    pub const ALL: [PowertrainType; 5] = [
        PowertrainType::Gas,
        PowertrainType::Diesel,
        PowertrainType::Hybrid,
        PowertrainType::Electric,
        PowertrainType::Hydrogen,
    ];

    /// Name used in the store files
    pub fn stored_name(&self) -> &'static str {
        match self {
            PowertrainType::Gas => "GAS",
            PowertrainType::Diesel => "DIESEL",
            PowertrainType::Hybrid => "HYBRID",
            PowertrainType::Electric => "ELECTRIC",
            PowertrainType::Hydrogen => "HYDROGEN",
        }
    }

    /// Decode a persisted powertrain name, falling back to [`PowertrainType::Gas`]
    /// when the value is not an exact stored name.
    pub fn from_stored(raw: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|powertrain| powertrain.stored_name() == raw)
            .unwrap_or_else(|| {
                warn!("Unknown stored powertrain type {:?}, falling back to GAS", raw);
                PowertrainType::Gas
            })
    }
}

impl fmt::Display for PowertrainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowertrainType::Gas => write!(f, "Gas"),
            PowertrainType::Diesel => write!(f, "Diesel"),
            PowertrainType::Hybrid => write!(f, "Hybrid"),
            PowertrainType::Electric => write!(f, "Electric"),
            PowertrainType::Hydrogen => write!(f, "Hydrogen"),
        }
    }
}

impl FromStr for PowertrainType {
    type Err = MaintainerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_variant_name(s).as_str() {
            "GAS" => Ok(PowertrainType::Gas),
            "DIESEL" => Ok(PowertrainType::Diesel),
            "HYBRID" => Ok(PowertrainType::Hybrid),
            "ELECTRIC" => Ok(PowertrainType::Electric),
            "HYDROGEN" => Ok(PowertrainType::Hydrogen),
            _ => Err(MaintainerError::UnknownVariant {
                kind: "powertrain type".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

fn deserialize_powertrain_lenient<'de, D>(deserializer: D) -> Result<PowertrainType, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(PowertrainType::from_stored(&raw))
}

/// Category of a maintenance event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaintenanceType {
    OilChange,
    FilterChange,
    BrakeService,
    TireService,
    BatteryService,
    EngineService,
    TransmissionService,
    CoolantService,
    Inspection,
    Repair,
    Other,
}

impl MaintenanceType {
    pub const ALL: [MaintenanceType; 11] = [
        MaintenanceType::OilChange,
        MaintenanceType::FilterChange,
        MaintenanceType::BrakeService,
        MaintenanceType::TireService,
        MaintenanceType::BatteryService,
        MaintenanceType::EngineService,
        MaintenanceType::TransmissionService,
        MaintenanceType::CoolantService,
        MaintenanceType::Inspection,
        MaintenanceType::Repair,
        MaintenanceType::Other,
    ];
}

impl fmt::Display for MaintenanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaintenanceType::OilChange => write!(f, "Oil Change"),
            MaintenanceType::FilterChange => write!(f, "Filter Change"),
            MaintenanceType::BrakeService => write!(f, "Brake Service"),
            MaintenanceType::TireService => write!(f, "Tire Service"),
            MaintenanceType::BatteryService => write!(f, "Battery Service"),
            MaintenanceType::EngineService => write!(f, "Engine Service"),
            MaintenanceType::TransmissionService => write!(f, "Transmission Service"),
            MaintenanceType::CoolantService => write!(f, "Coolant Service"),
            MaintenanceType::Inspection => write!(f, "Inspection"),
            MaintenanceType::Repair => write!(f, "Repair"),
            MaintenanceType::Other => write!(f, "Other"),
        }
    }
}

impl FromStr for MaintenanceType {
    type Err = MaintainerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_variant_name(s).as_str() {
            "OIL_CHANGE" => Ok(MaintenanceType::OilChange),
            "FILTER_CHANGE" => Ok(MaintenanceType::FilterChange),
            "BRAKE_SERVICE" => Ok(MaintenanceType::BrakeService),
            "TIRE_SERVICE" => Ok(MaintenanceType::TireService),
            "BATTERY_SERVICE" => Ok(MaintenanceType::BatteryService),
            "ENGINE_SERVICE" => Ok(MaintenanceType::EngineService),
            "TRANSMISSION_SERVICE" => Ok(MaintenanceType::TransmissionService),
            "COOLANT_SERVICE" => Ok(MaintenanceType::CoolantService),
            "INSPECTION" => Ok(MaintenanceType::Inspection),
            "REPAIR" => Ok(MaintenanceType::Repair),
            "OTHER" => Ok(MaintenanceType::Other),
            _ => Err(MaintainerError::UnknownVariant {
                kind: "maintenance type".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Motor oil grade used at an oil change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OilType {
    Conventional,
    SyntheticBlend,
    FullSynthetic,
}

impl OilType {
    pub const ALL: [OilType; 3] = [
        OilType::Conventional,
        OilType::SyntheticBlend,
        OilType::FullSynthetic,
    ];
}

impl fmt::Display for OilType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OilType::Conventional => write!(f, "Conventional"),
            OilType::SyntheticBlend => write!(f, "Synthetic Blend"),
            OilType::FullSynthetic => write!(f, "Full Synthetic"),
        }
    }
}

impl FromStr for OilType {
    type Err = MaintainerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_variant_name(s).as_str() {
            "CONVENTIONAL" => Ok(OilType::Conventional),
            "SYNTHETIC_BLEND" => Ok(OilType::SyntheticBlend),
            "FULL_SYNTHETIC" => Ok(OilType::FullSynthetic),
            _ => Err(MaintainerError::UnknownVariant {
                kind: "oil type".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Oldest model year accepted for a vehicle
pub const FIRST_MODEL_YEAR: i32 = 1886;

/// A vehicle in the garage
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Vehicle {
    pub id: String,
    pub vin: Option<String>,
    pub make: String,
    pub model: String,
    /// Model year
    pub year: i32,
    #[serde(default, deserialize_with = "deserialize_powertrain_lenient")]
    pub powertrain_type: PowertrainType,
    /// Odometer reading in miles
    pub current_mileage: u32,
    pub nickname: Option<String>,
    pub license_plate: Option<String>,
    /// Soft-delete flag; inactive vehicles are hidden from listings
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Vehicle {
    pub fn new(
        id: String,
        make: String,
        model: String,
        year: i32,
        powertrain_type: PowertrainType,
        current_mileage: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            vin: None,
            make,
            model,
            year,
            powertrain_type,
            current_mileage,
            nickname: None,
            license_plate: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Nickname if set, otherwise "year make model"
    pub fn display_name(&self) -> String {
        match &self.nickname {
            Some(nickname) if !nickname.trim().is_empty() => nickname.clone(),
            _ => format!("{} {} {}", self.year, self.make, self.model),
        }
    }

    /// Age in whole model years, never negative
    pub fn age_years(&self, now: DateTime<Utc>) -> u32 {
        u32::try_from(now.year().saturating_sub(self.year)).unwrap_or(0)
    }

    /// Check user-editable fields. The model year may be at most one year
    /// ahead of `now`.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), MaintainerError> {
        if self.make.trim().is_empty() || self.model.trim().is_empty() {
            return Err(MaintainerError::InvalidUserInput {
                field: "make/model".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        let latest_year = now.year().saturating_add(1);
        if !(FIRST_MODEL_YEAR..=latest_year).contains(&self.year) {
            return Err(MaintainerError::InvalidUserInput {
                field: "year".to_string(),
                reason: format!(
                    "must be between {} and {}, got {}",
                    FIRST_MODEL_YEAR, latest_year, self.year
                ),
            });
        }
        Ok(())
    }
}

/// A logged service event. Records are facts: they are only edited to
/// correct mistakes.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MaintenanceRecord {
    pub id: String,
    pub vehicle_id: String,
    pub maintenance_type: MaintenanceType,
    pub description: String,
    pub cost: f64,
    /// Odometer reading at service time
    pub mileage: u32,
    pub service_date: DateTime<Utc>,
    pub service_name: Option<String>,
    pub service_location: Option<String>,
    pub notes: Option<String>,
    pub oil_type: Option<OilType>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MaintenanceRecord {
    pub fn new(
        id: String,
        vehicle_id: String,
        maintenance_type: MaintenanceType,
        cost: f64,
        mileage: u32,
        service_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            vehicle_id,
            maintenance_type,
            description: maintenance_type.to_string(),
            cost,
            mileage,
            service_date,
            service_name: None,
            service_location: None,
            notes: None,
            oil_type: None,
            created_at: service_date,
            updated_at: service_date,
        }
    }

    pub fn validate(&self) -> Result<(), MaintainerError> {
        if self.vehicle_id.trim().is_empty() {
            return Err(MaintainerError::InvalidUserInput {
                field: "vehicle_id".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if !self.cost.is_finite() || self.cost < 0.0 {
            return Err(MaintainerError::InvalidUserInput {
                field: "cost".to_string(),
                reason: format!("must be a non-negative amount, got {}", self.cost),
            });
        }
        Ok(())
    }
}

/// Per-vehicle, per-type maintenance schedule
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MaintenanceSchedule {
    pub id: String,
    pub vehicle_id: String,
    pub maintenance_type: MaintenanceType,
    pub interval_miles: Option<u32>,
    pub interval_months: Option<u32>,
    pub last_service_mileage: u32,
    pub last_service_date: Option<DateTime<Utc>>,
    pub next_due_mileage: Option<u32>,
    pub next_due_date: Option<DateTime<Utc>>,
    pub is_enabled: bool,
    pub is_custom: bool,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MaintenanceSchedule {
    /// Create a custom schedule with the given intervals and no service history
    pub fn new(
        id: String,
        vehicle_id: String,
        maintenance_type: MaintenanceType,
        interval_miles: Option<u32>,
        interval_months: Option<u32>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            vehicle_id,
            maintenance_type,
            interval_miles,
            interval_months,
            last_service_mileage: 0,
            last_service_date: None,
            next_due_mileage: None,
            next_due_date: None,
            is_enabled: true,
            is_custom: true,
            description: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Seed a schedule from a catalog template
    pub fn from_template(
        id: String,
        vehicle_id: String,
        template: &ServiceTemplate,
        now: DateTime<Utc>,
    ) -> Self {
        let mut schedule = Self::new(
            id,
            vehicle_id,
            template.maintenance_type,
            Some(template.interval_miles).filter(|miles| *miles > 0),
            Some(template.interval_months).filter(|months| *months > 0),
            now,
        );
        schedule.is_custom = false;
        schedule.description = Some(template.name.to_string());
        schedule
    }

    /// Advance the schedule after a service at `mileage` on `date`.
    ///
    /// Next-due fields are recomputed from the intervals; a schedule without
    /// a mileage (or month) interval has no next-due mileage (or date).
    pub fn record_service(&mut self, mileage: u32, date: DateTime<Utc>, now: DateTime<Utc>) {
        self.last_service_mileage = mileage;
        self.last_service_date = Some(date);
        self.next_due_mileage = self
            .interval_miles
            .map(|interval| mileage.saturating_add(interval));
        self.next_due_date = self
            .interval_months
            .and_then(|months| date.checked_add_months(Months::new(months)));
        self.updated_at = now;
    }

    pub fn is_due(&self, current_mileage: u32, now: DateTime<Utc>) -> bool {
        if !self.is_enabled {
            return false;
        }
        let mileage_reached = self
            .next_due_mileage
            .is_some_and(|due| current_mileage >= due);
        let date_reached = self.next_due_date.is_some_and(|due| now >= due);
        mileage_reached || date_reached
    }

    pub fn is_upcoming(&self) -> bool {
        self.is_enabled && (self.next_due_mileage.is_some() || self.next_due_date.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_powertrain_strict_parse() {
        assert_eq!("ELECTRIC".parse::<PowertrainType>().unwrap(), PowertrainType::Electric);
        assert_eq!("diesel".parse::<PowertrainType>().unwrap(), PowertrainType::Diesel);
        assert!("steam".parse::<PowertrainType>().is_err());
    }

    #[test]
    fn test_powertrain_stored_fallback() {
        for powertrain in PowertrainType::ALL {
            assert_eq!(PowertrainType::from_stored(powertrain.stored_name()), powertrain);
        }
        assert_eq!(PowertrainType::from_stored("PLUTONIUM"), PowertrainType::Gas);
        assert_eq!(PowertrainType::from_stored(""), PowertrainType::Gas);
        // stored names are exact, unlike user input
        assert_eq!(PowertrainType::from_stored("hybrid"), PowertrainType::Gas);
        assert_eq!(PowertrainType::from_stored("Electric"), PowertrainType::Gas);
        assert_eq!("hybrid".parse::<PowertrainType>().unwrap(), PowertrainType::Hybrid);
    }

    #[test]
    fn test_stored_name_matches_serde() {
        for powertrain in PowertrainType::ALL {
            assert_eq!(
                serde_json::to_value(powertrain).unwrap(),
                serde_json::Value::String(powertrain.stored_name().to_string())
            );
        }
    }

    #[test]
    fn test_vehicle_deserializes_unknown_powertrain_as_gas() {
        let now = date(2024, 1, 1);
        let mut json = serde_json::to_value(Vehicle::new(
            "v1".to_string(),
            "Toyota".to_string(),
            "Camry".to_string(),
            2020,
            PowertrainType::Hybrid,
            25000,
            now,
        ))
        .unwrap();
        json["powertrain_type"] = serde_json::Value::String("NUCLEAR".to_string());

        let vehicle: Vehicle = serde_json::from_value(json).unwrap();
        assert_eq!(vehicle.powertrain_type, PowertrainType::Gas);
    }

    #[test]
    fn test_vehicle_missing_powertrain_defaults_to_gas() {
        let now = date(2024, 1, 1);
        let mut json = serde_json::to_value(Vehicle::new(
            "v1".to_string(),
            "Honda".to_string(),
            "Accord".to_string(),
            2019,
            PowertrainType::Electric,
            0,
            now,
        ))
        .unwrap();
        json.as_object_mut().unwrap().remove("powertrain_type");

        let vehicle: Vehicle = serde_json::from_value(json).unwrap();
        assert_eq!(vehicle.powertrain_type, PowertrainType::Gas);
    }

    #[test]
    fn test_maintenance_and_oil_type_parse() {
        assert_eq!(
            "oil-change".parse::<MaintenanceType>().unwrap(),
            MaintenanceType::OilChange
        );
        assert_eq!(
            "Full Synthetic".parse::<OilType>().unwrap(),
            OilType::FullSynthetic
        );
        assert!("wash".parse::<MaintenanceType>().is_err());
    }

    #[test]
    fn test_vehicle_display_name_and_age() {
        let now = date(2024, 6, 1);
        let mut vehicle = Vehicle::new(
            "v1".to_string(),
            "Toyota".to_string(),
            "Camry".to_string(),
            2020,
            PowertrainType::Gas,
            25000,
            now,
        );
        assert_eq!(vehicle.display_name(), "2020 Toyota Camry");
        assert_eq!(vehicle.age_years(now), 4);
        assert!(vehicle.is_active);

        vehicle.nickname = Some("Daily".to_string());
        assert_eq!(vehicle.display_name(), "Daily");

        vehicle.year = 2025;
        assert_eq!(vehicle.age_years(now), 0);
    }

    #[test]
    fn test_age_of_extreme_model_years_does_not_overflow() {
        let now = date(2024, 6, 1);
        let mut vehicle = Vehicle::new(
            "v1".to_string(),
            "Ford".to_string(),
            "Model T".to_string(),
            i32::MIN,
            PowertrainType::Gas,
            0,
            now,
        );
        assert_eq!(vehicle.age_years(now), i32::MAX as u32);

        vehicle.year = i32::MAX;
        assert_eq!(vehicle.age_years(now), 0);
    }

    #[test]
    fn test_vehicle_validation() {
        let now = date(2024, 6, 1);
        let mut vehicle = Vehicle::new(
            "v1".to_string(),
            "Ford".to_string(),
            "Model T".to_string(),
            1908,
            PowertrainType::Gas,
            0,
            now,
        );
        assert!(vehicle.validate(now).is_ok());

        vehicle.year = 2025;
        assert!(vehicle.validate(now).is_ok());

        for year in [2026, 1885, i32::MIN, i32::MAX] {
            vehicle.year = year;
            assert!(matches!(
                vehicle.validate(now),
                Err(MaintainerError::InvalidUserInput { .. })
            ));
        }

        vehicle.year = 2020;
        vehicle.model = "  ".to_string();
        assert!(vehicle.validate(now).is_err());
    }

    #[test]
    fn test_record_validation() {
        let mut record = MaintenanceRecord::new(
            "r1".to_string(),
            "v1".to_string(),
            MaintenanceType::OilChange,
            45.0,
            30000,
            date(2024, 3, 1),
        );
        assert!(record.validate().is_ok());

        record.cost = -1.0;
        assert!(matches!(
            record.validate(),
            Err(MaintainerError::InvalidUserInput { .. })
        ));

        record.cost = f64::NAN;
        assert!(record.validate().is_err());
    }

    #[test]
    fn test_schedule_record_service_advances_due_points() {
        let created = date(2024, 1, 1);
        let mut schedule = MaintenanceSchedule::new(
            "s1".to_string(),
            "v1".to_string(),
            MaintenanceType::OilChange,
            Some(5000),
            Some(6),
            created,
        );
        assert!(!schedule.is_upcoming());

        let serviced = date(2024, 8, 31);
        schedule.record_service(30000, serviced, serviced);

        assert_eq!(schedule.last_service_mileage, 30000);
        assert_eq!(schedule.last_service_date, Some(serviced));
        assert_eq!(schedule.next_due_mileage, Some(35000));
        // calendar months clamp to the end of a shorter month
        assert_eq!(schedule.next_due_date, Some(date(2025, 2, 28)));
        assert_eq!(schedule.updated_at, serviced);
        assert!(schedule.is_upcoming());
    }

    #[test]
    fn test_schedule_without_intervals_has_no_due_points() {
        let now = date(2024, 1, 1);
        let mut schedule = MaintenanceSchedule::new(
            "s1".to_string(),
            "v1".to_string(),
            MaintenanceType::Repair,
            None,
            None,
            now,
        );
        schedule.record_service(1000, now, now);
        assert_eq!(schedule.next_due_mileage, None);
        assert_eq!(schedule.next_due_date, None);
        assert!(!schedule.is_upcoming());
        assert!(!schedule.is_due(1_000_000, date(2100, 1, 1)));
    }

    #[test]
    fn test_schedule_is_due() {
        let serviced = date(2024, 1, 1);
        let mut schedule = MaintenanceSchedule::new(
            "s1".to_string(),
            "v1".to_string(),
            MaintenanceType::TireService,
            Some(6000),
            Some(6),
            serviced,
        );
        schedule.record_service(10000, serviced, serviced);

        assert!(!schedule.is_due(15999, date(2024, 6, 30)));
        assert!(schedule.is_due(16000, date(2024, 2, 1)));
        assert!(schedule.is_due(10000, date(2024, 7, 1)));

        schedule.is_enabled = false;
        assert!(!schedule.is_due(50000, date(2030, 1, 1)));
    }
}
