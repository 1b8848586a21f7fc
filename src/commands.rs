// Handlers behind the CLI subcommands

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use log::debug;
use serde::Serialize;

use maintainer::analytics::{self, AnalyticsReport};
use maintainer::garage::{self, FileBasedStorage, GarageStorage};
use maintainer::{
    AppConfig, LastService, MaintainerError, MaintenanceRecord, MaintenanceSchedule,
    MaintenanceType, OilType, PowertrainType, ServicePriority, ServiceTemplate,
    ServiceTemplateEngine, Vehicle, VehicleServiceStatus,
};

/// Settings shared by every command
pub(crate) struct CommandContext {
    pub(crate) config: AppConfig,
    pub(crate) data_dir: Option<PathBuf>,
    pub(crate) json: bool,
    /// Wall clock time, read once at startup
    pub(crate) now: DateTime<Utc>,
}

impl CommandContext {
    fn storage(&self) -> Result<FileBasedStorage, MaintainerError> {
        let path = self.config.resolve_data_dir(self.data_dir.as_deref())?;
        debug!("Using garage at {:?}", path);
        FileBasedStorage::new(path)
    }

    /// Print as pretty JSON in `--json` mode, otherwise run `human`
    fn emit<T: Serialize>(&self, value: &T, human: impl FnOnce()) -> Result<(), MaintainerError> {
        if self.json {
            let out = serde_json::to_string_pretty(value)
                .map_err(|e| MaintainerError::OutputSerializeError { source: e })?;
            println!("{}", out);
        } else {
            human();
        }
        Ok(())
    }
}

pub(crate) struct NewVehicle {
    pub(crate) make: String,
    pub(crate) model: String,
    pub(crate) year: i32,
    pub(crate) powertrain: PowertrainType,
    pub(crate) mileage: u32,
    pub(crate) nickname: Option<String>,
    pub(crate) vin: Option<String>,
    pub(crate) license_plate: Option<String>,
    pub(crate) seed_schedules: bool,
}

/// Changes to a vehicle; `None` leaves a field as it is
pub(crate) struct VehicleEdit {
    pub(crate) make: Option<String>,
    pub(crate) model: Option<String>,
    pub(crate) year: Option<i32>,
    pub(crate) powertrain: Option<PowertrainType>,
    pub(crate) nickname: Option<String>,
    pub(crate) vin: Option<String>,
    pub(crate) license_plate: Option<String>,
}

/// Corrections to a logged service; `None` leaves a field as it is
pub(crate) struct ServiceEdit {
    pub(crate) maintenance_type: Option<MaintenanceType>,
    pub(crate) cost: Option<f64>,
    pub(crate) mileage: Option<u32>,
    pub(crate) date: Option<NaiveDate>,
    pub(crate) description: Option<String>,
    pub(crate) service_name: Option<String>,
    pub(crate) service_location: Option<String>,
    pub(crate) notes: Option<String>,
    pub(crate) oil_type: Option<OilType>,
}

pub(crate) struct NewService {
    pub(crate) vehicle: String,
    pub(crate) maintenance_type: MaintenanceType,
    pub(crate) cost: f64,
    pub(crate) mileage: u32,
    pub(crate) date: Option<NaiveDate>,
    pub(crate) description: Option<String>,
    pub(crate) service_name: Option<String>,
    pub(crate) service_location: Option<String>,
    pub(crate) notes: Option<String>,
    pub(crate) oil_type: Option<OilType>,
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn money(amount: f64) -> String {
    format!("${:.2}", amount)
}

/// Find a record by exact id or unique id prefix
fn find_record<S: GarageStorage>(
    storage: &S,
    key: &str,
) -> Result<MaintenanceRecord, MaintainerError> {
    if let Some(record) = storage.load_record(key)? {
        return Ok(record);
    }
    let mut matches = storage
        .all_records()?
        .into_iter()
        .filter(|r| !key.is_empty() && r.id.starts_with(key));
    match (matches.next(), matches.next()) {
        (Some(record), None) => Ok(record),
        (Some(_), Some(_)) => Err(MaintainerError::InvalidUserInput {
            field: "record".to_string(),
            reason: format!("id prefix {} matches more than one record", key),
        }),
        _ => Err(MaintainerError::RecordNotFound {
            id: key.to_string(),
        }),
    }
}

/// An empty string clears an optional field
fn apply_optional(field: &mut Option<String>, value: Option<String>) {
    if let Some(value) = value {
        *field = Some(value).filter(|v| !v.trim().is_empty());
    }
}

fn print_templates(templates: &[&ServiceTemplate], show_notes: bool) {
    if templates.is_empty() {
        println!("No services.");
        return;
    }
    for template in templates {
        println!(
            "[{:<8}] {:<32} every {:>6} mi / {:>2} mo  {}",
            template.priority,
            template.name,
            template.interval_miles,
            template.interval_months,
            template.estimated_cost
        );
        if let Some(notes) = template.notes.filter(|_| show_notes) {
            println!("           {}", notes);
        }
    }
}

pub(crate) fn templates(
    ctx: &CommandContext,
    powertrain: Option<PowertrainType>,
    maintenance_type: Option<MaintenanceType>,
) -> Result<(), MaintainerError> {
    let engine = ServiceTemplateEngine::new();
    let templates: Vec<&ServiceTemplate> = match (powertrain, maintenance_type) {
        (Some(p), Some(t)) => engine
            .templates_for_powertrain(p)
            .into_iter()
            .filter(|template| template.maintenance_type == t)
            .collect(),
        (Some(p), None) => engine.templates_for_powertrain(p),
        (None, Some(t)) => engine.templates_by_type(t),
        (None, None) => engine.templates().iter().collect(),
    };
    ctx.emit(&templates, || {
        print_templates(&templates, ctx.config.show_notes)
    })
}

pub(crate) fn recommend_for_vehicle(
    ctx: &CommandContext,
    vehicle: &str,
    critical_only: bool,
) -> Result<(), MaintainerError> {
    let storage = ctx.storage()?;
    let vehicle = garage::find_vehicle(&storage, vehicle)?;
    let records = storage.records_for_vehicle(&vehicle.id)?;
    let status =
        VehicleServiceStatus::evaluate(&vehicle, &records, &ServiceTemplateEngine::new(), ctx.now);

    let services = if critical_only {
        &status.critical_services
    } else {
        &status.due_services
    };
    ctx.emit(services, || {
        println!("{} at {} mi", status.vehicle_name, status.current_mileage);
        print_templates(services, ctx.config.show_notes);
    })
}

pub(crate) fn recommend(
    ctx: &CommandContext,
    powertrain: PowertrainType,
    mileage: u32,
    last_mileage: Option<u32>,
    last_date: Option<NaiveDate>,
    critical_only: bool,
) -> Result<(), MaintainerError> {
    let engine = ServiceTemplateEngine::new();
    let never = LastService::never();
    let last_service = LastService::at(
        last_mileage.unwrap_or(never.mileage),
        last_date.map_or(never.date, start_of_day),
    );

    let services = if critical_only {
        engine.critical_overdue_services(powertrain, mileage, &last_service, ctx.now)
    } else {
        engine.recommended_services(powertrain, mileage, &last_service, ctx.now)
    };
    ctx.emit(&services, || {
        print_templates(&services, ctx.config.show_notes)
    })
}

#[derive(Serialize)]
struct OilIntervalOutput {
    powertrain_type: PowertrainType,
    oil_type: Option<OilType>,
    vehicle_age_years: u32,
    interval_miles: u32,
    next_oil_change_mileage: Option<u32>,
}

pub(crate) fn oil_interval(
    ctx: &CommandContext,
    powertrain: PowertrainType,
    oil_type: Option<OilType>,
    age: u32,
    last_mileage: Option<u32>,
) -> Result<(), MaintainerError> {
    let interval = ServiceTemplateEngine::calculate_oil_change_interval(powertrain, oil_type, age);
    let next = last_mileage.and_then(|last| {
        ServiceTemplateEngine::next_oil_change_mileage(powertrain, last, last, oil_type, age)
    });
    let output = OilIntervalOutput {
        powertrain_type: powertrain,
        oil_type,
        vehicle_age_years: age,
        interval_miles: interval,
        next_oil_change_mileage: next,
    };
    ctx.emit(&output, || {
        if interval == 0 {
            println!("{} vehicles do not need oil changes.", powertrain);
            return;
        }
        println!("Change oil every {} mi", interval);
        if let Some(next) = next {
            println!("Next oil change at {} mi", next);
        }
    })
}

pub(crate) fn cost(
    ctx: &CommandContext,
    maintenance_type: MaintenanceType,
    powertrain: PowertrainType,
) -> Result<(), MaintainerError> {
    let estimate = ServiceTemplateEngine::new().estimated_cost(maintenance_type, powertrain);
    ctx.emit(&estimate, || match estimate {
        Some(range) => println!("{} for {}: {}", maintenance_type, powertrain, range),
        None => println!(
            "No {} template applies to {} vehicles.",
            maintenance_type, powertrain
        ),
    })
}

pub(crate) fn add_vehicle(ctx: &CommandContext, new: NewVehicle) -> Result<(), MaintainerError> {
    let mut vehicle = Vehicle::new(
        uuid::Uuid::new_v4().to_string(),
        new.make,
        new.model,
        new.year,
        new.powertrain,
        new.mileage,
        ctx.now,
    );
    vehicle.nickname = new.nickname;
    vehicle.vin = new.vin;
    vehicle.license_plate = new.license_plate;
    vehicle.validate(ctx.now)?;

    let mut storage = ctx.storage()?;
    storage.save_vehicle(&vehicle)?;

    let schedules = if new.seed_schedules {
        garage::seed_default_schedules(
            &mut storage,
            &vehicle,
            &ServiceTemplateEngine::new(),
            ctx.now,
        )?
    } else {
        Vec::new()
    };

    ctx.emit(&vehicle, || {
        println!("Added {} ({})", vehicle.display_name(), vehicle.id);
        if !schedules.is_empty() {
            println!("Created {} maintenance schedules", schedules.len());
        }
    })
}

pub(crate) fn list_vehicles(ctx: &CommandContext) -> Result<(), MaintainerError> {
    let vehicles = ctx.storage()?.list_vehicles()?;
    ctx.emit(&vehicles, || {
        if vehicles.is_empty() {
            println!("No vehicles in the garage.");
        }
        for vehicle in &vehicles {
            println!(
                "{}  {:<28} {:<9} {:>8} mi",
                vehicle.id,
                vehicle.display_name(),
                vehicle.powertrain_type,
                vehicle.current_mileage
            );
        }
    })
}

pub(crate) fn remove_vehicle(ctx: &CommandContext, key: &str) -> Result<(), MaintainerError> {
    let mut storage = ctx.storage()?;
    let vehicle = garage::find_vehicle(&storage, key)?;
    storage.delete_vehicle(&vehicle.id, ctx.now)?;
    if !ctx.json {
        println!("Removed {}", vehicle.display_name());
    }
    Ok(())
}

pub(crate) fn edit_vehicle(
    ctx: &CommandContext,
    key: &str,
    edit: VehicleEdit,
) -> Result<(), MaintainerError> {
    let mut storage = ctx.storage()?;
    let mut vehicle = garage::find_vehicle(&storage, key)?;

    if let Some(make) = edit.make {
        vehicle.make = make;
    }
    if let Some(model) = edit.model {
        vehicle.model = model;
    }
    if let Some(year) = edit.year {
        vehicle.year = year;
    }
    if let Some(powertrain) = edit.powertrain {
        vehicle.powertrain_type = powertrain;
    }
    apply_optional(&mut vehicle.nickname, edit.nickname);
    apply_optional(&mut vehicle.vin, edit.vin);
    apply_optional(&mut vehicle.license_plate, edit.license_plate);

    garage::update_vehicle(&mut storage, &vehicle, ctx.now)?;
    ctx.emit(&vehicle, || {
        println!("Updated {} ({})", vehicle.display_name(), vehicle.id)
    })
}

pub(crate) fn set_mileage(
    ctx: &CommandContext,
    key: &str,
    mileage: u32,
) -> Result<(), MaintainerError> {
    let mut storage = ctx.storage()?;
    let vehicle = garage::find_vehicle(&storage, key)?;
    storage.update_mileage(&vehicle.id, mileage, ctx.now)?;
    if !ctx.json {
        println!("{} is now at {} mi", vehicle.display_name(), mileage);
    }
    Ok(())
}

pub(crate) fn log_service(ctx: &CommandContext, new: NewService) -> Result<(), MaintainerError> {
    let mut storage = ctx.storage()?;
    let vehicle = garage::find_vehicle(&storage, &new.vehicle)?;

    let mut record = MaintenanceRecord::new(
        uuid::Uuid::new_v4().to_string(),
        vehicle.id.clone(),
        new.maintenance_type,
        new.cost,
        new.mileage,
        new.date.map_or(ctx.now, start_of_day),
    );
    if let Some(description) = new.description {
        record.description = description;
    }
    record.service_name = new.service_name;
    record.service_location = new.service_location;
    record.notes = new.notes;
    record.oil_type = new.oil_type;
    record.created_at = ctx.now;
    record.updated_at = ctx.now;

    garage::log_service(&mut storage, &record, ctx.now)?;
    ctx.emit(&record, || {
        println!(
            "Logged {} for {} at {} mi ({})",
            record.maintenance_type,
            vehicle.display_name(),
            record.mileage,
            money(record.cost)
        )
    })
}

pub(crate) fn edit_record(
    ctx: &CommandContext,
    key: &str,
    edit: ServiceEdit,
) -> Result<(), MaintainerError> {
    let mut storage = ctx.storage()?;
    let mut record = find_record(&storage, key)?;

    if let Some(maintenance_type) = edit.maintenance_type {
        record.maintenance_type = maintenance_type;
    }
    if let Some(cost) = edit.cost {
        record.cost = cost;
    }
    if let Some(mileage) = edit.mileage {
        record.mileage = mileage;
    }
    if let Some(date) = edit.date {
        record.service_date = start_of_day(date);
    }
    if let Some(description) = edit.description {
        record.description = description;
    }
    apply_optional(&mut record.service_name, edit.service_name);
    apply_optional(&mut record.service_location, edit.service_location);
    apply_optional(&mut record.notes, edit.notes);
    if edit.oil_type.is_some() {
        record.oil_type = edit.oil_type;
    }

    garage::update_service(&mut storage, &record, ctx.now)?;
    ctx.emit(&record, || {
        println!(
            "Updated {} record {} ({} mi, {})",
            record.maintenance_type,
            record.id,
            record.mileage,
            money(record.cost)
        )
    })
}

pub(crate) fn delete_record(ctx: &CommandContext, key: &str) -> Result<(), MaintainerError> {
    let mut storage = ctx.storage()?;
    let record = find_record(&storage, key)?;
    let deleted = garage::delete_service(&mut storage, &record.id)?;
    if !ctx.json {
        println!(
            "Deleted {} record from {}",
            deleted.maintenance_type,
            deleted.service_date.format("%Y-%m-%d")
        );
    }
    Ok(())
}

pub(crate) fn history(ctx: &CommandContext, key: &str) -> Result<(), MaintainerError> {
    let storage = ctx.storage()?;
    let vehicle = garage::find_vehicle(&storage, key)?;
    let records = storage.records_for_vehicle(&vehicle.id)?;

    ctx.emit(&records, || {
        println!("{}", vehicle.display_name());
        for record in &records {
            println!(
                "{}  {:<20} {:>8} mi {:>10}  {}",
                record.service_date.format("%Y-%m-%d"),
                record.maintenance_type,
                record.mileage,
                money(record.cost),
                record.service_name.as_deref().unwrap_or("")
            );
        }
        println!(
            "Total: {}",
            money(analytics::total_cost_for_vehicle(&records, &vehicle.id))
        );
    })
}

fn print_schedules(schedules: &[MaintenanceSchedule]) {
    if schedules.is_empty() {
        println!("No schedules.");
    }
    for schedule in schedules {
        let next_mileage = schedule
            .next_due_mileage
            .map_or("-".to_string(), |m| format!("{} mi", m));
        let next_date = schedule
            .next_due_date
            .map_or("-".to_string(), |d| d.format("%Y-%m-%d").to_string());
        println!(
            "{:<20} {:<32} next {:>10} / {}",
            schedule.maintenance_type,
            schedule.description.as_deref().unwrap_or(""),
            next_mileage,
            next_date
        );
    }
}

pub(crate) fn init_schedules(ctx: &CommandContext, key: &str) -> Result<(), MaintainerError> {
    let mut storage = ctx.storage()?;
    let vehicle = garage::find_vehicle(&storage, key)?;
    let created = garage::seed_default_schedules(
        &mut storage,
        &vehicle,
        &ServiceTemplateEngine::new(),
        ctx.now,
    )?;
    ctx.emit(&created, || print_schedules(&created))
}

pub(crate) fn list_schedules(ctx: &CommandContext, key: &str) -> Result<(), MaintainerError> {
    let storage = ctx.storage()?;
    let vehicle = garage::find_vehicle(&storage, key)?;
    let schedules = storage.schedules_for_vehicle(&vehicle.id)?;
    ctx.emit(&schedules, || print_schedules(&schedules))
}

pub(crate) fn due_schedules(
    ctx: &CommandContext,
    key: Option<&str>,
) -> Result<(), MaintainerError> {
    let storage = ctx.storage()?;
    let vehicles = match key {
        Some(key) => vec![garage::find_vehicle(&storage, key)?],
        None => storage.list_vehicles()?,
    };

    let mut due: Vec<MaintenanceSchedule> = Vec::new();
    for vehicle in &vehicles {
        due.extend(
            storage
                .schedules_for_vehicle(&vehicle.id)?
                .into_iter()
                .filter(|s| s.is_due(vehicle.current_mileage, ctx.now)),
        );
    }
    ctx.emit(&due, || print_schedules(&due))
}

pub(crate) fn remove_schedule(
    ctx: &CommandContext,
    key: &str,
    maintenance_type: MaintenanceType,
) -> Result<(), MaintainerError> {
    let mut storage = ctx.storage()?;
    let vehicle = garage::find_vehicle(&storage, key)?;
    let schedule = storage
        .schedule_by_type(&vehicle.id, maintenance_type)?
        .ok_or_else(|| MaintainerError::ScheduleNotFound {
            id: format!("{}/{}", vehicle.id, maintenance_type),
        })?;
    storage.delete_schedule(&schedule.id)?;
    if !ctx.json {
        println!("Removed {} schedule", maintenance_type);
    }
    Ok(())
}

pub(crate) fn status(ctx: &CommandContext, key: Option<&str>) -> Result<(), MaintainerError> {
    let storage = ctx.storage()?;
    let vehicles = match key {
        Some(key) => vec![garage::find_vehicle(&storage, key)?],
        None => storage.list_vehicles()?,
    };
    let records = storage.all_records()?;
    let engine = ServiceTemplateEngine::new();

    let statuses: Vec<VehicleServiceStatus> = vehicles
        .iter()
        .map(|vehicle| VehicleServiceStatus::evaluate(vehicle, &records, &engine, ctx.now))
        .collect();

    ctx.emit(&statuses, || {
        if statuses.is_empty() {
            println!("No vehicles in the garage.");
        }
        for status in &statuses {
            println!(
                "{} ({} mi): {} services due, {} critical",
                status.vehicle_name,
                status.current_mileage,
                status.due_services.len(),
                status.critical_services.len()
            );
            for template in &status.critical_services {
                println!("  ! {}", template.name);
            }
            if let (Some(next), Some(left)) = (
                status.next_oil_change_mileage,
                status.miles_until_oil_change(),
            ) {
                println!("  next oil change at {} mi ({} mi left)", next, left);
            }
        }
        let attention = statuses.iter().filter(|s| s.needs_attention()).count();
        if attention > 0 {
            println!(
                "{} vehicle(s) with {} overdue services",
                attention,
                ServicePriority::Critical
            );
        }
    })
}

pub(crate) fn analytics(ctx: &CommandContext, months: Option<usize>) -> Result<(), MaintainerError> {
    let storage = ctx.storage()?;
    let vehicles = storage.list_vehicles()?;
    let records: Vec<MaintenanceRecord> = storage
        .all_records()?
        .into_iter()
        .filter(|r| vehicles.iter().any(|v| v.id == r.vehicle_id))
        .collect();

    let report = AnalyticsReport::calculate(
        &vehicles,
        &records,
        ctx.now,
        months.unwrap_or(ctx.config.spending_history_months),
    );

    ctx.emit(&report, || {
        println!(
            "Total spent: {} across {} vehicles ({} per vehicle, {:.3} per mile)",
            money(report.total_maintenance_cost),
            report.total_vehicles,
            money(report.average_cost_per_vehicle),
            report.cost_per_mile
        );
        if let Some(kind) = report.most_expensive_maintenance_type {
            println!("Most expensive category: {}", kind);
        }

        println!("\nMonthly spending");
        for month in &report.monthly_spending {
            println!(
                "  {:<16} {:>10} ({} services)",
                month.label(),
                money(month.amount),
                month.count
            );
        }

        println!("\nBy category");
        for data in &report.maintenance_type_breakdown {
            println!(
                "  {:<20} {:>10} ({} services, avg {})",
                data.maintenance_type,
                money(data.total_cost),
                data.count,
                money(data.average_cost)
            );
        }

        println!("\nBy vehicle");
        for data in &report.vehicle_cost_breakdown {
            println!(
                "  {:<28} {:>10} ({} services, {:.3} per mile)",
                data.vehicle_name,
                money(data.total_cost),
                data.maintenance_count,
                data.cost_per_mile
            );
        }

        let trends = &report.recent_trends;
        println!(
            "\nThis month {} ({} services) vs last month {} ({} services): {:+.1}%",
            money(trends.this_month_spending),
            trends.total_records_this_month,
            money(trends.last_month_spending),
            trends.total_records_last_month,
            trends.month_over_month_change
        );
    })
}

pub(crate) fn update_config(
    ctx: &CommandContext,
    data_dir: Option<PathBuf>,
    history_months: Option<usize>,
    show_notes: Option<bool>,
) -> Result<(), MaintainerError> {
    let mut config = ctx.config.clone();
    let changed = data_dir.is_some() || history_months.is_some() || show_notes.is_some();
    if let Some(dir) = data_dir {
        config.data_dir = Some(dir);
    }
    if let Some(months) = history_months {
        config.spending_history_months = months;
    }
    if let Some(show) = show_notes {
        config.show_notes = show;
    }
    if changed {
        config.save()?;
    }

    ctx.emit(&config, || {
        let data_dir = config
            .resolve_data_dir(None)
            .map_or("<unavailable>".to_string(), |dir| dir.display().to_string());
        println!("data dir:        {}", data_dir);
        println!("history months:  {}", config.spending_history_months);
        println!("show notes:      {}", config.show_notes);
    })
}
