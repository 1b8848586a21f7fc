mod commands;

use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use log::error;

use commands::{CommandContext, NewService, NewVehicle, ServiceEdit, VehicleEdit};
use maintainer::{AppConfig, MaintainerError, MaintenanceType, OilType, PowertrainType};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    /// Directory holding the garage files
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Print debug logs
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List service templates
    Templates {
        #[arg(short, long)]
        powertrain: Option<PowertrainType>,

        #[arg(short = 't', long = "type")]
        maintenance_type: Option<MaintenanceType>,
    },
    /// Services due for a garage vehicle, or for an ad-hoc powertrain and mileage.
    /// Without --last-mileage/--last-date the vehicle counts as never serviced.
    Recommend {
        #[arg(long, conflicts_with_all = ["powertrain", "mileage", "last_mileage", "last_date"])]
        vehicle: Option<String>,

        #[arg(short, long, required_unless_present = "vehicle")]
        powertrain: Option<PowertrainType>,

        #[arg(short, long, required_unless_present = "vehicle")]
        mileage: Option<u32>,

        #[arg(long)]
        last_mileage: Option<u32>,

        /// YYYY-MM-DD
        #[arg(long)]
        last_date: Option<NaiveDate>,

        /// Only critical services
        #[arg(long)]
        critical: bool,
    },
    /// Recommended oil change interval
    OilInterval {
        #[arg(short, long)]
        powertrain: PowertrainType,

        #[arg(short, long)]
        oil_type: Option<OilType>,

        /// Vehicle age in years
        #[arg(short, long)]
        age: u32,

        #[arg(long)]
        last_mileage: Option<u32>,
    },
    /// Cheapest estimated cost for a maintenance category
    Cost {
        #[arg(short = 't', long = "type")]
        maintenance_type: MaintenanceType,

        #[arg(short, long)]
        powertrain: PowertrainType,
    },
    /// Manage garage vehicles
    Vehicle {
        #[command(subcommand)]
        action: VehicleCommands,
    },
    /// Log a completed service
    Log {
        #[arg(long)]
        vehicle: String,

        #[arg(short = 't', long = "type")]
        maintenance_type: MaintenanceType,

        #[arg(short, long)]
        cost: f64,

        #[arg(short, long)]
        mileage: u32,

        /// Service date (YYYY-MM-DD), today when omitted
        #[arg(short, long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        description: Option<String>,

        /// Shop or service provider
        #[arg(long)]
        shop: Option<String>,

        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        notes: Option<String>,

        #[arg(long)]
        oil_type: Option<OilType>,
    },
    /// Correct or delete logged services
    Record {
        #[command(subcommand)]
        action: RecordCommands,
    },
    /// Service history of a vehicle
    History {
        #[arg(long)]
        vehicle: String,
    },
    /// Manage maintenance schedules
    Schedule {
        #[command(subcommand)]
        action: ScheduleCommands,
    },
    /// Service overview of the garage
    Status {
        #[arg(long)]
        vehicle: Option<String>,
    },
    /// Spending report
    Analytics {
        /// Months of monthly spending to show
        #[arg(long)]
        months: Option<usize>,
    },
    /// Show or change the saved configuration
    Config {
        /// Default garage directory
        #[arg(long)]
        set_data_dir: Option<PathBuf>,

        /// Default months of spending history
        #[arg(long)]
        history_months: Option<usize>,

        #[arg(long)]
        show_notes: Option<bool>,
    },
}

#[derive(Subcommand, Debug)]
enum VehicleCommands {
    Add {
        #[arg(long)]
        make: String,

        #[arg(long)]
        model: String,

        #[arg(long)]
        year: i32,

        #[arg(short, long, default_value = "gas")]
        powertrain: PowertrainType,

        #[arg(short, long, default_value_t = 0)]
        mileage: u32,

        #[arg(long)]
        nickname: Option<String>,

        #[arg(long)]
        vin: Option<String>,

        #[arg(long)]
        plate: Option<String>,

        /// Do not create default maintenance schedules
        #[arg(long)]
        no_schedules: bool,
    },
    List,
    /// Change vehicle details; an empty value clears nickname, VIN or plate
    Edit {
        /// Vehicle id, id prefix or VIN
        id: String,

        #[arg(long)]
        make: Option<String>,

        #[arg(long)]
        model: Option<String>,

        #[arg(long)]
        year: Option<i32>,

        #[arg(short, long)]
        powertrain: Option<PowertrainType>,

        #[arg(long)]
        nickname: Option<String>,

        #[arg(long)]
        vin: Option<String>,

        #[arg(long)]
        plate: Option<String>,
    },
    Remove {
        id: String,
    },
    Mileage {
        id: String,
        mileage: u32,
    },
}

#[derive(Subcommand, Debug)]
enum RecordCommands {
    /// Correct fields of a logged service
    Edit {
        /// Record id or id prefix
        id: String,

        #[arg(short = 't', long = "type")]
        maintenance_type: Option<MaintenanceType>,

        #[arg(short, long)]
        cost: Option<f64>,

        #[arg(short, long)]
        mileage: Option<u32>,

        /// YYYY-MM-DD
        #[arg(short, long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        shop: Option<String>,

        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        notes: Option<String>,

        #[arg(long)]
        oil_type: Option<OilType>,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand, Debug)]
enum ScheduleCommands {
    /// Create default schedules from the template catalog
    Init {
        #[arg(long)]
        vehicle: String,
    },
    List {
        #[arg(long)]
        vehicle: String,
    },
    /// Schedules whose next due mileage or date is reached
    Due {
        #[arg(long)]
        vehicle: Option<String>,
    },
    Remove {
        #[arg(long)]
        vehicle: String,

        #[arg(short = 't', long = "type")]
        maintenance_type: MaintenanceType,
    },
}

fn run(command: Commands, ctx: &CommandContext) -> Result<(), MaintainerError> {
    match command {
        Commands::Templates {
            powertrain,
            maintenance_type,
        } => commands::templates(ctx, powertrain, maintenance_type),
        Commands::Recommend {
            vehicle: Some(vehicle),
            critical,
            ..
        } => commands::recommend_for_vehicle(ctx, &vehicle, critical),
        Commands::Recommend {
            vehicle: None,
            powertrain,
            mileage,
            last_mileage,
            last_date,
            critical,
        } => match (powertrain, mileage) {
            (Some(powertrain), Some(mileage)) => {
                commands::recommend(ctx, powertrain, mileage, last_mileage, last_date, critical)
            }
            _ => Err(MaintainerError::InvalidUserInput {
                field: "recommend".to_string(),
                reason: "either --vehicle or both --powertrain and --mileage are required"
                    .to_string(),
            }),
        },
        Commands::OilInterval {
            powertrain,
            oil_type,
            age,
            last_mileage,
        } => commands::oil_interval(ctx, powertrain, oil_type, age, last_mileage),
        Commands::Cost {
            maintenance_type,
            powertrain,
        } => commands::cost(ctx, maintenance_type, powertrain),
        Commands::Vehicle { action } => match action {
            VehicleCommands::Add {
                make,
                model,
                year,
                powertrain,
                mileage,
                nickname,
                vin,
                plate,
                no_schedules,
            } => commands::add_vehicle(
                ctx,
                NewVehicle {
                    make,
                    model,
                    year,
                    powertrain,
                    mileage,
                    nickname,
                    vin,
                    license_plate: plate,
                    seed_schedules: !no_schedules,
                },
            ),
            VehicleCommands::List => commands::list_vehicles(ctx),
            VehicleCommands::Edit {
                id,
                make,
                model,
                year,
                powertrain,
                nickname,
                vin,
                plate,
            } => commands::edit_vehicle(
                ctx,
                &id,
                VehicleEdit {
                    make,
                    model,
                    year,
                    powertrain,
                    nickname,
                    vin,
                    license_plate: plate,
                },
            ),
            VehicleCommands::Remove { id } => commands::remove_vehicle(ctx, &id),
            VehicleCommands::Mileage { id, mileage } => commands::set_mileage(ctx, &id, mileage),
        },
        Commands::Log {
            vehicle,
            maintenance_type,
            cost,
            mileage,
            date,
            description,
            shop,
            location,
            notes,
            oil_type,
        } => commands::log_service(
            ctx,
            NewService {
                vehicle,
                maintenance_type,
                cost,
                mileage,
                date,
                description,
                service_name: shop,
                service_location: location,
                notes,
                oil_type,
            },
        ),
        Commands::Record { action } => match action {
            RecordCommands::Edit {
                id,
                maintenance_type,
                cost,
                mileage,
                date,
                description,
                shop,
                location,
                notes,
                oil_type,
            } => commands::edit_record(
                ctx,
                &id,
                ServiceEdit {
                    maintenance_type,
                    cost,
                    mileage,
                    date,
                    description,
                    service_name: shop,
                    service_location: location,
                    notes,
                    oil_type,
                },
            ),
            RecordCommands::Delete { id } => commands::delete_record(ctx, &id),
        },
        Commands::History { vehicle } => commands::history(ctx, &vehicle),
        Commands::Schedule { action } => match action {
            ScheduleCommands::Init { vehicle } => commands::init_schedules(ctx, &vehicle),
            ScheduleCommands::List { vehicle } => commands::list_schedules(ctx, &vehicle),
            ScheduleCommands::Due { vehicle } => commands::due_schedules(ctx, vehicle.as_deref()),
            ScheduleCommands::Remove {
                vehicle,
                maintenance_type,
            } => commands::remove_schedule(ctx, &vehicle, maintenance_type),
        },
        Commands::Status { vehicle } => commands::status(ctx, vehicle.as_deref()),
        Commands::Analytics { months } => commands::analytics(ctx, months),
        Commands::Config {
            set_data_dir,
            history_months,
            show_notes,
        } => commands::update_config(ctx, set_data_dir, history_months, show_notes),
    }
}

fn main() {
    let cli = Args::parse();
    if cfg!(debug_assertions) || cli.verbose {
        colog::init();
    }

    let ctx = CommandContext {
        config: AppConfig::load_or_default(),
        data_dir: cli.data_dir,
        json: cli.json,
        now: Utc::now(),
    };

    if let Err(e) = run(cli.command, &ctx) {
        error!("{:?}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
