// Static catalog of recurring services, matched by powertrain at query time

use super::{CostRange, ServicePriority, ServiceTemplate};
use crate::garage::{MaintenanceType, PowertrainType};

use PowertrainType::{Diesel, Electric, Gas, Hybrid};

const ALL_POWERTRAINS: &[PowertrainType] = &PowertrainType::ALL;
const COMBUSTION: &[PowertrainType] = &[Gas, Diesel];
const COMBUSTION_AND_HYBRID: &[PowertrainType] = &[Gas, Diesel, Hybrid];

/// Every known service template, in declaration order.
///
/// Queries preserve this order among templates of equal priority.
pub static SERVICE_TEMPLATES: &[ServiceTemplate] = &[
    // Oil changes
    ServiceTemplate {
        name: "Conventional Oil Change",
        maintenance_type: MaintenanceType::OilChange,
        description: "Regular oil change with conventional motor oil",
        interval_miles: 3000,
        interval_months: 3,
        powertrain_types: COMBUSTION,
        estimated_cost: CostRange::new(25, 50),
        priority: ServicePriority::High,
        notes: Some("Recommended for older vehicles or severe driving conditions"),
    },
    ServiceTemplate {
        name: "Synthetic Oil Change",
        maintenance_type: MaintenanceType::OilChange,
        description: "Premium oil change with full synthetic motor oil",
        interval_miles: 7500,
        interval_months: 6,
        powertrain_types: &[Gas],
        estimated_cost: CostRange::new(50, 85),
        priority: ServicePriority::High,
        notes: Some("Best protection for modern engines"),
    },
    ServiceTemplate {
        name: "Diesel Oil Change",
        maintenance_type: MaintenanceType::OilChange,
        description: "Oil change with diesel-specific motor oil",
        interval_miles: 5000,
        interval_months: 4,
        powertrain_types: &[Diesel],
        estimated_cost: CostRange::new(60, 100),
        priority: ServicePriority::High,
        notes: Some("Use diesel-specific oil formulation"),
    },
    ServiceTemplate {
        name: "Hybrid Oil Change",
        maintenance_type: MaintenanceType::OilChange,
        description: "Oil change for hybrid powertrain",
        interval_miles: 10000,
        interval_months: 8,
        powertrain_types: &[Hybrid],
        estimated_cost: CostRange::new(45, 75),
        priority: ServicePriority::High,
        notes: Some("Extended intervals due to reduced engine runtime"),
    },
    // Filters
    ServiceTemplate {
        name: "Air Filter Replacement",
        maintenance_type: MaintenanceType::FilterChange,
        description: "Replace engine air filter",
        interval_miles: 15000,
        interval_months: 12,
        powertrain_types: COMBUSTION_AND_HYBRID,
        estimated_cost: CostRange::new(20, 40),
        priority: ServicePriority::Medium,
        notes: None,
    },
    ServiceTemplate {
        name: "Cabin Air Filter",
        maintenance_type: MaintenanceType::FilterChange,
        description: "Replace cabin air filter for clean interior air",
        interval_miles: 15000,
        interval_months: 12,
        powertrain_types: ALL_POWERTRAINS,
        estimated_cost: CostRange::new(15, 35),
        priority: ServicePriority::Low,
        notes: None,
    },
    ServiceTemplate {
        name: "Fuel Filter Replacement",
        maintenance_type: MaintenanceType::FilterChange,
        description: "Replace fuel system filter",
        interval_miles: 30000,
        interval_months: 24,
        powertrain_types: COMBUSTION,
        estimated_cost: CostRange::new(50, 120),
        priority: ServicePriority::Medium,
        notes: Some("Critical for diesel engines, especially with modern injection systems"),
    },
    // Brakes
    ServiceTemplate {
        name: "Brake Pad Inspection",
        maintenance_type: MaintenanceType::BrakeService,
        description: "Inspect brake pads and rotors",
        interval_miles: 12000,
        interval_months: 12,
        powertrain_types: ALL_POWERTRAINS,
        estimated_cost: CostRange::new(50, 100),
        priority: ServicePriority::Critical,
        notes: None,
    },
    ServiceTemplate {
        name: "Brake Pad Replacement",
        maintenance_type: MaintenanceType::BrakeService,
        description: "Replace brake pads",
        interval_miles: 50000,
        interval_months: 48,
        powertrain_types: COMBUSTION,
        estimated_cost: CostRange::new(150, 400),
        priority: ServicePriority::Critical,
        notes: None,
    },
    ServiceTemplate {
        name: "Hybrid Brake Service",
        maintenance_type: MaintenanceType::BrakeService,
        description: "Brake service for hybrid/electric vehicles",
        interval_miles: 75000,
        interval_months: 60,
        powertrain_types: &[Hybrid, Electric],
        estimated_cost: CostRange::new(200, 500),
        priority: ServicePriority::Critical,
        notes: Some("Extended life due to regenerative braking"),
    },
    ServiceTemplate {
        name: "Brake Fluid Change",
        maintenance_type: MaintenanceType::BrakeService,
        description: "Replace brake fluid",
        interval_miles: 30000,
        interval_months: 24,
        powertrain_types: ALL_POWERTRAINS,
        estimated_cost: CostRange::new(80, 150),
        priority: ServicePriority::High,
        notes: None,
    },
    // Tires
    ServiceTemplate {
        name: "Tire Rotation",
        maintenance_type: MaintenanceType::TireService,
        description: "Rotate tires for even wear",
        interval_miles: 6000,
        interval_months: 6,
        powertrain_types: ALL_POWERTRAINS,
        estimated_cost: CostRange::new(25, 60),
        priority: ServicePriority::Medium,
        notes: None,
    },
    ServiceTemplate {
        name: "Tire Replacement",
        maintenance_type: MaintenanceType::TireService,
        description: "Replace worn tires",
        interval_miles: 60000,
        interval_months: 60,
        powertrain_types: ALL_POWERTRAINS,
        estimated_cost: CostRange::new(400, 1200),
        priority: ServicePriority::Critical,
        notes: Some("Electric vehicles may need more frequent replacement due to instant torque"),
    },
    // Batteries
    ServiceTemplate {
        name: "12V Battery Test",
        maintenance_type: MaintenanceType::BatteryService,
        description: "Test 12V battery condition",
        interval_miles: 12000,
        interval_months: 12,
        powertrain_types: ALL_POWERTRAINS,
        estimated_cost: CostRange::new(20, 50),
        priority: ServicePriority::Medium,
        notes: None,
    },
    ServiceTemplate {
        name: "12V Battery Replacement",
        maintenance_type: MaintenanceType::BatteryService,
        description: "Replace 12V auxiliary battery",
        interval_miles: 60000,
        interval_months: 48,
        powertrain_types: ALL_POWERTRAINS,
        estimated_cost: CostRange::new(100, 250),
        priority: ServicePriority::High,
        notes: None,
    },
    ServiceTemplate {
        name: "EV Battery Health Check",
        maintenance_type: MaintenanceType::BatteryService,
        description: "Check high-voltage battery health and charging system",
        interval_miles: 15000,
        interval_months: 12,
        powertrain_types: &[Electric, Hybrid],
        estimated_cost: CostRange::new(100, 300),
        priority: ServicePriority::High,
        notes: Some("Important for battery longevity and performance"),
    },
    // Transmission
    ServiceTemplate {
        name: "Automatic Transmission Service",
        maintenance_type: MaintenanceType::TransmissionService,
        description: "Change transmission fluid and filter",
        interval_miles: 60000,
        interval_months: 48,
        powertrain_types: COMBUSTION,
        estimated_cost: CostRange::new(200, 400),
        priority: ServicePriority::High,
        notes: None,
    },
    ServiceTemplate {
        name: "Manual Transmission Service",
        maintenance_type: MaintenanceType::TransmissionService,
        description: "Change manual transmission fluid",
        interval_miles: 60000,
        interval_months: 48,
        powertrain_types: COMBUSTION,
        estimated_cost: CostRange::new(100, 200),
        priority: ServicePriority::Medium,
        notes: None,
    },
    // Cooling
    ServiceTemplate {
        name: "Coolant System Flush",
        maintenance_type: MaintenanceType::CoolantService,
        description: "Flush and replace engine coolant",
        interval_miles: 60000,
        interval_months: 48,
        powertrain_types: COMBUSTION_AND_HYBRID,
        estimated_cost: CostRange::new(150, 300),
        priority: ServicePriority::High,
        notes: None,
    },
    ServiceTemplate {
        name: "EV Thermal Management",
        maintenance_type: MaintenanceType::CoolantService,
        description: "Service battery thermal management system",
        interval_miles: 50000,
        interval_months: 48,
        powertrain_types: &[Electric],
        estimated_cost: CostRange::new(200, 500),
        priority: ServicePriority::High,
        notes: Some("Critical for battery performance and longevity"),
    },
    // Inspections
    ServiceTemplate {
        name: "Annual Safety Inspection",
        maintenance_type: MaintenanceType::Inspection,
        description: "Comprehensive safety and emissions inspection",
        interval_miles: 12000,
        interval_months: 12,
        powertrain_types: ALL_POWERTRAINS,
        estimated_cost: CostRange::new(50, 150),
        priority: ServicePriority::Critical,
        notes: Some("Required by law in many states"),
    },
    ServiceTemplate {
        name: "Multi-Point Inspection",
        maintenance_type: MaintenanceType::Inspection,
        description: "Comprehensive vehicle inspection",
        interval_miles: 6000,
        interval_months: 6,
        powertrain_types: ALL_POWERTRAINS,
        estimated_cost: CostRange::new(30, 80),
        priority: ServicePriority::Medium,
        notes: None,
    },
];
