// Library interface for maintainer
// This allows integration tests and benches to access internal modules

pub mod analytics;
pub mod config;
pub mod errors;
pub mod garage;
pub mod service_templates;

// Re-export commonly used types
pub use analytics::AnalyticsReport;
pub use config::AppConfig;
pub use errors::MaintainerError;
pub use garage::{
    FileBasedStorage, GarageStorage, MaintenanceRecord, MaintenanceSchedule, MaintenanceType,
    OilType, PowertrainType, Vehicle, VehicleServiceStatus,
};
pub use service_templates::{
    CostRange, LastService, SERVICE_TEMPLATES, ServicePriority, ServiceTemplate,
    ServiceTemplateEngine,
};
