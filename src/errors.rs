// Error types for maintainer

use snafu::Snafu;
use std::io;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum MaintainerError {
    // Config management errors
    #[snafu(display("Could not find application config directory"))]
    NoConfigDir,
    #[snafu(display("Could not find application data directory"))]
    NoDataDir,
    #[snafu(display("Error reading or writing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error serializing config file"))]
    ConfigSerializeError { source: serde_json::Error },

    // Garage storage errors
    #[snafu(display("Storage I/O failed for {path}"))]
    StorageIOError { path: String, source: io::Error },
    #[snafu(display("Could not (de)serialize {path}"))]
    StorageSerializeError {
        path: String,
        source: serde_json::Error,
    },

    // Lookup errors
    #[snafu(display("No vehicle with id {id}"))]
    VehicleNotFound { id: String },
    #[snafu(display("No maintenance record with id {id}"))]
    RecordNotFound { id: String },
    #[snafu(display("No maintenance schedule with id {id}"))]
    ScheduleNotFound { id: String },

    // User input validation errors
    #[snafu(display("Invalid user input: {field} - {reason}"))]
    InvalidUserInput { field: String, reason: String },
    #[snafu(display("Unknown {kind}: {value}"))]
    UnknownVariant { kind: String, value: String },

    // CLI output errors
    #[snafu(display("Error serializing command output"))]
    OutputSerializeError { source: serde_json::Error },
}
