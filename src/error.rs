use thiserror::Error;

/// Errors of the servo configuration. A table with any of these errors is
/// never installed.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Failed to read the servo mapping file {path}: {message}")]
    ReadFile { path: String, message: String },

    #[error("Failed to parse the servo mapping: {0}")]
    Parse(String),

    #[error("Servo mapping {entry} references an unknown landmark: {name}")]
    UnknownLandmark { entry: usize, name: String },

    #[error("Servo mapping {entry} has an invalid command prefix: {prefix}")]
    InvalidPrefix { entry: usize, prefix: char },

    #[error("Servo mapping {entry} has an invalid domain: [{min}, {max}]")]
    InvalidDomain { entry: usize, min: f64, max: f64 },
}

/// Errors of the serial transport.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to open the serial device {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write the command {command}: {source}")]
    Write {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serial link is disconnected")]
    Disconnected,
}

/// Errors to start the processes of the model.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Failed to start the TCP/IP server: {0}")]
    Server(#[from] std::io::Error),

    #[error("Processes are already running")]
    AlreadyRunning,
}
