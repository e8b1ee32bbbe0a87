use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Already connected to Bluetooth")]
    AlreadyConnected,

    #[error("Connect to Bluetooth first")]
    NotConnected,

    #[error("No active connection")]
    NoConnection,

    #[error("Could not connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: serialport::Error,
    },

    #[error("Could not list serial ports: {0}")]
    PortScan(#[source] serialport::Error),

    #[error("Invalid {field} '{value}': {reason}")]
    InvalidInput {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Write failed at note {index}: {source}")]
    Write {
        index: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed command line '{0}'")]
    MalformedCommand(String),

    #[error("A melody is already playing")]
    Busy,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn invalid(field: &'static str, value: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidInput {
            field,
            value: value.into(),
            reason: reason.into(),
        }
    }
}
