use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum SorterError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("timeout waiting for sensor")]
    Timeout,
    #[error("invalid state: {0}")]
    State(String),
    #[error("stop requested")]
    Stopped,
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing collector actuator")]
    MissingCollector,
    #[error("missing dropper actuator")]
    MissingDropper,
    #[error("missing color sensor")]
    MissingSensor,
    #[error("missing home switch")]
    MissingHomeSwitch,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
