use thiserror::Error;

/// Typed hardware errors surfaced by simulated and real peripherals.
#[derive(Debug, Error, Clone)]
pub enum HwError {
    #[error("sensor timeout")]
    Timeout,
    #[error("drive released: {0}")]
    DriveReleased(&'static str),
    #[error("drive fault: {0}")]
    DriveFault(String),
    #[error("switch fault: {0}")]
    SwitchFault(String),
}
