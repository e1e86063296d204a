//! Human-readable error descriptions and structured JSON error formatting.

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use sorter_core::error::{BuildError, SorterError};

    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingCollector => {
                "What happened: No collector actuator was provided to the sorter.\nLikely causes: The collector drive failed to initialize or was not wired into the builder.\nHow to fix: Ensure the collector actuator is created successfully and passed via with_collector(...).".to_string()
            }
            BuildError::MissingDropper => {
                "What happened: No dropper actuator was provided to the sorter.\nLikely causes: The dropper drive failed to initialize or was not wired into the builder.\nHow to fix: Ensure the dropper actuator is created successfully and passed via with_dropper(...).".to_string()
            }
            BuildError::MissingSensor => {
                "What happened: No color sensor was provided to the sorter.\nLikely causes: The sensor failed to initialize or was not wired into the builder.\nHow to fix: Ensure the color sensor is created successfully and passed via with_sensor(...).".to_string()
            }
            BuildError::MissingHomeSwitch => {
                "What happened: No home switch was provided to the sorter.\nLikely causes: The switch input failed to initialize or was not wired into the builder.\nHow to fix: Ensure the home switch is created successfully and passed via with_home_switch(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See README for a sample."
            ),
        };
    }

    if let Some(se) = err.downcast_ref::<SorterError>() {
        return match se {
            SorterError::Stopped => {
                "What happened: A stop was requested (Ctrl-C or external stop input).\nBoth axes were halted in place; the run did not complete.\nHow to fix: Start a new run once the machine is clear.".to_string()
            }
            SorterError::Timeout => {
                "What happened: The color sensor did not produce data in time.\nLikely causes: Sensor not wired correctly, no power/ground, or settle delay too low.\nHow to fix: Verify the sensor wiring and consider raising color.settle_ms in the config.".to_string()
            }
            SorterError::State(msg) => format!(
                "What happened: The control program was driven out of order ({msg}).\nLikely causes: Cycling after shutdown, or scheduling before calibration.\nHow to fix: Re-run from the start; the run sequence is home, calibrate, sort."
            ),
            _ => format!(
                "What happened: {se}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // Generic fallback
    let msg = err.to_string();
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Map domain errors to stable exit codes; generic errors return 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    use sorter_core::error::SorterError;
    if let Some(se) = err.downcast_ref::<SorterError>() {
        return match se {
            SorterError::Stopped => 130,
            SorterError::Timeout => 4,
            SorterError::Hardware(_) | SorterError::HardwareFault(_) => 5,
            SorterError::Config(_) => 3,
            SorterError::State(_) => 6,
        };
    }
    1
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;
    use sorter_core::error::SorterError;

    let reason = match err.downcast_ref::<SorterError>() {
        Some(SorterError::Stopped) => "Stopped",
        Some(SorterError::Timeout) => "Timeout",
        Some(SorterError::Hardware(_)) => "Hardware",
        Some(SorterError::HardwareFault(_)) => "HardwareFault",
        Some(SorterError::Config(_)) => "Config",
        Some(SorterError::State(_)) => "State",
        None => "Error",
    };
    json!({ "reason": reason, "message": humanize(err) }).to_string()
}
