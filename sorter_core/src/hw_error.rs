//! Maps `Box<dyn Error>` from trait boundaries to typed `SorterError`.
//!
//! The traits in `sorter_traits` use `Box<dyn Error + Send + Sync>` for
//! maximum flexibility; this module converts those to our typed error enum,
//! with an optional feature-gated path for `sorter_hardware::HwError`
//! downcasting.

use crate::error::SorterError;

/// Map a trait-boundary error to a typed `SorterError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> SorterError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<sorter_hardware::error::HwError>() {
            return match hw {
                sorter_hardware::error::HwError::Timeout => SorterError::Timeout,
                other => SorterError::HardwareFault(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        SorterError::Timeout
    } else {
        SorterError::Hardware(s)
    }
}

#[cfg(test)]
mod tests {
    use super::map_hw_error;
    use crate::error::SorterError;

    #[test]
    fn string_timeout_maps_to_timeout() {
        let e: Box<dyn std::error::Error + Send + Sync> = "sensor timeout".into();
        assert!(matches!(map_hw_error(&*e), SorterError::Timeout));
    }

    #[test]
    fn other_errors_map_to_hardware() {
        let e: Box<dyn std::error::Error + Send + Sync> = "bus stuck low".into();
        match map_hw_error(&*e) {
            SorterError::Hardware(s) => assert!(s.contains("bus")),
            other => panic!("unexpected mapping: {other:?}"),
        }
    }

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn hw_error_downcast_is_precise() {
        let e: Box<dyn std::error::Error + Send + Sync> =
            Box::new(sorter_hardware::error::HwError::DriveFault("phase A".into()));
        assert!(matches!(
            map_hw_error(&*e),
            SorterError::HardwareFault(_)
        ));
    }
}
