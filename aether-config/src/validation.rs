//! Custom validation functions for configuration.

use aether_core::time::DurationSpec;
use validator::ValidationError;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate that a unit configuration adds up to a strictly positive duration.
pub fn validate_positive_duration(spec: &DurationSpec) -> Result<(), ValidationError> {
    match spec.checked_to_duration() {
        None => Err(ValidationError::new("duration_out_of_range")),
        Some(duration) if duration.as_flickers() > 0 => Ok(()),
        Some(_) => Err(ValidationError::new("duration_must_be_positive")),
    }
}

/// Validate a tracing level name.
pub fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    if LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_log_level"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_duration() {
        let one_breath = DurationSpec {
            breaths: 1,
            ..Default::default()
        };
        assert!(validate_positive_duration(&one_breath).is_ok());
        assert!(validate_positive_duration(&DurationSpec::default()).is_err());

        let net_negative = DurationSpec {
            breaths: 1,
            flickers: -61,
            ..Default::default()
        };
        assert!(validate_positive_duration(&net_negative).is_err());
    }

    #[test]
    fn overflowing_duration() {
        let huge = DurationSpec {
            chronicles: 99_999_999_999,
            ..Default::default()
        };
        let err = validate_positive_duration(&huge).unwrap_err();
        assert_eq!(err.code, "duration_out_of_range");
    }

    #[test]
    fn log_levels() {
        assert!(validate_log_level("info").is_ok());
        assert!(validate_log_level("DEBUG").is_ok());
        assert!(validate_log_level("verbose").is_err());
    }
}
