//! Minimal TOML parser for lock calibration
//!
//! Handles only the subset needed for `lock.toml`. It does NOT support the
//! full TOML grammar and needs neither `std` nor an allocator.
//!
//! Supported features:
//! - `[stepper]`, `[encoder]` and `[sequence]` section headers
//! - Key = value pairs (integer, boolean, string)
//! - Comments (# ...), including trailing comments
//!
//! Keys that are absent keep their [`LockConfig::default`] value. The parsed
//! configuration is validated before it is returned.

use super::types::{ConfigError, LockConfig};
use crate::traits::Direction;

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Stepper,
    Encoder,
    Sequence,
}

/// Parse `lock.toml` contents into a validated [`LockConfig`]
pub fn parse_config(input: &str) -> Result<LockConfig, ConfigError> {
    let mut config = LockConfig::default();
    let mut section = Section::Root;

    for line in input.lines() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') {
            section = parse_section_header(line)?;
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(ConfigError::InvalidValue)?;
        apply_value(section, key, value, &mut config)?;
    }

    config.validate()?;
    Ok(config)
}

/// Parse a section header line like `[stepper]` (trailing comment allowed)
fn parse_section_header(line: &str) -> Result<Section, ConfigError> {
    let line = strip_comment(line);
    let name = line
        .strip_prefix('[')
        .and_then(|l| l.strip_suffix(']'))
        .ok_or(ConfigError::InvalidSection)?;

    match name.trim() {
        "stepper" => Ok(Section::Stepper),
        "encoder" => Ok(Section::Encoder),
        "sequence" => Ok(Section::Sequence),
        _ => Err(ConfigError::InvalidSection),
    }
}

/// Remove a trailing comment that is not inside a string
fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(hash_pos) if line[..hash_pos].matches('"').count() % 2 == 0 => line[..hash_pos].trim(),
        _ => line,
    }
}

/// Split `key = value`, dropping trailing comments
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = strip_comment(line[eq_pos + 1..].trim());

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

fn parse_string(value: &str) -> Result<&str, ConfigError> {
    if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
        Ok(&value[1..value.len() - 1])
    } else {
        // Allow unquoted strings for simple values
        Ok(value)
    }
}

fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ConfigError> {
    // TOML allows '_' as a digit separator
    let mut digits = [0u8; 20];
    let mut len = 0;
    for b in value.bytes().filter(|b| *b != b'_') {
        *digits.get_mut(len).ok_or(ConfigError::InvalidValue)? = b;
        len += 1;
    }

    core::str::from_utf8(&digits[..len])
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(ConfigError::InvalidValue)
}

fn parse_bool(value: &str) -> Result<bool, ConfigError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ConfigError::InvalidValue),
    }
}

fn parse_direction(value: &str) -> Result<Direction, ConfigError> {
    match parse_string(value)? {
        "cw" => Ok(Direction::Clockwise),
        "ccw" => Ok(Direction::CounterClockwise),
        _ => Err(ConfigError::InvalidValue),
    }
}

/// Apply one key/value pair to the config being built
fn apply_value(
    section: Section,
    key: &str,
    value: &str,
    config: &mut LockConfig,
) -> Result<(), ConfigError> {
    match section {
        Section::Root => return Err(ConfigError::UnknownKey),
        Section::Stepper => {
            let s = &mut config.stepper;
            match key {
                "full_travel_steps" => s.full_travel_steps = parse_int(value)?,
                "full_travel_time_ms" => s.full_travel_time_ms = parse_int(value)?,
                "open_direction" => s.open_direction = parse_direction(value)?,
                "enable_inverted" => s.enable_inverted = parse_bool(value)?,
                _ => return Err(ConfigError::UnknownKey),
            }
        }
        Section::Encoder => {
            let e = &mut config.encoder;
            match key {
                "sample_interval_us" => e.sample_interval_us = parse_int(value)?,
                "min_ticks" => e.min_ticks = parse_int(value)?,
                _ => return Err(ConfigError::UnknownKey),
            }
        }
        Section::Sequence => {
            let q = &mut config.sequence;
            match key {
                "startup_delay_ms" => q.startup_delay_ms = parse_int(value)?,
                "hold_open_ms" => q.hold_open_ms = parse_int(value)?,
                "max_attempts" => q.max_attempts = parse_int(value)?,
                _ => return Err(ConfigError::UnknownKey),
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
# Bolt lock on the workshop door
[stepper]
full_travel_steps = 3_200   # two turns
full_travel_time_ms = 4000
open_direction = "ccw"
enable_inverted = false

[encoder]
sample_interval_us = 500
min_ticks = 40

[sequence]
max_attempts = 3
"#;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(SAMPLE).unwrap();

        assert_eq!(config.stepper.full_travel_steps, 3200);
        assert_eq!(config.stepper.full_travel_time_ms, 4000);
        assert_eq!(config.stepper.open_direction, Direction::CounterClockwise);
        assert!(!config.stepper.enable_inverted);
        assert_eq!(config.encoder.sample_interval_us, 500);
        assert_eq!(config.encoder.min_ticks, 40);
        assert_eq!(config.sequence.max_attempts, 3);
        // Untouched keys keep their defaults
        assert_eq!(config.sequence.hold_open_ms, 5000);
    }

    #[test]
    fn test_empty_input_is_default() {
        assert_eq!(parse_config("").unwrap(), LockConfig::default());
        assert_eq!(parse_config("# nothing\n\n").unwrap(), LockConfig::default());
    }

    #[test]
    fn test_parse_section_header() {
        assert_eq!(parse_section_header("[stepper]"), Ok(Section::Stepper));
        assert_eq!(parse_section_header("[ encoder ] # sampling"), Ok(Section::Encoder));
        assert_eq!(parse_section_header("[sequence]"), Ok(Section::Sequence));
        assert_eq!(parse_section_header("[heater]"), Err(ConfigError::InvalidSection));
        assert_eq!(parse_section_header("[stepper"), Err(ConfigError::InvalidSection));
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(parse_key_value("min_ticks = 50"), Some(("min_ticks", "50")));
        assert_eq!(
            parse_key_value("open_direction = \"cw\" # default"),
            Some(("open_direction", "\"cw\""))
        );
        assert_eq!(parse_key_value("min_ticks ="), None);
        assert_eq!(parse_key_value("min_ticks"), None);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let input = "[encoder]\nthreshold = 50\n";
        assert_eq!(parse_config(input), Err(ConfigError::UnknownKey));

        let input = "min_ticks = 50\n";
        assert_eq!(parse_config(input), Err(ConfigError::UnknownKey));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert_eq!(
            parse_config("[encoder]\nmin_ticks = -5\n"),
            Err(ConfigError::InvalidValue)
        );
        assert_eq!(
            parse_config("[stepper]\nopen_direction = \"up\"\n"),
            Err(ConfigError::InvalidValue)
        );
        assert_eq!(
            parse_config("[stepper]\nenable_inverted = yes\n"),
            Err(ConfigError::InvalidValue)
        );
        assert_eq!(
            parse_config("[sequence]\nmax_attempts = 300\n"),
            Err(ConfigError::InvalidValue)
        );
    }

    #[test]
    fn test_parsed_config_is_validated() {
        let input = "[stepper]\nfull_travel_steps = 0\n";
        assert_eq!(parse_config(input), Err(ConfigError::ZeroTravelSteps));

        let input = "[encoder]\nmin_ticks = 0\n";
        assert_eq!(parse_config(input), Err(ConfigError::ZeroMinTicks));
    }
}
