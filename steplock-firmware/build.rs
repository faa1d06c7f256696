//! Build script for steplock-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates lock.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Keys accepted in each section, with their inclusive integer range
/// (`None` for non-integer keys)
const STEPPER_KEYS: &[(&str, Option<(i64, i64)>)] = &[
    ("full_travel_steps", Some((1, u32::MAX as i64))),
    ("full_travel_time_ms", Some((1, u32::MAX as i64))),
    ("open_direction", None),
    ("enable_inverted", None),
];

const ENCODER_KEYS: &[(&str, Option<(i64, i64)>)] = &[
    ("sample_interval_us", Some((1, u32::MAX as i64))),
    ("min_ticks", Some((1, u32::MAX as i64))),
];

const SEQUENCE_KEYS: &[(&str, Option<(i64, i64)>)] = &[
    ("startup_delay_ms", Some((0, u32::MAX as i64))),
    ("hold_open_ms", Some((0, u32::MAX as i64))),
    ("max_attempts", Some((1, u8::MAX as i64))),
];

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths and scripts
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate lock.toml at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=lock.toml");

    let config_path = Path::new("lock.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: lock.toml not found!                                     ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a lock.toml calibration file.             ║\n\
            ║  Please create one in the steplock-firmware directory.           ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read lock.toml                                 ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in lock.toml                         ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();

    validate_sections(&config, &mut errors);
    validate_section(&config, "stepper", STEPPER_KEYS, &mut errors);
    validate_section(&config, "encoder", ENCODER_KEYS, &mut errors);
    validate_section(&config, "sequence", SEQUENCE_KEYS, &mut errors);
    validate_stepper(&config, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid lock.toml calibration                            ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=lock.toml validated successfully");
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Only tables for known sections are allowed at the top level
fn validate_sections(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(root) = config.as_table() else {
        return;
    };

    for (name, value) in root {
        if !["stepper", "encoder", "sequence"].contains(&name.as_str()) {
            errors.push(format!("unknown section or key '{}'", name));
        } else if !value.is_table() {
            errors.push(format!("[{}] must be a table", name));
        }
    }
}

/// Check keys and integer ranges of one section
///
/// Missing sections and keys are fine: the firmware falls back to the
/// built-in defaults for them.
fn validate_section(
    config: &toml::Value,
    section: &str,
    keys: &[(&str, Option<(i64, i64)>)],
    errors: &mut Vec<String>,
) {
    let table = match config.get(section) {
        Some(toml::Value::Table(t)) => t,
        _ => return,
    };

    for (key, value) in table {
        let Some((_, range)) = keys.iter().find(|(name, _)| name == key) else {
            errors.push(format!("[{}] unknown key '{}'", section, key));
            continue;
        };

        if let Some((min, max)) = range {
            match value.as_integer() {
                Some(n) if n < *min || n > *max => {
                    errors.push(format!("[{}] {} must be {}-{}", section, key, min, max));
                }
                Some(_) => {}
                None => errors.push(format!("[{}] {} must be an integer", section, key)),
            }
        }
    }
}

/// Check the stepper values that are not plain integers, and the derived
/// step timing
fn validate_stepper(config: &toml::Value, errors: &mut Vec<String>) {
    let stepper = match config.get("stepper") {
        Some(toml::Value::Table(t)) => t,
        _ => return,
    };

    if let Some(dir) = stepper.get("open_direction") {
        match dir.as_str() {
            Some("cw") | Some("ccw") => {}
            _ => errors.push("[stepper] open_direction must be 'cw' or 'ccw'".to_string()),
        }
    }

    if let Some(inverted) = stepper.get("enable_inverted") {
        if !inverted.is_bool() {
            errors.push("[stepper] enable_inverted must be true or false".to_string());
        }
    }

    // Per-step delay must land in 1..=u32::MAX nanoseconds
    let steps = stepper
        .get("full_travel_steps")
        .and_then(toml::Value::as_integer)
        .unwrap_or(4800);
    let time_ms = stepper
        .get("full_travel_time_ms")
        .and_then(toml::Value::as_integer)
        .unwrap_or(6000);
    if steps > 0 && time_ms > 0 {
        let delay_ns = time_ms as i128 * 1_000_000 / steps as i128;
        if delay_ns == 0 {
            errors.push("[stepper] full_travel_time_ms too short for the step count".to_string());
        } else if delay_ns > u32::MAX as i128 {
            errors.push("[stepper] full_travel_time_ms too long for the step count".to_string());
        }
    }
}
