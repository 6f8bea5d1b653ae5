//! Configuration overrides in a small TOML subset
//!
//! This is a minimal parser for overriding fields of a built
//! [`Configuration`], mainly to fill in a custom chemistry. It does NOT
//! support the full TOML spec.
//!
//! Supported features:
//! - Key = value pairs (float, integer, hex integer, string)
//! - [section] headers
//! - One-line arrays of floats: points = [4.2, 4.1, ...]
//! - Comments (# ...)
//!
//! Example:
//! ```toml
//! chemistry = "custom"
//!
//! [voltage]
//! cell_ov_limit = 3.65
//! cell_ov_reset = 3.45
//! ```

use super::chemistry::CellChemistry;
use super::ocv::{OcvCurve, OCV_POINTS};
use super::types::Configuration;
use crate::protection::ErrorFlags;

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Key not valid in its section
    UnknownKey,
    /// Line is not `key = value`, or value has the wrong type
    InvalidValue,
    /// Current limits given but the configuration has no current block
    NoCurrentMonitoring,
    /// OCV array does not have exactly `OCV_POINTS` values
    OcvLength,
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Voltage,
    Balancing,
    Current,
    Temperature,
    IdealDiode,
    Ocv,
}

/// Apply overrides to a configuration
///
/// Returns the number of keys applied. On error the configuration keeps
/// every override applied before the failing line.
pub fn apply_overrides(conf: &mut Configuration, input: &str) -> Result<usize, ParseError> {
    let mut section = Section::Root;
    let mut applied = 0;

    for line in input.lines() {
        let line = strip_comment(line).trim();

        if line.is_empty() {
            continue;
        }

        if let Some(header) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            section = parse_section_header(header)?;
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(ParseError::InvalidValue)?;
        apply_value(conf, section, key, value)?;
        applied += 1;
    }

    Ok(applied)
}

fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    match header.trim() {
        "voltage" => Ok(Section::Voltage),
        "balancing" => Ok(Section::Balancing),
        "current" => Ok(Section::Current),
        "temperature" => Ok(Section::Temperature),
        "ideal_diode" => Ok(Section::IdealDiode),
        "ocv" => Ok(Section::Ocv),
        _ => Err(ParseError::InvalidSection),
    }
}

/// Remove a trailing comment unless the `#` is inside a string
fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) if line[..pos].matches('"').count() % 2 == 0 => &line[..pos],
        _ => line,
    }
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let value = value.trim();

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

fn apply_value(
    conf: &mut Configuration,
    section: Section,
    key: &str,
    value: &str,
) -> Result<(), ParseError> {
    match section {
        Section::Root => match key {
            "chemistry" => conf.select_chemistry(parse_chemistry(value)?),
            "alert_mask" => conf.alert_mask = ErrorFlags::from_bits_truncate(parse_u32(value)?),
            _ => return Err(ParseError::UnknownKey),
        },
        Section::Voltage => {
            let v = &mut conf.voltage;
            match key {
                "cell_ov_limit" => v.cell_ov_limit = parse_f32(value)?,
                "cell_ov_reset" => v.cell_ov_reset = parse_f32(value)?,
                "cell_chg_voltage_limit" => v.cell_chg_voltage_limit = parse_f32(value)?,
                "cell_uv_limit" => v.cell_uv_limit = parse_f32(value)?,
                "cell_uv_reset" => v.cell_uv_reset = parse_f32(value)?,
                "cell_dis_voltage_limit" => v.cell_dis_voltage_limit = parse_f32(value)?,
                "cell_ov_delay_ms" => v.cell_ov_delay_ms = parse_u32(value)?,
                "cell_uv_delay_ms" => v.cell_uv_delay_ms = parse_u32(value)?,
                _ => return Err(ParseError::UnknownKey),
            }
        }
        Section::Balancing => {
            let b = &mut conf.balancing;
            match key {
                "cell_voltage_min" => b.cell_voltage_min = parse_f32(value)?,
                "idle_current" => b.idle_current = parse_f32(value)?,
                "idle_delay_s" => b.idle_delay_s = parse_u32(value)?,
                "cell_voltage_diff" => b.cell_voltage_diff = parse_f32(value)?,
                _ => return Err(ParseError::UnknownKey),
            }
        }
        Section::Current => {
            let c = conf
                .current
                .as_mut()
                .ok_or(ParseError::NoCurrentMonitoring)?;
            match key {
                "dis_oc_limit" => c.dis_oc_limit = parse_f32(value)?,
                "dis_oc_delay_ms" => c.dis_oc_delay_ms = parse_u32(value)?,
                "chg_oc_limit" => c.chg_oc_limit = parse_f32(value)?,
                "chg_oc_delay_ms" => c.chg_oc_delay_ms = parse_u32(value)?,
                "dis_sc_limit" => c.dis_sc_limit = parse_f32(value)?,
                "dis_sc_delay_us" => c.dis_sc_delay_us = parse_u32(value)?,
                _ => return Err(ParseError::UnknownKey),
            }
        }
        Section::Temperature => {
            let t = &mut conf.temperature;
            match key {
                "dis_ut_limit" => t.dis_ut_limit = parse_f32(value)?,
                "dis_ot_limit" => t.dis_ot_limit = parse_f32(value)?,
                "chg_ut_limit" => t.chg_ut_limit = parse_f32(value)?,
                "chg_ot_limit" => t.chg_ot_limit = parse_f32(value)?,
                "hysteresis" => t.hysteresis = parse_f32(value)?,
                _ => return Err(ParseError::UnknownKey),
            }
        }
        Section::IdealDiode => match key {
            "on_current" => conf.ideal_diode.on_current = parse_f32(value)?,
            "off_current" => conf.ideal_diode.off_current = parse_f32(value)?,
            _ => return Err(ParseError::UnknownKey),
        },
        Section::Ocv => match key {
            "points" => conf.ocv = OcvCurve::from_ocv(parse_ocv_points(value)?),
            _ => return Err(ParseError::UnknownKey),
        },
    }

    Ok(())
}

/// Parse a string value (removes quotes)
fn parse_string(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

fn parse_f32(value: &str) -> Result<f32, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidValue)
}

/// Parse a decimal or `0x` hex integer
fn parse_u32(value: &str) -> Result<u32, ParseError> {
    let value = strip_underscores(value);
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => value.parse(),
    }
    .map_err(|_| ParseError::InvalidValue)
}

fn parse_chemistry(value: &str) -> Result<CellChemistry, ParseError> {
    match parse_string(value) {
        "lfp" | "LFP" => Ok(CellChemistry::Lfp),
        "nmc" | "NMC" => Ok(CellChemistry::Nmc),
        "lto" | "LTO" => Ok(CellChemistry::Lto),
        "custom" | "CUSTOM" => Ok(CellChemistry::Custom),
        _ => Err(ParseError::InvalidValue),
    }
}

/// Parse an array like "[4.2, 4.1, 4.0]" with exactly `OCV_POINTS` values
fn parse_ocv_points(value: &str) -> Result<[f32; OCV_POINTS], ParseError> {
    let inner = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .ok_or(ParseError::InvalidValue)?;

    let mut points = [0.0; OCV_POINTS];
    let mut count = 0;

    // A trailing comma leaves an empty last item
    for item in inner.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let slot = points.get_mut(count).ok_or(ParseError::OcvLength)?;
        *slot = parse_f32(item)?;
        count += 1;
    }

    if count != OCV_POINTS {
        return Err(ParseError::OcvLength);
    }

    Ok(points)
}

/// Drop `_` digit separators
fn strip_underscores(value: &str) -> heapless::String<16> {
    let mut out = heapless::String::new();
    for c in value.chars().filter(|&c| c != '_') {
        // Overlong values come back empty and fail to parse
        if out.push(c).is_err() {
            out.clear();
            break;
        }
    }
    out
}
