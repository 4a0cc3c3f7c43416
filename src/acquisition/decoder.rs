// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the iron-plotter project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Sample decoder
//!
//! Turns one raw line received from the iron controller into a validated,
//! timestamped [`Sample`]. The controller emits newline-terminated ASCII lines
//! of exactly five comma separated integers:
//!
//! ```text
//! tip_temp_c,handle_temp_x10,power_x10,pwm_duty,tip_raw_uv
//! ```
//!
//! The handle temperature and the power are transmitted multiplied by ten and
//! are decoded with floating point division (`650` becomes `65.0`, `123`
//! becomes `12.3`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use thiserror::Error;

/// Number of comma separated fields in a device line
pub const FIELD_COUNT: usize = 5;

/// Scale applied by the firmware to the handle temperature and the power
const FIXED_POINT_SCALE: f64 = 10.0;

/// One decoded device reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Receipt time, assigned by the decoder (the device sends no clock)
    pub timestamp: DateTime<Utc>,
    /// Tip temperature in °C
    pub tip_temp_c: i32,
    /// Handle temperature in °C
    pub handle_temp_c: f64,
    /// Heater power in W
    pub power_w: f64,
    /// PWM duty cycle, nominally in [0, 255]; not clamped
    pub pwm_duty: i32,
    /// Raw thermocouple reading in µV
    pub tip_raw_uv: i32,
}

/// Why a line was rejected
#[derive(Debug, Error)]
pub enum MalformedCause {
    #[error("line is not ASCII")]
    NonAscii,

    #[error("expected {expected} fields, got {0}", expected = FIELD_COUNT)]
    FieldCount(usize),

    #[error("field {index} ({field:?}) is not an integer: {source}")]
    InvalidInteger {
        index: usize,
        field: String,
        #[source]
        source: ParseIntError,
    },
}

/// Decoder failure, carrying the offending bytes
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed sample {}: {cause}", RawLine(.raw))]
    MalformedSample { raw: Vec<u8>, cause: MalformedCause },
}

impl DecodeError {
    fn malformed(raw: &[u8], cause: MalformedCause) -> Self {
        DecodeError::MalformedSample {
            raw: raw.to_vec(),
            cause,
        }
    }

    /// The raw line that failed to decode
    pub fn raw(&self) -> &[u8] {
        match self {
            DecodeError::MalformedSample { raw, .. } => raw,
        }
    }

    /// The underlying cause
    pub fn cause(&self) -> &MalformedCause {
        match self {
            DecodeError::MalformedSample { cause, .. } => cause,
        }
    }
}

/// Raw bytes rendered as an escaped byte string literal
struct RawLine<'a>(&'a [u8]);

impl fmt::Display for RawLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b\"{}\"", self.0.escape_ascii())
    }
}

/// Decode a raw device line, stamping it with the current time
pub fn decode(raw_line: &[u8]) -> Result<Sample, DecodeError> {
    decode_at(raw_line, Utc::now())
}

/// Decode a raw device line with an explicit receipt time
///
/// Either all five fields parse or the whole line is rejected.
pub fn decode_at(raw_line: &[u8], timestamp: DateTime<Utc>) -> Result<Sample, DecodeError> {
    let line = match std::str::from_utf8(raw_line) {
        Ok(line) if line.is_ascii() => line,
        _ => return Err(DecodeError::malformed(raw_line, MalformedCause::NonAscii)),
    };

    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != FIELD_COUNT {
        return Err(DecodeError::malformed(
            raw_line,
            MalformedCause::FieldCount(fields.len()),
        ));
    }

    let mut values = [0i32; FIELD_COUNT];
    for (index, (field, slot)) in fields.iter().zip(values.iter_mut()).enumerate() {
        *slot = field.trim().parse::<i32>().map_err(|source| {
            DecodeError::malformed(
                raw_line,
                MalformedCause::InvalidInteger {
                    index,
                    field: field.trim().to_string(),
                    source,
                },
            )
        })?;
    }

    let [tip, handle_x10, power_x10, pwm, tip_raw_uv] = values;
    Ok(Sample {
        timestamp,
        tip_temp_c: tip,
        handle_temp_c: f64::from(handle_x10) / FIXED_POINT_SCALE,
        power_w: f64::from(power_x10) / FIXED_POINT_SCALE,
        pwm_duty: pwm,
        tip_raw_uv,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn epoch() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_decode_reference_line() {
        let sample = decode_at(b"230,650,120,128,15000\n", epoch()).unwrap();

        assert_eq!(
            sample,
            Sample {
                timestamp: epoch(),
                tip_temp_c: 230,
                handle_temp_c: 65.0,
                power_w: 12.0,
                pwm_duty: 128,
                tip_raw_uv: 15000,
            }
        );
    }

    #[test]
    fn test_fixed_point_uses_float_division() {
        let sample = decode_at(b"25,123,-5,0,0", epoch()).unwrap();
        assert_relative_eq!(sample.handle_temp_c, 12.3);
        assert_relative_eq!(sample.power_w, -0.5);
    }

    #[test]
    fn test_crlf_and_padding_are_tolerated() {
        let sample = decode_at(b" 300 , 251,  40,255,18000\r\n", epoch()).unwrap();
        assert_eq!(sample.tip_temp_c, 300);
        assert_relative_eq!(sample.handle_temp_c, 25.1);
        assert_eq!(sample.pwm_duty, 255);
        assert_eq!(sample.tip_raw_uv, 18000);
    }

    #[test]
    fn test_pwm_out_of_range_is_kept() {
        let sample = decode_at(b"1,1,1,300,1", epoch()).unwrap();
        assert_eq!(sample.pwm_duty, 300);
    }

    #[test]
    fn test_wrong_field_count_is_rejected() {
        for line in [
            &b"230,650,120,128\n"[..],
            b"230,650,120,128,15000,7\n",
            b"\n",
            b"",
        ] {
            let err = decode_at(line, epoch()).unwrap_err();
            assert!(
                matches!(err.cause(), MalformedCause::FieldCount(_)),
                "unexpected cause for {:?}: {}",
                line,
                err
            );
            assert_eq!(err.raw(), line);
        }
    }

    #[test]
    fn test_non_integer_field_rejects_whole_line() {
        let err = decode_at(b"230,65.0,120,128,15000\n", epoch()).unwrap_err();
        match err.cause() {
            MalformedCause::InvalidInteger { index, field, .. } => {
                assert_eq!(*index, 1);
                assert_eq!(field, "65.0");
            }
            other => panic!("unexpected cause: {other}"),
        }
    }

    #[test]
    fn test_non_ascii_is_rejected() {
        let err = decode_at(b"230,650,120,128,15\xff00\n", epoch()).unwrap_err();
        assert!(matches!(err.cause(), MalformedCause::NonAscii));
    }

    #[test]
    fn test_valid_utf8_outside_ascii_is_rejected() {
        let err = decode_at("230,65°,120,128,15000\n".as_bytes(), epoch()).unwrap_err();
        assert!(matches!(err.cause(), MalformedCause::NonAscii));
    }

    #[test]
    fn test_error_message_contains_raw_bytes() {
        let err = decode_at(b"garbage\n", epoch()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("garbage\\n"), "{message}");
        assert!(message.contains("expected 5 fields, got 1"), "{message}");
    }
}
