//! Wire-level value types and payload decoding
//!
//! The engine delivers every data payload as an untyped byte buffer. Each
//! registry entry carries a [`WireType`] that says how to reinterpret it:
//! numeric slots are fixed-width little-endian values, string slots are
//! fixed-capacity buffers padded with trailing NULs.

use crate::error::{Error, Result};
use std::fmt;

/// Typed wire slot shapes supported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireType {
    Int32,
    Int64,
    Float32,
    Float64,
    String8,
    String32,
    String64,
    String128,
    String256,
}

impl WireType {
    /// Fixed payload width in bytes for this slot shape
    pub fn payload_len(self) -> usize {
        match self {
            WireType::Int32 => 4,
            WireType::Int64 => 8,
            WireType::Float32 => 4,
            WireType::Float64 => 8,
            WireType::String8 => 8,
            WireType::String32 => 32,
            WireType::String64 => 64,
            WireType::String128 => 128,
            WireType::String256 => 256,
        }
    }

    /// Whether this slot carries a fixed-capacity string buffer
    pub fn is_string(self) -> bool {
        matches!(
            self,
            WireType::String8
                | WireType::String32
                | WireType::String64
                | WireType::String128
                | WireType::String256
        )
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WireType::Int32 => "INT32",
            WireType::Int64 => "INT64",
            WireType::Float32 => "FLOAT32",
            WireType::Float64 => "FLOAT64",
            WireType::String8 => "STRING8",
            WireType::String32 => "STRING32",
            WireType::String64 => "STRING64",
            WireType::String128 => "STRING128",
            WireType::String256 => "STRING256",
        };
        f.write_str(name)
    }
}

/// Decoded telemetry value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Float(f64),
    Int(i64),
    Text(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Float(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Text(v) => f.write_str(v),
        }
    }
}

/// Decode a raw payload according to its wire type.
///
/// Numeric slots are read little-endian. String slots are cut at the first
/// NUL byte; the remainder of the fixed buffer is padding. Narrower floats
/// and ints widen to `f64`/`i64`.
pub fn decode(wire_type: WireType, payload: &[u8]) -> Result<Value> {
    let expected = wire_type.payload_len();
    if payload.len() < expected {
        return Err(Error::Decode(format!(
            "{} payload too short: {} bytes, expected {}",
            wire_type,
            payload.len(),
            expected
        )));
    }

    let value = match wire_type {
        WireType::Int32 => {
            let raw: [u8; 4] = payload[..4].try_into().unwrap();
            Value::Int(i32::from_le_bytes(raw) as i64)
        }
        WireType::Int64 => {
            let raw: [u8; 8] = payload[..8].try_into().unwrap();
            Value::Int(i64::from_le_bytes(raw))
        }
        WireType::Float32 => {
            let raw: [u8; 4] = payload[..4].try_into().unwrap();
            Value::Float(f32::from_le_bytes(raw) as f64)
        }
        WireType::Float64 => {
            let raw: [u8; 8] = payload[..8].try_into().unwrap();
            Value::Float(f64::from_le_bytes(raw))
        }
        _ => {
            let buffer = &payload[..expected];
            let end = buffer.iter().position(|&b| b == 0).unwrap_or(expected);
            let text = std::str::from_utf8(&buffer[..end])
                .map_err(|e| Error::Decode(format!("{wire_type} payload is not UTF-8: {e}")))?;
            Value::Text(text.to_string())
        }
    };

    Ok(value)
}
