//! Channel format codes
//!
//! Transport-level format codes:
//! ```text
//! 0 - undefined
//! 1 - float32
//! 2 - double64
//! 3 - string
//! 4 - int32
//! 5 - int16
//! 6 - int8
//! 7 - int64
//! ```
//!
//! Any other code maps to [`ChannelFormat::Unknown`]; the mapping never fails.

use std::fmt;

const CODE_UNDEFINED: i32 = 0;
const CODE_FLOAT32: i32 = 1;
const CODE_DOUBLE64: i32 = 2;
const CODE_STRING: i32 = 3;
const CODE_INT32: i32 = 4;
const CODE_INT16: i32 = 5;
const CODE_INT8: i32 = 6;
const CODE_INT64: i32 = 7;

/// Sample format of every channel in a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelFormat {
    #[default]
    Float32,
    Double64,
    String,
    Int32,
    Int16,
    Int8,
    Int64,
    Undefined,
    /// Code outside the known set (the raw code is kept)
    Unknown(i32),
}

impl ChannelFormat {
    /// Map a transport format code to a format
    pub fn from_code(code: i32) -> Self {
        match code {
            CODE_FLOAT32 => ChannelFormat::Float32,
            CODE_DOUBLE64 => ChannelFormat::Double64,
            CODE_STRING => ChannelFormat::String,
            CODE_INT32 => ChannelFormat::Int32,
            CODE_INT16 => ChannelFormat::Int16,
            CODE_INT8 => ChannelFormat::Int8,
            CODE_INT64 => ChannelFormat::Int64,
            CODE_UNDEFINED => ChannelFormat::Undefined,
            other => ChannelFormat::Unknown(other),
        }
    }

    /// Transport format code
    pub fn code(&self) -> i32 {
        match self {
            ChannelFormat::Float32 => CODE_FLOAT32,
            ChannelFormat::Double64 => CODE_DOUBLE64,
            ChannelFormat::String => CODE_STRING,
            ChannelFormat::Int32 => CODE_INT32,
            ChannelFormat::Int16 => CODE_INT16,
            ChannelFormat::Int8 => CODE_INT8,
            ChannelFormat::Int64 => CODE_INT64,
            ChannelFormat::Undefined => CODE_UNDEFINED,
            ChannelFormat::Unknown(code) => *code,
        }
    }

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            ChannelFormat::Float32 => "float32",
            ChannelFormat::Double64 => "double64",
            ChannelFormat::String => "string",
            ChannelFormat::Int32 => "int32",
            ChannelFormat::Int16 => "int16",
            ChannelFormat::Int8 => "int8",
            ChannelFormat::Int64 => "int64",
            ChannelFormat::Undefined => "undefined",
            ChannelFormat::Unknown(_) => "unknown",
        }
    }
}

impl fmt::Display for ChannelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        assert_eq!(ChannelFormat::from_code(1).label(), "float32");
        assert_eq!(ChannelFormat::from_code(2).label(), "double64");
        assert_eq!(ChannelFormat::from_code(3).label(), "string");
        assert_eq!(ChannelFormat::from_code(4).label(), "int32");
        assert_eq!(ChannelFormat::from_code(5).label(), "int16");
        assert_eq!(ChannelFormat::from_code(6).label(), "int8");
        assert_eq!(ChannelFormat::from_code(7).label(), "int64");
        assert_eq!(ChannelFormat::from_code(0).label(), "undefined");
    }

    #[test]
    fn test_mapping_is_total() {
        for code in [-1, 8, 42, i32::MIN, i32::MAX] {
            let format = ChannelFormat::from_code(code);
            assert_eq!(format, ChannelFormat::Unknown(code));
            assert_eq!(format.label(), "unknown");
            assert_eq!(format.code(), code);
        }
    }

    #[test]
    fn test_code_roundtrip_for_known_set() {
        for code in 0..=7 {
            assert_eq!(ChannelFormat::from_code(code).code(), code);
        }
    }
}
