//! Sample types
//!
//! A [`Sample`] is what an inlet yields. A [`StreamSample`] is what the
//! push API hands to a consumer: the sample plus a borrow of the descriptor
//! of the stream it came from.

use super::info::{StreamId, StreamInfo};

/// One channel value
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelValue {
    Float(f32),
    Double(f64),
    Int(i32),
    Long(i64),
    String(String),
}

impl ChannelValue {
    /// Numeric value, if any
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ChannelValue::Float(v) => Some(*v as f64),
            ChannelValue::Double(v) => Some(*v),
            ChannelValue::Int(v) => Some(*v as f64),
            ChannelValue::Long(v) => Some(*v as f64),
            ChannelValue::String(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ChannelValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f32> for ChannelValue {
    fn from(v: f32) -> Self {
        ChannelValue::Float(v)
    }
}

impl From<f64> for ChannelValue {
    fn from(v: f64) -> Self {
        ChannelValue::Double(v)
    }
}

impl From<i32> for ChannelValue {
    fn from(v: i32) -> Self {
        ChannelValue::Int(v)
    }
}

impl From<i64> for ChannelValue {
    fn from(v: i64) -> Self {
        ChannelValue::Long(v)
    }
}

impl From<String> for ChannelValue {
    fn from(v: String) -> Self {
        ChannelValue::String(v)
    }
}

impl From<&str> for ChannelValue {
    fn from(v: &str) -> Self {
        ChannelValue::String(v.to_string())
    }
}

/// A buffered sample pulled from an inlet
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// One value per channel
    pub values: Vec<ChannelValue>,
    /// Capture timestamp in seconds (substrate clock)
    pub timestamp: f64,
}

impl Sample {
    pub fn new(values: Vec<ChannelValue>, timestamp: f64) -> Self {
        Self { values, timestamp }
    }

    /// Build a sample from anything convertible to channel values
    pub fn from_values<V: Into<ChannelValue>>(
        values: impl IntoIterator<Item = V>,
        timestamp: f64,
    ) -> Self {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            timestamp,
        }
    }
}

/// A delivered sample tagged with its stream's metadata
///
/// Carries the fixed tuple handed to consumers:
/// (sample, timestamp, name, type, host, identity, nominal rate, format label).
#[derive(Debug, Clone)]
pub struct StreamSample<'a> {
    pub sample: Sample,
    pub info: &'a StreamInfo,
}

impl<'a> StreamSample<'a> {
    pub fn values(&self) -> &[ChannelValue] {
        &self.sample.values
    }

    pub fn timestamp(&self) -> f64 {
        self.sample.timestamp
    }

    pub fn name(&self) -> &'a str {
        self.info.name()
    }

    pub fn stream_type(&self) -> &'a str {
        self.info.stream_type()
    }

    pub fn host(&self) -> &'a str {
        self.info.host()
    }

    pub fn uid(&self) -> &'a StreamId {
        self.info.uid()
    }

    pub fn nominal_srate(&self) -> f64 {
        self.info.srate()
    }

    pub fn format_label(&self) -> &'static str {
        self.info.format_label()
    }
}
