//! OSC 1.0 message encoder
//!
//! Packet layout:
//! ```text
//! address      OSC-string   "/EEG/BioSemi\0..." padded to 4 bytes
//! type tags    OSC-string   ",ffd\0..."         padded to 4 bytes
//! arguments    per tag:
//!   f  float32  big-endian
//!   d  float64  big-endian
//!   i  int32    big-endian
//!   h  int64    big-endian
//!   s  OSC-string
//! ```
//! An OSC-string is the UTF-8 bytes, at least one NUL, then NULs up to the
//! next multiple of four.

use bytes::{BufMut, Bytes, BytesMut};

use crate::stream::{ChannelValue, StreamSample};

/// One OSC argument
#[derive(Debug, Clone, PartialEq)]
pub enum OscArg {
    Float(f32),
    Double(f64),
    Int(i32),
    Long(i64),
    String(String),
}

impl OscArg {
    /// Type tag character
    pub fn tag(&self) -> u8 {
        match self {
            OscArg::Float(_) => b'f',
            OscArg::Double(_) => b'd',
            OscArg::Int(_) => b'i',
            OscArg::Long(_) => b'h',
            OscArg::String(_) => b's',
        }
    }
}

impl From<&ChannelValue> for OscArg {
    fn from(value: &ChannelValue) -> Self {
        match value {
            ChannelValue::Float(v) => OscArg::Float(*v),
            ChannelValue::Double(v) => OscArg::Double(*v),
            ChannelValue::Int(v) => OscArg::Int(*v),
            ChannelValue::Long(v) => OscArg::Long(*v),
            ChannelValue::String(v) => OscArg::String(v.clone()),
        }
    }
}

/// An addressed OSC message
#[derive(Debug, Clone, PartialEq)]
pub struct OscMessage {
    pub address: String,
    pub args: Vec<OscArg>,
}

impl OscMessage {
    pub fn new(address: impl Into<String>, args: Vec<OscArg>) -> Self {
        Self {
            address: address.into(),
            args,
        }
    }

    /// Message for a delivered sample: `/<type>/<name>` carrying the
    /// sample's value vector
    pub fn from_sample(sample: &StreamSample<'_>) -> Self {
        Self::new(
            format!("/{}/{}", sample.stream_type(), sample.name()),
            sample.values().iter().map(OscArg::from).collect(),
        )
    }

    /// Encode into a standalone packet
    pub fn encode(&self) -> Bytes {
        let mut encoder = OscEncoder::new();
        encoder.encode(self);
        encoder.finish()
    }
}

/// OSC encoder
pub struct OscEncoder {
    buf: BytesMut,
}

impl OscEncoder {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(128),
        }
    }

    /// Get the encoded bytes and reset the encoder
    pub fn finish(&mut self) -> Bytes {
        self.buf.split().freeze()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Encode one message
    pub fn encode(&mut self, message: &OscMessage) {
        self.put_string(message.address.as_bytes());

        let mut tags = Vec::with_capacity(message.args.len() + 1);
        tags.push(b',');
        tags.extend(message.args.iter().map(OscArg::tag));
        self.put_string(&tags);

        for arg in &message.args {
            match arg {
                OscArg::Float(v) => self.buf.put_f32(*v),
                OscArg::Double(v) => self.buf.put_f64(*v),
                OscArg::Int(v) => self.buf.put_i32(*v),
                OscArg::Long(v) => self.buf.put_i64(*v),
                OscArg::String(s) => self.put_string(s.as_bytes()),
            }
        }
    }

    fn put_string(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
        // 1 to 4 NULs
        let pad = 4 - bytes.len() % 4;
        self.buf.put_bytes(0, pad);
    }
}

impl Default for OscEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{Sample, StreamInfo};

    #[test]
    fn test_string_padding() {
        let mut encoder = OscEncoder::new();

        encoder.put_string(b"abc");
        assert_eq!(encoder.finish().as_ref(), b"abc\0");

        encoder.put_string(b"abcd");
        assert_eq!(encoder.finish().as_ref(), b"abcd\0\0\0\0");

        encoder.put_string(b"");
        assert_eq!(encoder.finish().as_ref(), b"\0\0\0\0");
    }

    #[test]
    fn test_no_args() {
        let bytes = OscMessage::new("/ping", vec![]).encode();

        assert_eq!(bytes.as_ref(), b"/ping\0\0\0,\0\0\0");
    }

    #[test]
    fn test_float_message() {
        let bytes = OscMessage::new("/EEG/A", vec![OscArg::Float(1.0)]).encode();

        let mut expected = Vec::new();
        expected.extend_from_slice(b"/EEG/A\0\0");
        expected.extend_from_slice(b",f\0\0");
        expected.extend_from_slice(&1.0f32.to_be_bytes());
        assert_eq!(bytes.as_ref(), expected.as_slice());
    }

    #[test]
    fn test_mixed_args() {
        let message = OscMessage::new(
            "/m",
            vec![
                OscArg::Int(-2),
                OscArg::Long(1 << 40),
                OscArg::Double(0.5),
                OscArg::String("hi".into()),
            ],
        );
        let bytes = message.encode();

        let mut expected = Vec::new();
        expected.extend_from_slice(b"/m\0\0");
        expected.extend_from_slice(b",ihds\0\0\0");
        expected.extend_from_slice(&(-2i32).to_be_bytes());
        expected.extend_from_slice(&(1i64 << 40).to_be_bytes());
        expected.extend_from_slice(&0.5f64.to_be_bytes());
        expected.extend_from_slice(b"hi\0\0");
        assert_eq!(bytes.as_ref(), expected.as_slice());
        assert_eq!(bytes.len() % 4, 0);
    }

    #[test]
    fn test_from_sample_address_and_payload() {
        let info = StreamInfo::new("A", "BioSemi", "EEG");
        let sample = StreamSample {
            sample: Sample::from_values([0.25f32, -1.0f32], 3.0),
            info: &info,
        };

        let message = OscMessage::from_sample(&sample);

        assert_eq!(message.address, "/EEG/BioSemi");
        assert_eq!(message.args, vec![OscArg::Float(0.25), OscArg::Float(-1.0)]);
    }

    #[test]
    fn test_encoder_reuse() {
        let mut encoder = OscEncoder::new();

        encoder.encode(&OscMessage::new("/a", vec![OscArg::Int(1)]));
        let first = encoder.finish();
        assert!(encoder.is_empty());

        encoder.encode(&OscMessage::new("/a", vec![OscArg::Int(1)]));
        assert_eq!(encoder.len(), first.len());
        assert_eq!(encoder.finish(), first);
    }
}
