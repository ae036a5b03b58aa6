//! Stream identity and descriptor

use std::fmt;
use std::sync::Arc;

use super::format::ChannelFormat;

/// Resolver-assigned identity of one live stream
///
/// Unique among currently discovered streams. A restarted source gets a new
/// identity, so two ids are never related across restarts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamId(Arc<str>);

impl StreamId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StreamId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Descriptor of a discovered stream
///
/// Immutable once obtained from the discovery substrate.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamInfo {
    uid: StreamId,
    name: String,
    stream_type: String,
    hostname: String,
    source_id: String,
    nominal_srate: f64,
    channel_count: u32,
    channel_format: ChannelFormat,
}

impl StreamInfo {
    /// Create a descriptor with one float32 channel and irregular rate
    pub fn new(
        uid: impl Into<StreamId>,
        name: impl Into<String>,
        stream_type: impl Into<String>,
    ) -> Self {
        Self {
            uid: uid.into(),
            name: name.into(),
            stream_type: stream_type.into(),
            hostname: "localhost".to_string(),
            source_id: String::new(),
            nominal_srate: 0.0,
            channel_count: 1,
            channel_format: ChannelFormat::Float32,
        }
    }

    /// Set the source host
    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    /// Set the publisher-chosen source id
    pub fn source_id(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = source_id.into();
        self
    }

    /// Set the nominal sample rate (0 = irregular)
    pub fn nominal_srate(mut self, srate: f64) -> Self {
        self.nominal_srate = srate;
        self
    }

    /// Set the number of channels
    pub fn channel_count(mut self, count: u32) -> Self {
        self.channel_count = count;
        self
    }

    /// Set the channel format
    pub fn channel_format(mut self, format: ChannelFormat) -> Self {
        self.channel_format = format;
        self
    }

    /// Replace the identity, keeping every other field
    pub fn with_uid(mut self, uid: impl Into<StreamId>) -> Self {
        self.uid = uid.into();
        self
    }

    pub fn uid(&self) -> &StreamId {
        &self.uid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stream_type(&self) -> &str {
        &self.stream_type
    }

    pub fn host(&self) -> &str {
        &self.hostname
    }

    pub fn source(&self) -> &str {
        &self.source_id
    }

    pub fn srate(&self) -> f64 {
        self.nominal_srate
    }

    pub fn channels(&self) -> u32 {
        self.channel_count
    }

    pub fn format(&self) -> ChannelFormat {
        self.channel_format
    }

    /// Display label of the channel format
    pub fn format_label(&self) -> &'static str {
        self.channel_format.label()
    }
}

impl fmt::Display for StreamInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) on {} [{}]",
            self.name, self.stream_type, self.hostname, self.uid
        )
    }
}
