//! Synthetic test sources
//!
//! Generates sine-wave streams on a [`MemoryNetwork`] so the bridge can be
//! run end-to-end without external producers.
//!
//! Description format: `TYPE:NAME[:CHANNELS[:RATE]]`, e.g. `EEG:BioSemi:8:256`.

use std::f64::consts::TAU;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::memory::MemoryNetwork;
use crate::stream::{ChannelFormat, Sample, StreamInfo};

const DEFAULT_CHANNELS: u32 = 1;
const DEFAULT_RATE: f64 = 10.0;

/// Frequency of the generated sine, in Hz
const SIGNAL_HZ: f64 = 1.0;

/// Longest sample period accepted: one sample per hour
const MAX_PERIOD: Duration = Duration::from_secs(3600);

/// Timer period for `rate`, if a timer can run at it
fn sample_period(rate: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(1.0 / rate)
        .ok()
        .filter(|period| !period.is_zero() && *period <= MAX_PERIOD)
}

/// Malformed source description
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpecError {
    /// TYPE or NAME missing or empty
    MissingField(&'static str),
    /// Channel count is not a positive integer
    InvalidChannels(String),
    /// Rate is not a positive number
    InvalidRate(String),
    /// More than four `:`-separated fields
    TooManyFields,
}

impl fmt::Display for SourceSpecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceSpecError::MissingField(field) => write!(f, "Missing source {}", field),
            SourceSpecError::InvalidChannels(v) => write!(f, "Invalid channel count: {}", v),
            SourceSpecError::InvalidRate(v) => write!(f, "Invalid sample rate: {}", v),
            SourceSpecError::TooManyFields => {
                write!(f, "Expected TYPE:NAME[:CHANNELS[:RATE]]")
            }
        }
    }
}

impl std::error::Error for SourceSpecError {}

/// A sine-wave stream producer
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticSource {
    pub stream_type: String,
    pub name: String,
    pub channels: u32,
    pub rate: f64,
}

impl SyntheticSource {
    /// Descriptor advertised for this source
    pub fn info(&self) -> StreamInfo {
        StreamInfo::new("", self.name.clone(), self.stream_type.clone())
            .hostname(hostname())
            .source_id(format!("synthetic-{}-{}", self.stream_type, self.name))
            .nominal_srate(self.rate)
            .channel_count(self.channels)
            .channel_format(ChannelFormat::Float32)
    }

    /// Advertise the stream and push samples at its nominal rate until the
    /// returned task is aborted
    ///
    /// Fails without advertising anything if the rate cannot be timed.
    pub fn spawn(self, network: &MemoryNetwork) -> Result<JoinHandle<()>, SourceSpecError> {
        let period = sample_period(self.rate)
            .ok_or_else(|| SourceSpecError::InvalidRate(self.rate.to_string()))?;
        let outlet = network.advertise(self.info());
        tracing::info!(
            stream = %outlet.uid(),
            name = %self.name,
            stream_type = %self.stream_type,
            rate = self.rate,
            "Synthetic source started"
        );

        Ok(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let start = Instant::now();

            loop {
                ticker.tick().await;
                let t = start.elapsed().as_secs_f64();
                outlet.push_sample(self.sample_at(t));
            }
        }))
    }

    fn sample_at(&self, t: f64) -> Sample {
        let values = (0..self.channels).map(|ch| {
            let phase = ch as f64 * TAU / self.channels as f64;
            (TAU * SIGNAL_HZ * t + phase).sin() as f32
        });
        Sample::from_values(values, t)
    }
}

impl FromStr for SyntheticSource {
    type Err = SourceSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');

        let stream_type = parts
            .next()
            .filter(|p| !p.is_empty())
            .ok_or(SourceSpecError::MissingField("type"))?;
        let name = parts
            .next()
            .filter(|p| !p.is_empty())
            .ok_or(SourceSpecError::MissingField("name"))?;

        let channels = match parts.next() {
            Some(v) => v
                .parse::<u32>()
                .ok()
                .filter(|c| *c > 0)
                .ok_or_else(|| SourceSpecError::InvalidChannels(v.to_string()))?,
            None => DEFAULT_CHANNELS,
        };

        let rate = match parts.next() {
            Some(v) => v
                .parse::<f64>()
                .ok()
                .filter(|r| sample_period(*r).is_some())
                .ok_or_else(|| SourceSpecError::InvalidRate(v.to_string()))?,
            None => DEFAULT_RATE,
        };

        if parts.next().is_some() {
            return Err(SourceSpecError::TooManyFields);
        }

        Ok(Self {
            stream_type: stream_type.to_string(),
            name: name.to_string(),
            channels,
            rate,
        })
    }
}

fn hostname() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::substrate::{Connector, Discovery, Inlet, MemoryConnector, MemoryResolver};

    #[test]
    fn test_parse_full() {
        let src: SyntheticSource = "EEG:BioSemi:8:256".parse().unwrap();
        assert_eq!(src.stream_type, "EEG");
        assert_eq!(src.name, "BioSemi");
        assert_eq!(src.channels, 8);
        assert_eq!(src.rate, 256.0);
    }

    #[test]
    fn test_parse_defaults() {
        let src: SyntheticSource = "HR:Polar".parse().unwrap();
        assert_eq!(src.channels, DEFAULT_CHANNELS);
        assert_eq!(src.rate, DEFAULT_RATE);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            "".parse::<SyntheticSource>(),
            Err(SourceSpecError::MissingField("type"))
        );
        assert_eq!(
            "EEG".parse::<SyntheticSource>(),
            Err(SourceSpecError::MissingField("name"))
        );
        assert!(matches!(
            "EEG:A:0".parse::<SyntheticSource>(),
            Err(SourceSpecError::InvalidChannels(_))
        ));
        assert!(matches!(
            "EEG:A:2:-1".parse::<SyntheticSource>(),
            Err(SourceSpecError::InvalidRate(_))
        ));
        assert_eq!(
            "EEG:A:2:10:x".parse::<SyntheticSource>(),
            Err(SourceSpecError::TooManyFields)
        );
    }

    #[test]
    fn test_parse_rejects_untimeable_rates() {
        for rate in ["1e12", "1e-30", "0.0001", "inf", "NaN", "0"] {
            let spec = format!("EEG:A:1:{}", rate);
            assert!(
                matches!(spec.parse::<SyntheticSource>(), Err(SourceSpecError::InvalidRate(_))),
                "accepted rate {}",
                rate
            );
        }

        let slow: SyntheticSource = "EEG:A:1:0.001".parse().unwrap();
        let period = sample_period(slow.rate).unwrap();
        assert!(period > Duration::from_secs(999) && period <= MAX_PERIOD);
    }

    #[tokio::test]
    async fn test_spawn_with_bad_rate_advertises_nothing() {
        let network = MemoryNetwork::new();
        let resolver = MemoryResolver::new(network.clone(), "").unwrap();

        let src = SyntheticSource {
            stream_type: "EEG".into(),
            name: "A".into(),
            channels: 1,
            rate: 1e12,
        };

        assert!(matches!(src.spawn(&network), Err(SourceSpecError::InvalidRate(_))));
        assert!(resolver.results().is_empty());
    }

    #[test]
    fn test_sample_has_one_value_per_channel() {
        let src: SyntheticSource = "EEG:A:4:100".parse().unwrap();
        let sample = src.sample_at(0.25);
        assert_eq!(sample.values.len(), 4);
        assert_eq!(sample.timestamp, 0.25);
        let first = sample.values[0].as_f64().unwrap();
        assert!((first - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_spawned_source_is_discoverable_and_streams() {
        let network = MemoryNetwork::new();
        let resolver = MemoryResolver::new(network.clone(), "type='EEG'").unwrap();
        let connector = MemoryConnector::new(network.clone());

        let src: SyntheticSource = "EEG:A:2:200".parse().unwrap();
        let task = src.spawn(&network).unwrap();

        let results = resolver.results();
        assert_eq!(results.len(), 1);
        let mut inlet = connector.open(&results[0]).unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        let sample = inlet.pull_sample().unwrap();
        assert!(sample.is_some());

        task.abort();
    }
}
