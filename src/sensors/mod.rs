//! Sensor channel inputs.
//!
//! A [`SensorChannelReader`] returns the latest integer an external source
//! holds for a [`Channel`]. Two readers exist: [`FileChannelReader`] for the
//! radio-to-host bridge files and [`SimulatedChannelReader`] for running
//! without hardware. Which one is used is a configuration choice.

pub mod file_reader;
pub mod simulated;

pub use file_reader::FileChannelReader;
pub use simulated::SimulatedChannelReader;

use crate::address_space::NodeId;
use crate::config::{SensorConfig, SensorSource};
use std::path::PathBuf;
use strum::{EnumIter, IntoStaticStr};
use thiserror::Error;

/// A named sensor input routed into a published variable.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Channel {
    Temperature,
    Humidity,
    Co2,
    Switch,
}

impl Channel {
    /// All channels in publishing order.
    pub const ALL: [Channel; 4] = [
        Channel::Temperature,
        Channel::Humidity,
        Channel::Co2,
        Channel::Switch,
    ];

    pub fn name(self) -> &'static str {
        self.into()
    }

    /// String identifier of the channel's variable, e.g. `eo.temperature`.
    pub fn node_key(self) -> String {
        format!("eo.{}", self.name())
    }

    pub fn node_id(self, namespace: u16) -> NodeId {
        NodeId::string(namespace, self.node_key())
    }

    /// Browse and display name of the channel's variable, e.g. `eo_temperature`.
    pub fn label(self) -> String {
        format!("eo_{}", self.name())
    }

    /// File the bridge writes this channel's reading to.
    pub fn file_name(self) -> &'static str {
        match self {
            Channel::Temperature => "temp.txt",
            Channel::Humidity => "humi.txt",
            Channel::Co2 => "co2.txt",
            Channel::Switch => "switch.txt",
        }
    }
}

/// Why a channel could not be read this cycle.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("sensor file {} missing", path.display())]
    Missing { path: PathBuf },

    #[error("failed to read sensor file {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("sensor file {} holds no integer: {content:?}", path.display())]
    Malformed { path: PathBuf, content: String },
}

/// Source of the latest reading per channel.
///
/// Readers are driven from the server's run loop, one cycle at a time: every
/// channel is read once, then [`end_cycle`](Self::end_cycle) is called.
pub trait SensorChannelReader: Send {
    /// Latest value for `channel`. Must not block for long.
    fn read(&mut self, channel: Channel) -> Result<i32, ReadError>;

    /// Called after all channels of a cycle have been read.
    fn end_cycle(&mut self) {}
}

/// Build the reader selected by `config`.
pub fn reader_from_config(config: &SensorConfig) -> Box<dyn SensorChannelReader> {
    match config.source {
        SensorSource::File => Box::new(FileChannelReader::new(config.bridge_dir.clone())),
        SensorSource::Simulated => Box::new(SimulatedChannelReader::default()),
    }
}
