//! Periodic sensor-to-node synchronisation.
//!
//! Every tick reads all channels once, in a fixed order, and republishes each
//! value. A failing channel never stops the others: a read failure marks the
//! channel's node not connected, a publish failure is logged and left for
//! the next tick.

use crate::address_space::{AddressSpace, NodeId};
use crate::publisher::{PublishError, VariablePublisher};
use crate::sensors::{Channel, ReadError, SensorChannelReader};
use crate::server::RepeatedJob;
use log::{info, warn};
use std::fmt::Write as _;

/// Name the job is registered under.
pub const JOB_NAME: &str = "sensor-sync";

/// What happened to one channel during a tick.
#[derive(Debug)]
pub enum ChannelOutcome {
    /// Value read and published with Good status.
    Published(i32),
    /// Reading failed; the node was marked not connected.
    Unavailable(ReadError),
    /// Value read but the node write failed.
    PublishFailed { value: i32, error: PublishError },
}

/// Result of one tick, in channel order.
#[derive(Debug)]
pub struct CycleReport {
    pub outcomes: Vec<(Channel, ChannelOutcome)>,
}

impl CycleReport {
    pub fn outcome(&self, channel: Channel) -> Option<&ChannelOutcome> {
        self.outcomes
            .iter()
            .find(|(c, _)| *c == channel)
            .map(|(_, outcome)| outcome)
    }

    /// The value read for `channel` this tick, published or not.
    pub fn value(&self, channel: Channel) -> Option<i32> {
        match self.outcome(channel)? {
            ChannelOutcome::Published(value) => Some(*value),
            ChannelOutcome::PublishFailed { value, .. } => Some(*value),
            ChannelOutcome::Unavailable(_) => None,
        }
    }

    pub fn published_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| matches!(outcome, ChannelOutcome::Published(_)))
            .count()
    }

    /// One-line aggregate, e.g. `temperature=21 humidity=40 co2=n/a switch=1`.
    pub fn summary(&self) -> String {
        let mut line = String::new();
        for (channel, _) in &self.outcomes {
            if !line.is_empty() {
                line.push(' ');
            }
            match self.value(*channel) {
                Some(value) => {
                    let _ = write!(line, "{}={}", channel.name(), value);
                }
                None => {
                    let _ = write!(line, "{}=n/a", channel.name());
                }
            }
        }
        line
    }
}

/// Reads every channel and republishes it on each tick.
pub struct PeriodicSyncJob {
    reader: Box<dyn SensorChannelReader>,
    publisher: VariablePublisher,
    channels: Vec<(Channel, NodeId)>,
}

impl PeriodicSyncJob {
    /// `channels` maps each channel to its variable, in publishing order.
    pub fn new(reader: Box<dyn SensorChannelReader>, channels: Vec<(Channel, NodeId)>) -> Self {
        Self {
            reader,
            publisher: VariablePublisher,
            channels,
        }
    }

    pub fn tick(&mut self, space: &mut dyn AddressSpace) -> CycleReport {
        let mut outcomes = Vec::with_capacity(self.channels.len());

        for (channel, node_id) in &self.channels {
            let outcome = match self.reader.read(*channel) {
                Ok(value) => match self.publisher.publish(space, node_id, value) {
                    Ok(()) => ChannelOutcome::Published(value),
                    Err(error) => {
                        warn!("[Sync] {}: {}", channel.name(), error);
                        ChannelOutcome::PublishFailed { value, error }
                    }
                },
                Err(error) => {
                    warn!("[Sync] {} unavailable: {}", channel.name(), error);
                    if let Err(e) = self.publisher.invalidate(space, node_id) {
                        warn!("[Sync] {}: {}", channel.name(), e);
                    }
                    ChannelOutcome::Unavailable(error)
                }
            };
            outcomes.push((*channel, outcome));
        }
        self.reader.end_cycle();

        let report = CycleReport { outcomes };
        info!("[Sync] Sensor cycle: {}", report.summary());
        report
    }
}

impl RepeatedJob for PeriodicSyncJob {
    fn name(&self) -> &str {
        JOB_NAME
    }

    fn run(&mut self, space: &mut dyn AddressSpace) {
        self.tick(space);
    }
}
