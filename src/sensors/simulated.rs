//! Stand-in reader for running without a bridge.
//!
//! Each channel reports a fixed base value plus an offset that grows by one
//! every completed cycle, so published values visibly move.

use super::{Channel, ReadError, SensorChannelReader};

/// Synthetic readings: `base(channel) + cycles completed`.
#[derive(Debug, Clone, Default)]
pub struct SimulatedChannelReader {
    offset: i32,
}

impl SimulatedChannelReader {
    pub fn base(channel: Channel) -> i32 {
        match channel {
            Channel::Temperature => 28,
            Channel::Humidity => 55,
            Channel::Co2 => 400,
            Channel::Switch => 0,
        }
    }

    pub fn offset(&self) -> i32 {
        self.offset
    }
}

impl SensorChannelReader for SimulatedChannelReader {
    fn read(&mut self, channel: Channel) -> Result<i32, ReadError> {
        Ok(Self::base(channel).wrapping_add(self.offset))
    }

    fn end_cycle(&mut self) {
        self.offset = self.offset.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_cycle_reports_base_values() {
        let mut reader = SimulatedChannelReader::default();
        assert_eq!(reader.read(Channel::Temperature).unwrap(), 28);
        assert_eq!(reader.read(Channel::Humidity).unwrap(), 55);
        assert_eq!(reader.read(Channel::Co2).unwrap(), 400);
        assert_eq!(reader.read(Channel::Switch).unwrap(), 0);
    }

    #[test]
    fn test_offset_advances_per_cycle_only() {
        let mut reader = SimulatedChannelReader::default();
        assert_eq!(reader.read(Channel::Temperature).unwrap(), 28);
        assert_eq!(reader.read(Channel::Temperature).unwrap(), 28);
        reader.end_cycle();
        reader.end_cycle();
        assert_eq!(reader.offset(), 2);
        assert_eq!(reader.read(Channel::Temperature).unwrap(), 30);
    }
}
