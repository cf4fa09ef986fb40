//! Plugin settings queries

use crate::bus;
use crate::bus::BusDirection;
use crate::lifecycle::PluginHandle;

/// Channel count reported when a plugin declares none
pub const DEFAULT_CHANNEL_COUNT: i32 = 2;

/// Settings a host can query from an open plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginSetting {
    /// Total input channels across all audio input buses
    NumInputs,
    /// Total output channels across all audio output buses
    NumOutputs,
    /// Processing latency in samples
    InitialDelay,
    /// Tail length in milliseconds
    TailTimeMs,
}

impl PluginHandle {
    /// Answer a settings query.
    ///
    /// Never fails: a closed handle reports stereo in and out with no delay
    /// or tail.
    pub fn get_setting(&self, setting: PluginSetting) -> i32 {
        match setting {
            PluginSetting::NumInputs => self.channel_count(BusDirection::Input),
            PluginSetting::NumOutputs => self.channel_count(BusDirection::Output),
            PluginSetting::InitialDelay => self
                .processor()
                .map_or(0, |processor| saturate(processor.latency_samples() as u64)),
            PluginSetting::TailTimeMs => {
                let sample_rate = self.config().sample_rate;
                match self.processor() {
                    Some(processor) if sample_rate > 0.0 => {
                        let millis = processor.tail_samples() as f64 * 1000.0 / sample_rate;
                        saturate(millis.round() as u64)
                    }
                    _ => 0,
                }
            }
        }
    }

    fn channel_count(&self, direction: BusDirection) -> i32 {
        let channels = self
            .component()
            .map_or(0, |component| bus::audio_channel_count(component, direction));
        if channels > 0 {
            channels
        } else {
            DEFAULT_CHANNEL_COUNT
        }
    }
}

fn saturate(value: u64) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
