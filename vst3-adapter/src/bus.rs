//! Bus metadata and bus negotiation helpers

use crate::component::Component;
use crate::error::ConfigurationWarning;
use std::fmt;

/// Media kind carried by a bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    /// Audio samples
    Audio,
    /// Events (notes, MIDI-like data)
    Event,
}

impl MediaType {
    /// Raw protocol value
    pub fn as_raw(self) -> i32 {
        match self {
            MediaType::Audio => 0,
            MediaType::Event => 1,
        }
    }
}

/// Direction of a bus as seen from the plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BusDirection {
    /// Data flowing into the plugin
    Input,
    /// Data produced by the plugin
    Output,
}

impl BusDirection {
    /// Raw protocol value
    pub fn as_raw(self) -> i32 {
        match self {
            BusDirection::Input => 0,
            BusDirection::Output => 1,
        }
    }
}

impl fmt::Display for BusDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusDirection::Input => f.write_str("input"),
            BusDirection::Output => f.write_str("output"),
        }
    }
}

/// Metadata for one bus, as reported by the plugin.
///
/// Never cached: callers query the component whenever they need it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusDescriptor {
    /// Media kind
    pub media: MediaType,
    /// Direction
    pub direction: BusDirection,
    /// Declared channel count
    pub channel_count: i32,
    /// Display name
    pub name: String,
    /// Whether this is a main bus (as opposed to aux/sidechain)
    pub is_main: bool,
}

/// Result of negotiating the audio buses of one direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusSummary {
    /// Number of buses the plugin reported
    pub bus_count: i32,
    /// Sum of declared channels over buses whose info could be read
    pub channel_count: i32,
}

/// Enumerate and activate every audio bus of `direction`.
///
/// Failures are pushed onto `warnings`; they never abort negotiation.
pub(crate) fn activate_audio_buses(
    component: &mut dyn Component,
    direction: BusDirection,
    warnings: &mut Vec<ConfigurationWarning>,
) -> BusSummary {
    let bus_count = component.bus_count(MediaType::Audio, direction).max(0);
    let mut channel_count = 0;

    for index in 0..bus_count {
        let Some(info) = component.bus_info(MediaType::Audio, direction, index) else {
            log::warn!("Could not get bus info for {} bus {}", direction, index);
            warnings.push(ConfigurationWarning::BusInfoUnavailable { direction, index });
            continue;
        };

        channel_count += info.channel_count.max(0);
        log::debug!(
            "{} bus {} '{}': {} channel(s){}",
            direction,
            index,
            info.name,
            info.channel_count,
            if info.is_main { " (main)" } else { "" }
        );

        let code = component.activate_bus(MediaType::Audio, direction, index, true);
        if !code.is_ok() {
            log::warn!("Could not activate {} bus {}: {}", direction, index, code);
            warnings.push(ConfigurationWarning::BusActivationFailed {
                direction,
                index,
                code,
            });
        }
    }

    BusSummary {
        bus_count,
        channel_count,
    }
}

/// Sum of declared audio channels over all readable buses of `direction`
pub(crate) fn audio_channel_count(component: &dyn Component, direction: BusDirection) -> i32 {
    (0..component.bus_count(MediaType::Audio, direction).max(0))
        .filter_map(|index| component.bus_info(MediaType::Audio, direction, index))
        .map(|info| info.channel_count.max(0))
        .sum()
}
