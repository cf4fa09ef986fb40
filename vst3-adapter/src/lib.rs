//! # vst3-adapter
//!
//! Host-side adapter for VST3 plugins. It drives a plugin through its
//! lifecycle (load, instantiate, negotiate buses, activate, process, close)
//! and maps a host's flat planar channel buffers onto the plugin's
//! bus-structured channel layout, padding with silence where the two
//! disagree.
//!
//! ## Quick Start
//!
//! ```no_run
//! use vst3_adapter::prelude::*;
//!
//! # fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let adapter = Vst3Adapter::builder()
//!     .sample_rate(48000.0)
//!     .block_size(256)
//!     .build()?;
//!
//! let mut plugin = adapter.open_plugin("Gain")?;
//! let mut inputs = SampleBuffer::new(2, 256);
//! let mut outputs = SampleBuffer::new(2, 256);
//! plugin.process(&mut inputs, &mut outputs);
//!
//! let latency = plugin.get_setting(PluginSetting::InitialDelay);
//! println!("latency: {} samples", latency);
//! plugin.close();
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod audio;
pub mod bus;
pub mod component;
pub mod discovery;
pub mod error;
pub mod host;
pub mod lifecycle;
pub mod loader;
pub mod mapping;
pub mod plugin;
pub mod settings;

mod internal;

pub use audio::{AudioConfig, SampleBuffer};
pub use bus::{BusDescriptor, BusDirection, MediaType};
pub use component::{
    AudioProcessor, BusBuffers, ClassInfo, Component, HostContext, PluginFactory, ProcessData,
    ProcessMode, ProcessSetup, ResultCode, SampleSize,
};
pub use discovery::{PluginLocator, StandardLocator};
pub use error::{ConfigurationWarning, Error, Result};
pub use host::{HostConfig, Vst3Adapter, Vst3AdapterBuilder};
pub use lifecycle::{PluginHandle, PluginState, PluginType};
pub use loader::{LibraryLoader, NativeLoader, PluginLibrary};
pub use mapping::{BusBinding, BusMapper, SilentChannelPool};
pub use plugin::Plugin;
pub use settings::{PluginSetting, DEFAULT_CHANNEL_COUNT};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        audio::{AudioConfig, SampleBuffer},
        error::{ConfigurationWarning, Error, Result},
        host::{HostConfig, Vst3Adapter, Vst3AdapterBuilder},
        lifecycle::{PluginState, PluginType},
        plugin::Plugin,
        settings::PluginSetting,
    };
}
