//! The wrapped plugin component interface.
//!
//! These traits mirror the calls the adapter makes into a plugin binary, in
//! the order it makes them: enumerate classes, create and initialize a
//! component, query its processor, negotiate buses, configure and activate,
//! then process blocks. The VST3 implementation lives in `internal`; tests
//! provide scripted implementations.

use crate::bus::{BusDescriptor, BusDirection, MediaType};
use std::fmt;

/// Category string of the primary audio-processing class
pub const AUDIO_MODULE_CLASS: &str = "Audio Module Class";

/// Status code returned by plugin calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResultCode(pub i32);

impl ResultCode {
    /// Success
    pub const OK: Self = Self(0);
    /// Call completed but the answer is "no"
    pub const FALSE: Self = Self(1);
    /// An argument was rejected
    pub const INVALID_ARGUMENT: Self = Self(2);
    /// The call is not implemented
    pub const NOT_IMPLEMENTED: Self = Self(3);
    /// The plugin failed internally
    pub const INTERNAL_ERROR: Self = Self(4);

    /// Whether the call succeeded
    pub fn is_ok(self) -> bool {
        self == Self::OK
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Metadata for one class advertised by a factory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassInfo {
    /// Class identifier
    pub cid: [u8; 16],
    /// Display name
    pub name: String,
    /// Category, e.g. "Audio Module Class"
    pub category: String,
    /// Instance cardinality
    pub cardinality: i32,
}

impl ClassInfo {
    /// Whether this is the primary audio-processing class
    pub fn is_audio_module(&self) -> bool {
        self.category == AUDIO_MODULE_CLASS
    }
}

/// Host context handed to a component during initialization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostContext {
    /// Host name reported to the plugin
    pub name: String,
}

impl Default for HostContext {
    fn default() -> Self {
        Self {
            name: "vst3-adapter".to_string(),
        }
    }
}

/// Processing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessMode {
    /// Real-time processing
    Realtime,
    /// Prefetch processing
    Prefetch,
    /// Offline rendering
    Offline,
}

impl ProcessMode {
    /// Raw protocol value
    pub fn as_raw(self) -> i32 {
        match self {
            ProcessMode::Realtime => 0,
            ProcessMode::Prefetch => 1,
            ProcessMode::Offline => 2,
        }
    }
}

/// Sample representation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleSize {
    /// 32-bit float samples
    Float32,
    /// 64-bit float samples
    Float64,
}

impl SampleSize {
    /// Raw protocol value
    pub fn as_raw(self) -> i32 {
        match self {
            SampleSize::Float32 => 0,
            SampleSize::Float64 => 1,
        }
    }
}

/// Processing parameters negotiated before activation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessSetup {
    /// Processing mode
    pub mode: ProcessMode,
    /// Sample representation
    pub sample_size: SampleSize,
    /// Largest block the host will pass
    pub max_samples_per_block: i32,
    /// Sample rate in Hz
    pub sample_rate: f64,
}

/// Channel pointers for one bus during a single process call.
///
/// Every declared channel has a valid, non-null pointer to at least
/// `num_samples` samples. Several channels may share the same scratch buffer.
#[derive(Debug, Clone, Copy)]
pub struct BusBuffers {
    /// Number of channels in this bus
    pub num_channels: i32,
    /// Bit `n` set means channel `n` is known to be silent
    pub silence_flags: u64,
    /// Array of `num_channels` channel pointers, null for an empty bus
    pub channel_buffers: *mut *mut f32,
}

impl BusBuffers {
    /// A bus with no channels
    pub fn empty() -> Self {
        Self {
            num_channels: 0,
            silence_flags: 0,
            channel_buffers: std::ptr::null_mut(),
        }
    }

    /// Channel pointer array of this bus.
    ///
    /// # Safety
    /// Only valid inside the process call that received these buffers.
    pub unsafe fn channel_ptrs(&self) -> &[*mut f32] {
        if self.channel_buffers.is_null() || self.num_channels <= 0 {
            return &[];
        }
        // SAFETY: the mapper hands out `num_channels` initialized pointers.
        unsafe { std::slice::from_raw_parts(self.channel_buffers, self.num_channels as usize) }
    }

    /// Read one channel.
    ///
    /// # Safety
    /// Only valid inside the process call, with `len` at most the block size,
    /// and while no mutable slice of an aliasing channel is alive.
    pub unsafe fn channel(&self, index: usize, len: usize) -> &[f32] {
        // SAFETY: upheld by the caller.
        unsafe { std::slice::from_raw_parts(self.channel_ptrs()[index], len) }
    }

    /// Write one channel.
    ///
    /// # Safety
    /// Same as [`BusBuffers::channel`]; channels may alias the same scratch
    /// buffer, so at most one returned slice may be alive at a time.
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn channel_mut(&self, index: usize, len: usize) -> &mut [f32] {
        // SAFETY: upheld by the caller.
        unsafe { std::slice::from_raw_parts_mut(self.channel_ptrs()[index], len) }
    }
}

/// Bus-structured buffers for one block
#[derive(Debug)]
pub struct ProcessData<'a> {
    /// Samples per channel in this block
    pub num_samples: i32,
    /// Input buses, in bus index order
    pub inputs: &'a mut [BusBuffers],
    /// Output buses, in bus index order
    pub outputs: &'a mut [BusBuffers],
}

/// A plugin factory exported by a loaded library
pub trait PluginFactory {
    /// Number of classes advertised
    fn class_count(&self) -> i32;

    /// Metadata for the class at `index`
    fn class_info(&self, index: i32) -> Option<ClassInfo>;

    /// Create a component instance of `class`
    fn create_component(&self, class: &ClassInfo)
        -> std::result::Result<Box<dyn Component>, ResultCode>;
}

/// A plugin component instance.
///
/// Dropping the box releases the instance.
pub trait Component {
    /// Initialize with the given host context
    fn initialize(&mut self, context: &HostContext) -> ResultCode;

    /// The audio processing capability, if the plugin has one
    fn audio_processor(&mut self) -> Option<Box<dyn AudioProcessor>>;

    /// Number of buses of a media kind and direction
    fn bus_count(&self, media: MediaType, direction: BusDirection) -> i32;

    /// Metadata of one bus
    fn bus_info(&self, media: MediaType, direction: BusDirection, index: i32)
        -> Option<BusDescriptor>;

    /// Activate or deactivate one bus
    fn activate_bus(
        &mut self,
        media: MediaType,
        direction: BusDirection,
        index: i32,
        active: bool,
    ) -> ResultCode;

    /// Activate or deactivate the component
    fn set_active(&mut self, active: bool) -> ResultCode;

    /// Terminate the component; the instance is released afterwards
    fn terminate(&mut self) -> ResultCode;
}

/// The audio processing capability of a component.
///
/// Dropping the box releases the capability handle.
pub trait AudioProcessor {
    /// Configure processing parameters
    fn setup_processing(&mut self, setup: &ProcessSetup) -> ResultCode;

    /// Enter or leave the processing state
    fn set_processing(&mut self, processing: bool) -> ResultCode;

    /// Process exactly one block
    fn process(&mut self, data: &mut ProcessData<'_>) -> ResultCode;

    /// Reported latency in samples
    fn latency_samples(&self) -> u32;

    /// Reported tail length in samples
    fn tail_samples(&self) -> u32;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_code_display_is_hex() {
        assert_eq!(ResultCode::INTERNAL_ERROR.to_string(), "0x4");
        assert!(ResultCode::OK.is_ok());
        assert!(!ResultCode::FALSE.is_ok());
    }

    #[test]
    fn audio_module_category_matches_exactly() {
        let mut info = ClassInfo {
            cid: [0; 16],
            name: "Gain".to_string(),
            category: AUDIO_MODULE_CLASS.to_string(),
            cardinality: 0x7FFF_FFFF,
        };
        assert!(info.is_audio_module());

        info.category = "Component Controller Class".to_string();
        assert!(!info.is_audio_module());
    }

    #[test]
    fn empty_bus_has_no_channels() {
        let bus = BusBuffers::empty();
        assert_eq!(bus.num_channels, 0);
        assert!(unsafe { bus.channel_ptrs() }.is_empty());
    }
}
