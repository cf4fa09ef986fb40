//! Error types for the vst3-adapter library

use crate::bus::BusDirection;
use crate::component::ResultCode;
use thiserror::Error;

/// Main error type for vst3-adapter operations
#[derive(Error, Debug)]
pub enum Error {
    /// No plugin bundle could be resolved for the requested name
    #[error("Plugin not found: {0}")]
    NotFound(String),

    /// The plugin library could not be mapped into memory
    #[error("Failed to load plugin library: {0}")]
    LoadError(String),

    /// The library does not expose a usable plugin factory
    #[error("Plugin factory unavailable: {0}")]
    FactoryError(String),

    /// The factory failed to create a component instance
    #[error("Failed to create component '{class}': {code}")]
    InstantiationError {
        /// Name of the class that was instantiated
        class: String,
        /// Result code reported by the factory
        code: ResultCode,
    },

    /// The component rejected initialization
    #[error("Component rejected initialization: {0}")]
    InitError(ResultCode),

    /// A single process call failed inside the plugin
    #[error("Plugin processing failed: {0}")]
    ProcessingFailure(ResultCode),

    /// The plugin has no audio buses in at least one direction
    #[error("No usable buses ({inputs} input, {outputs} output)")]
    NoUsableBuses {
        /// Recorded input bus count
        inputs: i32,
        /// Recorded output bus count
        outputs: i32,
    },

    /// The plugin did not advertise the audio processing capability
    #[error("Plugin has no audio processor")]
    ProcessorUnavailable,

    /// The plugin has not completed activation
    #[error("Plugin is not active")]
    NotActive,

    /// Host input does not cover the requested block
    #[error("Input block of {input} samples is shorter than output block of {output} samples")]
    BlockSizeMismatch {
        /// Input block size
        input: usize,
        /// Output block size
        output: usize,
    },

    /// Host block exceeds the maximum block size negotiated at open
    #[error("Block of {block} samples exceeds the configured maximum of {max}")]
    BlockTooLarge {
        /// Samples in the host block
        block: usize,
        /// Maximum block size passed to the processor setup
        max: usize,
    },

    /// Invalid host buffer layout
    #[error("Invalid sample buffer: {0}")]
    InvalidBuffer(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration could not be parsed
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// IO error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error aborts the open sequence.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_)
                | Error::LoadError(_)
                | Error::FactoryError(_)
                | Error::InstantiationError { .. }
                | Error::InitError(_)
        )
    }
}

/// Non-fatal problems met while opening a plugin.
///
/// These are logged and absorbed; the plugin stays usable, possibly as a
/// pass-through.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationWarning {
    /// No class was categorized as an audio module, the first class was used
    #[error("No Audio Module Class found, using first class '{0}'")]
    FallbackClass(String),

    /// The component does not implement the audio processor interface
    #[error("Plugin does not support the audio processor interface")]
    NoAudioProcessor,

    /// Bus metadata could not be read
    #[error("Could not get bus info for {direction} bus {index}")]
    BusInfoUnavailable {
        /// Bus direction
        direction: BusDirection,
        /// Bus index
        index: i32,
    },

    /// A bus refused activation
    #[error("Could not activate {direction} bus {index}: {code}")]
    BusActivationFailed {
        /// Bus direction
        direction: BusDirection,
        /// Bus index
        index: i32,
        /// Result code reported by the component
        code: ResultCode,
    },

    /// Processing parameters were rejected
    #[error("Could not set up audio processing: {0}")]
    ProcessingSetupFailed(ResultCode),

    /// The component refused activation
    #[error("Could not activate component: {0}")]
    ComponentActivationFailed(ResultCode),

    /// The processor refused to enter the processing state
    #[error("Could not start processing: {0}")]
    StartProcessingFailed(ResultCode),
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, Error>;
