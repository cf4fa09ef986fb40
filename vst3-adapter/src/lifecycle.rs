//! Plugin lifecycle controller.
//!
//! Drives one plugin instance from a bundle path through library loading,
//! component creation, bus negotiation and activation, and releases every
//! acquired handle in reverse order on close.

use crate::audio::{AudioConfig, SampleBuffer};
use crate::bus::{self, BusDirection, MediaType};
use crate::component::{
    AudioProcessor, ClassInfo, Component, HostContext, PluginFactory, ProcessMode, ProcessSetup,
    SampleSize,
};
use crate::error::{ConfigurationWarning, Error, Result};
use crate::loader::{LibraryLoader, PluginLibrary};
use crate::mapping::BusMapper;
use std::path::Path;

/// Lifecycle states of a plugin instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginState {
    /// Nothing acquired yet
    Unopened,
    /// Library mapped into memory
    LibraryLoaded,
    /// Factory obtained from the library
    FactoryObtained,
    /// Component instance created
    ComponentCreated,
    /// Component accepted initialization
    Initialized,
    /// Audio buses enumerated and activated
    BusesActivated,
    /// Processing parameters accepted by the processor
    ProcessingConfigured,
    /// Ready for process calls
    Active,
    /// Releasing handles
    Closing,
    /// Everything released
    Closed,
}

/// Plugin classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginType {
    /// Not opened yet
    Unknown,
    /// Processes incoming audio
    Effect,
    /// Has an event input bus
    Instrument,
}

/// Owned handles and negotiated state of one loaded plugin
pub struct PluginHandle {
    state: PluginState,
    library: Option<Box<dyn PluginLibrary>>,
    factory: Option<Box<dyn PluginFactory>>,
    component: Option<Box<dyn Component>>,
    processor: Option<Box<dyn AudioProcessor>>,
    initialized: bool,
    component_active: bool,
    input_bus_count: i32,
    output_bus_count: i32,
    plugin_type: PluginType,
    class_info: Option<ClassInfo>,
    config: AudioConfig,
    host_context: HostContext,
    warnings: Vec<ConfigurationWarning>,
    mapper: BusMapper,
}

impl Default for PluginHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginHandle {
    /// Create an empty, unopened handle
    pub fn new() -> Self {
        Self {
            state: PluginState::Unopened,
            library: None,
            factory: None,
            component: None,
            processor: None,
            initialized: false,
            component_active: false,
            input_bus_count: 0,
            output_bus_count: 0,
            plugin_type: PluginType::Unknown,
            class_info: None,
            config: AudioConfig::default(),
            host_context: HostContext::default(),
            warnings: Vec::new(),
            mapper: BusMapper::new(),
        }
    }

    /// Use a custom host context for initialization
    pub fn with_host_context(mut self, context: HostContext) -> Self {
        self.host_context = context;
        self
    }

    /// Current lifecycle state
    pub fn state(&self) -> PluginState {
        self.state
    }

    /// Whether activation completed and process calls are accepted
    pub fn is_active(&self) -> bool {
        self.state == PluginState::Active
    }

    /// Whether the component accepted initialization
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether the plugin advertised the audio processing capability
    pub fn has_audio_processor(&self) -> bool {
        self.processor.is_some()
    }

    /// Number of audio input buses recorded at open
    pub fn input_bus_count(&self) -> i32 {
        self.input_bus_count
    }

    /// Number of audio output buses recorded at open
    pub fn output_bus_count(&self) -> i32 {
        self.output_bus_count
    }

    /// Instrument/effect classification
    pub fn plugin_type(&self) -> PluginType {
        self.plugin_type
    }

    /// The class that was instantiated
    pub fn class_info(&self) -> Option<&ClassInfo> {
        self.class_info.as_ref()
    }

    /// Audio configuration used at open
    pub fn config(&self) -> &AudioConfig {
        &self.config
    }

    /// Non-fatal problems met during the last open
    pub fn warnings(&self) -> &[ConfigurationWarning] {
        &self.warnings
    }

    /// Bus mapping state
    pub fn mapper(&self) -> &BusMapper {
        &self.mapper
    }

    pub(crate) fn component(&self) -> Option<&dyn Component> {
        self.component.as_deref()
    }

    pub(crate) fn processor(&self) -> Option<&dyn AudioProcessor> {
        self.processor.as_deref()
    }

    /// Load, instantiate and activate the plugin bundle at `bundle`.
    ///
    /// Only library, factory, instantiation and initialization failures are
    /// errors. Everything after initialization degrades gracefully and is
    /// recorded in [`PluginHandle::warnings`].
    pub fn open(
        &mut self,
        bundle: &Path,
        loader: &dyn LibraryLoader,
        config: &AudioConfig,
    ) -> Result<()> {
        if self.is_active() {
            log::debug!("VST3 plugin '{}' is already open", bundle.display());
            return Ok(());
        }
        if !matches!(self.state, PluginState::Unopened | PluginState::Closed) {
            self.close();
        }

        self.warnings.clear();
        self.config = *config;

        self.open_sequence(bundle, loader).inspect_err(|e| {
            log::error!("Could not open VST3 plugin '{}': {}", bundle.display(), e);
            self.close();
        })
    }

    fn open_sequence(&mut self, bundle: &Path, loader: &dyn LibraryLoader) -> Result<()> {
        log::info!("Opening VST3 plugin '{}'", bundle.display());

        let library = self.library.insert(loader.load(bundle)?);
        self.state = PluginState::LibraryLoaded;
        log::info!("VST3 plugin library loaded: {}", library.path().display());

        let factory = self.factory.insert(library.factory()?);
        self.state = PluginState::FactoryObtained;
        log::info!("VST3 plugin factory obtained");

        let class = select_class(factory.as_ref(), &mut self.warnings)?;
        log::info!(
            "VST3 plugin class: {}, category: {}",
            class.name,
            class.category
        );

        let mut component =
            factory
                .create_component(&class)
                .map_err(|code| Error::InstantiationError {
                    class: class.name.clone(),
                    code,
                })?;
        self.state = PluginState::ComponentCreated;

        let code = component.initialize(&self.host_context);
        if !code.is_ok() {
            return Err(Error::InitError(code));
        }
        let component = self.component.insert(component);
        self.initialized = true;
        self.state = PluginState::Initialized;

        self.processor = component.audio_processor();
        if self.processor.is_none() {
            log::warn!("VST3 plugin does not support the audio processor interface");
            self.warnings.push(ConfigurationWarning::NoAudioProcessor);
        }

        let inputs = bus::activate_audio_buses(
            component.as_mut(),
            BusDirection::Input,
            &mut self.warnings,
        );
        let outputs = bus::activate_audio_buses(
            component.as_mut(),
            BusDirection::Output,
            &mut self.warnings,
        );
        log::info!(
            "VST3 plugin initialized: {} input buses ({} channels), {} output buses ({} channels)",
            inputs.bus_count,
            inputs.channel_count,
            outputs.bus_count,
            outputs.channel_count
        );
        self.input_bus_count = inputs.bus_count;
        self.output_bus_count = outputs.bus_count;
        self.state = PluginState::BusesActivated;

        if let Some(processor) = self.processor.as_mut() {
            let setup = ProcessSetup {
                mode: ProcessMode::Realtime,
                sample_size: SampleSize::Float32,
                max_samples_per_block: i32::try_from(self.config.block_size).unwrap_or(i32::MAX),
                sample_rate: self.config.sample_rate,
            };
            let code = processor.setup_processing(&setup);
            if code.is_ok() {
                log::info!(
                    "VST3 audio processing configured: {}Hz, block size {}",
                    setup.sample_rate,
                    setup.max_samples_per_block
                );
                self.state = PluginState::ProcessingConfigured;
            } else {
                log::warn!("Could not set up VST3 audio processing: {}", code);
                self.warnings
                    .push(ConfigurationWarning::ProcessingSetupFailed(code));
            }
        }

        let code = component.set_active(true);
        self.component_active = code.is_ok();
        if !code.is_ok() {
            log::warn!("Could not activate VST3 component: {}", code);
            self.warnings
                .push(ConfigurationWarning::ComponentActivationFailed(code));
        }

        if let Some(processor) = self.processor.as_mut() {
            let code = processor.set_processing(true);
            if !code.is_ok() {
                log::warn!("Could not start VST3 processing: {}", code);
                self.warnings
                    .push(ConfigurationWarning::StartProcessingFailed(code));
            }
        }

        self.plugin_type = if component.bus_count(MediaType::Event, BusDirection::Input) > 0 {
            PluginType::Instrument
        } else {
            PluginType::Effect
        };
        log::debug!("VST3 plugin type: {:?}", self.plugin_type);

        self.class_info = Some(class);
        self.state = PluginState::Active;
        Ok(())
    }

    /// Release every handle: processor, component, factory, library.
    ///
    /// Idempotent, and a no-op on a never-opened handle.
    pub fn close(&mut self) {
        if self.state == PluginState::Closed {
            return;
        }

        let was_active = self.state == PluginState::Active;
        self.state = PluginState::Closing;

        if was_active {
            if let Some(processor) = self.processor.as_mut() {
                processor.set_processing(false);
            }
        }
        if self.component_active {
            if let Some(component) = self.component.as_mut() {
                component.set_active(false);
            }
        }

        if self.processor.take().is_some() {
            log::debug!("VST3 audio processor released");
        }
        if let Some(mut component) = self.component.take() {
            component.terminate();
            drop(component);
            log::debug!("VST3 component terminated");
        }
        if self.factory.take().is_some() {
            log::debug!("VST3 plugin factory released");
        }
        if self.library.take().is_some() {
            log::debug!("VST3 plugin library unloaded");
        }

        self.initialized = false;
        self.component_active = false;
        self.input_bus_count = 0;
        self.output_bus_count = 0;
        self.state = PluginState::Closed;
    }

    /// Process one block through the plugin.
    ///
    /// Errors mean nothing useful was written to `outputs`; the caller is
    /// expected to fall back to pass-through.
    pub fn process(&mut self, inputs: &mut SampleBuffer, outputs: &mut SampleBuffer) -> Result<()> {
        if !self.is_active() {
            return Err(Error::NotActive);
        }
        let Some(component) = self.component.as_deref() else {
            return Err(Error::NotActive);
        };
        let Some(processor) = self.processor.as_deref_mut() else {
            return Err(Error::ProcessorUnavailable);
        };

        self.mapper.process(
            component,
            processor,
            self.input_bus_count,
            self.output_bus_count,
            self.config.block_size,
            inputs,
            outputs,
        )
    }
}

impl Drop for PluginHandle {
    fn drop(&mut self) {
        self.close();
    }
}

/// Pick the audio module class, falling back to the first class
fn select_class(
    factory: &dyn PluginFactory,
    warnings: &mut Vec<ConfigurationWarning>,
) -> Result<ClassInfo> {
    let count = factory.class_count();
    if count <= 0 {
        return Err(Error::FactoryError(
            "VST3 plugin factory has no classes".to_string(),
        ));
    }
    log::debug!("VST3 plugin has {} class(es)", count);

    for index in 0..count {
        let Some(info) = factory.class_info(index) else {
            continue;
        };
        log::debug!(
            "VST3 class {}: {}, category: {}",
            index,
            info.name,
            info.category
        );
        if info.is_audio_module() {
            return Ok(info);
        }
    }

    // TODO: check the fallback class for IComponent support before instantiating it
    let info = factory.class_info(0).ok_or_else(|| {
        Error::FactoryError("Could not get VST3 plugin class info".to_string())
    })?;
    log::warn!("No Audio Module Class found, using first class: {}", info.name);
    warnings.push(ConfigurationWarning::FallbackClass(info.name.clone()));
    Ok(info)
}
