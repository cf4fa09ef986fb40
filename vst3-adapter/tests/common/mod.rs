//! Scriptable mock plugin shared by the integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use vst3_adapter::component::AUDIO_MODULE_CLASS;
use vst3_adapter::{
    AudioProcessor, BusDescriptor, BusDirection, ClassInfo, Component, Error, HostContext,
    LibraryLoader, MediaType, PluginFactory, PluginLibrary, ProcessData, ProcessSetup, Result,
    ResultCode, Vst3Adapter,
};

/// What the mock processor writes into its outputs
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Behaviour {
    /// Output bus `b` channel `c` = input bus `b` channel `c` times the gain
    Gain(f32),
    /// Every declared output channel is filled with the value
    Fill(f32),
}

/// Script for one mock plugin
#[derive(Debug, Clone)]
pub struct MockSpec {
    pub classes: Vec<(String, String)>,
    pub input_buses: Vec<i32>,
    pub output_buses: Vec<i32>,
    pub event_inputs: i32,
    pub has_processor: bool,
    pub fail_load: bool,
    pub fail_factory: bool,
    pub fail_create: bool,
    pub fail_init: bool,
    pub fail_setup: bool,
    pub fail_activate: bool,
    pub fail_process: bool,
    pub broken_bus_info: Vec<(BusDirection, i32)>,
    pub latency: u32,
    pub tail: u32,
    pub output_silence: u64,
    pub behaviour: Behaviour,
}

impl Default for MockSpec {
    fn default() -> Self {
        Self {
            classes: vec![("Mock Gain".to_string(), AUDIO_MODULE_CLASS.to_string())],
            input_buses: vec![2],
            output_buses: vec![2],
            event_inputs: 0,
            has_processor: true,
            fail_load: false,
            fail_factory: false,
            fail_create: false,
            fail_init: false,
            fail_setup: false,
            fail_activate: false,
            fail_process: false,
            broken_bus_info: Vec::new(),
            latency: 0,
            tail: 0,
            output_silence: 0,
            behaviour: Behaviour::Gain(0.5),
        }
    }
}

/// What one process call looked like from inside the plugin
#[derive(Debug, Clone, PartialEq)]
pub struct BlockRecord {
    pub num_samples: i32,
    pub input_channels: Vec<i32>,
    pub output_channels: Vec<i32>,
    pub input_silence_flags: Vec<u64>,
}

/// Calls observed by the mock
#[derive(Debug, Default)]
pub struct Probe {
    pub events: Vec<String>,
    pub blocks: Vec<BlockRecord>,
    pub setup: Option<ProcessSetup>,
    pub host_name: Option<String>,
}

pub type SharedProbe = Arc<Mutex<Probe>>;

fn record(probe: &SharedProbe, event: impl Into<String>) {
    probe.lock().unwrap().events.push(event.into());
}

/// Library loader handing out mock libraries
pub struct MockLoader {
    spec: MockSpec,
    probe: SharedProbe,
}

impl MockLoader {
    pub fn new(spec: MockSpec) -> (Self, SharedProbe) {
        let probe = SharedProbe::default();
        (
            Self {
                spec,
                probe: Arc::clone(&probe),
            },
            probe,
        )
    }
}

impl LibraryLoader for MockLoader {
    fn load(&self, bundle: &Path) -> Result<Box<dyn PluginLibrary>> {
        if self.spec.fail_load {
            return Err(Error::LoadError("mock library refused to load".to_string()));
        }
        record(&self.probe, "load library");
        Ok(Box::new(MockLibrary {
            spec: self.spec.clone(),
            probe: Arc::clone(&self.probe),
            path: bundle.to_path_buf(),
        }))
    }
}

struct MockLibrary {
    spec: MockSpec,
    probe: SharedProbe,
    path: PathBuf,
}

impl PluginLibrary for MockLibrary {
    fn path(&self) -> &Path {
        &self.path
    }

    fn factory(&self) -> Result<Box<dyn PluginFactory>> {
        if self.spec.fail_factory {
            return Err(Error::FactoryError("no GetPluginFactory".to_string()));
        }
        record(&self.probe, "get factory");
        Ok(Box::new(MockFactory {
            spec: self.spec.clone(),
            probe: Arc::clone(&self.probe),
        }))
    }
}

impl Drop for MockLibrary {
    fn drop(&mut self) {
        record(&self.probe, "unload library");
    }
}

struct MockFactory {
    spec: MockSpec,
    probe: SharedProbe,
}

impl PluginFactory for MockFactory {
    fn class_count(&self) -> i32 {
        self.spec.classes.len() as i32
    }

    fn class_info(&self, index: i32) -> Option<ClassInfo> {
        let (name, category) = self.spec.classes.get(index as usize)?;
        let mut cid = [0u8; 16];
        cid[0] = index as u8;
        Some(ClassInfo {
            cid,
            name: name.clone(),
            category: category.clone(),
            cardinality: 0x7FFF_FFFF,
        })
    }

    fn create_component(
        &self,
        class: &ClassInfo,
    ) -> std::result::Result<Box<dyn Component>, ResultCode> {
        if self.spec.fail_create {
            return Err(ResultCode::INTERNAL_ERROR);
        }
        record(&self.probe, format!("create {}", class.name));
        Ok(Box::new(MockComponent {
            spec: self.spec.clone(),
            probe: Arc::clone(&self.probe),
        }))
    }
}

impl Drop for MockFactory {
    fn drop(&mut self) {
        record(&self.probe, "release factory");
    }
}

struct MockComponent {
    spec: MockSpec,
    probe: SharedProbe,
}

impl MockComponent {
    fn buses(&self, direction: BusDirection) -> &[i32] {
        match direction {
            BusDirection::Input => &self.spec.input_buses,
            BusDirection::Output => &self.spec.output_buses,
        }
    }
}

impl Component for MockComponent {
    fn initialize(&mut self, context: &HostContext) -> ResultCode {
        record(&self.probe, "initialize");
        self.probe.lock().unwrap().host_name = Some(context.name.clone());
        if self.spec.fail_init {
            ResultCode::FALSE
        } else {
            ResultCode::OK
        }
    }

    fn audio_processor(&mut self) -> Option<Box<dyn AudioProcessor>> {
        if !self.spec.has_processor {
            return None;
        }
        Some(Box::new(MockProcessor {
            spec: self.spec.clone(),
            probe: Arc::clone(&self.probe),
        }))
    }

    fn bus_count(&self, media: MediaType, direction: BusDirection) -> i32 {
        match (media, direction) {
            (MediaType::Audio, direction) => self.buses(direction).len() as i32,
            (MediaType::Event, BusDirection::Input) => self.spec.event_inputs,
            (MediaType::Event, BusDirection::Output) => 0,
        }
    }

    fn bus_info(
        &self,
        media: MediaType,
        direction: BusDirection,
        index: i32,
    ) -> Option<BusDescriptor> {
        if media != MediaType::Audio || self.spec.broken_bus_info.contains(&(direction, index)) {
            return None;
        }
        let channel_count = *self.buses(direction).get(index as usize)?;
        Some(BusDescriptor {
            media,
            direction,
            channel_count,
            name: format!("{} {}", direction, index),
            is_main: index == 0,
        })
    }

    fn activate_bus(
        &mut self,
        _media: MediaType,
        direction: BusDirection,
        index: i32,
        active: bool,
    ) -> ResultCode {
        record(&self.probe, format!("activate {} bus {} {}", direction, index, active));
        ResultCode::OK
    }

    fn set_active(&mut self, active: bool) -> ResultCode {
        record(&self.probe, format!("set active {}", active));
        if active && self.spec.fail_activate {
            ResultCode::INTERNAL_ERROR
        } else {
            ResultCode::OK
        }
    }

    fn terminate(&mut self) -> ResultCode {
        record(&self.probe, "terminate");
        ResultCode::OK
    }
}

impl Drop for MockComponent {
    fn drop(&mut self) {
        record(&self.probe, "release component");
    }
}

struct MockProcessor {
    spec: MockSpec,
    probe: SharedProbe,
}

impl AudioProcessor for MockProcessor {
    fn setup_processing(&mut self, setup: &ProcessSetup) -> ResultCode {
        record(&self.probe, "setup processing");
        self.probe.lock().unwrap().setup = Some(*setup);
        if self.spec.fail_setup {
            ResultCode::INVALID_ARGUMENT
        } else {
            ResultCode::OK
        }
    }

    fn set_processing(&mut self, processing: bool) -> ResultCode {
        record(&self.probe, format!("set processing {}", processing));
        ResultCode::OK
    }

    fn process(&mut self, data: &mut ProcessData<'_>) -> ResultCode {
        self.probe.lock().unwrap().blocks.push(BlockRecord {
            num_samples: data.num_samples,
            input_channels: data.inputs.iter().map(|bus| bus.num_channels).collect(),
            output_channels: data.outputs.iter().map(|bus| bus.num_channels).collect(),
            input_silence_flags: data.inputs.iter().map(|bus| bus.silence_flags).collect(),
        });
        if self.spec.fail_process {
            return ResultCode::INTERNAL_ERROR;
        }

        let len = data.num_samples as usize;
        for (index, output) in data.outputs.iter().enumerate() {
            for channel in 0..output.num_channels as usize {
                let samples: Vec<f32> = match self.spec.behaviour {
                    Behaviour::Gain(gain) => match data.inputs.get(index) {
                        Some(input) if channel < input.num_channels as usize => {
                            unsafe { input.channel(channel, len) }
                                .iter()
                                .map(|s| s * gain)
                                .collect()
                        }
                        _ => vec![0.0; len],
                    },
                    Behaviour::Fill(value) => vec![value; len],
                };
                unsafe { output.channel_mut(channel, len) }.copy_from_slice(&samples);
            }
        }
        for output in data.outputs.iter_mut() {
            output.silence_flags = self.spec.output_silence;
        }
        ResultCode::OK
    }

    fn latency_samples(&self) -> u32 {
        self.spec.latency
    }

    fn tail_samples(&self) -> u32 {
        self.spec.tail
    }
}

impl Drop for MockProcessor {
    fn drop(&mut self) {
        record(&self.probe, "release processor");
    }
}

/// Create a plugin root holding empty bundles named after `names`
pub fn plugin_root(names: &[&str]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for name in names {
        std::fs::create_dir_all(dir.path().join(format!("{}.vst3", name))).unwrap();
    }
    dir
}

/// An adapter resolving "Mock" to a mock plugin described by `spec`
pub fn mock_adapter(spec: MockSpec) -> (Vst3Adapter, SharedProbe, TempDir) {
    mock_adapter_with(spec, 44100.0, 512)
}

/// Same as [`mock_adapter`] with explicit audio settings
pub fn mock_adapter_with(
    spec: MockSpec,
    sample_rate: f64,
    block_size: usize,
) -> (Vst3Adapter, SharedProbe, TempDir) {
    let root = plugin_root(&["Mock"]);
    let (loader, probe) = MockLoader::new(spec);
    let adapter = Vst3Adapter::builder()
        .sample_rate(sample_rate)
        .block_size(block_size)
        .plugin_root(root.path())
        .loader(loader)
        .build()
        .unwrap();
    (adapter, probe, root)
}

/// Events recorded so far
pub fn events(probe: &SharedProbe) -> Vec<String> {
    probe.lock().unwrap().events.clone()
}

/// Events recorded from the first occurrence of `marker` on
pub fn events_from(probe: &SharedProbe, marker: &str) -> Vec<String> {
    let events = events(probe);
    let start = events.iter().position(|e| e == marker).unwrap_or(events.len());
    events[start..].to_vec()
}

/// Opt-in logging for debugging tests
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
