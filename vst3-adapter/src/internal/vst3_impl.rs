//! Component traits implemented over the `vst3` COM bindings

use crate::bus::{BusDescriptor, BusDirection, MediaType};
use crate::component::{
    AudioProcessor, ClassInfo, Component, HostContext, PluginFactory, ProcessData, ProcessSetup,
    ResultCode,
};
use crate::error::{Error, Result};
use crate::internal::utils::{c_str_to_string, string_to_vst_string, vst_string_to_string};
use crate::loader::PluginLibrary;
use libloading::{Library, Symbol};
use std::ffi::c_void;
use std::path::{Path, PathBuf};
use std::ptr;
use vst3::Steinberg::Vst::{
    AudioBusBuffers, BusInfo, IAudioProcessor, IAudioProcessorTrait, IComponent, IComponentTrait,
    IHostApplication, IHostApplicationTrait, String128,
};
use vst3::Steinberg::{IPluginBaseTrait, IPluginFactory, IPluginFactoryTrait};
use vst3::{Class, ComPtr, ComWrapper, Interface, Steinberg};

type GetPluginFactoryFunc = unsafe extern "system" fn() -> *mut IPluginFactory;

#[cfg(target_os = "linux")]
type ModuleEntryFunc = unsafe extern "system" fn(*mut c_void) -> bool;
#[cfg(target_os = "windows")]
type ModuleEntryFunc = unsafe extern "system" fn() -> bool;
#[cfg(any(target_os = "linux", target_os = "windows"))]
type ModuleExitFunc = unsafe extern "system" fn() -> bool;

#[cfg(target_os = "linux")]
const MODULE_ENTRY: &[u8] = b"ModuleEntry\0";
#[cfg(target_os = "linux")]
const MODULE_EXIT: &[u8] = b"ModuleExit\0";
#[cfg(target_os = "windows")]
const MODULE_ENTRY: &[u8] = b"InitDll\0";
#[cfg(target_os = "windows")]
const MODULE_EXIT: &[u8] = b"ExitDll\0";

fn code(result: Steinberg::tresult) -> ResultCode {
    ResultCode(result)
}

/// A plugin binary loaded with `libloading`
pub(crate) struct Vst3Library {
    library: Option<Library>,
    path: PathBuf,
    entered: bool,
}

impl Vst3Library {
    /// Load the binary at `path` and run its module entry point, if any
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let library = unsafe { Library::new(path) }
            .map_err(|e| Error::LoadError(format!("Failed to load library: {}", e)))?;

        let (library, entered) = Self::enter(library)?;
        Ok(Self {
            library: Some(library),
            path: path.to_path_buf(),
            entered,
        })
    }

    #[cfg(target_os = "linux")]
    fn enter(library: Library) -> Result<(Library, bool)> {
        use libloading::os::unix::Library as UnixLibrary;

        let handle = UnixLibrary::from(library).into_raw();
        let library: Library = unsafe { UnixLibrary::from_raw(handle) }.into();

        let entered = unsafe {
            match library.get::<ModuleEntryFunc>(MODULE_ENTRY) {
                Ok(entry) => {
                    if !entry(handle) {
                        return Err(Error::LoadError("ModuleEntry failed".to_string()));
                    }
                    true
                }
                Err(_) => false,
            }
        };
        Ok((library, entered))
    }

    #[cfg(target_os = "windows")]
    fn enter(library: Library) -> Result<(Library, bool)> {
        let entered = unsafe {
            match library.get::<ModuleEntryFunc>(MODULE_ENTRY) {
                Ok(entry) => {
                    if !entry() {
                        return Err(Error::LoadError("InitDll failed".to_string()));
                    }
                    true
                }
                Err(_) => false,
            }
        };
        Ok((library, entered))
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    fn enter(library: Library) -> Result<(Library, bool)> {
        Ok((library, false))
    }
}

impl PluginLibrary for Vst3Library {
    fn path(&self) -> &Path {
        &self.path
    }

    fn factory(&self) -> Result<Box<dyn PluginFactory>> {
        let library = self
            .library
            .as_ref()
            .ok_or_else(|| Error::FactoryError("Library already unloaded".to_string()))?;

        unsafe {
            let get_factory: Symbol<GetPluginFactoryFunc> =
                library.get(b"GetPluginFactory\0").map_err(|e| {
                    Error::FactoryError(format!("Failed to find GetPluginFactory: {}", e))
                })?;

            let factory = ComPtr::<IPluginFactory>::from_raw(get_factory()).ok_or_else(|| {
                Error::FactoryError("GetPluginFactory returned null".to_string())
            })?;

            Ok(Box::new(Vst3Factory { factory }))
        }
    }
}

impl Drop for Vst3Library {
    fn drop(&mut self) {
        #[cfg(any(target_os = "linux", target_os = "windows"))]
        {
            if let (true, Some(library)) = (self.entered, self.library.as_ref()) {
                unsafe {
                    if let Ok(exit) = library.get::<ModuleExitFunc>(MODULE_EXIT) {
                        exit();
                    }
                }
            }
        }
        #[cfg(not(any(target_os = "linux", target_os = "windows")))]
        let _ = self.entered;

        self.library.take();
    }
}

struct Vst3Factory {
    factory: ComPtr<IPluginFactory>,
}

impl PluginFactory for Vst3Factory {
    fn class_count(&self) -> i32 {
        unsafe { self.factory.countClasses() }
    }

    fn class_info(&self, index: i32) -> Option<ClassInfo> {
        unsafe {
            let mut info: Steinberg::PClassInfo = std::mem::zeroed();
            if self.factory.getClassInfo(index, &mut info) != Steinberg::kResultOk {
                return None;
            }

            let mut cid = [0u8; 16];
            for (dst, &src) in cid.iter_mut().zip(info.cid.iter()) {
                *dst = src as u8;
            }

            Some(ClassInfo {
                cid,
                name: c_str_to_string(&info.name[..]),
                category: c_str_to_string(&info.category[..]),
                cardinality: info.cardinality,
            })
        }
    }

    fn create_component(
        &self,
        class: &ClassInfo,
    ) -> std::result::Result<Box<dyn Component>, ResultCode> {
        unsafe {
            let mut component_ptr: *mut c_void = ptr::null_mut();
            let result = self.factory.createInstance(
                class.cid.as_ptr() as Steinberg::FIDString,
                IComponent::IID.as_ptr() as Steinberg::FIDString,
                &mut component_ptr,
            );
            if result != Steinberg::kResultOk {
                return Err(code(result));
            }

            let component = ComPtr::from_raw(component_ptr as *mut IComponent)
                .ok_or(code(Steinberg::kNoInterface))?;
            Ok(Box::new(Vst3Component {
                component,
                host: None,
            }))
        }
    }
}

struct Vst3Component {
    component: ComPtr<IComponent>,
    host: Option<ComPtr<IHostApplication>>,
}

impl Component for Vst3Component {
    fn initialize(&mut self, context: &HostContext) -> ResultCode {
        let host = ComWrapper::new(HostApplication {
            name: string_to_vst_string(&context.name),
        })
        .to_com_ptr::<IHostApplication>();

        let context_ptr = host
            .as_ref()
            .map_or(ptr::null_mut(), |host| host.as_ptr() as *mut Steinberg::FUnknown);
        let result = unsafe { self.component.initialize(context_ptr) };

        // The component may keep the context pointer until terminate.
        self.host = host;
        code(result)
    }

    fn audio_processor(&mut self) -> Option<Box<dyn AudioProcessor>> {
        let processor = self.component.cast::<IAudioProcessor>()?;
        Some(Box::new(Vst3Processor {
            processor,
            mode: 0,
            sample_size: 0,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }))
    }

    fn bus_count(&self, media: MediaType, direction: BusDirection) -> i32 {
        unsafe {
            self.component
                .getBusCount(media.as_raw(), direction.as_raw())
        }
    }

    fn bus_info(
        &self,
        media: MediaType,
        direction: BusDirection,
        index: i32,
    ) -> Option<BusDescriptor> {
        unsafe {
            let mut info: BusInfo = std::mem::zeroed();
            let result =
                self.component
                    .getBusInfo(media.as_raw(), direction.as_raw(), index, &mut info);
            if result != Steinberg::kResultOk {
                return None;
            }

            Some(BusDescriptor {
                media,
                direction,
                channel_count: info.channelCount,
                name: vst_string_to_string(&info.name),
                // kMain
                is_main: info.busType == 0,
            })
        }
    }

    fn activate_bus(
        &mut self,
        media: MediaType,
        direction: BusDirection,
        index: i32,
        active: bool,
    ) -> ResultCode {
        code(unsafe {
            self.component
                .activateBus(media.as_raw(), direction.as_raw(), index, active as u8)
        })
    }

    fn set_active(&mut self, active: bool) -> ResultCode {
        code(unsafe { self.component.setActive(active as u8) })
    }

    fn terminate(&mut self) -> ResultCode {
        let result = unsafe { self.component.terminate() };
        self.host = None;
        code(result)
    }
}

struct Vst3Processor {
    processor: ComPtr<IAudioProcessor>,
    mode: i32,
    sample_size: i32,
    inputs: Vec<AudioBusBuffers>,
    outputs: Vec<AudioBusBuffers>,
}

impl Vst3Processor {
    fn convert(source: &[crate::component::BusBuffers], target: &mut Vec<AudioBusBuffers>) {
        target.clear();
        for bus in source {
            let mut buffers: AudioBusBuffers = unsafe { std::mem::zeroed() };
            buffers.numChannels = bus.num_channels;
            buffers.silenceFlags = bus.silence_flags;
            buffers.__field0.channelBuffers32 = bus.channel_buffers;
            target.push(buffers);
        }
    }

    fn as_ptr(buses: &mut [AudioBusBuffers]) -> *mut AudioBusBuffers {
        if buses.is_empty() {
            ptr::null_mut()
        } else {
            buses.as_mut_ptr()
        }
    }
}

impl AudioProcessor for Vst3Processor {
    fn setup_processing(&mut self, setup: &ProcessSetup) -> ResultCode {
        let mut raw = Steinberg::Vst::ProcessSetup {
            processMode: setup.mode.as_raw(),
            symbolicSampleSize: setup.sample_size.as_raw(),
            maxSamplesPerBlock: setup.max_samples_per_block,
            sampleRate: setup.sample_rate,
        };
        let result = unsafe { self.processor.setupProcessing(&mut raw) };
        if result == Steinberg::kResultOk {
            self.mode = raw.processMode;
            self.sample_size = raw.symbolicSampleSize;
        }
        code(result)
    }

    fn set_processing(&mut self, processing: bool) -> ResultCode {
        code(unsafe { self.processor.setProcessing(processing as u8) })
    }

    fn process(&mut self, data: &mut ProcessData<'_>) -> ResultCode {
        Self::convert(data.inputs, &mut self.inputs);
        Self::convert(data.outputs, &mut self.outputs);

        let result = unsafe {
            let mut raw: Steinberg::Vst::ProcessData = std::mem::zeroed();
            raw.processMode = self.mode;
            raw.symbolicSampleSize = self.sample_size;
            raw.numSamples = data.num_samples;
            raw.numInputs = self.inputs.len() as i32;
            raw.numOutputs = self.outputs.len() as i32;
            raw.inputs = Self::as_ptr(&mut self.inputs);
            raw.outputs = Self::as_ptr(&mut self.outputs);
            self.processor.process(&mut raw)
        };

        // Plugins report output silence through the flags.
        for (bus, raw) in data.outputs.iter_mut().zip(&self.outputs) {
            bus.silence_flags = raw.silenceFlags;
        }
        self.inputs.clear();
        self.outputs.clear();

        code(result)
    }

    fn latency_samples(&self) -> u32 {
        unsafe { self.processor.getLatencySamples() }
    }

    fn tail_samples(&self) -> u32 {
        unsafe { self.processor.getTailSamples() }
    }
}

/// Minimal host context object handed to `IComponent::initialize`
struct HostApplication {
    name: String128,
}

impl Class for HostApplication {
    type Interfaces = (IHostApplication,);
}

impl IHostApplicationTrait for HostApplication {
    unsafe fn getName(&self, name: *mut String128) -> Steinberg::tresult {
        if name.is_null() {
            return Steinberg::kInvalidArgument;
        }
        *name = self.name;
        Steinberg::kResultOk
    }

    unsafe fn createInstance(
        &self,
        _cid: *mut Steinberg::TUID,
        _iid: *mut Steinberg::TUID,
        obj: *mut *mut c_void,
    ) -> Steinberg::tresult {
        if !obj.is_null() {
            *obj = ptr::null_mut();
        }
        Steinberg::kNoInterface
    }
}
