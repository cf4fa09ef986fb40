//! Bus mapping engine.
//!
//! Bridges the host's flat, channel-indexed [`SampleBuffer`] to the plugin's
//! bus-indexed channel pointer arrays for one block at a time. The plugin
//! interface requires a valid pointer for every declared channel, so channel
//! positions the host cannot supply are backed by per-instance silent scratch
//! buffers.

use crate::audio::SampleBuffer;
use crate::bus::{BusDirection, MediaType};
use crate::component::{AudioProcessor, BusBuffers, Component, ProcessData};
use crate::error::{Error, Result};

/// Zero-filled scratch buffers used for silence padding.
///
/// Grows to the largest block size seen and never shrinks. Both buffers are
/// fully zeroed between process calls.
#[derive(Debug, Default)]
pub struct SilentChannelPool {
    input: Vec<f32>,
    output: Vec<f32>,
}

impl SilentChannelPool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Samples available in the input padding buffer
    pub fn input_capacity(&self) -> usize {
        self.input.len()
    }

    /// Samples available in the output padding buffer
    pub fn output_capacity(&self) -> usize {
        self.output.len()
    }

    /// Input padding buffer contents
    pub fn input(&self) -> &[f32] {
        &self.input
    }

    /// Output padding buffer contents
    pub fn output(&self) -> &[f32] {
        &self.output
    }

    /// Whether both buffers hold only zeros
    pub fn is_silent(&self) -> bool {
        self.input.iter().chain(&self.output).all(|&s| s == 0.0)
    }

    /// Make sure both buffers hold at least `block_size` samples
    pub fn reserve(&mut self, block_size: usize) {
        Self::grow(&mut self.input, block_size);
        Self::grow(&mut self.output, block_size);
    }

    fn grow(buffer: &mut Vec<f32>, block_size: usize) {
        if buffer.len() < block_size {
            *buffer = vec![0.0; block_size];
        }
    }

    fn scrub(&mut self, block_size: usize) {
        self.input[..block_size].fill(0.0);
        self.output[..block_size].fill(0.0);
    }
}

/// How one plugin bus was bound to host channels in the last process call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusBinding {
    /// Bus index
    pub bus_index: i32,
    /// First global host channel this bus consumed
    pub channel_offset: usize,
    /// Channel count the plugin declared for the bus
    pub declared_channels: i32,
    /// Channels bound directly to host memory
    pub host_channels: i32,
    /// Bit `n` set means bus channel `n` was backed by a silent buffer
    pub padded_channels: u64,
    /// Silence flags after the call: the padding mask for inputs, the
    /// flags the plugin reported for outputs
    pub silence_flags: u64,
    /// Whether bus info could be read
    pub available: bool,
}

/// Pooled per-direction pointer arrays, rewritten on every call
#[derive(Debug, Default)]
struct DirectionScratch {
    channel_ptrs: Vec<Vec<*mut f32>>,
    buses: Vec<BusBuffers>,
    bindings: Vec<BusBinding>,
    next_offset: usize,
}

impl DirectionScratch {
    /// Bind `bus_count` buses to consecutive runs of host channels.
    ///
    /// Returns whether any channel had to be padded with `silent`.
    fn bind(
        &mut self,
        component: &dyn Component,
        direction: BusDirection,
        bus_count: usize,
        host: &mut SampleBuffer,
        silent: *mut f32,
    ) -> bool {
        if self.channel_ptrs.len() < bus_count {
            self.channel_ptrs.resize_with(bus_count, Vec::new);
        }
        self.buses.clear();
        self.bindings.clear();

        let host_channels = host.num_channels();
        let mut offset = 0usize;
        let mut padded_any = false;

        for (index, ptrs) in self.channel_ptrs.iter_mut().take(bus_count).enumerate() {
            let bus_index = index as i32;
            ptrs.clear();

            let Some(info) = component.bus_info(MediaType::Audio, direction, bus_index) else {
                log::warn!("Could not get bus info for {} bus {}", direction, bus_index);
                self.buses.push(BusBuffers::empty());
                self.bindings.push(BusBinding {
                    bus_index,
                    channel_offset: offset,
                    ..BusBinding::default()
                });
                continue;
            };

            let declared = info.channel_count.max(0) as usize;
            let mut padded = 0u64;
            for channel in 0..declared {
                let global = offset + channel;
                if global < host_channels {
                    ptrs.push(host.channel_ptr(global));
                } else {
                    ptrs.push(silent);
                    if channel < 64 {
                        padded |= 1u64 << channel;
                    }
                }
            }

            let direct = host_channels.saturating_sub(offset).min(declared);
            if direct < declared {
                padded_any = true;
                log::debug!(
                    "{} bus {}: plugin expects {} channels, host has {} (using silent buffers for the rest)",
                    direction,
                    bus_index,
                    declared,
                    direct
                );
            }

            self.buses.push(BusBuffers {
                num_channels: declared as i32,
                // Output silence flags are reported by the plugin.
                silence_flags: match direction {
                    BusDirection::Input => padded,
                    BusDirection::Output => 0,
                },
                channel_buffers: if ptrs.is_empty() {
                    std::ptr::null_mut()
                } else {
                    ptrs.as_mut_ptr()
                },
            });
            self.bindings.push(BusBinding {
                bus_index,
                channel_offset: offset,
                declared_channels: declared as i32,
                host_channels: direct as i32,
                padded_channels: padded,
                silence_flags: match direction {
                    BusDirection::Input => padded,
                    BusDirection::Output => 0,
                },
                available: true,
            });

            // Advance by the declared count even when padded.
            offset += declared;
        }

        self.next_offset = offset;
        padded_any
    }

    /// Record the silence flags the plugin left on the bus buffers
    fn collect_silence_flags(&mut self) {
        for (binding, bus) in self.bindings.iter_mut().zip(&self.buses) {
            binding.silence_flags = bus.silence_flags;
        }
    }

    /// Forget the bindings of an earlier call
    fn reset(&mut self) {
        self.bindings.clear();
        self.next_offset = 0;
    }

    /// Drop every pointer handed out for the call, keeping capacity
    fn release(&mut self) {
        for ptrs in &mut self.channel_ptrs {
            ptrs.clear();
        }
        self.buses.clear();
    }
}

/// Per-instance bus mapping state
#[derive(Debug, Default)]
pub struct BusMapper {
    silent: SilentChannelPool,
    inputs: DirectionScratch,
    outputs: DirectionScratch,
}

impl BusMapper {
    /// Create a mapper with an empty silent pool
    pub fn new() -> Self {
        Self::default()
    }

    /// The silent scratch pool
    pub fn silent_pool(&self) -> &SilentChannelPool {
        &self.silent
    }

    /// Input bus bindings of the last call, empty if it was rejected
    pub fn input_bindings(&self) -> &[BusBinding] {
        &self.inputs.bindings
    }

    /// Output bus bindings of the last call, empty if it was rejected
    pub fn output_bindings(&self) -> &[BusBinding] {
        &self.outputs.bindings
    }

    /// Global input channel offset a further bus would have started at
    pub fn next_input_offset(&self) -> usize {
        self.inputs.next_offset
    }

    /// Global output channel offset a further bus would have started at
    pub fn next_output_offset(&self) -> usize {
        self.outputs.next_offset
    }

    /// Map host buffers onto the plugin's buses and process one block.
    ///
    /// `max_block_size` is the limit the processor was set up with; larger
    /// blocks are rejected. Any error leaves `outputs` for the caller to fill
    /// by pass-through.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn process(
        &mut self,
        component: &dyn Component,
        processor: &mut dyn AudioProcessor,
        input_bus_count: i32,
        output_bus_count: i32,
        max_block_size: usize,
        inputs: &mut SampleBuffer,
        outputs: &mut SampleBuffer,
    ) -> Result<()> {
        self.inputs.reset();
        self.outputs.reset();

        if input_bus_count <= 0 || output_bus_count <= 0 {
            return Err(Error::NoUsableBuses {
                inputs: input_bus_count,
                outputs: output_bus_count,
            });
        }

        let num_samples = outputs.block_size();
        if num_samples > max_block_size {
            return Err(Error::BlockTooLarge {
                block: num_samples,
                max: max_block_size,
            });
        }
        if inputs.block_size() < num_samples {
            return Err(Error::BlockSizeMismatch {
                input: inputs.block_size(),
                output: num_samples,
            });
        }

        self.silent.reserve(num_samples);
        let silent_input = self.silent.input.as_mut_ptr();
        let silent_output = self.silent.output.as_mut_ptr();

        self.inputs.bind(
            component,
            BusDirection::Input,
            input_bus_count as usize,
            inputs,
            silent_input,
        );
        self.outputs.bind(
            component,
            BusDirection::Output,
            output_bus_count as usize,
            outputs,
            silent_output,
        );

        let code = {
            let mut data = ProcessData {
                num_samples: num_samples as i32,
                inputs: &mut self.inputs.buses,
                outputs: &mut self.outputs.buses,
            };
            processor.process(&mut data)
        };

        self.outputs.collect_silence_flags();
        self.inputs.release();
        self.outputs.release();
        // Output padding is written by the plugin and discarded.
        self.silent.scrub(num_samples);

        if code.is_ok() {
            Ok(())
        } else {
            Err(Error::ProcessingFailure(code))
        }
    }
}
