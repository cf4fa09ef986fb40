//! Host-side audio buffers and audio configuration

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Planar multichannel sample buffer owned by the host.
///
/// Every channel holds exactly `block_size` samples.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    channels: Vec<Vec<f32>>,
    block_size: usize,
}

impl SampleBuffer {
    /// Create a zeroed buffer
    pub fn new(num_channels: usize, block_size: usize) -> Self {
        Self {
            channels: vec![vec![0.0; block_size]; num_channels],
            block_size,
        }
    }

    /// Wrap existing channel data; all channels must have the same length
    pub fn from_channels(channels: Vec<Vec<f32>>) -> Result<Self> {
        let block_size = channels.first().map_or(0, Vec::len);
        if let Some((index, channel)) = channels
            .iter()
            .enumerate()
            .find(|(_, channel)| channel.len() != block_size)
        {
            return Err(Error::InvalidBuffer(format!(
                "channel {} has {} samples, expected {}",
                index,
                channel.len(),
                block_size
            )));
        }
        Ok(Self {
            channels,
            block_size,
        })
    }

    /// Number of channels
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// One channel's samples
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    /// One channel's samples, mutably
    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.channels[index]
    }

    /// All channels
    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Fill every channel with silence
    pub fn clear(&mut self) {
        for channel in &mut self.channels {
            channel.fill(0.0);
        }
    }

    /// Fill every channel with `value`
    pub fn fill(&mut self, value: f32) {
        for channel in &mut self.channels {
            channel.fill(value);
        }
    }

    /// Change the block size, zero-extending or truncating every channel
    pub fn set_block_size(&mut self, block_size: usize) {
        for channel in &mut self.channels {
            channel.resize(block_size, 0.0);
        }
        self.block_size = block_size;
    }

    /// Copy `source` into this buffer channel for channel.
    ///
    /// Only the first `min(source, self)` channels are touched; the rest keep
    /// their contents. When `source` is shorter than this buffer, the tail of
    /// each copied channel is zeroed so copied channels are fully populated.
    pub fn copy_and_map_channels(&mut self, source: &SampleBuffer) {
        let samples = self.block_size.min(source.block_size);
        for (dest, src) in self.channels.iter_mut().zip(&source.channels) {
            dest[..samples].copy_from_slice(&src[..samples]);
            dest[samples..].fill(0.0);
        }
    }

    pub(crate) fn channel_ptr(&mut self, index: usize) -> *mut f32 {
        self.channels[index].as_mut_ptr()
    }
}

/// Audio processing configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Sample rate in Hz
    pub sample_rate: f64,
    /// Block size in samples
    pub block_size: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100.0,
            block_size: 512,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_silent() {
        let buffer = SampleBuffer::new(2, 64);
        assert_eq!(buffer.num_channels(), 2);
        assert_eq!(buffer.block_size(), 64);
        assert!(buffer.channels().iter().flatten().all(|&s| s == 0.0));
    }

    #[test]
    fn from_channels_rejects_ragged_input() {
        let result = SampleBuffer::from_channels(vec![vec![0.0; 4], vec![0.0; 3]]);
        assert!(matches!(result, Err(Error::InvalidBuffer(_))));
    }

    #[test]
    fn copy_clamps_to_fewer_channels() {
        let source = SampleBuffer::from_channels(vec![
            vec![1.0, 2.0],
            vec![3.0, 4.0],
            vec![5.0, 6.0],
        ])
        .unwrap();
        let mut dest = SampleBuffer::new(2, 2);
        dest.copy_and_map_channels(&source);
        assert_eq!(dest.channel(0), &[1.0, 2.0]);
        assert_eq!(dest.channel(1), &[3.0, 4.0]);
    }

    #[test]
    fn copy_leaves_extra_channels_alone() {
        let source = SampleBuffer::from_channels(vec![vec![0.25; 8]]).unwrap();
        let mut dest = SampleBuffer::new(3, 8);
        dest.fill(7.0);
        dest.copy_and_map_channels(&source);
        assert!(dest.channel(0).iter().all(|&s| s == 0.25));
        assert!(dest.channel(1).iter().all(|&s| s == 7.0));
        assert!(dest.channel(2).iter().all(|&s| s == 7.0));
    }

    #[test]
    fn copy_zero_fills_short_source() {
        let source = SampleBuffer::from_channels(vec![vec![1.0; 4]]).unwrap();
        let mut dest = SampleBuffer::new(1, 6);
        dest.fill(9.0);
        dest.copy_and_map_channels(&source);
        assert_eq!(dest.channel(0), &[1.0, 1.0, 1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn audio_config_defaults() {
        let config = AudioConfig::default();
        assert_eq!(config.sample_rate, 44100.0);
        assert_eq!(config.block_size, 512);
    }
}
