//! VST3-backed implementations of the component traits

pub(crate) mod utils;
pub(crate) mod vst3_impl;
