//! Plugin library loading

use crate::component::PluginFactory;
use crate::error::Result;
use std::path::Path;

/// A plugin binary mapped into memory.
///
/// Dropping the box unloads the library; every factory obtained from it must
/// be released first.
pub trait PluginLibrary {
    /// Path of the loaded binary
    fn path(&self) -> &Path;

    /// Obtain the library's plugin factory
    fn factory(&self) -> Result<Box<dyn PluginFactory>>;
}

/// Maps bundle paths to loaded libraries
pub trait LibraryLoader: Send + Sync {
    /// Load the plugin binary of the bundle at `bundle`.
    ///
    /// Fails with `Error::LoadError` when the library cannot be mapped.
    fn load(&self, bundle: &Path) -> Result<Box<dyn PluginLibrary>>;
}

/// Loads real VST3 binaries through `libloading`
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeLoader;

impl LibraryLoader for NativeLoader {
    fn load(&self, bundle: &Path) -> Result<Box<dyn PluginLibrary>> {
        let binary = crate::discovery::binary_path(bundle)
            .map_err(|e| crate::Error::LoadError(e.to_string()))?;
        log::debug!("VST3 plugin binary: {}", binary.display());

        let library = crate::internal::vst3_impl::Vst3Library::load(&binary)?;
        Ok(Box::new(library))
    }
}
