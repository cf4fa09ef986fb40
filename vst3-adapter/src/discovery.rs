//! VST3 plugin location resolution

use crate::error::{Error, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// File extension of VST3 bundles
pub const PLUGIN_EXTENSION: &str = "vst3";

/// Resolves plugin names to bundle paths
pub trait PluginLocator: Send + Sync {
    /// Ordered search locations for a given root
    fn candidates(&self, root: Option<&Path>) -> Vec<PathBuf>;

    /// Absolute bundle path for `name`, if one exists
    fn resolve(&self, name: &str, root: Option<&Path>) -> Option<PathBuf> {
        if name.is_empty() {
            return None;
        }

        let direct = Path::new(name);
        if direct.exists() {
            return Some(absolute(direct));
        }

        let file_name = format!("{}.{}", name, PLUGIN_EXTENSION);
        self.candidates(root)
            .into_iter()
            .map(|location| location.join(&file_name))
            .find(|path| path.exists())
            .map(|path| absolute(&path))
    }
}

/// Searches the plugin root followed by the platform's standard directories
#[derive(Debug, Clone, Default)]
pub struct StandardLocator {
    extra_paths: Vec<PathBuf>,
}

impl StandardLocator {
    /// Locator over the standard directories only
    pub fn new() -> Self {
        Self::default()
    }

    /// Locator that also searches `paths`, after the root
    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        Self { extra_paths: paths }
    }
}

impl PluginLocator for StandardLocator {
    fn candidates(&self, root: Option<&Path>) -> Vec<PathBuf> {
        let root = match root {
            Some(root) if !root.as_os_str().is_empty() => root.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut paths = vec![root];
        paths.extend(self.extra_paths.iter().cloned());
        paths.extend(scan_standard_paths());
        paths
    }
}

/// Whether a plugin named `name` can be resolved
pub fn plugin_exists(locator: &dyn PluginLocator, name: &str, root: Option<&Path>) -> bool {
    locator.resolve(name, root).is_some()
}

/// Log the search locations and list every bundle found in them
pub fn list_available_plugins(locator: &dyn PluginLocator, root: Option<&Path>) -> Vec<PathBuf> {
    let locations = locator.candidates(root);

    log::info!("VST3 plugin search locations:");
    for location in &locations {
        log::info!("  {}", location.display());
    }

    scan_directories(&locations)
}

/// Standard VST3 directories for this platform
pub fn scan_standard_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    #[cfg(target_os = "macos")]
    {
        paths.push(PathBuf::from("/Library/Audio/Plug-Ins/VST3"));
        if let Ok(home) = std::env::var("HOME") {
            paths.push(PathBuf::from(home).join("Library/Audio/Plug-Ins/VST3"));
        }
    }

    #[cfg(target_os = "windows")]
    {
        paths.push(PathBuf::from(r"C:\Program Files\Common Files\VST3"));
        paths.push(PathBuf::from(r"C:\Program Files (x86)\Common Files\VST3"));
    }

    #[cfg(target_os = "linux")]
    {
        if let Ok(home) = std::env::var("HOME") {
            paths.push(PathBuf::from(home).join(".vst3"));
        }
        paths.push(PathBuf::from("/usr/lib/vst3"));
        paths.push(PathBuf::from("/usr/local/lib/vst3"));
    }

    paths
}

/// Scan directories for VST3 bundles, sorted and deduplicated
pub fn scan_directories(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut plugins = Vec::new();

    for path in paths {
        if path.is_dir() {
            log::debug!("Searching for VST3 plugins in: {}", path.display());
            scan_directory(path, &mut plugins);
        }
    }

    plugins.sort();
    plugins.dedup();
    plugins
}

fn scan_directory(dir: &Path, plugins: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if is_bundle(&path) {
            plugins.push(path);
        } else if path.is_dir() {
            scan_directory(&path, plugins);
        }
    }
}

fn is_bundle(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case(PLUGIN_EXTENSION))
}

fn absolute(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Platform-specific binary inside a VST3 bundle
pub fn binary_path(bundle_path: &Path) -> Result<PathBuf> {
    // A single-file plugin is its own binary
    if bundle_path.is_file() {
        return Ok(bundle_path.to_path_buf());
    }

    let contents = bundle_path.join("Contents");

    #[cfg(target_os = "macos")]
    let candidates: Vec<(PathBuf, Option<&str>)> = vec![(contents.join("MacOS"), None)];

    #[cfg(target_os = "windows")]
    let candidates: Vec<(PathBuf, Option<&str>)> = vec![
        (contents.join("x86_64-win"), Some(PLUGIN_EXTENSION)),
        (contents.join("x86-win"), Some(PLUGIN_EXTENSION)),
    ];

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let candidates: Vec<(PathBuf, Option<&str>)> = vec![
        (contents.join(format!("{}-linux", std::env::consts::ARCH)), Some("so")),
        (contents.join("x86_64-linux"), Some("so")),
        (contents.join("i386-linux"), Some("so")),
    ];

    for (dir, extension) in &candidates {
        let Ok(entries) = std::fs::read_dir(dir) else {
            continue;
        };
        let found = entries.flatten().map(|entry| entry.path()).find(|path| {
            path.is_file()
                && match extension {
                    Some(ext) => path.extension() == Some(OsStr::new(ext)),
                    None => path
                        .file_name()
                        .and_then(OsStr::to_str)
                        .is_some_and(|name| !name.starts_with('.') && !name.ends_with(".plist")),
                }
        });
        if let Some(path) = found {
            return Ok(path);
        }
    }

    Err(Error::NotFound(format!(
        "Could not find VST3 binary in bundle: {}",
        bundle_path.display()
    )))
}
