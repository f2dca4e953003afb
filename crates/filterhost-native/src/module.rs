//! Loaded filter modules.

use std::path::{Path, PathBuf};

use filterhost_abi::FilterEntryPoint;
use libloading::Library;

use crate::error::{FilterHostError, Result};
use crate::handles::SafeModuleHandle;

/// A filter module mapped into the process.
///
/// The module stays loaded until the value is dropped; entry points
/// obtained from it must not be called afterwards.
#[derive(Debug)]
pub struct PluginModule {
    path: PathBuf,
    library: SafeModuleHandle,
}

impl PluginModule {
    /// Load the module at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`FilterHostError::FilterRun`] carrying the loader's message
    /// when the module cannot be mapped.
    pub fn load(path: &Path) -> Result<Self> {
        // SAFETY: loading runs the module's initializers. Filter modules are
        // trusted to the same degree as the code that asked to run them.
        let library = unsafe { Library::new(path) }.map_err(|e| {
            FilterHostError::filter_run(
                format!("Unable to load the filter module {}", path.display()),
                e,
            )
        })?;

        tracing::info!(path = %path.display(), "Loaded filter module");

        Ok(Self {
            path: path.to_path_buf(),
            library: SafeModuleHandle::new(library),
        })
    }

    /// Path the module was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the module is still loaded.
    pub fn is_loaded(&self) -> bool {
        self.library.is_valid()
    }

    /// Resolve a filter entry point by its exported name.
    ///
    /// # Errors
    ///
    /// Returns [`FilterHostError::FilterRun`] when the symbol is missing or
    /// the module has been unloaded.
    pub fn entry_point(&self, name: &str) -> Result<FilterEntryPoint> {
        let library = self.library.raw_for_abi().ok_or_else(|| {
            FilterHostError::filter_run_message(format!(
                "The filter module {} is no longer loaded",
                self.path.display()
            ))
        })?;

        // SAFETY: the symbol is declared by the module's PiPL as a filter
        // entry point, which has the `FilterEntryPoint` signature. The
        // returned pointer is only used while `self` keeps the module loaded.
        let symbol = unsafe { library.get::<FilterEntryPoint>(name.as_bytes()) }.map_err(|e| {
            FilterHostError::filter_run(
                format!("The entry point {name} was not found in {}", self.path.display()),
                e,
            )
        })?;

        Ok(*symbol)
    }

    /// Unload the module now. Later calls do nothing.
    pub fn unload(&mut self) {
        self.library.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_module_is_filter_run_error() {
        let result = PluginModule::load(Path::new("definitely/not/here.8bf"));
        match result {
            Err(FilterHostError::FilterRun { message, source }) => {
                assert!(message.contains("here.8bf"));
                assert!(source.is_some());
            }
            other => panic!("expected FilterRun, got {other:?}"),
        }
    }
}
