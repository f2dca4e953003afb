//! Discovery of filter modules on disk.

use std::path::Path;

use walkdir::WalkDir;

use crate::aete::parse_aete;
use crate::config::HostConfig;
use crate::descriptor::PluginDescriptor;
use crate::error::{PiplError, Result};
use crate::handles::SafeFindHandle;
use crate::pipl::{PiplInfo, PiplSource, parse_pipl};

/// Walks a directory and yields module files with the plug-in extension.
///
/// Entries that cannot be read are skipped.
pub struct ModuleFiles<'a> {
    search: SafeFindHandle,
    config: &'a HostConfig,
}

impl<'a> ModuleFiles<'a> {
    /// Start a search under `root`.
    pub fn new(root: &Path, config: &'a HostConfig) -> Self {
        let max_depth = if config.search_subdirectories {
            usize::MAX
        } else {
            1
        };
        let walk = WalkDir::new(root)
            .follow_links(config.follow_links)
            .max_depth(max_depth)
            .sort_by_file_name()
            .into_iter();
        Self {
            search: SafeFindHandle::new(walk),
            config,
        }
    }
}

impl Iterator for ModuleFiles<'_> {
    type Item = std::path::PathBuf;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.search.get_mut()?.next() {
                Some(Ok(entry)) => entry,
                Some(Err(e)) => {
                    tracing::debug!(error = %e, "Skipping unreadable entry");
                    continue;
                }
                None => {
                    self.search.release();
                    return None;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }
            let matches = entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| self.config.matches_extension(e));
            if matches {
                return Some(entry.into_path());
            }
        }
    }
}

/// Enumerate every filter under `root`.
///
/// Modules whose resources cannot be read are skipped with a warning.
/// Invalid descriptors are skipped unless
/// [`HostConfig::require_valid_descriptors`] is set.
///
/// # Errors
///
/// With `require_valid_descriptors`, returns the first
/// [`crate::FilterHostError::InvalidDescriptor`] or [`crate::FilterHostError::Pipl`].
pub fn enumerate_plugins(
    root: &Path,
    config: &HostConfig,
    source: &dyn PiplSource,
) -> Result<Vec<PluginDescriptor>> {
    let mut plugins = Vec::new();
    for path in ModuleFiles::new(root, config) {
        match load_module_descriptors(&path, config, source) {
            Ok(mut found) => plugins.append(&mut found),
            Err(e) if config.require_valid_descriptors => return Err(e),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping filter module");
            }
        }
    }
    tracing::info!(root = %root.display(), count = plugins.len(), "Enumerated filters");
    Ok(plugins)
}

/// Build the descriptors of every filter in one module.
///
/// # Errors
///
/// Returns an error when the module's resources cannot be read, or when
/// `require_valid_descriptors` is set and a resource or descriptor is bad.
pub fn load_module_descriptors(
    path: &Path,
    config: &HostConfig,
    source: &dyn PiplSource,
) -> Result<Vec<PluginDescriptor>> {
    let mut infos: Vec<PiplInfo> = Vec::new();
    for blob in source.read_pipls(path)? {
        match parse_pipl(&blob) {
            Ok(info) => infos.push(info),
            Err(PiplError::NotAFilter { kind }) => {
                tracing::debug!(path = %path.display(), kind, "Not a filter resource");
            }
            Err(e) if config.require_valid_descriptors => return Err(e.into()),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "Bad PiPL resource"),
        }
    }

    let entry_points: Vec<String> = infos.iter().map(|i| i.entry_point.clone()).collect();
    let mut descriptors = Vec::with_capacity(infos.len());

    for info in infos {
        let mut builder = PluginDescriptor::builder(path)
            .category(info.category)
            .title(info.title)
            .entry_point(info.entry_point)
            .has_about_box(info.has_about_box)
            .module_entry_points(entry_points.clone());
        if let Some(table) = info.filter_info {
            builder = builder.filter_info(table);
        }
        builder = match (info.enable_info, info.supported_modes) {
            (Some(expr), _) if !expr.is_empty() => builder.enable_info(expr),
            (_, Some(modes)) => builder.supported_modes(modes),
            _ => builder,
        };
        if let Some(id) = info.aete_resource_id
            && let Some(data) = source.read_aete(path, id)?
        {
            match parse_aete(&data) {
                Ok(Some(aete)) => builder = builder.aete(aete),
                Ok(None) => {}
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Bad aete resource"),
            }
        }

        let descriptor = builder.build();
        match descriptor.validate() {
            Ok(()) => descriptors.push(descriptor),
            Err(e) if config.require_valid_descriptors => return Err(e),
            Err(e) => tracing::warn!(error = %e, "Skipping invalid filter"),
        }
    }

    Ok(descriptors)
}
