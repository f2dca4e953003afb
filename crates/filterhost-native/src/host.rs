//! The application-facing filter host.
//!
//! [`FilterHost`] ties discovery, execution and parameter replay together
//! for a calling application:
//! - [`FilterHost::enumerate_filters`] lists the filters under a directory
//! - [`FilterHost::run_filter`] runs one and remembers its parameters
//! - [`FilterHost::repeat_filter`] replays the remembered parameters
//! - [`FilterHost::run_filter_async`] runs on tokio's blocking pool and
//!   streams progress over a `watch` channel
//!
//! Application callbacks are installed once on the host and shared by
//! every run.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use filterhost_abi::{FilterEntryPoint, RgbColor};
use filterhost_surface::PixelSurface;
use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::callbacks::{HostCallbacks, PreviewFrame, ProgressEvent};
use crate::config::HostConfig;
use crate::descriptor::PluginDescriptor;
use crate::enumerate::enumerate_plugins;
use crate::error::{FilterHostError, Result};
use crate::pipl::PiplSource;
use crate::run::{FilterOutcome, FilterParameters, FilterRequest, FilterRunner};

/// Saved parameters per filter, for "repeat last filter".
#[derive(Debug, Default)]
pub struct ParameterCache {
    entries: Mutex<HashMap<PluginDescriptor, FilterParameters>>,
}

impl ParameterCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameters saved for `descriptor`.
    pub fn get(&self, descriptor: &PluginDescriptor) -> Option<FilterParameters> {
        self.entries.lock().get(descriptor).cloned()
    }

    /// Save `parameters` for `descriptor`, returning what they replace.
    pub fn insert(
        &self,
        descriptor: PluginDescriptor,
        parameters: FilterParameters,
    ) -> Option<FilterParameters> {
        self.entries.lock().insert(descriptor, parameters)
    }

    /// Forget the parameters of `descriptor`.
    pub fn remove(&self, descriptor: &PluginDescriptor) -> Option<FilterParameters> {
        self.entries.lock().remove(descriptor)
    }

    /// Forget everything.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of filters with saved parameters.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether nothing is saved.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[derive(Debug, Clone, Default)]
struct ColorProfiles {
    document: Option<Vec<u8>>,
    monitor: Option<Vec<u8>>,
}

/// A filter running on the blocking pool.
#[derive(Debug)]
pub struct FilterTask {
    progress: watch::Receiver<ProgressEvent>,
    handle: JoinHandle<Result<FilterOutcome>>,
}

impl FilterTask {
    /// Receiver of the latest progress report.
    pub fn progress(&self) -> watch::Receiver<ProgressEvent> {
        self.progress.clone()
    }

    /// Wait for the run to end.
    ///
    /// # Errors
    ///
    /// The run's own error, or [`FilterHostError::Worker`] when the worker
    /// panicked or was cancelled.
    pub async fn finish(self) -> Result<FilterOutcome> {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(join_error) => Err(FilterHostError::Worker(join_error.to_string())),
        }
    }
}

/// Discovers, runs and replays filter plug-ins for an application.
pub struct FilterHost {
    config: HostConfig,
    callbacks: RwLock<HostCallbacks>,
    profiles: RwLock<ColorProfiles>,
    parameters: ParameterCache,
}

impl FilterHost {
    /// A host using `config`.
    ///
    /// # Errors
    ///
    /// [`FilterHostError::Config`] when the configuration is invalid.
    pub fn new(config: HostConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            callbacks: RwLock::new(HostCallbacks::default()),
            profiles: RwLock::new(ColorProfiles::default()),
            parameters: ParameterCache::new(),
        })
    }

    /// A host with the default configuration.
    pub fn with_defaults() -> Self {
        Self {
            config: HostConfig::default(),
            callbacks: RwLock::new(HostCallbacks::default()),
            profiles: RwLock::new(ColorProfiles::default()),
            parameters: ParameterCache::new(),
        }
    }

    /// The host's configuration.
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Saved filter parameters.
    pub fn parameters(&self) -> &ParameterCache {
        &self.parameters
    }

    /// Install the predicate polled to cancel runs.
    pub fn set_abort_predicate(&self, abort: impl Fn() -> bool + Send + Sync + 'static) {
        self.callbacks.write().abort = Some(Arc::new(abort));
    }

    /// Install the receiver of progress reports.
    pub fn set_progress_sink(&self, progress: impl Fn(ProgressEvent) + Send + Sync + 'static) {
        self.callbacks.write().progress = Some(Arc::new(progress));
    }

    /// Install the color picker offered to plug-ins.
    pub fn set_pick_color(
        &self,
        pick: impl Fn(&str) -> Option<RgbColor> + Send + Sync + 'static,
    ) {
        self.callbacks.write().pick_color = Some(Arc::new(pick));
    }

    /// Install the receiver of plug-in preview pixels.
    pub fn set_preview_sink(&self, preview: impl Fn(&PreviewFrame) + Send + Sync + 'static) {
        self.callbacks.write().preview = Some(Arc::new(preview));
    }

    /// Profiles used to color manage previews when a request names none.
    pub fn set_color_profiles(&self, document: Option<Vec<u8>>, monitor: Option<Vec<u8>>) {
        *self.profiles.write() = ColorProfiles { document, monitor };
    }

    /// Every filter under `directory`.
    ///
    /// # Errors
    ///
    /// See [`enumerate_plugins`].
    pub fn enumerate_filters(
        &self,
        directory: &Path,
        source: &dyn PiplSource,
    ) -> Result<Vec<PluginDescriptor>> {
        enumerate_plugins(directory, &self.config, source)
    }

    /// Run a filter and remember the parameters it saved.
    ///
    /// # Errors
    ///
    /// See [`FilterRunner::run`].
    pub fn run_filter(
        &self,
        descriptor: &PluginDescriptor,
        source: &PixelSurface,
        request: &FilterRequest,
    ) -> Result<FilterOutcome> {
        let request = self.complete_request(request);
        let outcome = self.runner(None).run(descriptor, source, &request)?;
        self.remember(descriptor, &outcome);
        Ok(outcome)
    }

    /// Run a filter linked into the process.
    ///
    /// # Errors
    ///
    /// See [`FilterRunner::run_with_entry_point`].
    pub fn run_entry_point(
        &self,
        descriptor: &PluginDescriptor,
        entry: FilterEntryPoint,
        source: &PixelSurface,
        request: &FilterRequest,
    ) -> Result<FilterOutcome> {
        let request = self.complete_request(request);
        let outcome = self
            .runner(None)
            .run_with_entry_point(descriptor, entry, source, &request)?;
        self.remember(descriptor, &outcome);
        Ok(outcome)
    }

    /// Run a filter again with the parameters saved by its last run.
    ///
    /// # Errors
    ///
    /// [`FilterHostError::FilterRun`] when nothing is saved for the filter,
    /// otherwise as [`FilterHost::run_filter`].
    pub fn repeat_filter(
        &self,
        descriptor: &PluginDescriptor,
        source: &PixelSurface,
        request: &FilterRequest,
    ) -> Result<FilterOutcome> {
        let request = self.replay_request(descriptor, request)?;
        self.run_filter(descriptor, source, &request)
    }

    /// Show a filter's about box.
    ///
    /// # Errors
    ///
    /// See [`FilterRunner::show_about`].
    pub fn show_about(&self, descriptor: &PluginDescriptor) -> Result<()> {
        self.runner(None).show_about(descriptor)
    }

    /// Run a filter on tokio's blocking pool.
    ///
    /// # Errors
    ///
    /// [`FilterHostError::Worker`] when called outside a tokio runtime.
    pub fn run_filter_async(
        self: &Arc<Self>,
        descriptor: PluginDescriptor,
        source: PixelSurface,
        request: FilterRequest,
    ) -> Result<FilterTask> {
        self.spawn(descriptor, None, source, request)
    }

    /// Run a filter linked into the process on tokio's blocking pool.
    ///
    /// # Errors
    ///
    /// [`FilterHostError::Worker`] when called outside a tokio runtime.
    pub fn run_entry_point_async(
        self: &Arc<Self>,
        descriptor: PluginDescriptor,
        entry: FilterEntryPoint,
        source: PixelSurface,
        request: FilterRequest,
    ) -> Result<FilterTask> {
        self.spawn(descriptor, Some(entry), source, request)
    }

    fn spawn(
        self: &Arc<Self>,
        descriptor: PluginDescriptor,
        entry: Option<FilterEntryPoint>,
        source: PixelSurface,
        request: FilterRequest,
    ) -> Result<FilterTask> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| FilterHostError::Worker(e.to_string()))?;
        let (sender, progress) = watch::channel(ProgressEvent::default());
        let sender = Arc::new(sender);
        let host = Arc::clone(self);

        let handle = runtime.spawn_blocking(move || {
            let request = host.complete_request(&request);
            let runner = host.runner(Some(sender));
            let outcome = match entry {
                Some(entry) => runner.run_with_entry_point(&descriptor, entry, &source, &request),
                None => runner.run(&descriptor, &source, &request),
            }?;
            host.remember(&descriptor, &outcome);
            Ok(outcome)
        });
        Ok(FilterTask { progress, handle })
    }

    fn runner(&self, progress: Option<Arc<watch::Sender<ProgressEvent>>>) -> FilterRunner {
        let mut callbacks = self.callbacks.read().clone();
        if let Some(sender) = progress {
            let inner = callbacks.progress.take();
            callbacks.progress = Some(Arc::new(move |event: ProgressEvent| {
                sender.send_replace(event);
                if let Some(inner) = &inner {
                    inner(event);
                }
            }));
        }
        FilterRunner::new(self.config.clone(), callbacks)
    }

    fn complete_request(&self, request: &FilterRequest) -> FilterRequest {
        let mut request = request.clone();
        let profiles = self.profiles.read();
        if request.document_profile.is_none() {
            request.document_profile.clone_from(&profiles.document);
        }
        if request.monitor_profile.is_none() {
            request.monitor_profile.clone_from(&profiles.monitor);
        }
        request
    }

    fn replay_request(
        &self,
        descriptor: &PluginDescriptor,
        request: &FilterRequest,
    ) -> Result<FilterRequest> {
        let saved = self.parameters.get(descriptor).ok_or_else(|| {
            FilterHostError::filter_run_message(format!(
                "No saved parameters for {}",
                descriptor.display_title()
            ))
        })?;
        Ok(FilterRequest {
            replay: Some(saved),
            ..request.clone()
        })
    }

    fn remember(&self, descriptor: &PluginDescriptor, outcome: &FilterOutcome) {
        if outcome.parameters.is_empty() {
            return;
        }
        tracing::debug!(plugin = %descriptor.title(), "Saving filter parameters");
        self.parameters
            .insert(descriptor.clone(), outcome.parameters.clone());
    }
}

impl std::fmt::Debug for FilterHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterHost")
            .field("config", &self.config)
            .field("callbacks", &*self.callbacks.read())
            .field("saved_parameters", &self.parameters.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(title: &str) -> PluginDescriptor {
        PluginDescriptor::builder("cache.8bf")
            .category("Test")
            .title(title)
            .entry_point("PluginMain")
            .build()
    }

    #[test]
    fn test_parameter_cache_keys_by_descriptor() {
        let cache = ParameterCache::new();
        let saved = FilterParameters {
            parameter_data: Some(vec![1, 2]),
            ..FilterParameters::default()
        };
        assert!(cache.insert(descriptor("Blur"), saved.clone()).is_none());
        assert_eq!(cache.get(&descriptor("Blur")), Some(saved));
        assert_eq!(cache.get(&descriptor("Sharpen")), None);
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_repeat_without_saved_parameters_fails() {
        let host = FilterHost::with_defaults();
        let result = host.replay_request(&descriptor("Blur..."), &FilterRequest::default());
        assert!(matches!(
            result,
            Err(FilterHostError::FilterRun { ref message, .. }) if message == "No saved parameters for Blur"
        ));
    }

    #[test]
    fn test_host_profiles_fill_missing_request_profiles() {
        let host = FilterHost::with_defaults();
        host.set_color_profiles(Some(vec![1]), Some(vec![2]));
        let request = FilterRequest {
            monitor_profile: Some(vec![9]),
            ..FilterRequest::default()
        };
        let completed = host.complete_request(&request);
        assert_eq!(completed.document_profile, Some(vec![1]));
        assert_eq!(completed.monitor_profile, Some(vec![9]));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = HostConfig {
            plugin_extension: String::new(),
            ..HostConfig::default()
        };
        assert!(matches!(FilterHost::new(config), Err(FilterHostError::Config(_))));
    }

    #[test]
    fn test_async_run_outside_runtime_fails() {
        let host = Arc::new(FilterHost::with_defaults());
        let source = PixelSurface::new(1, 1, filterhost_surface::SurfaceFormat::Bgra32);
        let Ok(source) = source else {
            panic!("surface");
        };
        let result = host.run_filter_async(descriptor("Blur"), source, FilterRequest::default());
        assert!(matches!(result, Err(FilterHostError::Worker(_))));
    }
}
