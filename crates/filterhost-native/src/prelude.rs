//! Convenience re-exports for common types.

pub use crate::callbacks::{HostCallbacks, PreviewFrame, ProgressEvent};
pub use crate::config::HostConfig;
pub use crate::descriptor::{ImagePixelFormat, PluginDescriptor};
pub use crate::error::{FilterHostError, PluginError, Result};
pub use crate::host::{FilterHost, FilterTask, ParameterCache};
pub use crate::pipl::PiplSource;
pub use crate::run::{FilterOutcome, FilterParameters, FilterRequest, FilterRunner};
pub use crate::suites::{DescriptorValue, LeakReport};
