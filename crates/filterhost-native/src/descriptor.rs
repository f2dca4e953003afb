//! Plug-in descriptors and capability detection.

use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use filterhost_abi::{FilterCase, FilterCaseInfo, FilterCaseInfoTable, SupportedModes};
use filterhost_surface::SurfaceFormat;

use crate::aete::PluginAete;
use crate::enable_info;
use crate::error::{FilterHostError, Result};

/// Pixel formats a caller may ask about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImagePixelFormat {
    /// 1-bit black and white.
    BlackWhite,
    /// 8-bit gray.
    Gray8,
    /// 16-bit gray.
    Gray16,
    /// 32-bit float gray.
    Gray32Float,
    /// 8-bit BGR.
    Bgr24,
    /// 8-bit BGRA.
    Bgra32,
    /// 16-bit RGB.
    Rgb48,
    /// 16-bit RGBA.
    Rgba64,
    /// 32-bit float RGBA.
    Rgba128Float,
}

impl ImagePixelFormat {
    /// Display name used in errors.
    pub fn name(self) -> &'static str {
        match self {
            Self::BlackWhite => "black and white",
            Self::Gray8 => "8-bit grayscale",
            Self::Gray16 => "16-bit grayscale",
            Self::Gray32Float => "32-bit grayscale",
            Self::Bgr24 => "8-bit RGB",
            Self::Bgra32 => "8-bit RGBA",
            Self::Rgb48 => "16-bit RGB",
            Self::Rgba64 => "16-bit RGBA",
            Self::Rgba128Float => "32-bit RGBA",
        }
    }
}

impl From<SurfaceFormat> for ImagePixelFormat {
    fn from(format: SurfaceFormat) -> Self {
        match format {
            SurfaceFormat::Bgra32 => Self::Bgra32,
            SurfaceFormat::Gray16 => Self::Gray16,
        }
    }
}

/// How a plug-in declares the documents it accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability {
    /// An enable-info expression; the mode bitmask is derived from it.
    EnableInfo(String),
    /// A mode bitmask.
    Modes(SupportedModes),
    /// Nothing declared; no mode is supported.
    Undeclared,
}

/// One filter function exported by a module.
///
/// Immutable once built. Two descriptors are equal when their paths match
/// ignoring case and their category, title and entry point match exactly.
#[derive(Debug, Clone)]
pub struct PluginDescriptor {
    path: PathBuf,
    entry_point: String,
    category: String,
    title: String,
    filter_info: Option<FilterCaseInfoTable>,
    aete: Option<Arc<PluginAete>>,
    capability: Capability,
    modes: OnceLock<SupportedModes>,
    has_about_box: bool,
    module_entry_points: Arc<[String]>,
}

impl PluginDescriptor {
    /// Start building a descriptor for the module at `path`.
    pub fn builder(path: impl Into<PathBuf>) -> PluginDescriptorBuilder {
        PluginDescriptorBuilder::new(path)
    }

    /// Module path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Exported entry point name.
    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    /// Menu category as declared.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Menu title as declared.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Category without trailing periods.
    pub fn display_category(&self) -> &str {
        self.category.trim_end_matches('.')
    }

    /// Title without trailing periods, so `"Gaussian..."` shows as `"Gaussian"`.
    pub fn display_title(&self) -> &str {
        self.title.trim_end_matches('.')
    }

    /// Scripting metadata.
    pub fn aete(&self) -> Option<&Arc<PluginAete>> {
        self.aete.as_ref()
    }

    /// Declared capability.
    pub fn capability(&self) -> &Capability {
        &self.capability
    }

    /// Whether the filter has an about box.
    pub fn has_about_box(&self) -> bool {
        self.has_about_box
    }

    /// Every entry point in the same module, in resource order.
    pub fn module_entry_points(&self) -> &[String] {
        &self.module_entry_points
    }

    /// Index of this entry point within its module.
    pub fn plugin_index(&self) -> usize {
        self.module_entry_points
            .iter()
            .position(|e| *e == self.entry_point)
            .unwrap_or(0)
    }

    /// The per-case table, if declared.
    pub fn filter_info(&self) -> Option<&FilterCaseInfoTable> {
        self.filter_info.as_ref()
    }

    /// Handling for `case`. Filters without a table accept every case as is.
    pub fn filter_case_info(&self, case: FilterCase) -> FilterCaseInfo {
        self.filter_info
            .as_ref()
            .and_then(|table| table.get(case.index()).copied())
            .unwrap_or(FilterCaseInfo::PASS_THROUGH)
    }

    /// Whether category, title and entry point are all present.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Check the required fields.
    ///
    /// # Errors
    ///
    /// Returns [`FilterHostError::InvalidDescriptor`] naming the first
    /// missing field.
    pub fn validate(&self) -> Result<()> {
        let reason = if self.category.is_empty() {
            "missing category"
        } else if self.title.is_empty() {
            "missing title"
        } else if self.entry_point.is_empty() {
            "missing entry point"
        } else {
            return Ok(());
        };
        Err(FilterHostError::InvalidDescriptor {
            path: self.path.clone(),
            reason,
        })
    }

    /// Mode bitmask, derived from the enable-info expression on first use.
    pub fn supported_modes(&self) -> SupportedModes {
        *self.modes.get_or_init(|| match &self.capability {
            Capability::Modes(modes) => *modes,
            Capability::EnableInfo(source) if source == "true" => SupportedModes::all(),
            Capability::EnableInfo(source) => enable_info::supported_modes(source)
                .unwrap_or_else(|e| {
                    tracing::warn!(
                        plugin = %self.title,
                        error = %e,
                        "Unparseable enable info; treating as no supported modes"
                    );
                    SupportedModes::empty()
                }),
            Capability::Undeclared => SupportedModes::empty(),
        })
    }

    /// Whether the filter accepts documents in `format`.
    ///
    /// Deep formats re-evaluate the enable-info expression for a 16-bit
    /// document rather than reading the cached bitmask.
    pub fn supports_mode(&self, format: ImagePixelFormat) -> bool {
        match format {
            ImagePixelFormat::BlackWhite | ImagePixelFormat::Gray8 => {
                self.supported_modes().contains(SupportedModes::GRAY_SCALE)
            }
            ImagePixelFormat::Gray16 | ImagePixelFormat::Gray32Float => self.supports_16bit(true),
            ImagePixelFormat::Rgb48
            | ImagePixelFormat::Rgba64
            | ImagePixelFormat::Rgba128Float => self.supports_16bit(false),
            ImagePixelFormat::Bgr24 | ImagePixelFormat::Bgra32 => {
                self.supported_modes().contains(SupportedModes::RGB_COLOR)
            }
        }
    }

    fn supports_16bit(&self, grayscale: bool) -> bool {
        if let Capability::EnableInfo(source) = &self.capability
            && !source.is_empty()
        {
            return enable_info::supports_16bit(source, grayscale).unwrap_or_else(|e| {
                tracing::warn!(plugin = %self.title, error = %e, "Unparseable enable info");
                false
            });
        }
        let flag = if grayscale {
            SupportedModes::GRAY16
        } else {
            SupportedModes::RGB48
        };
        self.supported_modes().contains(flag)
    }

    fn path_key(&self) -> String {
        self.path.to_string_lossy().to_lowercase()
    }
}

impl PartialEq for PluginDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.category == other.category
            && self.entry_point == other.entry_point
            && self.title == other.title
            && self.path_key() == other.path_key()
    }
}

impl Eq for PluginDescriptor {}

impl Hash for PluginDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path_key().hash(state);
        self.category.hash(state);
        self.entry_point.hash(state);
        self.title.hash(state);
    }
}

/// Builder for [`PluginDescriptor`].
#[derive(Debug, Clone)]
pub struct PluginDescriptorBuilder {
    path: PathBuf,
    entry_point: String,
    category: String,
    title: String,
    filter_info: Option<FilterCaseInfoTable>,
    aete: Option<Arc<PluginAete>>,
    capability: Capability,
    has_about_box: bool,
    module_entry_points: Vec<String>,
}

impl PluginDescriptorBuilder {
    /// Start a descriptor for the module at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entry_point: String::new(),
            category: String::new(),
            title: String::new(),
            filter_info: None,
            aete: None,
            capability: Capability::Undeclared,
            has_about_box: true,
            module_entry_points: Vec::new(),
        }
    }

    /// Set the entry point.
    pub fn entry_point(mut self, entry_point: impl Into<String>) -> Self {
        self.entry_point = entry_point.into();
        self
    }

    /// Set the category.
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Set the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the per-case table.
    pub fn filter_info(mut self, table: FilterCaseInfoTable) -> Self {
        self.filter_info = Some(table);
        self
    }

    /// Attach scripting metadata.
    pub fn aete(mut self, aete: PluginAete) -> Self {
        self.aete = Some(Arc::new(aete));
        self
    }

    /// Declare support through an enable-info expression.
    pub fn enable_info(mut self, source: impl Into<String>) -> Self {
        self.capability = Capability::EnableInfo(source.into());
        self
    }

    /// Declare support through a mode bitmask.
    pub fn supported_modes(mut self, modes: SupportedModes) -> Self {
        self.capability = Capability::Modes(modes);
        self
    }

    /// Set whether the filter has an about box.
    pub fn has_about_box(mut self, has_about_box: bool) -> Self {
        self.has_about_box = has_about_box;
        self
    }

    /// Set the module's entry points.
    pub fn module_entry_points(mut self, entry_points: Vec<String>) -> Self {
        self.module_entry_points = entry_points;
        self
    }

    /// Finish. The result is not validated; see [`PluginDescriptor::validate`].
    pub fn build(self) -> PluginDescriptor {
        let module_entry_points = if self.module_entry_points.is_empty() {
            vec![self.entry_point.clone()]
        } else {
            self.module_entry_points
        };
        PluginDescriptor {
            path: self.path,
            entry_point: self.entry_point,
            category: self.category,
            title: self.title,
            filter_info: self.filter_info,
            aete: self.aete,
            capability: self.capability,
            modes: OnceLock::new(),
            has_about_box: self.has_about_box,
            module_entry_points: module_entry_points.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn blur(path: &str) -> PluginDescriptor {
        PluginDescriptor::builder(path)
            .category("Blur")
            .title("Gaussian...")
            .entry_point("PluginMain")
            .build()
    }

    fn hash_of(d: &PluginDescriptor) -> u64 {
        let mut hasher = DefaultHasher::new();
        d.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_path_case_ignored() {
        let a = blur("C:/Filters/Blur.8bf");
        let b = blur("c:/filters/BLUR.8BF");
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_other_fields_are_ordinal() {
        let a = blur("blur.8bf");
        let b = PluginDescriptor::builder("blur.8bf")
            .category("blur")
            .title("Gaussian...")
            .entry_point("PluginMain")
            .build();
        assert_ne!(a, b);
    }

    #[test]
    fn test_display_title_trims_periods() {
        let d = blur("blur.8bf");
        assert_eq!(d.display_title(), "Gaussian");
        assert_eq!(d.title(), "Gaussian...");
    }

    #[test]
    fn test_validation_names_missing_field() {
        let d = PluginDescriptor::builder("x.8bf").category("Blur").build();
        assert!(!d.is_valid());
        assert!(matches!(
            d.validate(),
            Err(FilterHostError::InvalidDescriptor {
                reason: "missing title",
                ..
            })
        ));
    }

    #[test]
    fn test_no_capability_supports_nothing() {
        let d = blur("blur.8bf");
        assert!(!d.supports_mode(ImagePixelFormat::Bgra32));
        assert!(!d.supports_mode(ImagePixelFormat::Gray16));
    }

    #[test]
    fn test_bitmask_capability() {
        let d = PluginDescriptor::builder("x.8bf")
            .supported_modes(SupportedModes::RGB_COLOR | SupportedModes::GRAY16)
            .build();
        assert!(d.supports_mode(ImagePixelFormat::Bgra32));
        assert!(d.supports_mode(ImagePixelFormat::Gray16));
        assert!(!d.supports_mode(ImagePixelFormat::Gray8));
        assert!(!d.supports_mode(ImagePixelFormat::Rgb48));
    }

    #[test]
    fn test_enable_info_true_supports_everything() {
        let d = PluginDescriptor::builder("x.8bf").enable_info("true").build();
        assert_eq!(d.supported_modes(), SupportedModes::all());
        assert!(d.supports_mode(ImagePixelFormat::Gray16));
    }

    #[test]
    fn test_missing_filter_info_passes_through() {
        let d = blur("x.8bf");
        assert_eq!(
            d.filter_case_info(FilterCase::EditableTransparencyNoSelection),
            FilterCaseInfo::PASS_THROUGH
        );
    }

    #[test]
    fn test_plugin_index_within_module() {
        let d = PluginDescriptor::builder("x.8bf")
            .entry_point("Second")
            .module_entry_points(vec!["First".to_string(), "Second".to_string()])
            .build();
        assert_eq!(d.plugin_index(), 1);
    }
}
