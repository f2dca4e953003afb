//! Driving a filter through its selectors.
//!
//! A run follows the legacy protocol:
//!
//! ```text
//! Parameters   (skipped when replaying saved parameters)
//! Prepare
//! Start
//! Continue     (repeated while the plug-in requests rectangles)
//! Finish
//! ```
//!
//! Before `Start` and after every `Continue` the host reads the rectangles
//! and plane ranges the plug-in requested, fills interleaved input, output
//! and mask buffers from the surfaces, and after `Continue` copies the
//! output buffer back, clipped to the image and the selection.
//!
//! 16-bit gray images are staged in the 0..=32768 range plug-ins expect and
//! mapped back afterwards. Images with transparency are flattened when the
//! filter declares it cannot handle their filter case.

use core::ffi::c_void;

use filterhost_abi::{
    AboutRecord, BigDocument, DescriptorParameters, ERROR_STRING_CAPACITY, FilterCase,
    FilterEntryPoint, FilterRecord, Point16, RgbColor, VPoint, VRect, image_mode, play_info,
    procs_version, result_code, selector,
};
use filterhost_surface::{PixelSurface, Rect, SurfaceFormat};
use serde::{Deserialize, Serialize};

use crate::callbacks::HostCallbacks;
use crate::color::ColorProfileConverter;
use crate::config::HostConfig;
use crate::descriptor::{ImagePixelFormat, PluginDescriptor};
use crate::error::{FilterHostError, PluginError, Result};
use crate::module::PluginModule;
use crate::suites::{
    ACTION_DESCRIPTOR_PROCS, DescriptorValues, LeakReport, SP_BASIC_SUITE, SessionContext,
    SessionOptions, SuiteSession, install_record_procs,
};

/// Largest single exchange buffer the host allocates for a plug-in.
const MAX_EXCHANGE_BYTES: u64 = 1 << 31;

/// Parameters a filter saved during a run, replayable on a later run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterParameters {
    /// Contents of the record's parameter handle.
    pub parameter_data: Option<Vec<u8>>,
    /// Contents of the handle the plug-in kept in its data slot.
    pub plugin_data: Option<Vec<u8>>,
    /// Scripting descriptor the plug-in returned.
    pub descriptor: Option<DescriptorValues>,
}

impl FilterParameters {
    /// Whether nothing was saved.
    pub fn is_empty(&self) -> bool {
        self.parameter_data.is_none() && self.plugin_data.is_none() && self.descriptor.is_none()
    }
}

/// What to run a filter on.
#[derive(Debug, Clone)]
pub struct FilterRequest {
    /// Area to filter; the whole image when `None`.
    pub selection: Option<Rect>,
    /// Foreground color.
    pub primary_color: RgbColor,
    /// Background color.
    pub secondary_color: RgbColor,
    /// Saved parameters to replay instead of asking the user.
    pub replay: Option<FilterParameters>,
    /// Let the plug-in show its dialog while replaying.
    pub show_dialog_on_replay: bool,
    /// Document title reported through the property suite.
    pub document_title: String,
    /// ICC profile of the document, for preview color management.
    pub document_profile: Option<Vec<u8>>,
    /// ICC profile of the display, for preview color management.
    pub monitor_profile: Option<Vec<u8>>,
}

impl Default for FilterRequest {
    fn default() -> Self {
        Self {
            selection: None,
            primary_color: RgbColor::from_rgb8(0, 0, 0),
            secondary_color: RgbColor::from_rgb8(255, 255, 255),
            replay: None,
            show_dialog_on_replay: false,
            document_title: "Untitled".to_string(),
            document_profile: None,
            monitor_profile: None,
        }
    }
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    /// The filtered image, in the source's format.
    pub surface: PixelSurface,
    /// Parameters to replay the same filter later.
    pub parameters: FilterParameters,
    /// Resources the plug-in left allocated.
    pub leaks: LeakReport,
}

/// Executes filters against pixel surfaces.
#[derive(Debug, Clone)]
pub struct FilterRunner {
    config: HostConfig,
    callbacks: HostCallbacks,
}

impl FilterRunner {
    /// A runner using `config` and reporting through `callbacks`.
    pub fn new(config: HostConfig, callbacks: HostCallbacks) -> Self {
        Self { config, callbacks }
    }

    /// Load the filter's module and run it on `source`.
    ///
    /// # Errors
    ///
    /// - [`FilterHostError::InvalidDescriptor`] for incomplete descriptors
    /// - [`FilterHostError::UnsupportedMode`] when the filter rejects the format
    /// - [`FilterHostError::Cancelled`] when the user or the abort predicate stops it
    /// - [`FilterHostError::FilterRun`] for load failures and plug-in errors
    pub fn run(
        &self,
        descriptor: &PluginDescriptor,
        source: &PixelSurface,
        request: &FilterRequest,
    ) -> Result<FilterOutcome> {
        check_runnable(descriptor, source)?;
        let module = PluginModule::load(descriptor.path())?;
        let entry = module.entry_point(descriptor.entry_point())?;
        let outcome = self.run_with_entry_point(descriptor, entry, source, request);
        drop(module);
        outcome
    }

    /// Run an entry point that is already resolved.
    ///
    /// `entry` must stay callable for the duration of the call; filters
    /// linked into the host process qualify.
    ///
    /// # Errors
    ///
    /// As [`FilterRunner::run`], minus module loading.
    pub fn run_with_entry_point(
        &self,
        descriptor: &PluginDescriptor,
        entry: FilterEntryPoint,
        source: &PixelSurface,
        request: &FilterRequest,
    ) -> Result<FilterOutcome> {
        check_runnable(descriptor, source)?;
        let title = descriptor.display_title().to_string();

        let filter_rect = match request.selection {
            Some(selection) => {
                let clipped = selection.intersect(&source.bounds());
                if clipped.is_empty() {
                    return Err(FilterHostError::filter_run_message(
                        "The selection does not intersect the image",
                    ));
                }
                clipped
            }
            None => source.bounds(),
        };
        let selection = request.selection.map(|_| filter_rect);

        let mut input = source.clone();
        if input.format() == SurfaceFormat::Gray16 {
            input.scale_to_photoshop_range()?;
        }
        let case = select_case(descriptor, &mut input, selection.is_some())?;
        let layout = PlaneLayout::new(input.format(), case);

        let context = SessionContext::new(
            SessionOptions {
                plugin_title: title.clone(),
                document_title: request.document_title.clone(),
                image_mode: layout.image_mode,
                channel_count: i32::from(layout.planes),
                max_space: self.config.max_space_i32(),
                owner_window: self.config.owner_window,
            },
            self.callbacks.clone(),
        );
        let context = match self.color_converter(request)? {
            Some(converter) => context.with_color_converter(converter),
            None => context,
        };

        let session = SuiteSession::begin(context);
        tracing::info!(
            plugin = %title,
            session = %session.context().id(),
            case = ?case,
            width = source.width(),
            height = source.height(),
            "Running filter"
        );

        let mut exchange = RecordState::new(
            &self.config,
            descriptor,
            &layout,
            case,
            source,
            filter_rect,
            request,
        );
        exchange.restore(&session, request)?;

        let mut driver = Driver {
            entry,
            title: &title,
            state: &mut exchange,
            session: &session,
        };
        let mut output = input.clone();
        driver.execute(request.replay.is_some(), &input, &mut output, selection)?;

        let parameters = exchange.collect(&session);
        let leaks = session.end();

        if output.format() == SurfaceFormat::Gray16 {
            output.from_photoshop_range()?;
        }
        let mut surface = source.clone();
        surface.copy_region_from(&output, filter_rect)?;

        tracing::info!(plugin = %title, "Filter finished");
        Ok(FilterOutcome {
            surface,
            parameters,
            leaks,
        })
    }

    /// Load the filter's module and show its about box.
    ///
    /// # Errors
    ///
    /// [`FilterHostError::FilterRun`] for load failures and plug-in errors.
    pub fn show_about(&self, descriptor: &PluginDescriptor) -> Result<()> {
        descriptor.validate()?;
        if !descriptor.has_about_box() {
            tracing::debug!(plugin = %descriptor.title(), "Filter has no about box");
            return Ok(());
        }
        let module = PluginModule::load(descriptor.path())?;
        let entry = module.entry_point(descriptor.entry_point())?;
        let shown = self.show_about_with_entry_point(descriptor, entry);
        drop(module);
        shown
    }

    /// Show the about box of an entry point that is already resolved.
    ///
    /// # Errors
    ///
    /// [`FilterHostError::FilterRun`] when the plug-in reports an error.
    pub fn show_about_with_entry_point(
        &self,
        descriptor: &PluginDescriptor,
        entry: FilterEntryPoint,
    ) -> Result<()> {
        descriptor.validate()?;
        let session = SuiteSession::begin(SessionContext::new(
            SessionOptions {
                plugin_title: descriptor.display_title().to_string(),
                max_space: self.config.max_space_i32(),
                owner_window: self.config.owner_window,
                ..SessionOptions::default()
            },
            self.callbacks.clone(),
        ));

        let mut about = AboutRecord {
            platform_data: self.config.owner_window as *mut c_void,
            sp_basic_suite: &raw const SP_BASIC_SUITE,
            plugin_ref: descriptor.plugin_index() as isize,
        };
        let mut data: isize = 0;
        let mut result: i16 = 0;
        // SAFETY: `entry` follows the filter ABI; `about`, `data` and
        // `result` outlive the call.
        unsafe { entry(selector::ABOUT, (&raw mut about).cast(), &mut data, &mut result) };
        session.end();

        match result {
            result_code::NO_ERR | result_code::USER_CANCELED => Ok(()),
            code => Err(plugin_failure(
                descriptor.display_title(),
                PluginError {
                    code,
                    selector: selector::ABOUT,
                    message: None,
                },
            )),
        }
    }

    fn color_converter(&self, request: &FilterRequest) -> Result<Option<ColorProfileConverter>> {
        if !self.config.color_management || self.callbacks.preview.is_none() {
            return Ok(None);
        }
        match (&request.document_profile, &request.monitor_profile) {
            (Some(document), Some(monitor)) => {
                ColorProfileConverter::initialize(document, monitor).map(Some)
            }
            _ => Ok(None),
        }
    }
}

fn check_runnable(descriptor: &PluginDescriptor, source: &PixelSurface) -> Result<()> {
    descriptor.validate()?;
    let format = ImagePixelFormat::from(source.format());
    if descriptor.supports_mode(format) {
        Ok(())
    } else {
        Err(FilterHostError::UnsupportedMode {
            title: descriptor.display_title().to_string(),
            mode: format.name(),
        })
    }
}

/// Pick the filter case, flattening alpha when the filter cannot take it.
fn select_case(
    descriptor: &PluginDescriptor,
    input: &mut PixelSurface,
    has_selection: bool,
) -> Result<FilterCase> {
    let transparent = input.format().has_alpha() && input.has_transparency();
    let mut case = FilterCase::select(transparent, has_selection);
    if !descriptor.filter_case_info(case).can_filter() && case.has_transparency() {
        tracing::debug!(plugin = %descriptor.title(), case = ?case, "Flattening transparency");
        input.set_alpha_opaque(input.bounds());
        case = case.flattened();
    }
    if descriptor.filter_case_info(case).can_filter() {
        Ok(case)
    } else {
        Err(FilterHostError::filter_run_message(format!(
            "{} cannot filter this image",
            descriptor.display_title()
        )))
    }
}

fn plugin_failure(title: &str, error: PluginError) -> FilterHostError {
    let message = match &error.message {
        Some(message) if !message.is_empty() => message.clone(),
        _ => format!("{title}: {}", result_code::describe(error.code)),
    };
    FilterHostError::filter_run(message, error)
}

/// How the surface's channels appear to the plug-in.
#[derive(Debug, Clone, Copy)]
struct PlaneLayout {
    image_mode: i16,
    depth: i32,
    planes: i16,
    color_planes: i16,
    transparency: bool,
    bytes_per_sample: usize,
}

impl PlaneLayout {
    fn new(format: SurfaceFormat, case: FilterCase) -> Self {
        match format {
            SurfaceFormat::Bgra32 => {
                let transparency = case.has_transparency();
                Self {
                    image_mode: image_mode::RGB_COLOR,
                    depth: 8,
                    planes: if transparency { 4 } else { 3 },
                    color_planes: 3,
                    transparency,
                    bytes_per_sample: 1,
                }
            }
            SurfaceFormat::Gray16 => Self {
                image_mode: image_mode::GRAY16,
                depth: 16,
                planes: 1,
                color_planes: 1,
                transparency: false,
                bytes_per_sample: 2,
            },
        }
    }
}

/// Byte offset of `plane` inside one pixel of `format`.
fn plane_offset(format: SurfaceFormat, plane: usize) -> Option<usize> {
    match format {
        SurfaceFormat::Bgra32 => [2usize, 1, 0, 3].get(plane).copied(),
        SurfaceFormat::Gray16 => (plane == 0).then_some(0),
    }
}

fn clamp16(value: i64) -> i16 {
    value.clamp(i64::from(i16::MIN), i64::from(i16::MAX)) as i16
}

fn color_bytes(color: RgbColor, grayscale: bool) -> [u8; 4] {
    let [r, g, b] = color.to_rgb8();
    if grayscale {
        let luma = (u32::from(r) * 299 + u32::from(g) * 587 + u32::from(b) * 114 + 500) / 1000;
        [luma as u8, 0, 0, 0]
    } else {
        [r, g, b, 0]
    }
}

/// The record and everything it points to, kept at stable addresses.
struct RecordState {
    record: Box<FilterRecord>,
    big_document: Box<BigDocument>,
    descriptor_parameters: Box<DescriptorParameters>,
    error_string: Box<[u8; ERROR_STRING_CAPACITY]>,
    data: isize,
    layout: PlaneLayout,
}

impl RecordState {
    fn new(
        config: &HostConfig,
        descriptor: &PluginDescriptor,
        layout: &PlaneLayout,
        case: FilterCase,
        source: &PixelSurface,
        filter_rect: Rect,
        request: &FilterRequest,
    ) -> Self {
        let mut state = Self {
            record: Box::new(FilterRecord::empty()),
            big_document: Box::new(BigDocument::new()),
            descriptor_parameters: Box::new(DescriptorParameters {
                descriptor_parameters_version: procs_version::DESCRIPTOR_PARAMETERS,
                play_info: play_info::DISPLAY,
                record_info: play_info::DONT_DISPLAY,
                descriptor: 0,
                action_descriptor_procs: &raw const ACTION_DESCRIPTOR_PROCS,
            }),
            error_string: Box::new([0; ERROR_STRING_CAPACITY]),
            data: 0,
            layout: *layout,
        };

        let size = VPoint {
            v: source.height() as i32,
            h: source.width() as i32,
        };
        let rect = VRect {
            top: filter_rect.y,
            left: filter_rect.x,
            bottom: filter_rect.bottom(),
            right: filter_rect.right(),
        };
        state.big_document.image_size32 = size;
        state.big_document.filter_rect32 = rect;

        let grayscale = layout.image_mode == image_mode::GRAY16;
        let record = &mut *state.record;
        install_record_procs(record);
        record.image_size = Point16 {
            v: clamp16(i64::from(size.v)),
            h: clamp16(i64::from(size.h)),
        };
        record.whole_size = record.image_size;
        record.planes = layout.planes;
        record.filter_rect = rect.to_rect16();
        record.foreground = request.primary_color;
        record.background = request.secondary_color;
        record.fore_color = color_bytes(request.primary_color, grayscale);
        record.back_color = color_bytes(request.secondary_color, grayscale);
        record.max_space = config.max_space_i32();
        record.buffer_space = record.max_space;
        record.image_h_res = 72 << 16;
        record.image_v_res = 72 << 16;
        record.host_sig = config.host_signature;
        record.image_mode = layout.image_mode;
        record.depth = layout.depth;
        record.have_mask = u8::from(request.selection.is_some());
        record.auto_mask = record.have_mask;
        record.platform_data = config.owner_window as *mut c_void;
        record.plugin_ref = descriptor.plugin_index() as isize;
        record.filter_case = case.as_raw();

        if layout.transparency {
            record.in_layer_planes = layout.color_planes;
            record.in_transparency_mask = 1;
            record.out_layer_planes = layout.color_planes;
            record.out_transparency_mask = 1;
        } else {
            record.in_non_layer_planes = layout.color_planes;
            record.out_non_layer_planes = layout.color_planes;
        }

        record.big_document_data = &raw mut *state.big_document;
        record.descriptor_parameters = &raw mut *state.descriptor_parameters;
        record.error_string = state.error_string.as_mut_ptr();
        state
    }

    /// Hand saved parameters back to the plug-in.
    fn restore(&mut self, session: &SuiteSession, request: &FilterRequest) -> Result<()> {
        let Some(replay) = &request.replay else {
            return Ok(());
        };
        let context = session.context();
        let restore_error = |e: crate::suites::SuiteError| {
            FilterHostError::filter_run("Unable to restore the filter parameters", e)
        };
        if let Some(bytes) = &replay.parameter_data {
            self.record.parameters = context.handles().from_bytes(bytes).map_err(restore_error)?;
        }
        if let Some(bytes) = &replay.plugin_data {
            let handle = context.handles().from_bytes(bytes).map_err(restore_error)?;
            self.data = handle as isize;
        }
        if let Some(values) = &replay.descriptor {
            self.descriptor_parameters.descriptor = context
                .descriptors()
                .create_descriptor(values.clone())
                .map_err(restore_error)?;
        }
        self.descriptor_parameters.play_info = if request.show_dialog_on_replay {
            play_info::DISPLAY
        } else {
            play_info::DONT_DISPLAY
        };
        Ok(())
    }

    /// Take the parameters the plug-in left in the record, disposing the
    /// host-side copies.
    fn collect(&mut self, session: &SuiteSession) -> FilterParameters {
        let context = session.context();
        let mut handles = context.handles();
        let mut take = |id: u64| -> Option<Vec<u8>> {
            if id == 0 {
                return None;
            }
            let bytes = handles.bytes(id).map(<[u8]>::to_vec)?;
            handles.dispose(id).ok()?;
            Some(bytes)
        };
        let parameter_data = take(self.record.parameters);
        let plugin_data = take(self.data as u64);
        drop(handles);

        let descriptor_id = self.descriptor_parameters.descriptor;
        let descriptor = if descriptor_id == 0 {
            None
        } else {
            let mut descriptors = context.descriptors();
            let values = descriptors.try_get_descriptor_values(descriptor_id);
            if values.is_some() && descriptors.free(descriptor_id).is_err() {
                tracing::debug!("Descriptor vanished while collecting parameters");
            }
            values
        };
        FilterParameters {
            parameter_data,
            plugin_data,
            descriptor,
        }
    }

    fn clear_buffers(&mut self) {
        let record = &mut *self.record;
        record.in_data = core::ptr::null_mut();
        record.out_data = core::ptr::null_mut();
        record.mask_data = core::ptr::null_mut();
    }

    /// Read a Pascal string the plug-in left in the error buffer.
    fn error_message(&self) -> Option<String> {
        let len = usize::from(*self.error_string.first()?);
        let bytes = self.error_string.get(1..1 + len)?;
        let text = crate::pipl::decode_text(bytes);
        (!text.is_empty()).then_some(text)
    }
}

/// Buffers handed to the plug-in for one `Continue` call.
struct Exchange {
    input: Vec<u8>,
    output: Vec<u8>,
    mask: Vec<u8>,
    out_rect: VRect,
    out_planes: Option<(usize, usize)>,
}

struct Driver<'a> {
    entry: FilterEntryPoint,
    title: &'a str,
    state: &'a mut RecordState,
    session: &'a SuiteSession,
}

impl Driver<'_> {
    fn execute(
        &mut self,
        replaying: bool,
        input: &PixelSurface,
        output: &mut PixelSurface,
        selection: Option<Rect>,
    ) -> Result<()> {
        if !replaying {
            self.call(selector::PARAMETERS)?;
        }
        self.call(selector::PREPARE)?;
        self.check_abort()?;
        self.call(selector::START)?;

        while let Some(exchange) = self.fill(input, output, selection)? {
            self.call(selector::CONTINUE)?;
            self.write_back(&exchange, output, selection);
            self.state.clear_buffers();
            drop(exchange);
            self.check_abort()?;
        }
        self.state.clear_buffers();

        self.call(selector::FINISH)
    }

    fn check_abort(&self) -> Result<()> {
        if self.session.context().is_aborted() {
            tracing::info!(plugin = %self.title, "Filter aborted");
            return Err(FilterHostError::Cancelled);
        }
        Ok(())
    }

    fn call(&mut self, selector: i16) -> Result<()> {
        tracing::debug!(plugin = %self.title, selector = selector::name(selector), "Calling filter");
        let mut result: i16 = 0;
        let record: *mut FilterRecord = &raw mut *self.state.record;
        // SAFETY: `entry` follows the filter ABI. The record and every
        // structure it points to are owned by `self.state` and outlive the
        // call; exchange buffers stay alive until after `write_back`.
        unsafe { (self.entry)(selector, record.cast(), &mut self.state.data, &mut result) };

        match result {
            result_code::NO_ERR => Ok(()),
            result_code::USER_CANCELED => {
                tracing::info!(plugin = %self.title, "Filter cancelled by the user");
                Err(FilterHostError::Cancelled)
            }
            code => {
                let message = if code == result_code::REPORT_STRING {
                    self.state.error_message()
                } else {
                    None
                };
                let error = PluginError {
                    code,
                    selector,
                    message,
                };
                tracing::warn!(plugin = %self.title, error = %error, "Filter reported an error");
                Err(plugin_failure(self.title, error))
            }
        }
    }

    fn requested_rects(&self) -> (VRect, VRect, VRect) {
        let record = &*self.state.record;
        // SAFETY: `big_document_data` points into `self.state`, which is live.
        unsafe {
            (
                record.effective_in_rect(),
                record.effective_out_rect(),
                record.effective_mask_rect(),
            )
        }
    }

    fn plane_range(&self, lo: i16, hi: i16) -> Option<(usize, usize)> {
        let last = self.state.layout.planes - 1;
        let (lo, hi) = (lo.max(0), hi.min(last));
        (lo <= hi).then_some((lo as usize, hi as usize))
    }

    /// Fill buffers for the rectangles the plug-in requested, or `None`
    /// when it requested nothing.
    fn fill(
        &mut self,
        input: &PixelSurface,
        output: &PixelSurface,
        selection: Option<Rect>,
    ) -> Result<Option<Exchange>> {
        let (in_rect, out_rect, mask_rect) = self.requested_rects();
        if in_rect.is_empty() && out_rect.is_empty() && mask_rect.is_empty() {
            return Ok(None);
        }
        let bps = self.state.layout.bytes_per_sample;
        let record = &*self.state.record;
        let in_planes = self.plane_range(record.in_lo_plane, record.in_hi_plane);
        let out_planes = self.plane_range(record.out_lo_plane, record.out_hi_plane);

        let mut exchange = Exchange {
            input: Vec::new(),
            output: Vec::new(),
            mask: Vec::new(),
            out_rect,
            out_planes,
        };
        let (in_row, in_column) = match in_planes {
            Some(planes) if !in_rect.is_empty() => {
                pack(input, in_rect, planes, bps, &mut exchange.input)?
            }
            _ => (0, 0),
        };
        let (out_row, out_column) = match out_planes {
            Some(planes) if !out_rect.is_empty() => {
                pack(output, out_rect, planes, bps, &mut exchange.output)?
            }
            _ => (0, 0),
        };
        let mask_row = match selection {
            Some(selection) if !mask_rect.is_empty() => {
                mask(selection, mask_rect, &mut exchange.mask)?
            }
            _ => 0,
        };

        let record = &mut *self.state.record;
        record.in_data = buffer_ptr(&mut exchange.input);
        record.in_row_bytes = in_row;
        record.in_column_bytes = in_column;
        record.in_plane_bytes = bps as i32;
        record.out_data = buffer_ptr(&mut exchange.output);
        record.out_row_bytes = out_row;
        record.out_column_bytes = out_column;
        record.out_plane_bytes = bps as i32;
        record.mask_data = buffer_ptr(&mut exchange.mask);
        record.mask_row_bytes = mask_row;
        Ok(Some(exchange))
    }

    fn write_back(&self, exchange: &Exchange, output: &mut PixelSurface, selection: Option<Rect>) {
        let Some((lo, hi)) = exchange.out_planes else {
            return;
        };
        if exchange.output.is_empty() {
            return;
        }
        let rect = exchange.out_rect;
        let width = (rect.right - rect.left) as usize;
        let bps = self.state.layout.bytes_per_sample;
        let column = (hi - lo + 1) * bps;
        let format = output.format();
        let bpp = format.bytes_per_pixel();
        let target = selection.unwrap_or_else(|| output.bounds());

        for y in rect.top.max(target.y)..rect.bottom.min(target.bottom()) {
            let Some(row) = output.row_mut(y as u32) else {
                continue;
            };
            for x in rect.left.max(target.x)..rect.right.min(target.right()) {
                let src = ((y - rect.top) as usize * width + (x - rect.left) as usize) * column;
                for plane in lo..=hi {
                    let Some(offset) = plane_offset(format, plane) else {
                        continue;
                    };
                    let dst = x as usize * bpp + offset;
                    let from = src + (plane - lo) * bps;
                    if let (Some(d), Some(s)) = (
                        row.get_mut(dst..dst + bps),
                        exchange.output.get(from..from + bps),
                    ) {
                        d.copy_from_slice(s);
                    }
                }
            }
        }
    }
}

fn buffer_ptr(buffer: &mut Vec<u8>) -> *mut c_void {
    if buffer.is_empty() {
        core::ptr::null_mut()
    } else {
        buffer.as_mut_ptr().cast()
    }
}

fn allocate(width: usize, height: usize, column: usize, into: &mut Vec<u8>) -> Result<()> {
    let total = (width as u64)
        .checked_mul(height as u64)
        .and_then(|n| n.checked_mul(column as u64))
        .filter(|&n| n <= MAX_EXCHANGE_BYTES)
        .ok_or_else(|| {
            FilterHostError::filter_run_message("The filter requested more memory than is available")
        })?;
    *into = vec![0; total as usize];
    Ok(())
}

/// Interleave `planes` of `surface` over `rect` into `into`. Pixels
/// outside the surface read as zero. Returns row and column strides.
fn pack(
    surface: &PixelSurface,
    rect: VRect,
    (lo, hi): (usize, usize),
    bps: usize,
    into: &mut Vec<u8>,
) -> Result<(i32, i32)> {
    let width = (rect.right - rect.left) as usize;
    let height = (rect.bottom - rect.top) as usize;
    let column = (hi - lo + 1) * bps;
    allocate(width, height, column, into)?;

    let format = surface.format();
    let bpp = format.bytes_per_pixel();
    let bounds = surface.bounds();
    for y in rect.top.max(0)..rect.bottom.min(bounds.bottom()) {
        let Some(row) = surface.row(y as u32) else {
            continue;
        };
        for x in rect.left.max(0)..rect.right.min(bounds.right()) {
            let dst = ((y - rect.top) as usize * width + (x - rect.left) as usize) * column;
            for plane in lo..=hi {
                let Some(offset) = plane_offset(format, plane) else {
                    continue;
                };
                let src = x as usize * bpp + offset;
                let at = dst + (plane - lo) * bps;
                if let (Some(d), Some(s)) = (into.get_mut(at..at + bps), row.get(src..src + bps)) {
                    d.copy_from_slice(s);
                }
            }
        }
    }
    Ok((
        i32::try_from(width * column).unwrap_or(i32::MAX),
        column as i32,
    ))
}

/// Selection mask over `rect`: 255 inside the selection, 0 outside.
fn mask(selection: Rect, rect: VRect, into: &mut Vec<u8>) -> Result<i32> {
    let width = (rect.right - rect.left) as usize;
    let height = (rect.bottom - rect.top) as usize;
    allocate(width, height, 1, into)?;
    for (i, value) in into.iter_mut().enumerate() {
        let x = rect.left + (i % width) as i32;
        let y = rect.top + (i / width) as i32;
        if selection.contains(x, y) {
            *value = 255;
        }
    }
    Ok(i32::try_from(width).unwrap_or(i32::MAX))
}
