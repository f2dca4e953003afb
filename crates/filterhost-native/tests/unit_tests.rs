//! Unit tests for descriptors, resource parsing, color profiles and
//! configuration, exercised through the public API.

use filterhost_abi::{FilterCase, FilterCaseInfo, SupportedModes, four_cc, image_mode};
use filterhost_native::enable_info::{self, EvalContext};
use filterhost_native::prelude::*;
use filterhost_native::{
    ColorProfileConverter, IccHeader, PiplError, ProfileRole, parse_aete, parse_pipl,
    profiles_require_correction,
};
use filterhost_surface::{PixelSurface, SurfaceFormat};
use filterhost_test_helpers::prelude::*;

mod pipl {
    use super::*;

    #[test]
    fn test_filter_pipl_fields() -> TestResult {
        let mut table = [FilterCaseInfo::PASS_THROUGH; 7];
        table[FilterCase::FloatingSelection.index()] = FilterCaseInfo::CANT_FILTER;
        let data = PiplBuilder::filter("Sharpen", "Unsharp Mask...", "UnsharpMain")
            .modes(SupportedModes::RGB_COLOR | SupportedModes::GRAY_SCALE)
            .filter_info(table)
            .aete(16000)
            .no_about_box()
            .build();

        let info = parse_pipl(&data)?;
        assert_eq!(info.category, "Sharpen");
        assert_eq!(info.title, "Unsharp Mask...");
        assert_eq!(info.entry_point, "UnsharpMain");
        assert_eq!(
            info.supported_modes,
            Some(SupportedModes::RGB_COLOR | SupportedModes::GRAY_SCALE)
        );
        assert_eq!(info.filter_info, Some(table));
        assert_eq!(info.aete_resource_id, Some(16000));
        assert!(!info.has_about_box);
        Ok(())
    }

    #[test]
    fn test_other_module_kinds_are_not_filters() {
        let data = PiplBuilder::new().kind(*b"8BIF").title("Importer").build();
        assert_eq!(
            parse_pipl(&data),
            Err(PiplError::NotAFilter {
                kind: four_cc(*b"8BIF")
            })
        );
    }

    #[test]
    fn test_foreign_vendor_properties_are_ignored() -> TestResult {
        let data = PiplBuilder::filter("Blur", "Soft", "SoftMain")
            .raw(four_cc(*b"ADBE"), *b"name", vec![4, b'N', b'o', b'p', b'e'])
            .build();
        assert_eq!(parse_pipl(&data)?.title, "Soft");
        Ok(())
    }

    #[test]
    fn test_truncated_pipl() {
        let mut data = PiplBuilder::filter("Blur", "Soft", "SoftMain").build();
        data.truncate(data.len() - 8);
        assert!(matches!(parse_pipl(&data), Err(PiplError::UnexpectedEof { .. })));
    }
}

mod aete {
    use super::*;

    #[test]
    fn test_single_event_with_parameters_and_enums() -> TestResult {
        let data = AeteBuilder::new("Acme", "Ripple the image")
            .event(*b"Acme", *b"Rppl")
            .parameter("Amount", *b"Amnt", *b"long", 0)
            .parameter("Size", *b"Sz  ", *b"Size", 0)
            .enumeration(*b"Size", &[("Small", *b"Smll"), ("Large", *b"Lrg ")])
            .build();

        let aete = must_some(parse_aete(&data)?, "event");
        assert_eq!(aete.event.vendor, "Acme");
        assert_eq!(aete.event.description, "Ripple the image");
        assert_eq!(aete.event.event_type, four_cc(*b"Rppl"));
        assert_eq!(aete.event.parameters.len(), 2);
        let amount = must_some(aete.event.parameter(four_cc(*b"Amnt")), "Amount");
        assert_eq!(amount.name, "Amount");
        assert_eq!(amount.type_code, four_cc(*b"long"));

        let sizes = must_some(aete.event.enums.first(), "enum");
        let names: Vec<&str> = sizes.enums.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Small", "Large"]);
        Ok(())
    }
}

mod descriptors {
    use super::*;

    #[test]
    fn test_display_names_trim_trailing_periods() {
        let descriptor = PluginDescriptor::builder("a.8bf")
            .category("Artistic...")
            .title("Watercolor...")
            .entry_point("Main")
            .build();
        assert_eq!(descriptor.display_category(), "Artistic");
        assert_eq!(descriptor.display_title(), "Watercolor");
        assert_eq!(descriptor.title(), "Watercolor...");
    }

    #[test]
    fn test_validate_reports_first_missing_field() {
        let descriptor = PluginDescriptor::builder("a.8bf").category("Blur").build();
        assert!(matches!(
            descriptor.validate(),
            Err(FilterHostError::InvalidDescriptor { reason: "missing title", .. })
        ));
    }

    #[test]
    fn test_enable_info_drives_mode_support() {
        let descriptor = PluginDescriptor::builder("a.8bf")
            .category("Blur")
            .title("Soft")
            .entry_point("Main")
            .enable_info("in (PSHOP_ImageMode, RGBMode, GrayScaleMode, Gray16Mode)")
            .build();
        assert!(descriptor.supports_mode(ImagePixelFormat::Bgra32));
        assert!(descriptor.supports_mode(ImagePixelFormat::Gray8));
        assert!(descriptor.supports_mode(ImagePixelFormat::Gray16));
        assert!(!descriptor.supports_mode(ImagePixelFormat::Rgb48));
    }

    #[test]
    fn test_missing_capability_supports_nothing() {
        let descriptor = PluginDescriptor::builder("a.8bf")
            .category("Blur")
            .title("Soft")
            .entry_point("Main")
            .build();
        assert!(!descriptor.supports_mode(ImagePixelFormat::Bgra32));
    }

    #[test]
    fn test_module_entry_points_index_about_dispatch() {
        let descriptor = PluginDescriptor::builder("pack.8bf")
            .category("Pack")
            .title("Second")
            .entry_point("SecondMain")
            .module_entry_points(vec!["FirstMain".into(), "SecondMain".into()])
            .build();
        assert_eq!(descriptor.plugin_index(), 1);
    }
}

mod enable_info_expressions {
    use super::*;

    #[test]
    fn test_depth_condition() -> TestResult {
        let expr = enable_info::parse("PSHOP_ImageMode == RGBMode && PSHOP_ImageDepth == 8")?;
        assert!(expr.is_true(&EvalContext::for_mode(image_mode::RGB_COLOR)));
        assert!(!expr.is_true(&EvalContext::for_mode(image_mode::RGB48)));
        Ok(())
    }

    #[test]
    fn test_unknown_identifiers_are_false() -> TestResult {
        let expr = enable_info::parse("PSHOP_SomethingNew")?;
        assert!(!expr.is_true(&EvalContext::for_mode(image_mode::RGB_COLOR)));
        Ok(())
    }

    #[test]
    fn test_unbalanced_parenthesis_is_an_error() {
        assert!(enable_info::parse("(true").is_err());
    }
}

mod color_profiles {
    use super::*;

    #[test]
    fn test_header_parse_and_compare() -> TestResult {
        let rgb = IccHeaderBuilder::rgb().build();
        let header = IccHeader::parse(&rgb, ProfileRole::Document)?;
        assert!(!header.is_gray());
        assert_eq!(header.size, 128);

        let gray = IccHeaderBuilder::gray().build();
        assert!(profiles_require_correction(&rgb, &gray)?);
        assert!(!profiles_require_correction(&rgb, &rgb)?);
        let intent = IccHeaderBuilder::rgb().rendering_intent(1).build();
        assert!(profiles_require_correction(&rgb, &intent)?);
        Ok(())
    }

    #[test]
    fn test_bad_signature_is_rejected() {
        let bytes = IccHeaderBuilder::rgb().signature(*b"xxxx").build();
        assert!(IccHeader::parse(&bytes, ProfileRole::Monitor).is_err());
    }

    #[test]
    fn test_identical_profiles_need_no_transform() -> TestResult {
        let profile = IccHeaderBuilder::rgb().size(256).build();
        let converter = ColorProfileConverter::initialize(&profile, &profile)?;
        assert!(!converter.correction_required());
        assert!(!converter.has_transform());
        assert!(!converter.has_open_profiles());

        let source = solid_bgra(2, 2, [1, 2, 3, 255]);
        let mut destination = PixelSurface::new(2, 2, SurfaceFormat::Bgra32)?;
        assert!(!converter.color_correct_bgra(&source, &mut destination)?);
        assert_eq!(destination.bgra_at(0, 0), Some([0, 0, 0, 0]));
        Ok(())
    }

    fn srgb_and_display_p3() -> std::result::Result<(Vec<u8>, Vec<u8>), moxcms::CmsError> {
        Ok((
            moxcms::ColorProfile::new_srgb().encode()?,
            moxcms::ColorProfile::new_display_p3().encode()?,
        ))
    }

    #[test]
    fn test_distinct_engine_profiles_require_correction() -> TestResult {
        let (document, monitor) = srgb_and_display_p3()?;
        assert!(profiles_require_correction(&document, &monitor)?);
        assert!(!profiles_require_correction(&document, &document)?);

        let converter = ColorProfileConverter::initialize(&document, &monitor)?;
        assert!(converter.correction_required());
        assert!(converter.has_transform());
        assert!(converter.has_open_profiles());
        Ok(())
    }

    #[test]
    fn test_bgra_correction_keeps_alpha() -> TestResult {
        let (document, monitor) = srgb_and_display_p3()?;
        let converter = ColorProfileConverter::initialize(&document, &monitor)?;

        let source = solid_bgra(3, 2, [0, 0, 255, 77]);
        let mut destination = PixelSurface::new(3, 2, SurfaceFormat::Bgra32)?;
        assert!(converter.color_correct_bgra(&source, &mut destination)?);

        for (x, y) in [(0, 0), (2, 1)] {
            let [b, g, r, a] = must_some(destination.bgra_at(x, y), "pixel");
            assert_eq!(a, 77);
            assert!(r > 200, "red channel {r}");
            assert!(b < 100 && g < 100, "blue {b} green {g}");
            assert_ne!([b, g, r], [0, 0, 255]);
        }
        Ok(())
    }

    #[test]
    fn test_grayscale_correction_writes_opaque_gray() -> TestResult {
        let (document, monitor) = srgb_and_display_p3()?;
        let converter = ColorProfileConverter::initialize(&document, &monitor)?;

        let stride = 4;
        let source = vec![200u8; stride * 2];
        let mut destination = PixelSurface::new(3, 2, SurfaceFormat::Bgra32)?;
        assert!(converter.color_correct_grayscale(&source, stride, &mut destination)?);

        let [b, g, r, a] = must_some(destination.bgra_at(1, 1), "pixel");
        assert_eq!(a, 255);
        assert!(b.abs_diff(g) <= 2 && g.abs_diff(r) <= 2, "{b} {g} {r}");
        assert!(r.abs_diff(200) <= 4, "gray level {r}");
        Ok(())
    }

    #[test]
    fn test_dispose_releases_transform_and_profiles() -> TestResult {
        let (document, monitor) = srgb_and_display_p3()?;
        let mut converter = ColorProfileConverter::initialize(&document, &monitor)?;
        converter.dispose();
        assert!(!converter.has_transform());
        assert!(!converter.has_open_profiles());

        let source = solid_bgra(1, 1, [0, 0, 255, 77]);
        let mut destination = PixelSurface::new(1, 1, SurfaceFormat::Bgra32)?;
        assert!(!converter.color_correct_bgra(&source, &mut destination)?);
        converter.dispose();
        Ok(())
    }

    #[test]
    fn test_truncated_profile_fails_initialization() {
        let profile = IccHeaderBuilder::rgb().build();
        let result = ColorProfileConverter::initialize(&profile[..64], &profile);
        assert!(matches!(result, Err(FilterHostError::FilterRun { .. })));
    }
}

mod config {
    use super::*;

    #[test]
    fn test_json_round_trip_with_defaults() -> TestResult {
        let config =
            HostConfig::from_json_str(r#"{"plugin_extension": "8bf", "follow_links": false}"#)?;
        assert!(!config.follow_links);
        assert!(config.search_subdirectories);
        let json = config.to_json_string()?;
        assert_eq!(HostConfig::from_json_str(&json)?, config);
        Ok(())
    }

    #[test]
    fn test_presets() {
        assert!(HostConfig::strict().require_valid_descriptors);
        assert!(!HostConfig::strict().follow_links);
        assert!(!HostConfig::permissive().require_valid_descriptors);
    }

    #[test]
    fn test_dotted_extension_is_invalid() {
        let config = HostConfig {
            plugin_extension: ".8bf".to_string(),
            ..HostConfig::default()
        };
        assert!(matches!(config.validate(), Err(FilterHostError::Config(_))));
    }
}
