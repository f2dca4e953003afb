//! Unit tests for ABI types.
//!
//! These tests verify layout, bit assignments and numeric constants that
//! compiled plug-ins depend on.

use filterhost_abi::*;

mod size_and_alignment {
    use super::*;
    use std::mem::{align_of, offset_of, size_of};

    #[test]
    fn test_rect16_layout() {
        assert_eq!(size_of::<Rect16>(), 8);
        assert_eq!(align_of::<Rect16>(), 2);
        assert_eq!(offset_of!(Rect16, top), 0);
        assert_eq!(offset_of!(Rect16, left), 2);
        assert_eq!(offset_of!(Rect16, bottom), 4);
        assert_eq!(offset_of!(Rect16, right), 6);
    }

    #[test]
    fn test_vrect_layout() {
        assert_eq!(size_of::<VRect>(), 16);
        assert_eq!(offset_of!(VRect, right), 12);
    }

    #[test]
    fn test_rgb_color_layout() {
        assert_eq!(size_of::<RgbColor>(), 6);
        assert_eq!(offset_of!(RgbColor, blue), 4);
    }

    #[test]
    fn test_filter_case_info_layout() {
        assert_eq!(size_of::<FilterCaseInfo>(), FilterCaseInfo::SIZE);
        assert_eq!(size_of::<FilterCaseInfoTable>(), 28);
    }

    #[test]
    fn test_supported_modes_is_transparent_u16() {
        assert_eq!(size_of::<SupportedModes>(), 2);
    }

    #[test]
    fn test_record_leads_with_serial_and_procs() {
        assert_eq!(offset_of!(FilterRecord, serial_number), 0);
        assert_eq!(
            offset_of!(FilterRecord, abort_proc),
            size_of::<usize>().max(4)
        );
    }

    #[test]
    fn test_suite_tables_are_pointer_arrays() {
        let ptr = size_of::<usize>();
        assert_eq!(size_of::<PSHandleSuite2>(), size_of::<PSHandleSuite1>() + ptr);
        assert_eq!(size_of::<SPBasicSuite>(), 7 * ptr);
    }
}

mod constants {
    use super::*;

    #[test]
    fn test_selectors() {
        assert_eq!(selector::ABOUT, 0);
        assert_eq!(selector::PARAMETERS, 1);
        assert_eq!(selector::PREPARE, 2);
        assert_eq!(selector::START, 3);
        assert_eq!(selector::CONTINUE, 4);
        assert_eq!(selector::FINISH, 5);
        assert_eq!(selector::name(selector::CONTINUE), "continue");
        assert_eq!(selector::name(42), "unknown");
    }

    #[test]
    fn test_result_codes() {
        assert_eq!(result_code::NO_ERR, 0);
        assert_eq!(result_code::USER_CANCELED, -128);
        assert_eq!(result_code::MEM_FULL, -108);
        assert_eq!(result_code::NIL_HANDLE, -109);
        assert_eq!(result_code::FILTER_BAD_PARAMETERS, -30100);
        assert_eq!(result_code::FILTER_BAD_MODE, -30101);
        assert_eq!(result_code::HOST_INSUFFICIENT, -30900);
        assert_eq!(result_code::REPORT_STRING, -30904);
    }

    #[test]
    fn test_suite_names() {
        assert_eq!(suite::BUFFER, "Photoshop Buffer Suite for Plug-ins");
        assert_eq!(suite::HANDLE, "Photoshop Handle Suite for Plug-ins");
        assert_eq!(suite::UI_HOOKS, "Photoshop UIHooks Suite for Plug-ins");
        assert_eq!(suite::ACTION_DESCRIPTOR, "Photoshop ActionDescriptor Suite");
    }

    #[test]
    fn test_descriptor_type_codes() {
        assert_eq!(descriptor_type::INTEGER.to_be_bytes(), *b"long");
        assert_eq!(descriptor_type::TEXT.to_be_bytes(), *b"TEXT");
    }
}

mod supported_modes {
    use super::*;

    #[test]
    fn test_legacy_bit_assignment() {
        assert_eq!(SupportedModes::BITMAP.bits(), 0x0080);
        assert_eq!(SupportedModes::GRAY_SCALE.bits(), 0x0040);
        assert_eq!(SupportedModes::RGB_COLOR.bits(), 0x0010);
        assert_eq!(SupportedModes::MULTICHANNEL.bits(), 0x0001);
        assert_eq!(SupportedModes::DUOTONE.bits(), 0x8000);
        assert_eq!(SupportedModes::GRAY16.bits(), 0x2000);
        assert_eq!(SupportedModes::RGB48.bits(), 0x1000);
        assert_eq!(SupportedModes::DUOTONE16.bits(), 0x0100);
    }

    #[test]
    fn test_all_bits_cover_every_mode() {
        assert_eq!(SupportedModes::all().bits(), 0xFFFF);
    }

    #[test]
    fn test_from_image_mode() {
        assert_eq!(
            SupportedModes::from_image_mode(image_mode::RGB_COLOR),
            Some(SupportedModes::RGB_COLOR)
        );
        assert_eq!(
            SupportedModes::from_image_mode(image_mode::GRAY16),
            Some(SupportedModes::GRAY16)
        );
        assert_eq!(SupportedModes::from_image_mode(image_mode::RGB96), None);
    }
}

mod filter_case {
    use super::*;

    #[test]
    fn test_select() {
        assert_eq!(
            FilterCase::select(false, false),
            FilterCase::FlatImageNoSelection
        );
        assert_eq!(
            FilterCase::select(false, true),
            FilterCase::FlatImageWithSelection
        );
        assert_eq!(
            FilterCase::select(true, false),
            FilterCase::EditableTransparencyNoSelection
        );
        assert_eq!(
            FilterCase::select(true, true),
            FilterCase::EditableTransparencyWithSelection
        );
    }

    #[test]
    fn test_flattened_keeps_selection() {
        assert_eq!(
            FilterCase::EditableTransparencyWithSelection.flattened(),
            FilterCase::FlatImageWithSelection
        );
        assert_eq!(
            FilterCase::ProtectedTransparencyNoSelection.flattened(),
            FilterCase::FlatImageNoSelection
        );
    }

    #[test]
    fn test_indices_are_dense() {
        for (expected, case) in FilterCase::ALL.iter().enumerate() {
            assert_eq!(case.index(), expected);
        }
    }

    #[test]
    fn test_case_info_can_filter() {
        assert!(!FilterCaseInfo::CANT_FILTER.can_filter());
        assert!(FilterCaseInfo::PASS_THROUGH.can_filter());
        let info = FilterCaseInfo::from_bytes([1, 1, 0b1000, 0]);
        assert!(info.flags().contains(FilterCaseFlags::WRITES_OUTSIDE_SELECTION));
    }
}

mod geometry {
    use super::*;

    #[test]
    fn test_rect16_saturates() {
        let wide = VRect {
            top: -40_000,
            left: 0,
            bottom: 40_000,
            right: 12,
        };
        let narrow = wide.to_rect16();
        assert_eq!(narrow.top, i16::MIN);
        assert_eq!(narrow.bottom, i16::MAX);
        assert_eq!(narrow.right, 12);
    }

    #[test]
    fn test_empty_rects() {
        assert!(Rect16::default().is_empty());
        assert!(
            VRect {
                top: 3,
                left: 0,
                bottom: 3,
                right: 9
            }
            .is_empty()
        );
    }

    #[test]
    fn test_rgb_color_expansion() {
        let color = RgbColor::from_rgb8(255, 128, 0);
        assert_eq!(color.red, 65535);
        assert_eq!(color.green, 128 * 257);
        assert_eq!(color.to_rgb8(), [255, 128, 0]);
    }
}
