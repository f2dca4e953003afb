//! Property-based tests for ABI value conversions.

use filterhost_abi::*;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_case_info_bytes_preserved(bytes in any::<[u8; 4]>()) {
        let info = FilterCaseInfo::from_bytes(bytes);
        prop_assert_eq!(info.to_bytes(), bytes);
    }

    #[test]
    fn prop_rgb8_expansion_is_exact(r in any::<u8>(), g in any::<u8>(), b in any::<u8>()) {
        prop_assert_eq!(RgbColor::from_rgb8(r, g, b).to_rgb8(), [r, g, b]);
    }

    #[test]
    fn prop_rect16_widening_is_lossless(
        top in any::<i16>(),
        left in any::<i16>(),
        bottom in any::<i16>(),
        right in any::<i16>(),
    ) {
        let rect = Rect16 { top, left, bottom, right };
        prop_assert_eq!(VRect::from_rect16(rect).to_rect16(), rect);
        prop_assert_eq!(VRect::from_rect16(rect).is_empty(), rect.is_empty());
    }

    #[test]
    fn prop_filter_case_selection_consistent(transparent in any::<bool>(), selection in any::<bool>()) {
        let case = FilterCase::select(transparent, selection);
        prop_assert_eq!(case.has_selection(), selection);
        prop_assert_eq!(case.has_transparency(), transparent);
        prop_assert!(!case.flattened().has_transparency());
    }
}
