//! Snapshot tests for user-facing error messages.

use std::path::PathBuf;

use filterhost_abi::{result_code, selector};
use filterhost_native::suites::SuiteError;
use filterhost_native::{
    ColorProfileError, EnableInfoError, FilterHostError, PiplError, PluginError, ProfileRole,
};

#[test]
fn snapshot_invalid_descriptor_message() {
    let err = FilterHostError::InvalidDescriptor {
        path: PathBuf::from("plugins/blur.8bf"),
        reason: "missing entry point",
    };
    insta::assert_snapshot!(
        err.to_string(),
        @"Invalid plug-in descriptor for plugins/blur.8bf: missing entry point"
    );
}

#[test]
fn snapshot_unsupported_mode_message() {
    let err = FilterHostError::UnsupportedMode {
        title: "Gaussian".to_string(),
        mode: "16-bit grayscale",
    };
    insta::assert_snapshot!(err.to_string(), @"Gaussian does not support 16-bit grayscale images");
}

#[test]
fn snapshot_cancelled_message() {
    insta::assert_snapshot!(FilterHostError::Cancelled.to_string(), @"The filter was cancelled");
}

#[test]
fn snapshot_plugin_error_display() {
    let err = PluginError {
        code: result_code::FILTER_BAD_MODE,
        selector: selector::START,
        message: None,
    };
    insta::assert_snapshot!(
        err.to_string(),
        @"the filter does not support this image mode (code -30101 during start)"
    );
}

#[test]
fn snapshot_plugin_error_prefers_own_message() {
    let err = PluginError {
        code: result_code::REPORT_STRING,
        selector: selector::PARAMETERS,
        message: Some("Radius must be positive".to_string()),
    };
    insta::assert_snapshot!(
        err.to_string(),
        @"Radius must be positive (code -30904 during parameters)"
    );
}

#[test]
fn snapshot_profile_errors() {
    let truncated = ColorProfileError::Truncated {
        role: ProfileRole::Document,
        len: 12,
    };
    insta::assert_snapshot!(truncated.to_string(), @"document profile is truncated: 12 bytes");

    let signature = ColorProfileError::BadSignature {
        role: ProfileRole::Monitor,
        signature: 0x6162_6364,
    };
    insta::assert_snapshot!(
        signature.to_string(),
        @"monitor profile has an invalid signature 0x61626364"
    );
}

#[test]
fn snapshot_pipl_errors() {
    insta::assert_snapshot!(
        PiplError::NotAFilter { kind: 0x3842_4946 }.to_string(),
        @"not a filter module (kind 0x38424946)"
    );
    insta::assert_snapshot!(
        PiplError::UnexpectedEof { offset: 40 }.to_string(),
        @"unexpected end of data at offset 40"
    );
}

#[test]
fn snapshot_enable_info_error() {
    let err = EnableInfoError::UnexpectedToken {
        found: "end of input".to_string(),
        expected: "')'",
        position: 17,
    };
    insta::assert_snapshot!(err.to_string(), @"unexpected end of input at 17, expected ')'");
}

#[test]
fn snapshot_suite_errors() {
    let space = SuiteError::OutOfSpace {
        requested: 4096,
        available: 1024,
    };
    insta::assert_snapshot!(space.to_string(), @"requested 4096 bytes but only 1024 are available");

    let missing = SuiteError::SuiteNotFound {
        name: "Photoshop Channel Ports Suite".to_string(),
        version: 3,
    };
    insta::assert_snapshot!(
        missing.to_string(),
        @r#"suite "Photoshop Channel Ports Suite" version 3 is not provided"#
    );
}
