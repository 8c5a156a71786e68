#![forbid(unsafe_code)]

//! Loading `PageConfig` from JSON and TOML documents.
//!
//! Run:
//!   cargo test -p pagefx-core --features config --test config_loading

use core::time::Duration;

use pagefx_core::PageConfig;
use pagefx_core::error::ConfigError;
use pretty_assertions::assert_eq;

#[test]
fn empty_documents_yield_defaults() {
    assert_eq!(PageConfig::from_json_str("{}").unwrap(), PageConfig::default());
    assert_eq!(PageConfig::from_toml_str("").unwrap(), PageConfig::default());
}

#[test]
fn toml_overrides_only_named_fields() {
    let config = PageConfig::from_toml_str(
        r#"
        [ticker]
        px_per_sec = 60.0
        min_duration_ms = 6000

        [dropdown]
        accordion_breakpoint_px = 900.0
        "#,
    )
    .unwrap();

    assert_eq!(config.ticker.px_per_sec, 60.0);
    assert_eq!(config.ticker.min_duration(), Duration::from_secs(6));
    assert_eq!(config.ticker.max_fill_passes, 60);
    assert_eq!(config.dropdown.accordion_breakpoint_px, 900.0);
    assert_eq!(config.header, PageConfig::default().header);
}

#[test]
fn json_overrides_nested_sections() {
    let config = PageConfig::from_json_str(
        r#"{ "video": { "replay_top_px": 200.0 }, "preference": { "key": "variant" } }"#,
    )
    .unwrap();
    assert_eq!(config.video.replay_top_px, 200.0);
    assert_eq!(config.preference.key, "variant");
    assert_eq!(config.slogan, PageConfig::default().slogan);
}

#[test]
fn malformed_documents_report_parse_errors() {
    assert!(matches!(
        PageConfig::from_json_str("{ not json"),
        Err(ConfigError::Parse(_))
    ));
    assert!(matches!(
        PageConfig::from_toml_str("[ticker"),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn out_of_range_values_are_rejected_after_parse() {
    let err = PageConfig::from_json_str(r#"{ "reveal": { "threshold": 1.5 } }"#).unwrap_err();
    assert_eq!(
        err,
        ConfigError::Invalid {
            field: "reveal.threshold",
            reason: "must be in [0, 1]",
        }
    );
}

#[test]
fn serialized_defaults_load_back() {
    let json = serde_json::to_string(&PageConfig::default()).unwrap();
    assert_eq!(PageConfig::from_json_str(&json).unwrap(), PageConfig::default());
}

#[test]
fn oversized_slogan_timings_load_without_overflow() {
    let config = PageConfig::from_json_str(
        r#"{ "slogan": { "display_ms": 18446744073709551615, "transition_ms": 420 } }"#,
    )
    .unwrap();
    assert_eq!(config.slogan.display_ms, u64::MAX);
    assert!(config.slogan.interval() > Duration::from_millis(u64::MAX));
}
