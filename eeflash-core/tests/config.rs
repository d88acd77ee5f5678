//! Loading `EepromConfig` from TOML

#![cfg(feature = "serde")]

use eeflash_core::{ConfigError, EepromConfig, FlashGeometry, Poll};

fn samd21j18() -> FlashGeometry {
    FlashGeometry::new(64, 4096, 256).unwrap()
}

#[test]
fn test_parse_full_config() {
    let config: EepromConfig = toml::from_str(
        r#"
        region_address = 0x3F000
        region_length = 1024
        flag_address = 0x3EF00
        poll_limit = 100000
        "#,
    )
    .unwrap();

    assert_eq!(
        config,
        EepromConfig::new(0x3_F000, 1024, 0x3_EF00).with_poll_limit(100_000)
    );
    assert_eq!(config.poll(), Poll::bounded(100_000));
    assert!(config.validate(&samd21j18()).is_ok());
}

#[test]
fn test_poll_limit_defaults_to_unbounded() {
    let config: EepromConfig = toml::from_str(
        r#"
        region_address = 0x3F000
        region_length = 1024
        flag_address = 0x3EF00
        "#,
    )
    .unwrap();
    assert_eq!(config.poll_limit, None);
    assert_eq!(config.poll(), Poll::unbounded());
}

#[test]
fn test_missing_field_is_rejected() {
    let result: Result<EepromConfig, _> = toml::from_str("region_address = 0\nregion_length = 16");
    assert!(result.is_err());
}

#[test]
fn test_parsed_config_still_validated() {
    let config: EepromConfig = toml::from_str(
        r#"
        region_address = 0x3F000
        region_length = 1024
        flag_address = 0x3F200
        "#,
    )
    .unwrap();
    assert_eq!(
        config.validate(&samd21j18()),
        Err(ConfigError::FlagOverlapsRegion)
    );
}

#[test]
fn test_serialize_round_trip_through_toml() {
    let config = EepromConfig::reserve_top(&samd21j18(), 512).unwrap();
    let text = toml::to_string(&config).unwrap();
    let parsed: EepromConfig = toml::from_str(&text).unwrap();
    assert_eq!(parsed, config);
}
