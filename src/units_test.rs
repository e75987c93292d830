#![allow(clippy::float_cmp)]

use super::*;

const EPSILON: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

// =============================================================
// Unit
// =============================================================

#[test]
fn unit_default_is_pixel() {
    assert_eq!(Unit::default(), Unit::Pixel);
}

#[test]
fn unit_tokens_round_trip_through_from_str() {
    for unit in Unit::ALL {
        assert_eq!(unit.as_str().parse::<Unit>(), Ok(unit));
    }
}

#[test]
fn unit_from_str_rejects_unknown() {
    assert_eq!("yard".parse::<Unit>(), Err(MeasureError::UnknownUnit("yard".into())));
}

#[test]
fn unit_serde_uses_short_tokens() {
    assert_eq!(serde_json::to_string(&Unit::FootInch).unwrap(), "\"ftin\"");
    let unit: Unit = serde_json::from_str("\"mm\"").unwrap();
    assert_eq!(unit, Unit::Millimeter);
}

#[test]
fn inch_is_ninety_six_pixels() {
    assert_eq!(to_pixels(1.0, Unit::FootInch), 96.0);
}

#[test]
fn foot_uses_fixed_constant() {
    assert_eq!(to_pixels(1.0, Unit::Foot), 1_151.999_999_983_2);
}

#[test]
fn metric_factors_follow_inch_ratio() {
    // 25.4 mm per inch at 96 px per inch.
    assert!((to_pixels(25.4, Unit::Millimeter) - 96.0).abs() < 1e-6);
    assert!((to_pixels(2.54, Unit::Centimeter) - 96.0).abs() < 1e-6);
    assert!((to_pixels(0.0254, Unit::Meter) - 96.0).abs() < 1e-6);
}

#[test]
fn pixel_unit_is_identity() {
    assert_eq!(to_pixels(123.45, Unit::Pixel), 123.45);
    assert_eq!(from_pixels(123.45, Unit::Pixel), 123.45);
}

#[test]
fn linear_units_round_trip() {
    for unit in [Unit::Pixel, Unit::Foot, Unit::Millimeter, Unit::Centimeter, Unit::Meter] {
        for v in [0.5, 1.0, 12.25, 300.0, 9_876.5] {
            let back = from_pixels(to_pixels(v, unit), unit);
            assert!(approx_eq(back, v), "{unit}: {v} -> {back}");
            let shown = format_length(to_pixels(v, unit), unit, Precision::Quarter).unwrap();
            assert_eq!(shown, format!("{v:.2}"));
        }
    }
}

// =============================================================
// Precision
// =============================================================

#[test]
fn precision_default_is_quarter() {
    assert_eq!(Precision::default().denominator(), 4);
}

#[test]
fn precision_parses_fraction_and_bare_forms() {
    assert_eq!("1/16".parse::<Precision>(), Ok(Precision::Sixteenth));
    assert_eq!("32".parse::<Precision>(), Ok(Precision::ThirtySecond));
    assert_eq!(" 1/2 ".parse::<Precision>(), Ok(Precision::Half));
}

#[test]
fn precision_rejects_unsupported_denominators() {
    assert!(matches!("1/3".parse::<Precision>(), Err(MeasureError::UnsupportedPrecision(_))));
    assert!(matches!("quarter".parse::<Precision>(), Err(MeasureError::UnsupportedPrecision(_))));
    assert!(Precision::from_denominator(64).is_err());
}

#[test]
fn precision_displays_as_fraction() {
    assert_eq!(Precision::Eighth.to_string(), "1/8");
}

#[test]
fn precision_serde_uses_fraction_string() {
    assert_eq!(serde_json::to_string(&Precision::Eighth).unwrap(), "\"1/8\"");
    let p: Precision = serde_json::from_str("\"1/16\"").unwrap();
    assert_eq!(p, Precision::Sixteenth);
}

// =============================================================
// parse_foot_inch
// =============================================================

#[test]
fn foot_inch_accepts_all_spellings() {
    for input in ["10'-6\"", "10'-6''", "10'6\"", "10'6''"] {
        assert_eq!(parse_foot_inch(input), Ok(126.0), "{input}");
    }
}

#[test]
fn foot_inch_accepts_inches_only() {
    assert_eq!(parse_foot_inch("6\""), Ok(6.0));
    assert_eq!(parse_foot_inch("6''"), Ok(6.0));
    assert_eq!(parse_foot_inch("80\""), Ok(80.0));
}

#[test]
fn foot_inch_rejects_malformed() {
    for input in ["10-6", "ten feet six", "10'", "10'-\"", "'6\"", "10'-6", "1.5'-6\"", "-3\"", "", "\""] {
        assert!(
            matches!(parse_foot_inch(input), Err(MeasureError::InvalidFormat { unit: Unit::FootInch, .. })),
            "{input:?} should be rejected"
        );
    }
}

// =============================================================
// parse_length
// =============================================================

#[test]
fn parse_length_foot_inch_to_pixels() {
    assert_eq!(parse_length("10'-0\"", Unit::FootInch), Ok(11_520.0));
}

#[test]
fn parse_length_decimal_units() {
    assert_eq!(parse_length("2.5", Unit::Pixel), Ok(2.5));
    assert!(approx_eq(parse_length("1", Unit::Foot).unwrap(), 1_151.999_999_983_2));
}

#[test]
fn parse_length_rejects_non_positive_and_garbage() {
    assert!(parse_length("0", Unit::Meter).is_err());
    assert!(parse_length("-4", Unit::Meter).is_err());
    assert!(parse_length("abc", Unit::Meter).is_err());
    assert!(parse_length("0'-0\"", Unit::FootInch).is_err());
    assert!(parse_length("inf", Unit::Centimeter).is_err());
}

// =============================================================
// get_fraction / quantize_fraction
// =============================================================

#[test]
fn fraction_zero_rounds_up_to_first_step() {
    assert_eq!(get_fraction(0.0, 4).unwrap(), "1/4");
}

#[test]
fn fraction_one_is_full_denominator() {
    assert_eq!(get_fraction(1.0, 4).unwrap(), "4/4");
}

#[test]
fn fraction_boundaries_are_inclusive_upper() {
    assert_eq!(get_fraction(0.25, 4).unwrap(), "1/4");
    assert_eq!(get_fraction(0.2501, 4).unwrap(), "2/4");
    assert_eq!(get_fraction(0.5, 8).unwrap(), "4/8");
}

#[test]
fn fraction_out_of_range_is_error() {
    assert_eq!(get_fraction(1.5, 4), Err(MeasureError::PrecisionOutOfRange(1.5)));
    assert!(get_fraction(-0.1, 4).is_err());
    assert!(get_fraction(f64::NAN, 4).is_err());
}

#[test]
fn fraction_rejects_unsupported_denominators() {
    for denominator in [0, 1, 3, 10, 64] {
        assert_eq!(
            get_fraction(0.5, denominator),
            Err(MeasureError::UnsupportedPrecision(denominator.to_string()))
        );
    }
    assert_eq!(quantize_fraction(0.5, 32), Ok(16));
}

// =============================================================
// format_length
// =============================================================

#[test]
fn format_foot_inch_whole_feet() {
    assert_eq!(format_length(5_760.0, Unit::FootInch, Precision::Quarter).unwrap(), "5'-0\"");
}

#[test]
fn format_foot_inch_with_fraction() {
    // 3'-2.5" = 38.5 in.
    let px = 38.5 * 96.0;
    assert_eq!(format_length(px, Unit::FootInch, Precision::Quarter).unwrap(), "3'-2 2/4\"");
    assert_eq!(format_length(px, Unit::FootInch, Precision::Half).unwrap(), "3'-2 1/2\"");
}

#[test]
fn format_foot_inch_suppresses_small_fraction() {
    let px = 14.05 * 96.0;
    assert_eq!(format_length(px, Unit::FootInch, Precision::Sixteenth).unwrap(), "1'-2\"");
}

#[test]
fn format_foot_inch_carries_full_fraction_into_next_inch() {
    let px = 13.9 * 96.0;
    assert_eq!(format_length(px, Unit::FootInch, Precision::Quarter).unwrap(), "1'-2\"");
}

#[test]
fn format_foot_inch_carries_twelve_inches_into_next_foot() {
    let px = 59.999_999 * 96.0;
    assert_eq!(format_length(px, Unit::FootInch, Precision::Quarter).unwrap(), "5'-0\"");
}

#[test]
fn format_zero_length() {
    assert_eq!(format_length(0.0, Unit::FootInch, Precision::Quarter).unwrap(), "0'-0\"");
    assert_eq!(format_length(0.0, Unit::Pixel, Precision::Quarter).unwrap(), "0.00");
}

#[test]
fn format_pixels_two_decimals() {
    assert_eq!(format_length(300.0, Unit::Pixel, Precision::Quarter).unwrap(), "300.00");
    assert_eq!(format_length(1.005, Unit::Pixel, Precision::Quarter).unwrap().len(), 4);
}

#[test]
fn format_rejects_negative_and_nan() {
    assert_eq!(format_length(-1.0, Unit::Meter, Precision::Quarter), Err(MeasureError::DegenerateGeometry));
    assert!(format_length(f64::NAN, Unit::Pixel, Precision::Quarter).is_err());
}

// =============================================================
// Scale
// =============================================================

#[test]
fn scale_default_is_uncalibrated_pixels() {
    let scale = Scale::default();
    assert_eq!(scale.factor, 1.0);
    assert_eq!(scale.unit, Unit::Pixel);
    assert_eq!(scale.display(42.0).unwrap(), "42.00");
}

#[test]
fn scale_multiplies_before_converting() {
    let scale = Scale { factor: 11_520.0 / 300.0, unit: Unit::FootInch, precision: Precision::Quarter };
    assert_eq!(scale.display(150.0).unwrap(), "5'-0\"");
    assert_eq!(scale.display(300.0).unwrap(), "10'-0\"");
}
