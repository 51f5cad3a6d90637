//! Behavior-driven tests for display formatting
//!
//! Formatting is total: whatever a provider reports, the user sees either a
//! well-formed figure or `N/A`.

use tickerlens_core::format::{currency_symbol, format_percent_change, parse_currency};
use tickerlens_core::{format_field, FieldFormatter, FormatKind, MetaValue, NOT_AVAILABLE};

fn number(value: f64) -> Option<MetaValue> {
    Some(MetaValue::Number(value))
}

// =============================================================================
// Formatting: Magnitudes and Percentages
// =============================================================================

#[test]
fn when_market_cap_is_in_billions_it_renders_with_suffix() {
    // Given: A market cap of 1.5 billion
    let market_cap = number(1_500_000_000.0);

    // When: It is formatted as a large magnitude
    let text = format_field(market_cap.as_ref(), FormatKind::LargeMagnitude);

    // Then: It uses two decimals and a B suffix
    assert_eq!(text, "1.50B");
}

#[test]
fn when_dividend_yield_is_a_fraction_it_renders_as_percent() {
    // Given: A dividend yield reported as a fraction
    let dividend_yield = number(0.0421);

    // When: It is formatted as a percentage
    let text = format_field(dividend_yield.as_ref(), FormatKind::Percentage);

    // Then: It is scaled by 100 with two decimals
    assert_eq!(text, "4.21%");
}

#[test]
fn when_percent_change_is_already_scaled_it_is_not_scaled_again() {
    // Given/When/Then: Price moves are percent figures, not fractions
    assert_eq!(format_percent_change(Some(1.666_666)), "1.67%");
    assert_eq!(format_percent_change(Some(-2.5)), "-2.50%");
    assert_eq!(format_percent_change(None), NOT_AVAILABLE);
}

// =============================================================================
// Formatting: Missing and Malformed Input
// =============================================================================

#[test]
fn when_value_is_missing_every_kind_renders_not_available() {
    // Given: No value at all
    let kinds = [
        FormatKind::Currency,
        FormatKind::Percentage,
        FormatKind::LargeMagnitude,
        FormatKind::Plain,
        FormatKind::Ratio,
        FormatKind::Text,
    ];

    // When/Then: Each format kind renders the marker
    for kind in kinds {
        assert_eq!(format_field(None, kind), "N/A", "{kind:?}");
    }
}

#[test]
fn when_value_is_not_numeric_numeric_kinds_render_not_available() {
    // Given: Text where a number was expected
    let garbage = Some(MetaValue::from("not-a-number"));

    // When/Then: Numeric formats degrade instead of failing
    assert_eq!(format_field(garbage.as_ref(), FormatKind::LargeMagnitude), "N/A");
    assert_eq!(format_field(garbage.as_ref(), FormatKind::Currency), "N/A");
    assert_eq!(format_field(garbage.as_ref(), FormatKind::Ratio), "N/A");
}

#[test]
fn when_value_is_infinite_it_renders_not_available() {
    // Given/When/Then: Non-finite numbers never leak into the display
    assert_eq!(format_field(number(f64::INFINITY).as_ref(), FormatKind::Ratio), "N/A");
    assert_eq!(format_field(number(f64::NAN).as_ref(), FormatKind::Percentage), "N/A");
}

// =============================================================================
// Formatting: Currency
// =============================================================================

#[test]
fn when_currency_is_formatted_and_parsed_back_value_survives_to_the_cent() {
    // Given: A formatter for each supported currency symbol
    for symbol in ["$", "€", "£", "¥"] {
        let formatter = FieldFormatter::new(symbol);

        for value in [0.0, 0.01, 152.5, 1234.567, -1.5] {
            // When: The value is formatted and parsed back
            let text = formatter.number(Some(value), FormatKind::Currency);
            let parsed = parse_currency(&text).expect("parses");

            // Then: It matches to two decimals
            let expected = (value * 100.0_f64).round() / 100.0;
            assert!((parsed - expected).abs() < 1e-9, "{text} -> {parsed}");
        }
    }
}

#[test]
fn when_currency_code_is_known_its_symbol_is_used() {
    // Given/When/Then: ISO codes map to display symbols
    assert_eq!(currency_symbol("USD"), "$");
    assert_eq!(currency_symbol("eur"), "€");
    assert_eq!(currency_symbol("GBP"), "£");
    assert_eq!(FieldFormatter::new(currency_symbol("JPY")).number(Some(150.0), FormatKind::Currency), "¥150.00");

    // And: Unknown codes are shown as a prefix
    assert_eq!(
        FieldFormatter::new(currency_symbol("CHF")).number(Some(9.5), FormatKind::Currency),
        "CHF 9.50"
    );
}

#[test]
fn when_negative_amount_is_formatted_sign_precedes_symbol() {
    // Given/When/Then
    assert_eq!(FieldFormatter::default().number(Some(-1.5), FormatKind::Currency), "-$1.50");
    assert_eq!(FieldFormatter::default().number(Some(-0.001), FormatKind::Currency), "$0.00");
}

#[test]
fn when_a_tiny_negative_move_rounds_to_zero_no_sign_is_shown() {
    // Given: A fractional move too small to survive rounding
    let tiny = number(-0.000_01);

    // When/Then: It renders as an unsigned zero
    assert_eq!(format_field(tiny.as_ref(), FormatKind::Percentage), "0.00%");
    assert_eq!(format_percent_change(Some(-0.001)), "0.00%");
}
