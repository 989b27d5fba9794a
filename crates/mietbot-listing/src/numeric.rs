//! Numeric interpretation of display strings.
//!
//! Rent and size strings stay raw on the listing; these helpers turn them
//! into numbers on demand. Parsing is gated on the unit marker, so a string
//! that never claimed to be a rent comes back as `None` (unknown) rather
//! than a bogus zero.

use once_cell::sync::Lazy;
use regex::Regex;

static INTEGER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid regex"));

/// Parse a rent display string such as `"Warmmiete 1.404,40 €"`.
///
/// Returns `None` when the string carries no `€` marker or no usable number.
#[must_use]
pub fn parse_rent(raw: &str) -> Option<f64> {
    if !raw.contains('\u{20ac}') {
        return None;
    }
    parse_german_decimal(raw)
}

/// Parse a size display string such as `"Größe 54,00 m²"`.
///
/// Returns `None` when the string carries no `m²` marker or no usable number.
#[must_use]
pub fn parse_size(raw: &str) -> Option<f64> {
    if !raw.contains("m\u{b2}") {
        return None;
    }
    parse_german_decimal(raw)
}

/// First integer token of a rooms display string: `"Zimmer2"` -> 2.
#[must_use]
pub fn parse_rooms(raw: &str) -> Option<u32> {
    INTEGER_RE
        .find(raw)
        .and_then(|token| token.as_str().parse().ok())
}

/// German-format decimal: `,` separates decimals and `.` groups thousands.
/// After unifying separators, every dot but the last is grouping and gets
/// dropped, so `"1.404,40"` -> 1404.40 and `"1.404"` -> 1.404.
fn parse_german_decimal(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ','))
        .collect();
    let unified = cleaned.replace(',', ".");

    let separators = unified.matches('.').count();
    let numeric: String = if separators > 1 {
        let mut dropped = 0;
        unified
            .chars()
            .filter(|c| {
                if *c == '.' && dropped < separators - 1 {
                    dropped += 1;
                    false
                } else {
                    true
                }
            })
            .collect()
    } else {
        unified
    };

    numeric.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rent_german_format() {
        let rent = parse_rent("Warmmiete 1.404,40 \u{20ac}").expect("parses");
        assert!((rent - 1404.40).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_rent_requires_currency_marker() {
        assert_eq!(parse_rent("Warmmiete 1.404,40"), None);
        assert_eq!(parse_rent("auf Anfrage"), None);
        assert_eq!(parse_rent(""), None);
    }

    #[test]
    fn test_parse_rent_marker_without_digits() {
        assert_eq!(parse_rent("\u{20ac}"), None);
    }

    #[test]
    fn test_parse_rent_thousands_grouping() {
        let rent = parse_rent("2.100,00 \u{20ac}").expect("parses");
        assert!((rent - 2100.00).abs() < f64::EPSILON);

        // A single separator is read as the decimal point
        let plain = parse_rent("1.404 \u{20ac}").expect("parses");
        assert!((plain - 1.404).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_size() {
        let size = parse_size("Gr\u{f6}\u{df}e 60,09 m\u{b2}").expect("parses");
        assert!((size - 60.09).abs() < f64::EPSILON);

        assert_eq!(parse_size("60,09"), None);
    }

    #[test]
    fn test_parse_rooms_first_integer() {
        assert_eq!(parse_rooms("Zimmer 2"), Some(2));
        assert_eq!(parse_rooms("Zimmer2"), Some(2));
        assert_eq!(parse_rooms("3 Zimmer, 2 Balkone"), Some(3));
        assert_eq!(parse_rooms("keine Angabe"), None);
        assert_eq!(parse_rooms(""), None);
    }
}
