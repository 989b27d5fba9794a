//! Dual-mode fragment parser.
//!
//! A fragment is classified exactly once at entry: anything carrying both an
//! opening and a closing markup delimiter is parsed as markup, everything
//! else as plain text. Each mode is a pure extraction pass producing a
//! partial record; when the markup pass misses rent, size or rooms, a text
//! pass over the same fragment's rendering fills the still-empty fields.
//! Present values always win over the fallback.

use crate::listing::{identity_hash, Listing};
use crate::text;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

/// Parsing mode, decided once per fragment.
#[derive(Debug, Clone, Copy)]
enum Fragment<'a> {
    Markup(&'a str),
    Text(&'a str),
}

impl<'a> Fragment<'a> {
    fn classify(source: &'a str) -> Self {
        if source.contains('<') && source.contains("</") {
            Fragment::Markup(source)
        } else {
            Fragment::Text(source)
        }
    }
}

/// Field values one extraction pass recovered. `None` means the pass found
/// nothing usable: a missing block and an empty value are the same outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct PartialListing {
    pub title: Option<String>,
    pub district: Option<String>,
    pub street: Option<String>,
    pub zip_code: Option<String>,
    pub city: Option<String>,
    pub total_rent: Option<String>,
    pub size: Option<String>,
    pub rooms: Option<String>,
}

impl PartialListing {
    /// Fill fields this pass left empty from a fallback pass. Present values
    /// are never overwritten.
    fn merge_missing_from(self, fallback: PartialListing) -> PartialListing {
        PartialListing {
            title: self.title.or(fallback.title),
            district: self.district.or(fallback.district),
            street: self.street.or(fallback.street),
            zip_code: self.zip_code.or(fallback.zip_code),
            city: self.city.or(fallback.city),
            total_rent: self.total_rent.or(fallback.total_rent),
            size: self.size.or(fallback.size),
            rooms: self.rooms.or(fallback.rooms),
        }
    }

    fn lacks_details(&self) -> bool {
        self.total_rent.is_none() || self.size.is_none() || self.rooms.is_none()
    }
}

static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h2.imageTitle").expect("valid selector"));
static DISTRICT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.area").expect("valid selector"));
static ADDRESS_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.address").expect("valid selector"));
static RENT_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("div.main-property-value.main-property-rent").expect("valid selector")
});
static SIZE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("div.main-property-value.main-property-size").expect("valid selector")
});
static ROOMS_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("div.main-property-value.main-property-rooms").expect("valid selector")
});

// In a markup address the zip must be followed by whitespace and the city;
// embedded in an assembled street any 5-digit token counts.
static ZIP_SPACE_CITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{5})\s+(.*)").expect("valid regex"));
static EMBEDDED_ZIP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{5})\b\s*(.*)").expect("valid regex"));

/// Parse one raw listing fragment into a [`Listing`].
///
/// Total: never fails. Fields the fragment doesn't carry come back as empty
/// strings, and the identity hash is computed over the fragment bytes as
/// given.
#[must_use]
pub fn parse(fragment: &str) -> Listing {
    let mode = Fragment::classify(fragment);

    let rendered = match mode {
        Fragment::Markup(source) => render_text(source),
        Fragment::Text(source) => source.to_string(),
    };
    let lines: Vec<String> = rendered
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect();
    let display_text = lines.join("\n");

    let extracted = match mode {
        Fragment::Markup(source) => {
            let markup = extract_from_markup(source);
            if markup.lacks_details() {
                markup.merge_missing_from(text::extract(&lines))
            } else {
                markup
            }
        }
        Fragment::Text(_) => text::extract(&lines),
    };

    let title = extracted.title.unwrap_or_default();
    let requires_wbs =
        title.to_lowercase().contains("wbs") || display_text.to_lowercase().contains("wbs");

    Listing {
        identity_hash: identity_hash(fragment),
        source_identity: fragment.to_string(),
        title,
        district: extracted.district.unwrap_or_default(),
        street: extracted.street.unwrap_or_default(),
        zip_code: extracted.zip_code.unwrap_or_default(),
        city: extracted.city.unwrap_or_default(),
        total_rent_raw: extracted.total_rent.unwrap_or_default(),
        size_raw: extracted.size.unwrap_or_default(),
        rooms_raw: extracted.rooms.unwrap_or_default(),
        display_text,
        requires_wbs,
    }
}

/// Textual rendering of a markup fragment: every text node becomes its own
/// line, entities already decoded by the parser.
fn render_text(source: &str) -> String {
    let document = Html::parse_fragment(source);
    document
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join("\n")
}

fn extract_from_markup(source: &str) -> PartialListing {
    let document = Html::parse_fragment(source);

    let address_line = select_text(&document, &ADDRESS_SELECTOR);
    let (street, zip_code, city) = address_line
        .as_deref()
        .map(split_address)
        .unwrap_or((None, None, None));

    PartialListing {
        title: select_text(&document, &TITLE_SELECTOR),
        district: select_text(&document, &DISTRICT_SELECTOR),
        street,
        zip_code,
        city,
        total_rent: select_text(&document, &RENT_SELECTOR),
        size: select_text(&document, &SIZE_SELECTOR),
        rooms: select_text(&document, &ROOMS_SELECTOR),
    }
}

/// First match's text nodes, space-joined and whitespace-collapsed.
fn select_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<Vec<_>>().join(" ")))
        .filter(|value| !value.is_empty())
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split a markup address line into street, zip and city.
///
/// Comma-joined parts: one part is all street; with several, the last part is
/// "zip city". A 5-digit code still embedded in the assembled street fills an
/// empty zip/city and is trimmed out of the street.
fn split_address(line: &str) -> (Option<String>, Option<String>, Option<String>) {
    let parts: Vec<&str> = line
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();
    if parts.is_empty() {
        return (None, None, None);
    }

    let mut street;
    let mut zip_code = String::new();
    let mut city = String::new();

    if parts.len() == 1 {
        street = parts[0].to_string();
    } else {
        street = parts[..parts.len() - 1].join(", ");
        let candidate = parts[parts.len() - 1];
        if let Some(caps) = ZIP_SPACE_CITY_RE.captures(candidate) {
            zip_code = caps[1].to_string();
            city = caps[2].trim().to_string();
        } else {
            city = candidate.to_string();
        }
    }

    let embedded = EMBEDDED_ZIP_RE.captures(&street).map(|caps| {
        (
            caps[1].to_string(),
            caps[2].trim().to_string(),
            caps.get(1).map_or(0, |m| m.start()),
        )
    });
    if let Some((zip, rest, zip_start)) = embedded {
        if zip_code.is_empty() {
            zip_code = zip;
        }
        if city.is_empty() {
            city = rest;
        }
        street = street[..zip_start]
            .trim_matches(|c| c == ',' || c == ' ')
            .to_string();
    }

    (
        none_if_empty(street),
        none_if_empty(zip_code),
        none_if_empty(city),
    )
}

pub(crate) fn none_if_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
