//! Text-mode extraction.
//!
//! A plain-text fragment (or the text rendering of a markup one) is an
//! ordered sequence of trimmed non-empty lines: title, district, street
//! lines, an address line carrying the postal code, then detail tokens.
//! Street lines accumulate until a 5-digit code or a detail keyword shows
//! up; everything from the address boundary on is scanned for labelled
//! details.

use crate::parser::{none_if_empty, PartialListing};
use once_cell::sync::Lazy;
use regex::Regex;

/// Keywords that end street accumulation, in normalized form.
const DETAIL_KEYWORDS: [&str; 4] = ["warmmiete", "kaltmiete", "grosse", "zimmer"];

static ZIP_TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{5}\b").expect("valid regex"));
static ZIP_CITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{5})\b\s*(.*)").expect("valid regex"));

pub(crate) fn extract(lines: &[String]) -> PartialListing {
    let mut street_parts: Vec<String> = Vec::new();
    let mut zip_code = String::new();
    let mut city = String::new();

    let mut index = 2;
    while index < lines.len() {
        let line = &lines[index];
        if ZIP_TOKEN_RE.is_match(line) {
            break;
        }
        let normalized = normalize_keyword_text(line);
        if DETAIL_KEYWORDS
            .iter()
            .any(|keyword| normalized.contains(keyword))
        {
            break;
        }
        street_parts.push(line.clone());
        index += 1;
    }

    if index < lines.len() {
        if let Some((zip, rest, zip_start)) = parse_zip_city(&lines[index]) {
            let candidate = lines[index][..zip_start].trim().trim_end_matches(',');
            if !candidate.is_empty() {
                street_parts.push(candidate.to_string());
            }
            zip_code = zip;
            city = rest;
            index += 1;
        } else {
            // The boundary was a detail keyword with no postal code on it;
            // the line still belongs to the street.
            street_parts.push(lines[index].clone());
            index += 1;
            if index < lines.len() {
                if let Some((zip, rest, zip_start)) = parse_zip_city(&lines[index]) {
                    let candidate = lines[index][..zip_start].trim().trim_end_matches(',');
                    // Guard only: the boundary line above was already pushed,
                    // so the prefix of a late postal line is never adopted.
                    if !candidate.is_empty() && street_parts.is_empty() {
                        street_parts.push(candidate.to_string());
                    }
                    zip_code = zip;
                    city = rest;
                    index += 1;
                }
            }
        }
    }

    let street = street_parts
        .iter()
        .map(|part| part.trim_matches(|c: char| c == ',' || c == ' '))
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string();

    let details = lines.get(index..).unwrap_or(&[]);

    PartialListing {
        title: lines.first().cloned(),
        district: lines.get(1).cloned(),
        street: none_if_empty(street),
        zip_code: none_if_empty(zip_code),
        city: none_if_empty(city),
        total_rent: extract_detail(details, "warmmiete"),
        size: extract_detail(details, "gr\u{f6}\u{df}e"),
        rooms: extract_detail(details, "zimmer"),
    }
}

/// First `\b(\d{5})\b` with the trimmed remainder as city and the match
/// offset into the line.
fn parse_zip_city(line: &str) -> Option<(String, String, usize)> {
    ZIP_CITY_RE.captures(line).map(|caps| {
        let zip = caps.get(1).expect("group 1 always participates");
        (
            zip.as_str().to_string(),
            caps[2].trim().to_string(),
            zip.start(),
        )
    })
}

/// Scan tokens for a case-insensitive label. The value is the remainder of
/// the matching token stripped of separators, or the following token when
/// the label stands alone.
fn extract_detail(tokens: &[String], label: &str) -> Option<String> {
    for (index, token) in tokens.iter().enumerate() {
        let stripped = token.trim();
        let Some(position) = stripped.to_lowercase().find(label) else {
            continue;
        };
        // Lowercasing is byte-stable for the German text these labels occur
        // in; if it ever isn't, the slice misses and we take the next token.
        let value = stripped
            .get(position + label.len()..)
            .map(|rest| rest.trim_matches(|c: char| c == ' ' || c == ':'))
            .unwrap_or("");
        if !value.is_empty() {
            return Some(value.to_string());
        }
        if let Some(next) = tokens.get(index + 1) {
            return none_if_empty(next.trim().to_string());
        }
        // Label on the last token with nothing after it: keep scanning.
    }
    None
}

/// Lowercase and fold German diacritics so keyword checks survive the
/// spellings seen in the wild (`Größe`, `Grösse`, `GROESSE` stay apart but
/// `Größe`/`Grosse` meet at `grosse`).
pub(crate) fn normalize_keyword_text(value: &str) -> String {
    let mut normalized = String::with_capacity(value.len());
    for ch in value.to_lowercase().chars() {
        match ch {
            '\u{df}' => normalized.push_str("ss"),
            '\u{e4}' | '\u{e0}' | '\u{e1}' | '\u{e2}' => normalized.push('a'),
            '\u{f6}' | '\u{f2}' | '\u{f3}' | '\u{f4}' => normalized.push('o'),
            '\u{fc}' | '\u{f9}' | '\u{fa}' | '\u{fb}' => normalized.push('u'),
            '\u{e8}' | '\u{e9}' | '\u{ea}' | '\u{eb}' => normalized.push('e'),
            c if c.is_ascii() => normalized.push(c),
            _ => {}
        }
    }
    normalized
}
