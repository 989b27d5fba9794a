//! Processing order for one page of listings.

use crate::listing::Listing;
use crate::numeric;
use std::cmp::Ordering;

/// One listing's place in the processing order. `index` points back into the
/// enumeration the entries were built from.
#[derive(Debug, Clone)]
pub struct SortedEntry {
    /// Position of the listing row at enumeration time.
    pub index: usize,
    /// Parsed rent, `f64::INFINITY` when unknown.
    pub rent_key: f64,
    /// Rent string for operator logs, `"unknown"` when the listing has none.
    pub display_rent: String,
    /// Title for operator logs, with a positional fallback.
    pub title: String,
}

/// Order listings cheapest-first.
///
/// Unknown rents sort last, and equal rents fall back to the lowercased
/// title. The sort is stable, so fully tied entries keep enumeration order.
#[must_use]
pub fn sorted_by_rent(listings: &[Listing]) -> Vec<SortedEntry> {
    let mut entries: Vec<SortedEntry> = listings
        .iter()
        .enumerate()
        .map(|(index, listing)| {
            let rent_key = numeric::parse_rent(&listing.total_rent_raw).unwrap_or(f64::INFINITY);
            let display_rent = if listing.total_rent_raw.is_empty() {
                "unknown".to_string()
            } else {
                listing.total_rent_raw.clone()
            };
            let title = if listing.title.is_empty() {
                format!("Listing #{}", index + 1)
            } else {
                listing.title.clone()
            };
            SortedEntry {
                index,
                rent_key,
                display_rent,
                title,
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        a.rent_key
            .partial_cmp(&b.rent_key)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
    });
    entries
}
