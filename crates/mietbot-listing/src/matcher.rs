//! Profile criteria applied to a parsed listing.
//!
//! All checks run unconditionally so the outcome carries every reason a
//! listing was rejected, not just the first. A threshold whose listing value
//! could not be parsed passes by default: the operator would rather see one
//! application too many than silently skip a plausible flat.

use crate::listing::Listing;
use crate::numeric;
use mietbot_core::UserProfile;
use std::fmt;

/// One reason a listing does not fit a profile.
#[derive(Debug, Clone, PartialEq)]
pub enum CriterionFailure {
    /// Exclude keywords found in the listing text.
    ExcludedKeywords {
        /// The profile keywords that matched, in profile order.
        keywords: Vec<String>,
    },
    /// The listing demands a WBS certificate the profile does not hold.
    RequiresWbs,
    /// Parsed rent above the profile limit.
    RentTooHigh {
        /// Parsed warm rent in euros.
        rent: f64,
        /// Profile limit in euros.
        max_rent: f64,
    },
    /// Parsed size below the profile minimum.
    SizeTooSmall {
        /// Parsed size in square meters.
        size: f64,
        /// Profile minimum in square meters.
        min_size: f64,
    },
    /// Parsed room count below the profile minimum.
    TooFewRooms {
        /// Parsed room count.
        rooms: u32,
        /// Profile minimum.
        min_rooms: u32,
    },
}

impl fmt::Display for CriterionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExcludedKeywords { keywords } => {
                write!(f, "matches exclude keyword(s) {}", keywords.join(", "))
            }
            Self::RequiresWbs => write!(f, "requires a WBS certificate"),
            Self::RentTooHigh { rent, max_rent } => {
                write!(f, "rent {rent:.2} above the {max_rent:.2} limit")
            }
            Self::SizeTooSmall { size, min_size } => {
                write!(f, "size {size:.2} below the {min_size:.2} minimum")
            }
            Self::TooFewRooms { rooms, min_rooms } => {
                write!(f, "{rooms} room(s) below the minimum of {min_rooms}")
            }
        }
    }
}

/// Outcome of matching one listing against one profile.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    /// Every failed criterion, in check order.
    pub failures: Vec<CriterionFailure>,
}

impl MatchOutcome {
    /// Whether the listing fits the profile.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// The first failure, the one worth a log line when skipping.
    #[must_use]
    pub fn primary_reason(&self) -> Option<&CriterionFailure> {
        self.failures.first()
    }
}

/// Match a listing against a profile.
///
/// Checks run in a fixed order: exclude keywords over the display text, WBS
/// eligibility, then the rent, size and room thresholds. Blank exclude
/// keywords are ignored.
#[must_use]
pub fn evaluate(listing: &Listing, profile: &UserProfile) -> MatchOutcome {
    let mut failures = Vec::new();

    let text = listing.display_text.to_lowercase();
    let keywords: Vec<String> = profile
        .exclude
        .iter()
        .filter(|keyword| {
            let keyword = keyword.trim().to_lowercase();
            !keyword.is_empty() && text.contains(&keyword)
        })
        .cloned()
        .collect();
    if !keywords.is_empty() {
        failures.push(CriterionFailure::ExcludedKeywords { keywords });
    }

    if listing.requires_wbs && !profile.wbs {
        failures.push(CriterionFailure::RequiresWbs);
    }

    if let Some(rent) = numeric::parse_rent(&listing.total_rent_raw) {
        if rent > profile.max_rent {
            failures.push(CriterionFailure::RentTooHigh {
                rent,
                max_rent: profile.max_rent,
            });
        }
    }

    if let Some(size) = numeric::parse_size(&listing.size_raw) {
        if size < profile.min_size {
            failures.push(CriterionFailure::SizeTooSmall {
                size,
                min_size: profile.min_size,
            });
        }
    }

    if let Some(rooms) = numeric::parse_rooms(&listing.rooms_raw) {
        if rooms < profile.min_rooms {
            failures.push(CriterionFailure::TooFewRooms {
                rooms,
                min_rooms: profile.min_rooms,
            });
        }
    }

    MatchOutcome { failures }
}
