//! Notification mail content.

use mietbot_core::UserProfile;
use mietbot_listing::Listing;

/// One outbound notification mail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// Recipient address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// Plain-text body
    pub body: String,
}

/// Mail telling the operator an application went out.
#[must_use]
pub fn applied_notification(
    to: &str,
    listing: &Listing,
    recipient: &str,
    detail_url: &str,
    profile: &UserProfile,
) -> EmailMessage {
    let title = if listing.title.is_empty() {
        "Unbenanntes Angebot"
    } else {
        &listing.title
    };

    let mut body = String::new();
    body.push_str(&format!("Applied to: {title}\n"));
    if !listing.street.is_empty() || !listing.zip_code.is_empty() {
        body.push_str(&format!(
            "Address: {} {} {}\n",
            listing.street, listing.zip_code, listing.city
        ));
    }
    if !listing.total_rent_raw.is_empty() {
        body.push_str(&format!("Rent: {}\n", listing.total_rent_raw));
    }
    if !listing.size_raw.is_empty() {
        body.push_str(&format!("Size: {}\n", listing.size_raw));
    }
    if !listing.rooms_raw.is_empty() {
        body.push_str(&format!("Rooms: {}\n", listing.rooms_raw));
    }
    body.push_str(&format!("As: {recipient}\n"));
    body.push_str(&format!("Detail page: {detail_url}\n"));
    body.push_str(&format!("\nProfile:\n{profile}\n"));

    EmailMessage {
        to: to.to_string(),
        subject: format!("[Applied] {title}"),
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mietbot_listing::parse;

    fn sample_profile() -> UserProfile {
        UserProfile {
            emails: vec!["anna@example.com".to_string()],
            first_name: "Anna".to_string(),
            last_name: "Muster".to_string(),
            max_rent: 1200.0,
            ..UserProfile::default()
        }
    }

    #[test]
    fn test_applied_notification_contents() {
        let listing = parse(
            "Sunny Flat\nMitte\nTeststr 1\n10115 Berlin\nWarmmiete\n850,00 \u{20ac}\nGr\u{f6}sse\n54 m\u{b2}\nZimmer\n2",
        );
        let mail = applied_notification(
            "notify@example.com",
            &listing,
            "anna@example.com",
            "https://example.org/details/1",
            &sample_profile(),
        );

        assert_eq!(mail.to, "notify@example.com");
        assert_eq!(mail.subject, "[Applied] Sunny Flat");
        assert!(mail.body.contains("anna@example.com"));
        assert!(mail.body.contains("https://example.org/details/1"));
        assert!(mail.body.contains("850,00"));
        assert!(mail.body.contains("Anna Muster"));
    }

    #[test]
    fn test_untitled_listing_gets_placeholder() {
        let listing = parse("");
        let mail = applied_notification(
            "notify@example.com",
            &listing,
            "anna@example.com",
            "https://example.org/details/2",
            &sample_profile(),
        );
        assert_eq!(mail.subject, "[Applied] Unbenanntes Angebot");
    }
}
