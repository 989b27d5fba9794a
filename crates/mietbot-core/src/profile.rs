//! Applicant profile.
//!
//! One profile describes one applicant: the recipient addresses applications
//! are filed under, the filter criteria, and the personal fields the catalog's
//! application form asks for. Profiles are JSON documents; the same document
//! shape is stored verbatim in the remote profile collection.

use crate::error::{ProfileError, ProfileResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// One applicant configuration.
///
/// Loaded once per process run and never mutated by the core. All fields
/// default so partial documents load; [`UserProfile::validate`] decides
/// whether the result is usable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    /// Stable key for the remote profile collection
    pub user_id: Option<String>,
    /// Recipient emails, applied in this order
    pub emails: Vec<String>,
    /// Salutation for the form's select field (e.g. "Frau", "Herr")
    pub salutation: String,
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Street and house number
    pub street: String,
    /// Postal code
    pub zip_code: String,
    /// City
    pub city: String,
    /// Phone number
    pub phone: String,
    /// Upper rent bound in euros
    pub max_rent: f64,
    /// Lower size bound in square meters
    pub min_size: f64,
    /// Lower room-count bound
    pub min_rooms: u32,
    /// Listings whose text contains any of these are skipped
    pub exclude: Vec<String>,
    /// Holds a WBS (housing entitlement certificate)
    pub wbs: bool,
    /// WBS valid-until date, as the form expects it
    pub wbs_date: String,
    /// WBS room entitlement, as the form's select expects it
    pub wbs_rooms: String,
    /// WBS income tier per income certificate §9
    pub wbs_income_tier: String,
    /// WBS marked with special housing need
    pub wbs_special_housing_need: bool,
    /// Address notified after each successful application
    pub notification_email: Option<String>,
}

impl UserProfile {
    /// Load and validate a profile from a JSON file.
    pub fn load_from_file(path: &Path) -> ProfileResult<Self> {
        if !path.exists() {
            return Err(ProfileError::NotFound {
                path: path.display().to_string(),
            });
        }
        tracing::debug!("Loading profile from {}", path.display());
        let contents = fs::read_to_string(path)?;
        let profile: Self = serde_json::from_str(&contents)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Write the profile to a JSON file (pretty-printed).
    pub fn save_to_file(&self, path: &Path) -> ProfileResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Check that the profile can drive an application run.
    ///
    /// # Errors
    /// Returns [`ProfileError::Invalid`] naming the first unusable field.
    pub fn validate(&self) -> ProfileResult<()> {
        if self.emails.iter().all(|e| e.trim().is_empty()) {
            return Err(ProfileError::Invalid {
                field: "emails".to_string(),
                reason: "at least one recipient email is required".to_string(),
            });
        }
        if self.max_rent < 0.0 {
            return Err(ProfileError::Invalid {
                field: "max_rent".to_string(),
                reason: "must not be negative".to_string(),
            });
        }
        if self.min_size < 0.0 {
            return Err(ProfileError::Invalid {
                field: "min_size".to_string(),
                reason: "must not be negative".to_string(),
            });
        }
        Ok(())
    }

    /// Resolve the key this profile is stored under remotely.
    ///
    /// Order: explicit `user_id`, then the notification address, then the
    /// first recipient email. `None` when nothing usable is present.
    #[must_use]
    pub fn resolve_key(&self) -> Option<String> {
        if let Some(id) = self.user_id.as_deref() {
            let id = id.trim();
            if !id.is_empty() {
                return Some(id.to_string());
            }
        }
        if let Some(email) = self.notification_email.as_deref() {
            let email = email.trim();
            if !email.is_empty() {
                return Some(email.to_string());
            }
        }
        self.emails
            .iter()
            .map(|e| e.trim())
            .find(|e| !e.is_empty())
            .map(ToString::to_string)
    }
}

impl fmt::Display for UserProfile {
    /// Operator-facing summary, used in notification mail bodies. Never
    /// includes phone or street to keep forwarded mail lean.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", self.first_name, self.last_name)?;
        writeln!(f, "Recipients: {}", self.emails.join(", "))?;
        writeln!(
            f,
            "Criteria: rent <= {} EUR, size >= {} m2, rooms >= {}",
            self.max_rent, self.min_size, self.min_rooms
        )?;
        write!(f, "WBS: {}", if self.wbs { "yes" } else { "no" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_profile() -> UserProfile {
        UserProfile {
            emails: vec!["anna@example.com".to_string()],
            salutation: "Frau".to_string(),
            first_name: "Anna".to_string(),
            last_name: "Muster".to_string(),
            street: "Musterweg 12".to_string(),
            zip_code: "10115".to_string(),
            city: "Berlin".to_string(),
            phone: "030123456".to_string(),
            max_rent: 1200.0,
            min_size: 50.0,
            min_rooms: 2,
            ..UserProfile::default()
        }
    }

    #[test]
    fn test_roundtrip_through_file() {
        let tmp = TempDir::new().expect("create temp dir");
        let path = tmp.path().join("profile.json");

        let profile = sample_profile();
        profile.save_to_file(&path).expect("save profile");

        let loaded = UserProfile::load_from_file(&path).expect("load profile");
        assert_eq!(loaded.emails, profile.emails);
        assert_eq!(loaded.first_name, "Anna");
        assert!((loaded.max_rent - 1200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let tmp = TempDir::new().expect("create temp dir");
        let result = UserProfile::load_from_file(&tmp.path().join("nope.json"));
        assert!(matches!(result, Err(ProfileError::NotFound { .. })));
    }

    #[test]
    fn test_validate_requires_emails() {
        let mut profile = sample_profile();
        profile.emails.clear();
        let result = profile.validate();
        assert!(matches!(
            result,
            Err(ProfileError::Invalid { field, .. }) if field == "emails"
        ));

        // All-blank entries count as empty too
        profile.emails = vec!["  ".to_string()];
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_partial_document_loads_with_defaults() {
        let json = r#"{ "emails": ["x@example.com"], "max_rent": 900 }"#;
        let profile: UserProfile = serde_json::from_str(json).expect("parse partial profile");
        assert_eq!(profile.min_rooms, 0);
        assert!(!profile.wbs);
        assert!(profile.exclude.is_empty());
    }

    #[test]
    fn test_resolve_key_order() {
        let mut profile = sample_profile();
        profile.user_id = Some("user-1".to_string());
        profile.notification_email = Some("notify@example.com".to_string());
        assert_eq!(profile.resolve_key().as_deref(), Some("user-1"));

        profile.user_id = None;
        assert_eq!(profile.resolve_key().as_deref(), Some("notify@example.com"));

        profile.notification_email = None;
        assert_eq!(profile.resolve_key().as_deref(), Some("anna@example.com"));

        profile.emails.clear();
        assert_eq!(profile.resolve_key(), None);
    }
}
