//! Backend-owned profile record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::ProfileId;

/// Application user record owned by the backend, at most one per identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: ProfileId,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub verify: bool,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

impl Profile {
    /// Merge a patch into a local copy. Used only when the authoritative
    /// re-fetch after a patch is unavailable.
    pub fn with_patch(mut self, patch: &ProfilePatch) -> Self {
        if let Some(first_name) = &patch.first_name {
            self.first_name = Some(first_name.clone());
        }
        if let Some(last_name) = &patch.last_name {
            self.last_name = Some(last_name.clone());
        }
        if let Some(phone) = &patch.phone {
            self.phone = Some(phone.clone());
        }
        if let Some(city) = &patch.city {
            self.city = Some(city.clone());
        }
        if let Some(nickname) = &patch.nickname {
            self.nickname = Some(nickname.clone());
        }
        self
    }
}

/// Partial update sent with `PUT /users/{id}`. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self == &ProfilePatch::default()
    }
}

/// Names collected by the sign-up form, used to correct the backend record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameHints {
    pub first_name: String,
    pub last_name: String,
}

impl NameHints {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into().trim().to_string(),
            last_name: last_name.into().trim().to_string(),
        }
    }

    /// Display name handed to the identity provider after sign-up.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Patch containing only the hinted names the profile does not already store.
    /// Empty hints never overwrite stored names.
    pub fn corrective_patch(&self, profile: &Profile) -> ProfilePatch {
        fn differs(hint: &str, stored: Option<&String>) -> bool {
            !hint.is_empty() && stored.map(|s| s.trim()) != Some(hint)
        }

        ProfilePatch {
            first_name: differs(&self.first_name, profile.first_name.as_ref())
                .then(|| self.first_name.clone()),
            last_name: differs(&self.last_name, profile.last_name.as_ref())
                .then(|| self.last_name.clone()),
            ..ProfilePatch::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(first: Option<&str>, last: Option<&str>) -> Profile {
        Profile {
            id: ProfileId::from("p-1"),
            first_name: first.map(str::to_string),
            last_name: last.map(str::to_string),
            email: Some("ayse@example.com".into()),
            phone: None,
            city: None,
            nickname: None,
            verify: false,
            is_active: true,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn corrective_patch_is_empty_when_names_match() {
        let hints = NameHints::new("Ayşe", "Yılmaz");
        let patch = hints.corrective_patch(&profile(Some("Ayşe"), Some("Yılmaz")));
        assert!(patch.is_empty());
    }

    #[test]
    fn corrective_patch_only_carries_differing_names() {
        let hints = NameHints::new("Ayşe", "Yılmaz");
        let patch = hints.corrective_patch(&profile(Some("Ayşe"), None));
        assert_eq!(patch.first_name, None);
        assert_eq!(patch.last_name.as_deref(), Some("Yılmaz"));
    }

    #[test]
    fn empty_hints_never_clear_stored_names() {
        let hints = NameHints::new("  ", "");
        let patch = hints.corrective_patch(&profile(Some("Ayşe"), Some("Yılmaz")));
        assert!(patch.is_empty());
    }

    #[test]
    fn profile_deserializes_backend_payload() {
        let json = r#"{
            "id": 7,
            "firstName": "Ayşe",
            "lastName": "Yılmaz",
            "email": "ayse@example.com",
            "phone": null,
            "city": "İzmir",
            "nickname": "ayse",
            "verify": true,
            "isActive": true,
            "createdAt": "2024-03-01T10:00:00Z",
            "updatedAt": "2024-03-02T10:00:00Z"
        }"#;

        let profile: Profile = serde_json::from_str(json).unwrap();

        assert_eq!(profile.id.as_str(), "7");
        assert_eq!(profile.city.as_deref(), Some("İzmir"));
        assert!(profile.verify);
        assert!(profile.created_at.is_some());
    }

    #[test]
    fn patch_serializes_only_present_fields() {
        let patch = ProfilePatch {
            first_name: Some("Ayşe".into()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_string(&patch).unwrap(),
            r#"{"firstName":"Ayşe"}"#
        );
    }
}
