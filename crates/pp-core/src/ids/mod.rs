//! Identifier newtypes.
//!
//! `IdentityId` is issued by the identity provider, `ProfileId` by the backend.
//! The two are never interchangeable even though both are plain strings on the wire.

mod id_macro;

use serde::{Deserialize, Deserializer, Serialize};

use id_macro::impl_id;

/// Provider-issued principal id (`localId` / `uid`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityId(String);

/// Backend-owned profile record id.
///
/// The backend may hand out numeric ids; they are kept in their decimal text form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ProfileId(String);

impl<'de> Deserialize<'de> for ProfileId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => Self(s),
            RawId::Number(n) => Self(n.to_string()),
        })
    }
}

impl_id!(IdentityId, ProfileId);
