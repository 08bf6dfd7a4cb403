//! Profile and privacy models.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::fields::{FieldReader, FromResponse};

/// Business details of an account.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BusinessProfile {
    pub wid: Option<String>,
    pub description: Option<String>,
    pub email: Option<String>,
    pub website: Vec<String>,
    pub category: Option<String>,
    pub address: Option<String>,
    pub extra: Map<String, Value>,
}

impl FromResponse for BusinessProfile {
    fn read(fields: &mut FieldReader<'_>) -> Self {
        Self {
            wid: fields.string(&["wid", "wuid"]),
            description: fields.string(&["description"]),
            email: fields.string(&["email"]),
            website: fields.strings(&["website"]),
            category: fields.string(&["category"]),
            address: fields.string(&["address"]),
            extra: fields.extra(),
        }
    }
}

/// Public profile of an account.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Profile {
    pub wuid: Option<String>,
    pub name: Option<String>,
    pub number: Option<String>,
    pub picture: Option<String>,
    /// The "about" text.
    pub status: Option<String>,
    pub is_business: Option<bool>,
    pub description: Option<String>,
    pub extra: Map<String, Value>,
}

impl FromResponse for Profile {
    fn read(fields: &mut FieldReader<'_>) -> Self {
        // The about text arrives either as a string or as {"status": .., "setAt": ..}.
        let status = match fields.raw(&["status"]) {
            Some(Value::Object(map)) => map.get("status").and_then(Value::as_str).map(str::to_string),
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                fields.violate("status", "expected string or object");
                None
            }
            None => None,
        };

        Self {
            wuid: fields.string(&["wuid", "wid"]),
            name: fields.string(&["name"]),
            number: fields.string(&["number"]),
            picture: fields.string(&["picture", "profilePictureUrl"]),
            status,
            is_business: fields.bool(&["isBusiness", "is_business"]),
            description: fields.string(&["description"]),
            extra: fields.extra(),
        }
    }
}

/// Who can see what.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PrivacySettings {
    /// `all` or `none`.
    #[serde(rename = "readreceipts", skip_serializing_if = "Option::is_none")]
    pub read_receipts: Option<String>,
    /// `all`, `contacts`, `contact_blacklist` or `none`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// `all` or `match_last_seen`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub online: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last: Option<String>,
    #[serde(rename = "groupadd", skip_serializing_if = "Option::is_none")]
    pub group_add: Option<String>,
}

impl FromResponse for PrivacySettings {
    fn read(fields: &mut FieldReader<'_>) -> Self {
        Self {
            read_receipts: fields.string(&["readreceipts", "readReceipts"]),
            profile: fields.string(&["profile"]),
            status: fields.string(&["status"]),
            online: fields.string(&["online"]),
            last: fields.string(&["last"]),
            group_add: fields.string(&["groupadd", "groupAdd"]),
        }
    }
}
