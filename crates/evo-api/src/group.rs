//! Group metadata, participants, and group payloads.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::fields::{FieldReader, FromResponse};

open_enum! {
    /// Admin role of a participant. Plain members carry no role.
    pub enum ParticipantRole {
        Admin => "admin",
        SuperAdmin => "superadmin",
    }
}

/// A group member.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupParticipant {
    pub id: String,
    pub role: Option<ParticipantRole>,
    pub extra: Map<String, Value>,
}

impl FromResponse for GroupParticipant {
    fn read(fields: &mut FieldReader<'_>) -> Self {
        Self {
            id: fields.required_string(&["id", "jid"]),
            role: fields.enumeration(&["admin", "role"]),
            extra: fields.extra(),
        }
    }
}

impl GroupParticipant {
    /// Returns true for admins and the super admin.
    pub fn is_admin(&self) -> bool {
        matches!(
            self.role,
            Some(ParticipantRole::Admin) | Some(ParticipantRole::SuperAdmin)
        )
    }
}

/// Group metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Group {
    /// The group JID, ending in `@g.us`.
    pub id: String,
    pub subject: Option<String>,
    pub subject_owner: Option<String>,
    pub subject_time: Option<i64>,
    pub owner: Option<String>,
    pub description: Option<String>,
    pub picture_url: Option<String>,
    pub size: Option<i64>,
    /// Unix seconds.
    pub creation: Option<i64>,
    /// Only admins can edit group info.
    pub restrict: Option<bool>,
    /// Only admins can send messages.
    pub announce: Option<bool>,
    pub participants: Vec<GroupParticipant>,
    pub extra: Map<String, Value>,
}

impl FromResponse for Group {
    fn read(fields: &mut FieldReader<'_>) -> Self {
        Self {
            id: fields.required_string(&["id", "groupJid", "jid"]),
            subject: fields.string(&["subject"]),
            subject_owner: fields.string(&["subjectOwner", "subject_owner"]),
            subject_time: fields.int(&["subjectTime", "subject_time"]),
            owner: fields.string(&["owner"]),
            description: fields.string(&["desc", "description"]),
            picture_url: fields.string(&["pictureUrl", "picture_url"]),
            size: fields.int(&["size"]),
            creation: fields.int(&["creation"]),
            restrict: fields.bool(&["restrict"]),
            announce: fields.bool(&["announce"]),
            participants: fields.list(&["participants"]),
            extra: fields.extra(),
        }
    }
}

impl Group {
    /// Admins of the group, when participants were fetched.
    pub fn admins(&self) -> impl Iterator<Item = &GroupParticipant> {
        self.participants.iter().filter(|p| p.is_admin())
    }
}

/// A group's invite link.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InviteCode {
    pub invite_code: Option<String>,
    pub invite_url: Option<String>,
    /// Set by revoke calls.
    pub revoked: Option<bool>,
}

impl FromResponse for InviteCode {
    fn read(fields: &mut FieldReader<'_>) -> Self {
        Self {
            invite_code: fields.string(&["inviteCode", "invite_code", "code"]),
            invite_url: fields.string(&["inviteUrl", "invite_url"]),
            revoked: fields.bool(&["revoked"]),
        }
    }
}

/// Outcome of adding, removing, promoting or demoting one participant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticipantUpdate {
    pub jid: Option<String>,
    /// WhatsApp result code, `"200"` on success.
    pub status: Option<String>,
    pub extra: Map<String, Value>,
}

impl FromResponse for ParticipantUpdate {
    fn read(fields: &mut FieldReader<'_>) -> Self {
        Self {
            jid: fields.string(&["jid", "id"]),
            status: fields.string(&["status"]),
            extra: fields.extra(),
        }
    }
}

impl ParticipantUpdate {
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some("200")
    }
}

/// Wrapper for the participant list endpoints.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ParticipantList(pub(crate) Vec<GroupParticipant>);

impl FromResponse for ParticipantList {
    fn read(fields: &mut FieldReader<'_>) -> Self {
        Self(fields.list(&["participants"]))
    }
}

/// Wrapper for participant update results.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ParticipantUpdates(pub(crate) Vec<ParticipantUpdate>);

impl FromResponse for ParticipantUpdates {
    fn read(fields: &mut FieldReader<'_>) -> Self {
        Self(fields.list(&["updateParticipants", "participants"]))
    }
}

/// Options for creating a group.
#[derive(Debug, Clone, Serialize)]
pub struct CreateGroup {
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Phone numbers of the initial members.
    pub participants: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CreateGroup {
    pub fn new(subject: impl Into<String>, participants: Vec<String>) -> Self {
        Self {
            subject: subject.into(),
            description: None,
            participants,
            extra: Map::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// What to do with a set of participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantAction {
    Add,
    Remove,
    Promote,
    Demote,
}

/// Group-wide permission settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupSetting {
    /// Only admins send messages.
    Announcement,
    /// Everyone sends messages.
    NotAnnouncement,
    /// Only admins edit group info.
    Locked,
    /// Everyone edits group info.
    Unlocked,
}

/// Disappearing-message timers accepted by WhatsApp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ephemeral {
    Off,
    OneDay,
    SevenDays,
    NinetyDays,
}

impl Ephemeral {
    /// Timer length in seconds.
    pub fn seconds(&self) -> u32 {
        match self {
            Ephemeral::Off => 0,
            Ephemeral::OneDay => 86_400,
            Ephemeral::SevenDays => 604_800,
            Ephemeral::NinetyDays => 7_776_000,
        }
    }
}
