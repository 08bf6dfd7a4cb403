use serde_json::{json, Value};
use tracing::instrument;

use evolution_sdk_client::{ApiFamily, RequestBuilder, Result};

use super::{target, EvolutionClient};
use crate::ack::Ack;
use crate::group::{
    CreateGroup, Ephemeral, Group, GroupParticipant, GroupSetting, InviteCode, ParticipantAction,
    ParticipantList, ParticipantUpdate, ParticipantUpdates,
};
use crate::validate::Validator;

const FAMILY: ApiFamily = ApiFamily::Group;

/// Group management. Groups are addressed by their `@g.us` JID.
#[derive(Debug, Clone, Copy)]
pub struct GroupApi<'a> {
    client: &'a EvolutionClient,
}

impl<'a> GroupApi<'a> {
    pub(crate) fn new(client: &'a EvolutionClient) -> Self {
        Self { client }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Create a group and return its metadata.
    #[instrument(skip(self, group), fields(subject = %group.subject))]
    pub async fn create(&self, instance: &str, group: CreateGroup) -> Result<Group> {
        let mut check = Validator::new();
        check
            .instance(target(instance))
            .not_empty("subject", &group.subject)
            .recipients("participants", &group.participants);
        check.finish().map_err(|e| e.in_family(FAMILY))?;

        let request = RequestBuilder::post("/group/create/{instance}")
            .maybe_instance(target(instance))
            .json(&group)?;
        self.client.fetch(request, FAMILY).await
    }

    /// List every group the account belongs to.
    #[instrument(skip(self))]
    pub async fn fetch_all_groups(&self, instance: &str, with_participants: bool) -> Result<Vec<Group>> {
        let mut check = Validator::new();
        check.instance(target(instance));
        check.finish().map_err(|e| e.in_family(FAMILY))?;

        let request = RequestBuilder::get("/group/fetchAllGroups/{instance}")
            .maybe_instance(target(instance))
            .query("getParticipants", with_participants.to_string());
        self.client.fetch_list(request, FAMILY).await
    }

    #[instrument(skip(self))]
    pub async fn find_group_info(&self, instance: &str, group_jid: &str) -> Result<Group> {
        let request = self.get(instance, "findGroupInfos", group_jid)?;
        self.client.fetch(request, FAMILY).await
    }

    /// Leave the group.
    #[instrument(skip(self))]
    pub async fn leave(&self, instance: &str, group_jid: &str) -> Result<Ack> {
        let request = RequestBuilder::delete("/group/leaveGroup/{instance}")
            .maybe_instance(target(instance))
            .query("groupJid", group_jid);
        let request = self.checked(instance, group_jid, Validator::new(), request)?;
        self.client.fetch(request, FAMILY).await
    }

    // =========================================================================
    // Metadata
    // =========================================================================

    /// Set the group picture from a URL or base64 image.
    #[instrument(skip(self, image))]
    pub async fn update_picture(&self, instance: &str, group_jid: &str, image: &str) -> Result<Ack> {
        let mut check = Validator::new();
        check.not_empty("image", image);
        let request = self.post(instance, "updateGroupPicture", group_jid, check, json!({ "image": image }))?;
        self.client.fetch(request, FAMILY).await
    }

    #[instrument(skip(self))]
    pub async fn update_subject(&self, instance: &str, group_jid: &str, subject: &str) -> Result<Ack> {
        let mut check = Validator::new();
        check.not_empty("subject", subject);
        let body = json!({ "subject": subject });
        let request = self.post(instance, "updateGroupSubject", group_jid, check, body)?;
        self.client.fetch(request, FAMILY).await
    }

    #[instrument(skip(self, description))]
    pub async fn update_description(&self, instance: &str, group_jid: &str, description: &str) -> Result<Ack> {
        let body = json!({ "description": description });
        let request = self.post(instance, "updateGroupDescription", group_jid, Validator::new(), body)?;
        self.client.fetch(request, FAMILY).await
    }

    /// Change who may send messages or edit group info.
    #[instrument(skip(self))]
    pub async fn update_setting(&self, instance: &str, group_jid: &str, setting: GroupSetting) -> Result<Ack> {
        let body = json!({ "action": setting });
        let request = self.post(instance, "updateSetting", group_jid, Validator::new(), body)?;
        self.client.fetch(request, FAMILY).await
    }

    /// Set the disappearing-messages timer.
    #[instrument(skip(self))]
    pub async fn toggle_ephemeral(&self, instance: &str, group_jid: &str, timer: Ephemeral) -> Result<Ack> {
        let body = json!({ "expiration": timer.seconds() });
        let request = self.post(instance, "toggleEphemeral", group_jid, Validator::new(), body)?;
        self.client.fetch(request, FAMILY).await
    }

    // =========================================================================
    // Invites
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn invite_code(&self, instance: &str, group_jid: &str) -> Result<InviteCode> {
        let request = self.get(instance, "inviteCode", group_jid)?;
        self.client.fetch(request, FAMILY).await
    }

    /// Invalidate the current invite link and return the new one.
    #[instrument(skip(self))]
    pub async fn revoke_invite_code(&self, instance: &str, group_jid: &str) -> Result<InviteCode> {
        let request = self.post(instance, "revokeInviteCode", group_jid, Validator::new(), json!({}))?;
        self.client.fetch(request, FAMILY).await
    }

    /// Send the invite link to `numbers` with an optional note.
    #[instrument(skip(self, numbers, description), fields(count = numbers.len()))]
    pub async fn send_invite(
        &self,
        instance: &str,
        group_jid: &str,
        numbers: &[String],
        description: Option<&str>,
    ) -> Result<Ack> {
        let mut check = Validator::new();
        check
            .instance(target(instance))
            .group_jid("groupJid", group_jid)
            .recipients("numbers", numbers);
        check.finish().map_err(|e| e.in_family(FAMILY))?;

        let mut body = json!({ "groupJid": group_jid, "numbers": numbers });
        if let Some(description) = description {
            body["description"] = Value::from(description);
        }
        let request = RequestBuilder::post("/group/sendInvite/{instance}")
            .maybe_instance(target(instance))
            .json_value(body);
        self.client.fetch(request, FAMILY).await
    }

    /// Look up a group by invite code without joining.
    #[instrument(skip(self))]
    pub async fn find_by_invite_code(&self, instance: &str, invite_code: &str) -> Result<Group> {
        let mut check = Validator::new();
        check.instance(target(instance)).not_empty("inviteCode", invite_code);
        check.finish().map_err(|e| e.in_family(FAMILY))?;

        let request = RequestBuilder::get("/group/inviteInfo/{instance}")
            .maybe_instance(target(instance))
            .query("inviteCode", invite_code);
        self.client.fetch(request, FAMILY).await
    }

    // =========================================================================
    // Participants
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn participants(&self, instance: &str, group_jid: &str) -> Result<Vec<GroupParticipant>> {
        let request = self.get(instance, "participants", group_jid)?;
        let list: ParticipantList = self.client.fetch(request, FAMILY).await?;
        Ok(list.0)
    }

    /// Add, remove, promote or demote participants.
    #[instrument(skip(self, participants), fields(count = participants.len()))]
    pub async fn update_participants(
        &self,
        instance: &str,
        group_jid: &str,
        action: ParticipantAction,
        participants: &[String],
    ) -> Result<Vec<ParticipantUpdate>> {
        let mut check = Validator::new();
        check.recipients("participants", participants);
        let body = json!({ "action": action, "participants": participants });
        let request = self.post(instance, "updateParticipant", group_jid, check, body)?;
        let updates: ParticipantUpdates = self.client.fetch(request, FAMILY).await?;
        Ok(updates.0)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn get(&self, instance: &str, endpoint: &str, group_jid: &str) -> Result<RequestBuilder> {
        let request = RequestBuilder::get(format!("/group/{endpoint}/{{instance}}"))
            .maybe_instance(target(instance))
            .query("groupJid", group_jid);
        self.checked(instance, group_jid, Validator::new(), request)
    }

    fn post(
        &self,
        instance: &str,
        endpoint: &str,
        group_jid: &str,
        check: Validator,
        body: Value,
    ) -> Result<RequestBuilder> {
        let request = RequestBuilder::post(format!("/group/{endpoint}/{{instance}}"))
            .maybe_instance(target(instance))
            .query("groupJid", group_jid)
            .json_value(body);
        self.checked(instance, group_jid, check, request)
    }

    fn checked(
        &self,
        instance: &str,
        group_jid: &str,
        mut check: Validator,
        request: RequestBuilder,
    ) -> Result<RequestBuilder> {
        check.instance(target(instance)).group_jid("groupJid", group_jid);
        check.finish().map_err(|e| e.in_family(FAMILY))?;
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::client_for;
    use crate::group::{CreateGroup, Ephemeral, GroupSetting, ParticipantAction, ParticipantRole};
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const JID: &str = "120363025246125486@g.us";

    #[tokio::test]
    async fn test_create_group_wiremock() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/group/create/demo"))
            .and(body_json(json!({
                "subject": "Team",
                "description": "Weekly sync",
                "participants": ["5511999999999"]
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": JID,
                "subject": "Team",
                "owner": "5511888888888@s.whatsapp.net",
                "participants": [
                    {"id": "5511888888888@s.whatsapp.net", "admin": "superadmin"},
                    {"id": "5511999999999@s.whatsapp.net", "admin": null}
                ]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let group = client
            .group()
            .create(
                "demo",
                CreateGroup::new("Team", vec!["5511999999999".into()]).with_description("Weekly sync"),
            )
            .await
            .expect("create should succeed");
        assert_eq!(group.id, JID);
        assert_eq!(group.admins().count(), 1);
        assert_eq!(group.participants[0].role, Some(ParticipantRole::SuperAdmin));
    }

    #[tokio::test]
    async fn test_group_jid_is_checked_locally() {
        let server = MockServer::start().await;
        let client = client_for(&server);

        let err = client
            .group()
            .find_group_info("demo", "5511999999999@s.whatsapp.net")
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(err.is_group_error());
        assert_eq!(err.violations()[0].field, "groupJid");

        let err = client
            .group()
            .update_subject("demo", JID, " ")
            .await
            .unwrap_err();
        assert_eq!(err.violations()[0].field, "subject");
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_group_queries_wiremock() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/group/fetchAllGroups/demo"))
            .and(query_param("getParticipants", "false"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": JID, "subject": "Team", "size": 3},
                {"id": "120363000000000000@g.us", "subject": "Other"}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/group/findGroupInfos/demo"))
            .and(query_param("groupJid", JID))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": JID, "subject": "Team", "desc": "Weekly sync", "announce": true
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/group/participants/demo"))
            .and(query_param("groupJid", JID))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "participants": [
                    {"id": "5511888888888@s.whatsapp.net", "admin": "admin"},
                    {"id": "5511999999999@s.whatsapp.net"}
                ]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let groups = client
            .group()
            .fetch_all_groups("demo", false)
            .await
            .expect("fetch_all_groups should succeed");
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].size, Some(3));

        let info = client
            .group()
            .find_group_info("demo", JID)
            .await
            .expect("find_group_info should succeed");
        assert_eq!(info.description.as_deref(), Some("Weekly sync"));
        assert_eq!(info.announce, Some(true));

        let members = client
            .group()
            .participants("demo", JID)
            .await
            .expect("participants should succeed");
        assert_eq!(members.len(), 2);
        assert!(members[0].is_admin());
        assert!(!members[1].is_admin());
    }

    #[tokio::test]
    async fn test_update_participants_wiremock() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/group/updateParticipant/demo"))
            .and(query_param("groupJid", JID))
            .and(body_json(json!({"action": "promote", "participants": ["5511999999999"]})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "updateParticipants": [
                    {"status": "200", "jid": "5511999999999@s.whatsapp.net"}
                ]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let updates = client
            .group()
            .update_participants("demo", JID, ParticipantAction::Promote, &["5511999999999".into()])
            .await
            .expect("update_participants should succeed");
        assert_eq!(updates.len(), 1);
        assert!(updates[0].is_success());
    }

    #[tokio::test]
    async fn test_invites_wiremock() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/group/inviteCode/demo"))
            .and(query_param("groupJid", JID))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "inviteUrl": "https://chat.whatsapp.com/AbC", "inviteCode": "AbC"
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/group/revokeInviteCode/demo"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "revoked": true, "inviteCode": "XyZ"
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/group/sendInvite/demo"))
            .and(body_json(json!({
                "groupJid": JID, "numbers": ["5511999999999"], "description": "Join us"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "send": true, "inviteUrl": "https://chat.whatsapp.com/XyZ"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/group/inviteInfo/demo"))
            .and(query_param("inviteCode", "XyZ"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": JID, "subject": "Team"})))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let groups = client.group();

        let code = groups.invite_code("demo", JID).await.expect("invite_code should succeed");
        assert_eq!(code.invite_code.as_deref(), Some("AbC"));

        let revoked = groups
            .revoke_invite_code("demo", JID)
            .await
            .expect("revoke should succeed");
        assert_eq!(revoked.revoked, Some(true));
        assert_eq!(revoked.invite_code.as_deref(), Some("XyZ"));

        let sent = groups
            .send_invite("demo", JID, &["5511999999999".into()], Some("Join us"))
            .await
            .expect("send_invite should succeed");
        assert_eq!(sent.extra.get("send"), Some(&json!(true)));

        let found = groups
            .find_by_invite_code("demo", "XyZ")
            .await
            .expect("find_by_invite_code should succeed");
        assert_eq!(found.subject.as_deref(), Some("Team"));
    }

    #[tokio::test]
    async fn test_group_settings_wiremock() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/group/updateSetting/demo"))
            .and(body_json(json!({"action": "not_announcement"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"updateSetting": true})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/group/toggleEphemeral/demo"))
            .and(body_json(json!({"expiration": 604800})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"success": true})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/group/updateGroupPicture/demo"))
            .and(body_json(json!({"image": "https://example.com/team.png"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"update": "success"})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/group/updateGroupDescription/demo"))
            .and(body_json(json!({"description": "New topic"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"update": "success"})))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/group/leaveGroup/demo"))
            .and(query_param("groupJid", JID))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"groupJid": JID, "leave": true})))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let groups = client.group();
        groups
            .update_setting("demo", JID, GroupSetting::NotAnnouncement)
            .await
            .expect("update_setting should succeed");
        groups
            .toggle_ephemeral("demo", JID, Ephemeral::SevenDays)
            .await
            .expect("toggle_ephemeral should succeed");
        groups
            .update_picture("demo", JID, "https://example.com/team.png")
            .await
            .expect("update_picture should succeed");
        groups
            .update_description("demo", JID, "New topic")
            .await
            .expect("update_description should succeed");
        let left = groups.leave("demo", JID).await.expect("leave should succeed");
        assert_eq!(left.extra.get("leave"), Some(&json!(true)));
    }
}
