use serde_json::{json, Value};
use tracing::instrument;

use evolution_sdk_client::{ApiFamily, RequestBuilder, Result};

use super::{target, EvolutionClient};
use crate::ack::Ack;
use crate::profile::{BusinessProfile, PrivacySettings, Profile};
use crate::validate::Validator;

const FAMILY: ApiFamily = ApiFamily::Profile;

/// Profile and privacy of the connected account, and lookups of other profiles.
#[derive(Debug, Clone, Copy)]
pub struct ProfileApi<'a> {
    client: &'a EvolutionClient,
}

impl<'a> ProfileApi<'a> {
    pub(crate) fn new(client: &'a EvolutionClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self))]
    pub async fn fetch_business_profile(&self, instance: &str, number: &str) -> Result<BusinessProfile> {
        let mut check = Validator::new();
        check.recipient("number", number);
        let request = self.post(instance, "fetchBusinessProfile", check, json!({ "number": number }))?;
        self.client.fetch(request, FAMILY).await
    }

    #[instrument(skip(self))]
    pub async fn fetch_profile(&self, instance: &str, number: &str) -> Result<Profile> {
        let mut check = Validator::new();
        check.recipient("number", number);
        let request = self.post(instance, "fetchProfile", check, json!({ "number": number }))?;
        self.client.fetch(request, FAMILY).await
    }

    /// Set the display name.
    #[instrument(skip(self))]
    pub async fn update_name(&self, instance: &str, name: &str) -> Result<Ack> {
        let mut check = Validator::new();
        check.not_empty("name", name);
        let request = self.post(instance, "updateProfileName", check, json!({ "name": name }))?;
        self.client.fetch(request, FAMILY).await
    }

    /// Set the "about" text.
    #[instrument(skip(self, status))]
    pub async fn update_status(&self, instance: &str, status: &str) -> Result<Ack> {
        let body = json!({ "status": status });
        let request = self.post(instance, "updateProfileStatus", Validator::new(), body)?;
        self.client.fetch(request, FAMILY).await
    }

    /// Set the profile picture from a URL or base64 image.
    #[instrument(skip(self, picture))]
    pub async fn update_picture(&self, instance: &str, picture: &str) -> Result<Ack> {
        let mut check = Validator::new();
        check.not_empty("picture", picture);
        let request = self.post(instance, "updateProfilePicture", check, json!({ "picture": picture }))?;
        self.client.fetch(request, FAMILY).await
    }

    #[instrument(skip(self))]
    pub async fn remove_picture(&self, instance: &str) -> Result<Ack> {
        let request = RequestBuilder::delete("/chat/removeProfilePicture/{instance}");
        let request = self.checked(instance, Validator::new(), request)?;
        self.client.fetch(request, FAMILY).await
    }

    #[instrument(skip(self))]
    pub async fn fetch_privacy_settings(&self, instance: &str) -> Result<PrivacySettings> {
        let request = RequestBuilder::get("/chat/fetchPrivacySettings/{instance}");
        let request = self.checked(instance, Validator::new(), request)?;
        self.client.fetch(request, FAMILY).await
    }

    /// Update the given privacy settings. Unset fields are left unchanged.
    #[instrument(skip(self, settings))]
    pub async fn update_privacy_settings(&self, instance: &str, settings: &PrivacySettings) -> Result<Ack> {
        let request = RequestBuilder::post("/chat/updatePrivacySettings/{instance}").json(settings)?;
        let request = self.checked(instance, Validator::new(), request)?;
        self.client.fetch(request, FAMILY).await
    }

    fn post(&self, instance: &str, endpoint: &str, check: Validator, body: Value) -> Result<RequestBuilder> {
        let request = RequestBuilder::post(format!("/chat/{endpoint}/{{instance}}")).json_value(body);
        self.checked(instance, check, request)
    }

    fn checked(&self, instance: &str, mut check: Validator, request: RequestBuilder) -> Result<RequestBuilder> {
        check.instance(target(instance));
        check.finish().map_err(|e| e.in_family(FAMILY))?;
        Ok(request.maybe_instance(target(instance)))
    }
}
