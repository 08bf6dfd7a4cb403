//! Caller-side parameter checks, run before any request is sent.

use evolution_sdk_client::security::jid;
use evolution_sdk_client::{Error, Result, Violation};

/// Collects parameter violations and fails once with all of them.
#[derive(Debug, Default)]
pub(crate) struct Validator {
    violations: Vec<Violation>,
}

impl Validator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, field: &str, message: impl Into<String>) {
        self.violations.push(Violation::new(field, message));
    }

    /// Instance name. Absent or blank falls back to the default instance.
    pub(crate) fn instance(&mut self, name: Option<&str>) -> &mut Self {
        if let Some(name) = name {
            if name.contains('/') {
                self.push("instance", "must not contain '/'");
            }
        }
        self
    }

    /// A name the caller must supply, such as a new instance's name.
    pub(crate) fn required_name(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.push(field, "must not be empty");
        } else if value.contains('/') {
            self.push(field, "must not contain '/'");
        }
        self
    }

    pub(crate) fn not_empty(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.push(field, "must not be empty");
        }
        self
    }

    pub(crate) fn not_empty_list<T>(&mut self, field: &str, values: &[T]) -> &mut Self {
        if values.is_empty() {
            self.push(field, "must not be empty");
        }
        self
    }

    /// A phone number or a full JID.
    pub(crate) fn recipient(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.push(field, "must not be empty");
        } else if !jid::is_recipient(value) {
            self.push(field, format!("is not a phone number or JID: {value:?}"));
        }
        self
    }

    pub(crate) fn recipients(&mut self, field: &str, values: &[String]) -> &mut Self {
        self.not_empty_list(field, values);
        for (index, value) in values.iter().enumerate() {
            if !jid::is_recipient(value) {
                self.push(
                    &format!("{field}[{index}]"),
                    format!("is not a phone number or JID: {value:?}"),
                );
            }
        }
        self
    }

    pub(crate) fn group_jid(&mut self, field: &str, value: &str) -> &mut Self {
        if !jid::is_group_jid(value) {
            self.push(field, format!("must be a group JID ending in @g.us, got {value:?}"));
        }
        self
    }

    pub(crate) fn range<T>(&mut self, field: &str, value: T, min: T, max: T) -> &mut Self
    where
        T: PartialOrd + std::fmt::Display + Copy,
    {
        if value < min || value > max {
            self.push(field, format!("must be between {min} and {max}, got {value}"));
        }
        self
    }

    pub(crate) fn latitude(&mut self, value: f64) -> &mut Self {
        if !value.is_finite() {
            self.push("latitude", "must be a finite number");
            return self;
        }
        self.range("latitude", value, -90.0, 90.0)
    }

    pub(crate) fn longitude(&mut self, value: f64) -> &mut Self {
        if !value.is_finite() {
            self.push("longitude", "must be a finite number");
            return self;
        }
        self.range("longitude", value, -180.0, 180.0)
    }

    /// An absolute http(s) URL.
    pub(crate) fn http_url(&mut self, field: &str, value: &str) -> &mut Self {
        match url::Url::parse(value) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            Ok(parsed) => self.push(field, format!("must use http or https, got {:?}", parsed.scheme())),
            Err(err) => self.push(field, format!("is not a valid URL: {err}")),
        }
        self
    }

    pub(crate) fn finish(&mut self) -> Result<()> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(Error::invalid_request(std::mem::take(&mut self.violations)))
        }
    }
}
