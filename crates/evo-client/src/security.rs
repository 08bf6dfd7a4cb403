//! Security utilities for Evolution API calls.
//!
//! ## URL Parameter Encoding
//!
//! Instance names and other user-provided values placed in URL paths MUST
//! be encoded:
//!
//! ```rust
//! use evolution_sdk_client::security::url;
//!
//! let encoded = url::encode_param("my bot/1");
//! let path = format!("/instance/connect/{}", encoded);
//! assert_eq!(path, "/instance/connect/my%20bot%2F1");
//! ```
//!
//! ## Error message redaction
//!
//! Server error bodies can echo the request back, including the `apikey`
//! header. [`redact::sanitize_error_message`] strips credentials and caps
//! the length before a body ends up in an error value or a log line.

/// URL encoding utilities.
pub mod url {
    /// URL-encode a value for use as a path segment or query parameter.
    #[must_use]
    pub fn encode_param(value: &str) -> String {
        urlencoding::encode(value).into_owned()
    }
}

/// WhatsApp identifier checks.
pub mod jid {
    /// Suffix of group JIDs.
    pub const GROUP_SUFFIX: &str = "@g.us";
    /// Suffix of user JIDs.
    pub const USER_SUFFIX: &str = "@s.whatsapp.net";

    /// Returns true if the value looks like a group JID (`<digits/dash>@g.us`).
    #[must_use]
    pub fn is_group_jid(value: &str) -> bool {
        match value.strip_suffix(GROUP_SUFFIX) {
            Some(id) => !id.is_empty() && id.chars().all(|c| c.is_ascii_digit() || c == '-'),
            None => false,
        }
    }

    /// Returns true if the value is a usable recipient: a phone number
    /// (digits, optionally with `+`, spaces or dashes) or any JID.
    #[must_use]
    pub fn is_recipient(value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() {
            return false;
        }
        if let Some((user, server)) = value.split_once('@') {
            return !user.is_empty() && !server.is_empty();
        }
        let digits = value.chars().filter(|c| c.is_ascii_digit()).count();
        digits >= 5
            && value
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')'))
    }
}

/// Redaction of credentials in server-provided text.
pub mod redact {
    use std::sync::OnceLock;

    const MAX_LENGTH: usize = 500;

    fn key_pattern() -> &'static regex_lite::Regex {
        static PATTERN: OnceLock<regex_lite::Regex> = OnceLock::new();
        PATTERN.get_or_init(|| {
            regex_lite::Regex::new(r#"(?i)("?(?:apikey|api_key|token)"?\s*[:=]\s*"?)[^",\s}]+"#)
                .expect("static regex compiles")
        })
    }

    /// Sanitize an error message to prevent exposing credentials.
    ///
    /// - Replaces `apikey`/`token` values with `[REDACTED]`
    /// - Truncates messages longer than 500 characters
    #[must_use]
    pub fn sanitize_error_message(message: &str) -> String {
        let mut sanitized = key_pattern()
            .replace_all(message, "${1}[REDACTED]")
            .to_string();

        if sanitized.len() > MAX_LENGTH {
            let mut cut = MAX_LENGTH;
            while !sanitized.is_char_boundary(cut) {
                cut -= 1;
            }
            sanitized.truncate(cut);
            sanitized.push_str("...[truncated]");
        }

        sanitized
    }
}
