use std::fmt;
use std::str::FromStr;

/// Name conventionally treated as the active profile by AWS tooling
pub const DEFAULT_PROFILE: &str = "default";

/// Credential fields that may appear inside a profile section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialField {
    AccessKeyId,
    SecretAccessKey,
    SessionToken,
}

impl CredentialField {
    /// All fields, in the order they are written to disk
    pub fn all() -> [CredentialField; 3] {
        [
            CredentialField::AccessKeyId,
            CredentialField::SecretAccessKey,
            CredentialField::SessionToken,
        ]
    }

    /// Key used in the credentials file
    pub fn key(&self) -> &'static str {
        match self {
            CredentialField::AccessKeyId => "aws_access_key_id",
            CredentialField::SecretAccessKey => "aws_secret_access_key",
            CredentialField::SessionToken => "aws_session_token",
        }
    }
}

impl FromStr for CredentialField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aws_access_key_id" => Ok(CredentialField::AccessKeyId),
            "aws_secret_access_key" => Ok(CredentialField::SecretAccessKey),
            "aws_session_token" => Ok(CredentialField::SessionToken),
            _ => Err(format!("unknown field '{}'", s)),
        }
    }
}

impl fmt::Display for CredentialField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A single named profile from the credentials file.
///
/// The session token starts out as an empty string rather than `None`, so a
/// record built by the parser always carries one even when the file has no
/// `aws_session_token` line.
#[derive(Clone, PartialEq, Eq)]
pub struct ProfileRecord {
    pub name: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
}

impl ProfileRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            access_key_id: None,
            secret_access_key: None,
            session_token: Some(String::new()),
        }
    }

    pub fn with_keys(
        name: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: Some(access_key_id.into()),
            secret_access_key: Some(secret_access_key.into()),
            ..Self::new(name)
        }
    }

    pub fn field(&self, field: CredentialField) -> Option<&str> {
        match field {
            CredentialField::AccessKeyId => self.access_key_id.as_deref(),
            CredentialField::SecretAccessKey => self.secret_access_key.as_deref(),
            CredentialField::SessionToken => self.session_token.as_deref(),
        }
    }

    pub fn set_field(&mut self, field: CredentialField, value: impl Into<String>) {
        let value = Some(value.into());
        match field {
            CredentialField::AccessKeyId => self.access_key_id = value,
            CredentialField::SecretAccessKey => self.secret_access_key = value,
            CredentialField::SessionToken => self.session_token = value,
        }
    }

    /// Copy of this record's credentials under another name
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    /// Whether the record carries a non-empty session token
    pub fn has_session_token(&self) -> bool {
        self.session_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

// Keys and tokens stay out of debug output; `codec::encode_record` is the
// only way to print them.
impl fmt::Debug for ProfileRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("ProfileRecord")
            .field("name", &self.name)
            .field("access_key_id", &redact(&self.access_key_id))
            .field("secret_access_key", &redact(&self.secret_access_key))
            .field("session_token", &redact(&self.session_token))
            .finish()
    }
}

/// Validate a profile name supplied by the user
///
/// Names end up inside `[...]` headers, so brackets, line breaks and
/// surrounding whitespace are rejected.
pub fn validate_profile_name(name: &str) -> anyhow::Result<()> {
    if name.is_empty() {
        anyhow::bail!("Profile name cannot be empty");
    }

    if name.trim() != name {
        anyhow::bail!("Profile name '{}' has leading or trailing whitespace", name);
    }

    if name.chars().any(|c| matches!(c, '[' | ']' | '\n' | '\r')) {
        anyhow::bail!(
            "Invalid profile name '{}'.\n\n Brackets and line breaks are not allowed.",
            name
        );
    }

    Ok(())
}
