//! Where new profiles come from: the system clipboard or the process
//! environment.
//!
//! Both are host capabilities behind single-method traits so the store can
//! be driven by fakes in tests.

use std::io::ErrorKind as IoErrorKind;
use std::process::Command;
use std::str::FromStr;

use crate::codec;
use crate::error::{ProfileError, Result};
use crate::profile::{CredentialField, ProfileRecord};

/// Name given to a profile synthesized from environment variables
pub const ENV_PROFILE_NAME: &str = "env_profile";

pub const ACCESS_KEY_ID_ENV: &str = "AWS_ACCESS_KEY_ID";
pub const SECRET_ACCESS_KEY_ENV: &str = "AWS_SECRET_ACCESS_KEY";
pub const SESSION_TOKEN_ENV: &str = "AWS_SESSION_TOKEN";

/// Read access to the system clipboard
pub trait ClipboardProvider {
    fn read_clipboard_text(&self) -> Result<String>;
}

/// Read access to environment variables
pub trait EnvProvider {
    fn get_env(&self, name: &str) -> Option<String>;
}

/// Selects which provider a new profile is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileSource {
    Clipboard,
    Environment,
}

impl FromStr for ProfileSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cb" | "clipboard" => Ok(Self::Clipboard),
            "env" | "environment" => Ok(Self::Environment),
            _ => Err(format!(
                "unknown profile source '{}' (expected cb, clipboard, env or environment)",
                s
            )),
        }
    }
}

/// Both host capabilities, handed to `ProfileStore::inject_from`
pub struct Providers<'a> {
    pub clipboard: &'a dyn ClipboardProvider,
    pub env: &'a dyn EnvProvider,
}

impl Providers<'_> {
    /// Build a record from the selected source
    pub fn fetch(&self, source: ProfileSource) -> Result<ProfileRecord> {
        match source {
            ProfileSource::Clipboard => profile_from_clipboard(self.clipboard),
            ProfileSource::Environment => profile_from_env(self.env),
        }
    }
}

/// Parse a profile section copied to the clipboard.
///
/// When several sections are present the last one is returned.
pub fn profile_from_clipboard(clipboard: &dyn ClipboardProvider) -> Result<ProfileRecord> {
    let text = clipboard.read_clipboard_text()?;
    if !text.contains(CredentialField::AccessKeyId.key()) {
        return Err(ProfileError::MissingCredentials(
            "AWS Access Key is not in the clipboard".to_string(),
        ));
    }

    codec::decode(&text)?.pop().ok_or_else(|| {
        ProfileError::MissingCredentials("Clipboard contains no profile section".to_string())
    })
}

/// Build the `env_profile` record from the standard AWS variables
pub fn profile_from_env(env: &dyn EnvProvider) -> Result<ProfileRecord> {
    let non_empty = |name: &str| env.get_env(name).filter(|v| !v.is_empty());

    let (Some(access_key_id), Some(secret_access_key)) =
        (non_empty(ACCESS_KEY_ID_ENV), non_empty(SECRET_ACCESS_KEY_ENV))
    else {
        return Err(ProfileError::MissingCredentials(format!(
            "AWS credentials env vars not configured properly. Make sure both {} and {} are set.",
            ACCESS_KEY_ID_ENV, SECRET_ACCESS_KEY_ENV
        )));
    };

    Ok(ProfileRecord {
        name: ENV_PROFILE_NAME.to_string(),
        access_key_id: Some(access_key_id),
        secret_access_key: Some(secret_access_key),
        session_token: env.get_env(SESSION_TOKEN_ENV),
    })
}

/// Environment of the running process
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvProvider for ProcessEnv {
    fn get_env(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Paste utilities tried in order until one can be spawned
#[cfg(target_os = "macos")]
const CLIPBOARD_COMMANDS: &[(&str, &[&str])] = &[("pbpaste", &[])];

#[cfg(windows)]
const CLIPBOARD_COMMANDS: &[(&str, &[&str])] = &[(
    "powershell",
    &["-NoProfile", "-Command", "Get-Clipboard -Raw"],
)];

#[cfg(not(any(target_os = "macos", windows)))]
const CLIPBOARD_COMMANDS: &[(&str, &[&str])] = &[
    ("wl-paste", &["--no-newline"]),
    ("xclip", &["-selection", "clipboard", "-o"]),
    ("xsel", &["--clipboard", "--output"]),
];

/// Clipboard read by shelling out to the platform's paste utility
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl ClipboardProvider for SystemClipboard {
    fn read_clipboard_text(&self) -> Result<String> {
        for (program, args) in CLIPBOARD_COMMANDS {
            let output = match Command::new(program).args(*args).output() {
                Ok(output) => output,
                Err(e) if e.kind() == IoErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(ProfileError::Unavailable(format!(
                        "failed to run {}: {}",
                        program, e
                    )));
                }
            };

            if !output.status.success() {
                return Err(ProfileError::Unavailable(format!(
                    "{} exited with {}: {}",
                    program,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                )));
            }

            return String::from_utf8(output.stdout).map_err(|_| {
                ProfileError::Unavailable(format!("{} returned non UTF-8 text", program))
            });
        }

        let tried: Vec<&str> = CLIPBOARD_COMMANDS.iter().map(|(p, _)| *p).collect();
        Err(ProfileError::Unavailable(format!(
            "no clipboard utility found (tried {})",
            tried.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::test_utils::{FakeClipboard, FakeEnv};
    use serial_test::serial;

    #[test]
    fn test_source_parse() {
        assert_eq!("cb".parse::<ProfileSource>().unwrap(), ProfileSource::Clipboard);
        assert_eq!("Clipboard".parse::<ProfileSource>().unwrap(), ProfileSource::Clipboard);
        assert_eq!("ENV".parse::<ProfileSource>().unwrap(), ProfileSource::Environment);
        assert_eq!(
            "environment".parse::<ProfileSource>().unwrap(),
            ProfileSource::Environment
        );
        assert!("file".parse::<ProfileSource>().is_err());
    }

    #[test]
    fn test_clipboard_profile() {
        let clipboard = FakeClipboard::text(
            "[copied]\naws_access_key_id=ASIA1\naws_secret_access_key=s\naws_session_token=t\n",
        );
        let record = profile_from_clipboard(&clipboard).unwrap();
        assert_eq!(record.name, "copied");
        assert_eq!(record.access_key_id.as_deref(), Some("ASIA1"));
        assert_eq!(record.session_token.as_deref(), Some("t"));
    }

    #[test]
    fn test_clipboard_takes_last_section() {
        let clipboard =
            FakeClipboard::text("[one]\naws_access_key_id=A\n[two]\naws_access_key_id=B\n");
        assert_eq!(profile_from_clipboard(&clipboard).unwrap().name, "two");
    }

    #[test]
    fn test_clipboard_without_access_key() {
        let clipboard = FakeClipboard::text("just some text");
        let err = profile_from_clipboard(&clipboard).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingCredentials);
    }

    #[test]
    fn test_clipboard_without_header() {
        let clipboard = FakeClipboard::text("aws_access_key_id=A\n");
        let err = profile_from_clipboard(&clipboard).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_clipboard_unavailable() {
        let err = profile_from_clipboard(&FakeClipboard::Unavailable).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unavailable);
    }

    #[test]
    fn test_env_profile() {
        let env = FakeEnv::new()
            .with(ACCESS_KEY_ID_ENV, "DEADBEEF")
            .with(SECRET_ACCESS_KEY_ENV, "VERYSECRET")
            .with(SESSION_TOKEN_ENV, "SPOKENTOKEN");
        let record = profile_from_env(&env).unwrap();
        assert_eq!(record.name, ENV_PROFILE_NAME);
        assert_eq!(record.secret_access_key.as_deref(), Some("VERYSECRET"));
        assert_eq!(record.session_token.as_deref(), Some("SPOKENTOKEN"));
    }

    #[test]
    fn test_env_profile_without_token() {
        let env = FakeEnv::new()
            .with(ACCESS_KEY_ID_ENV, "A")
            .with(SECRET_ACCESS_KEY_ENV, "S");
        let record = profile_from_env(&env).unwrap();
        assert!(record.session_token.is_none());
    }

    #[test]
    fn test_env_profile_missing_secret() {
        let env = FakeEnv::new()
            .with(ACCESS_KEY_ID_ENV, "A")
            .with(SECRET_ACCESS_KEY_ENV, "");
        let err = profile_from_env(&env).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingCredentials);
    }

    #[test]
    #[serial]
    fn test_process_env() {
        // SAFETY: serialized with every other test touching the environment
        unsafe { std::env::set_var("AWSPROF_TEST_VAR", "value") };
        assert_eq!(ProcessEnv.get_env("AWSPROF_TEST_VAR").as_deref(), Some("value"));
        unsafe { std::env::remove_var("AWSPROF_TEST_VAR") };
        assert!(ProcessEnv.get_env("AWSPROF_TEST_VAR").is_none());
    }
}
