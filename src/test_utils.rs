//! Test utilities shared across test modules
//!
//! Fixtures for credentials files plus fake clipboard and environment
//! providers, so no test touches the real host.

use std::collections::HashMap;
use std::path::PathBuf;
use tempfile::TempDir;

use crate::error::{ProfileError, Result};
use crate::sources::{ClipboardProvider, EnvProvider};

pub const SAMPLE_CREDS: &str = "[default]\naws_access_key_id=AKIA123\naws_secret_access_key=SECRET456\n\n[work]\naws_access_key_id=AKIA999\n";

/// Write `SAMPLE_CREDS` to `<temp>/credentials` and return its path
pub fn write_sample_creds(temp_dir: &TempDir) -> PathBuf {
    let path = temp_dir.path().join("credentials");
    std::fs::write(&path, SAMPLE_CREDS).unwrap();
    path
}

/// Environment backed by a map
#[derive(Debug, Default)]
pub struct FakeEnv {
    vars: HashMap<String, String>,
}

impl FakeEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.vars.insert(name.to_string(), value.to_string());
        self
    }
}

impl EnvProvider for FakeEnv {
    fn get_env(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

/// Clipboard returning fixed text, or failing as if no paste utility exists
#[derive(Debug)]
pub enum FakeClipboard {
    Text(String),
    Unavailable,
}

impl FakeClipboard {
    pub fn text(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl ClipboardProvider for FakeClipboard {
    fn read_clipboard_text(&self) -> Result<String> {
        match self {
            Self::Text(text) => Ok(text.clone()),
            Self::Unavailable => Err(ProfileError::Unavailable("no clipboard in tests".to_string())),
        }
    }
}
