use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use directories::BaseDirs;
use std::fs;
use std::path::{Path, PathBuf};

use crate::sources::EnvProvider;

/// Environment variable naming an alternate credentials file
pub const CREDS_FILE_ENV: &str = "AWS_CREDS_FILE";

/// Timestamp format embedded in default backup names
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H%M%S";

const BACKUP_EXTENSION: &str = ".bkp";

/// Locations used by awsprof
#[derive(Debug, Clone)]
pub struct Paths {
    /// ~/.aws/credentials unless overridden
    pub creds_file: PathBuf,
}

impl Paths {
    /// Resolve the credentials file location.
    ///
    /// Priority:
    /// 1. `override_path` (from --creds-file)
    /// 2. `AWS_CREDS_FILE`, if set and its parent directory exists
    /// 3. `~/.aws/credentials`
    pub fn resolve(override_path: Option<PathBuf>, env: &dyn EnvProvider) -> Result<Self> {
        if let Some(creds_file) = override_path {
            return Ok(Self { creds_file });
        }

        if let Some(creds_file) = env_creds_file(env) {
            return Ok(Self { creds_file });
        }

        let base_dirs = BaseDirs::new().context("Failed to determine home directory")?;
        Ok(Self {
            creds_file: default_creds_file(base_dirs.home_dir()),
        })
    }
}

/// `<home>/.aws/credentials`
pub fn default_creds_file(home: &Path) -> PathBuf {
    home.join(".aws").join("credentials")
}

fn env_creds_file(env: &dyn EnvProvider) -> Option<PathBuf> {
    let value = env.get_env(CREDS_FILE_ENV).filter(|v| !v.is_empty())?;
    let path = PathBuf::from(value);
    let parent = match path.parent() {
        Some(p) if p.as_os_str().is_empty() => Path::new("."),
        Some(p) => p,
        None => return None,
    };
    parent.is_dir().then_some(path)
}

/// `<creds file>-<YYYY-MM-DD-HHMMSS>.bkp`
pub fn backup_path_for(creds_file: &Path, at: DateTime<Local>) -> PathBuf {
    let mut name = creds_file.as_os_str().to_owned();
    name.push(format!("-{}{}", at.format(BACKUP_TIMESTAMP_FORMAT), BACKUP_EXTENSION));
    PathBuf::from(name)
}

/// Most recent timestamped backup sitting next to `creds_file`, if any.
///
/// The timestamp format sorts lexically, so the greatest name wins.
pub fn latest_backup(creds_file: &Path) -> Option<PathBuf> {
    let file_name = creds_file.file_name()?.to_str()?;
    let prefix = format!("{}-", file_name);
    let dir = match creds_file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    fs::read_dir(dir)
        .ok()?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter_map(|e| {
            let name = e.file_name().to_str()?.to_string();
            let stamp = name.strip_prefix(&prefix)?.strip_suffix(BACKUP_EXTENSION)?;
            is_backup_timestamp(stamp).then(|| (name, e.path()))
        })
        .max_by(|a, b| a.0.cmp(&b.0))
        .map(|(_, path)| path)
}

fn is_backup_timestamp(stamp: &str) -> bool {
    chrono::NaiveDateTime::parse_from_str(stamp, BACKUP_TIMESTAMP_FORMAT).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeEnv;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_override_wins() {
        let env = FakeEnv::new().with(CREDS_FILE_ENV, "/tmp/other");
        let paths = Paths::resolve(Some(PathBuf::from("/custom/creds")), &env).unwrap();
        assert_eq!(paths.creds_file, PathBuf::from("/custom/creds"));
    }

    #[test]
    fn test_env_var_used_when_parent_exists() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("creds");
        let env = FakeEnv::new().with(CREDS_FILE_ENV, target.to_str().unwrap());
        let paths = Paths::resolve(None, &env).unwrap();
        assert_eq!(paths.creds_file, target);
    }

    #[test]
    fn test_env_var_ignored_when_parent_missing() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("missing").join("creds");
        let env = FakeEnv::new().with(CREDS_FILE_ENV, target.to_str().unwrap());
        let paths = Paths::resolve(None, &env).unwrap();
        assert!(paths.creds_file.ends_with(".aws/credentials"));
    }

    #[test]
    fn test_backup_path_format() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        let path = backup_path_for(Path::new("/home/u/.aws/credentials"), at);
        assert_eq!(
            path,
            PathBuf::from("/home/u/.aws/credentials-2024-03-09-070501.bkp")
        );
    }

    #[test]
    fn test_latest_backup() {
        let temp_dir = TempDir::new().unwrap();
        let creds = temp_dir.path().join("credentials");
        assert!(latest_backup(&creds).is_none());

        fs::write(temp_dir.path().join("credentials-2023-01-01-000000.bkp"), "").unwrap();
        fs::write(temp_dir.path().join("credentials-2024-06-30-235959.bkp"), "").unwrap();
        fs::write(temp_dir.path().join("credentials-garbage.bkp"), "").unwrap();
        fs::write(temp_dir.path().join("other-2025-01-01-000000.bkp"), "").unwrap();

        assert_eq!(
            latest_backup(&creds).unwrap(),
            temp_dir.path().join("credentials-2024-06-30-235959.bkp")
        );
    }
}
