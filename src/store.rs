//! In-memory collection of profiles loaded from a credentials file.
//!
//! All mutating operations either succeed completely or leave the store
//! untouched. Nothing is written to disk until [`ProfileStore::save`] or
//! [`ProfileStore::backup`] is called.

use chrono::Local;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::codec;
use crate::error::{ProfileError, Result};
use crate::fs_utils::{WriteLock, atomic_write, read_text};
use crate::paths::{backup_path_for, latest_backup};
use crate::profile::{DEFAULT_PROFILE, ProfileRecord};
use crate::sources::{ProfileSource, Providers};

#[derive(Debug, Clone)]
pub struct ProfileStore {
    /// Unique by name, in file order
    profiles: Vec<ProfileRecord>,
    source_path: PathBuf,
    last_backup: Option<PathBuf>,
}

impl ProfileStore {
    /// Read and parse the credentials file at `path`
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let source_path = path.into();
        let profiles = Self::read_profiles(&source_path)?;
        Ok(Self {
            profiles,
            source_path,
            last_backup: None,
        })
    }

    /// Store over records that were not read from disk; `path` is the save target
    pub fn from_records(path: impl Into<PathBuf>, records: Vec<ProfileRecord>) -> Self {
        let mut store = Self {
            profiles: Vec::with_capacity(records.len()),
            source_path: path.into(),
            last_backup: None,
        };
        for record in records {
            store.upsert(record);
        }
        store
    }

    fn read_profiles(path: &Path) -> Result<Vec<ProfileRecord>> {
        let text = read_text(path)?;
        codec::decode(&text)
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Backup written or restored most recently by this store
    pub fn last_backup(&self) -> Option<&Path> {
        self.last_backup.as_deref()
    }

    /// Profile names in stored order
    pub fn list(&self) -> Vec<&str> {
        self.profiles.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn records(&self) -> &[ProfileRecord] {
        &self.profiles
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&ProfileRecord> {
        self.profiles.iter().find(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Section text for one profile, secrets included
    pub fn show(&self, name: &str) -> Result<String> {
        self.get(name)
            .map(codec::encode_record)
            .ok_or_else(|| ProfileError::not_found(name))
    }

    /// Insert `record`, replacing any profile with the same name.
    ///
    /// With `strict`, an existing name is an error and nothing changes.
    /// With `set_default`, the record is also copied to `default`.
    pub fn inject(&mut self, record: ProfileRecord, set_default: bool, strict: bool) -> Result<()> {
        if strict && self.contains(&record.name) {
            return Err(ProfileError::AlreadyExists { name: record.name });
        }

        let name = record.name.clone();
        self.upsert(record);

        if set_default {
            self.set_default(&name)?;
        }
        Ok(())
    }

    /// Fetch a record from the clipboard or the environment, then `inject` it
    pub fn inject_from(
        &mut self,
        source: ProfileSource,
        providers: &Providers<'_>,
        set_default: bool,
        strict: bool,
    ) -> Result<String> {
        let record = providers.fetch(source)?;
        let name = record.name.clone();
        self.inject(record, set_default, strict)?;
        Ok(name)
    }

    pub fn delete(&mut self, name: &str) -> Result<ProfileRecord> {
        let pos = self
            .position(name)
            .ok_or_else(|| ProfileError::not_found(name))?;
        Ok(self.profiles.remove(pos))
    }

    /// Copy `name`'s credentials into the `default` profile
    pub fn set_default(&mut self, name: &str) -> Result<()> {
        let promoted = self
            .get(name)
            .map(|p| p.renamed(DEFAULT_PROFILE))
            .ok_or_else(|| ProfileError::not_found(name))?;
        self.upsert(promoted);
        Ok(())
    }

    /// Move a profile to a new, unused name, keeping its position
    pub fn rename(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        let pos = self
            .position(old_name)
            .ok_or_else(|| ProfileError::not_found(old_name))?;
        if self.contains(new_name) {
            return Err(ProfileError::AlreadyExists {
                name: new_name.to_string(),
            });
        }

        self.profiles[pos] = self.profiles[pos].renamed(new_name);
        Ok(())
    }

    /// Write every profile to `path`, or to the file the store was loaded from
    ///
    /// Writers are serialized through a lock file beside the source file,
    /// whatever the target.
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let target = path.unwrap_or(&self.source_path);
        let _lock = WriteLock::acquire(&self.source_path)?;
        atomic_write(target, &codec::encode(&self.profiles))
    }

    /// Write a copy of the profiles, by default to a timestamped sibling of
    /// the source file. Returns the path written.
    pub fn backup(&mut self, path: Option<&Path>) -> Result<PathBuf> {
        let target = match path {
            Some(p) => p.to_path_buf(),
            None => backup_path_for(&self.source_path, Local::now()),
        };
        self.save(Some(target.as_path()))?;
        self.last_backup = Some(target.clone());
        Ok(target)
    }

    /// Replace the in-memory profiles with the latest backup's contents.
    ///
    /// Uses the backup this store last wrote if there is one, otherwise the
    /// newest timestamped backup beside the source file. Returns the path
    /// restored from.
    pub fn restore(&mut self) -> Result<PathBuf> {
        let backup = self
            .last_backup
            .clone()
            .filter(|p| p.is_file())
            .or_else(|| latest_backup(&self.source_path))
            .ok_or_else(|| ProfileError::BackupNotFound {
                path: self.source_path.clone(),
            })?;

        self.profiles = Self::read_profiles(&backup)?;
        self.last_backup = Some(backup.clone());
        Ok(backup)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.profiles.iter().position(|p| p.name == name)
    }

    fn upsert(&mut self, record: ProfileRecord) {
        match self.position(&record.name) {
            Some(pos) => self.profiles[pos] = record,
            None => self.profiles.push(record),
        }
    }
}

impl fmt::Display for ProfileStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file: {}", self.source_path.display())?;
        for name in self.list() {
            write!(f, "\n- {}", name)?;
        }
        Ok(())
    }
}
