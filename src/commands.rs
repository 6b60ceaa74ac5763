//! High-level command orchestration for the CLI.
//!
//! Each handler loads a [`ProfileStore`] from the resolved credentials file,
//! runs one store operation, and saves the result when the operation
//! mutates it. This is the only layer that logs or talks to the terminal.

use anstyle::AnsiColor;
use anyhow::{Context, Result, bail};
use std::path::Path;

use crate::error::{ErrorKind, ProfileError};
use crate::paths::Paths;
use crate::profile::{DEFAULT_PROFILE, validate_profile_name};
use crate::sources::{ProfileSource, Providers};
use crate::store::ProfileStore;
use crate::ui::Ui;

/// Parse the `--setdefault` answer
pub fn parse_yes_no(s: &str) -> Result<bool, String> {
    match s.to_lowercase().as_str() {
        "y" | "yes" => Ok(true),
        "n" | "no" => Ok(false),
        _ => Err(format!("expected y or n, got '{}'", s)),
    }
}

fn load_store(paths: &Paths) -> Result<ProfileStore> {
    let store = ProfileStore::load(&paths.creds_file).map_err(with_hint)?;
    log::debug!(
        "loaded {} profile(s) from {}",
        store.len(),
        paths.creds_file.display()
    );
    Ok(store)
}

fn save_store(store: &ProfileStore) -> Result<()> {
    store
        .save(None)
        .with_context(|| format!("Failed to save {}", store.source_path().display()))?;
    log::debug!(
        "wrote {} profile(s) to {}",
        store.len(),
        store.source_path().display()
    );
    Ok(())
}

/// Attach a usage hint to the store errors a user can act on
fn with_hint(err: ProfileError) -> anyhow::Error {
    let hint = match &err {
        ProfileError::ProfileNotFound { .. } => {
            Some("Hint: Use 'awsprof list' to see available profiles.")
        }
        ProfileError::FileNotFound { .. } => {
            Some("Hint: Pass --creds-file or set AWS_CREDS_FILE to use another file.")
        }
        ProfileError::BackupNotFound { .. } => {
            Some("Hint: Create one with 'awsprof backup'.")
        }
        _ => None,
    };
    match hint {
        Some(hint) => anyhow::anyhow!("{}\n{}", err, hint),
        None => anyhow::Error::new(err),
    }
}

/// Shorten an access key id to its first and last four characters
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// List all profiles in the credentials file
pub fn list(paths: &Paths, ui: &Ui) -> Result<()> {
    let store = load_store(paths)?;

    if store.is_empty() {
        ui.warn(format!("No profiles in {}", paths.creds_file.display()));
        return Ok(());
    }

    let mut table = ui.simple_table();
    table.set_header(vec![
        ui.header_cell(""),
        ui.header_cell("Profile"),
        ui.header_cell("Access key"),
        ui.header_cell("Session token"),
    ]);

    for record in store.records() {
        let is_default = record.name == DEFAULT_PROFILE;
        let icon = if is_default { ui.icon_ok() } else { " " };
        let name_cell = if is_default {
            ui.colored_cell(&record.name, AnsiColor::Green)
        } else {
            ui.cell(&record.name)
        };
        let key = record
            .access_key_id
            .as_deref()
            .map(mask_key)
            .unwrap_or_else(|| "-".to_string());
        let token = if record.has_session_token() { "yes" } else { "-" };

        table.add_row(vec![ui.cell(icon), name_cell, ui.cell(key), ui.cell(token)]);
    }

    ui.section(format!("AWS profiles in {}", paths.creds_file.display()));
    ui.println(table.to_string());
    Ok(())
}

/// Print a profile section, secrets included
pub fn show(paths: &Paths, name: &str, ui: &Ui) -> Result<()> {
    let store = load_store(paths)?;
    ui.println(store.show(name).map_err(with_hint)?);
    Ok(())
}

/// Add a profile from the clipboard or the environment
pub fn add(
    paths: &Paths,
    source: &str,
    set_default: bool,
    strict: bool,
    providers: &Providers<'_>,
    ui: &Ui,
) -> Result<()> {
    let source = match source.parse::<ProfileSource>() {
        Ok(source) => source,
        Err(e) => bail!("{}\nHint: Use 'cb' for the clipboard or 'env' for environment variables.", e),
    };

    let mut store = load_store(paths)?;
    let name = store
        .inject_from(source, providers, set_default, strict)
        .map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => anyhow::anyhow!(
                "{}\nHint: Drop --strict to overwrite it, or rename the existing profile first.",
                e
            ),
            _ => with_hint(e),
        })?;
    log::debug!("injected profile '{}' from {:?}", name, source);
    save_store(&store)?;

    ui.ok(format!("Added profile '{}'", name));
    if set_default {
        ui.ok(format!("Profile '{}' is now the default", name));
    }
    Ok(())
}

/// Remove a profile
pub fn delete(paths: &Paths, name: &str, force: bool, ui: &Ui) -> Result<()> {
    let mut store = load_store(paths)?;

    if !store.contains(name) {
        return Err(with_hint(ProfileError::not_found(name)));
    }

    // Confirm unless --force
    if !force {
        let confirm = inquire::Confirm::new(&format!("Are you sure you want to delete profile '{}'?", name))
            .with_default(false)
            .with_help_message("The profile's keys are removed from the credentials file")
            .prompt()
            .context("Confirmation cancelled")?;

        if !confirm {
            ui.warn("Deletion cancelled.");
            return Ok(());
        }
    }

    store.delete(name).map_err(with_hint)?;
    save_store(&store)?;

    ui.ok(format!("Deleted profile '{}'", name));
    Ok(())
}

/// Copy a profile's credentials into `default`
pub fn set_default(paths: &Paths, name: &str, ui: &Ui) -> Result<()> {
    let mut store = load_store(paths)?;
    store.set_default(name).map_err(with_hint)?;
    save_store(&store)?;

    ui.ok(format!("Profile '{}' is now the default", name));
    Ok(())
}

/// Rename a profile
pub fn rename(paths: &Paths, old_name: &str, new_name: &str, ui: &Ui) -> Result<()> {
    validate_profile_name(new_name)?;

    let mut store = load_store(paths)?;
    store.rename(old_name, new_name).map_err(|e| match e.kind() {
        ErrorKind::AlreadyExists => anyhow::anyhow!(
            "{}\nHint: Choose a different name or delete the existing profile first.",
            e
        ),
        _ => with_hint(e),
    })?;
    save_store(&store)?;

    ui.ok(format!("Renamed profile '{}' to '{}'", old_name, new_name));
    Ok(())
}

/// Back up the credentials file, by default next to the original
pub fn backup(paths: &Paths, dest: Option<&Path>, ui: &Ui) -> Result<()> {
    let mut store = load_store(paths)?;
    let written = store
        .backup(dest)
        .context("Failed to write backup")?;
    log::debug!("backup written to {}", written.display());

    ui.ok(format!(
        "Backed up {} profile(s) to {}",
        store.len(),
        written.display()
    ));
    Ok(())
}

/// Restore the credentials file from its latest backup
pub fn restore(paths: &Paths, ui: &Ui) -> Result<()> {
    // The credentials file may be gone or corrupt; restoring must still work then.
    let mut store = match ProfileStore::load(&paths.creds_file) {
        Ok(store) => store,
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::Format) => {
            log::debug!(
                "{} unusable ({}), restoring into an empty store",
                paths.creds_file.display(),
                e
            );
            ProfileStore::from_records(&paths.creds_file, Vec::new())
        }
        Err(e) => return Err(with_hint(e)),
    };

    let restored_from = store.restore().map_err(with_hint)?;
    save_store(&store)?;

    ui.ok(format!(
        "Restored {} profile(s) from {}",
        store.len(),
        restored_from.display()
    ));
    Ok(())
}
