//! Credentials file codec.
//!
//! The format is a small INI dialect:
//!
//! ```text
//! [default]
//! aws_access_key_id=AKIA123
//! aws_secret_access_key=SECRET456
//!
//! [work]
//! aws_access_key_id=AKIA999
//! ```
//!
//! Only the three credential keys are accepted. Values are split on the
//! first `=`, so they may contain `=` themselves.

use crate::error::{ProfileError, Result};
use crate::profile::{CredentialField, ProfileRecord};

/// Parse credentials text into records, in header order.
///
/// A header that repeats an earlier name continues filling that earlier
/// record, so later values win field by field.
pub fn decode(text: &str) -> Result<Vec<ProfileRecord>> {
    let mut records: Vec<ProfileRecord> = Vec::new();
    let mut current: Option<usize> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(name) = parse_header(line) {
            if name.is_empty() {
                return Err(format_error(line_no, "empty profile name in section header"));
            }
            let pos = match records.iter().position(|r| r.name == name) {
                Some(pos) => pos,
                None => {
                    records.push(ProfileRecord::new(name));
                    records.len() - 1
                }
            };
            current = Some(pos);
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            return Err(format_error(
                line_no,
                format!("expected '[name]' or 'key=value', found '{}'", line),
            ));
        };
        let (key, value) = (key.trim(), value.trim());

        let Some(pos) = current else {
            return Err(format_error(
                line_no,
                format!("found {} outside of profile definition", key),
            ));
        };

        let field = key
            .parse::<CredentialField>()
            .map_err(|e| format_error(line_no, e))?;
        records[pos].set_field(field, value);
    }

    Ok(records)
}

/// Serialize records back to credentials text.
///
/// Every section is followed by a blank line. Empty or missing values are
/// not written.
pub fn encode(records: &[ProfileRecord]) -> String {
    let mut out = String::new();
    for record in records {
        out.push_str(&encode_record(record));
        out.push_str("\n\n");
    }
    out
}

/// Text of a single section, without a trailing newline
pub fn encode_record(record: &ProfileRecord) -> String {
    let mut lines = vec![format!("[{}]", record.name)];
    for field in CredentialField::all() {
        if let Some(value) = record.field(field).filter(|v| !v.is_empty()) {
            lines.push(format!("{}={}", field.key(), value));
        }
    }
    lines.join("\n")
}

/// Name between the brackets, kept exactly as written
fn parse_header(line: &str) -> Option<&str> {
    line.strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
}

fn format_error(line: usize, message: impl Into<String>) -> ProfileError {
    ProfileError::Format {
        line,
        message: message.into(),
    }
}
