use std::path::Path;

use anyhow::Result;
use tracing::info;

/// Extensions an upload may carry, matched case-insensitively against the
/// part after the last dot.
const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// Outcome of upload validation. A rejected upload is not an error: the
/// caller proceeds without an attachment. Keeping the skip as an explicit
/// variant stops it from degenerating into an implicit fallthrough.
#[derive(Debug, PartialEq, Eq)]
pub enum AttachmentOutcome {
    Accepted(String),
    Rejected,
}

fn allowed_file(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()),
        None => false,
    }
}

/// Reduce an uploaded filename to something safe to use as an on-disk name:
/// drop any path components, keep only ASCII alphanumerics and `.`, `-`, `_`,
/// turn whitespace into underscores, and strip leading/trailing dots and
/// underscores.
pub fn secure_filename(filename: &str) -> String {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);

    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
            out.push(c);
        } else if c.is_whitespace() {
            out.push('_');
        }
    }

    out.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Apply the extension allow-list to the raw filename, then sanitize it into
/// the stored reference.
pub fn validate_upload(filename: &str) -> AttachmentOutcome {
    if !allowed_file(filename) {
        return AttachmentOutcome::Rejected;
    }
    let safe = secure_filename(filename);
    if safe.is_empty() {
        return AttachmentOutcome::Rejected;
    }
    AttachmentOutcome::Accepted(safe)
}

/// Write accepted upload bytes into a storage directory under its sanitized
/// name, creating the directory on first use.
pub async fn save(dir: &Path, filename: &str, bytes: &[u8]) -> Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(filename);
    tokio::fs::write(&path, bytes).await?;
    info!("Stored upload at {}", path.display());
    Ok(())
}
