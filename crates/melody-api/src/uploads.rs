//! Media uploads for moments.
//!
//! The gate is purely the filename suffix; file contents are never inspected.

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

/// Image and video extensions accepted for moments, lowercase.
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "mp4", "mov", "avi", "webm",
];

/// URL prefix uploaded files are served under.
pub const UPLOADS_URL_PREFIX: &str = "/uploads";

/// True when `filename` has an extension on the allow-list (case-insensitive).
pub fn allowed_file(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => {
            let ext = ext.to_ascii_lowercase();
            ALLOWED_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

/// Reduce a client-supplied filename to a flat, ASCII-only name.
///
/// Path separators and runs of whitespace become a single `_`, anything other
/// than ASCII alphanumerics and `.-_` is removed, and leading or trailing
/// dots and underscores are trimmed. The result never contains a separator.
pub fn secure_filename(filename: &str) -> String {
    let spaced: String = filename
        .chars()
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");

    let cleaned: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(*c, '.' | '-' | '_'))
        .collect();

    cleaned.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// On-disk name for an upload: a sub-second timestamp prefix keeps
/// concurrent uploads of the same file apart.
///
/// The prefix is joined before cleaning so a name whose stem is entirely
/// non-ASCII still keeps the dot in front of its extension.
pub fn stored_name(client_name: &str, now: DateTime<Utc>) -> String {
    secure_filename(&format!(
        "{}.{:06}_{}",
        now.timestamp(),
        now.timestamp_subsec_micros(),
        client_name
    ))
}

/// Flat directory holding uploaded media.
pub struct UploadDir {
    dir: PathBuf,
}

impl UploadDir {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Upload directory: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `data` as `name` and return the URL path it is served from.
    /// `name` must already be sanitized.
    pub async fn save(&self, name: &str, data: &[u8]) -> std::io::Result<String> {
        fs::create_dir_all(&self.dir).await?;

        let path = self.dir.join(name);
        let mut file = fs::File::create(&path).await?;
        file.write_all(data).await?;
        file.flush().await?;

        info!("Saved upload {} ({} bytes)", name, data.len());
        Ok(format!("{UPLOADS_URL_PREFIX}/{name}"))
    }

    /// Remove an upload whose database row was never written.
    pub async fn discard(&self, name: &str) {
        match fs::remove_file(self.dir.join(name)).await {
            Ok(()) => info!("Discarded upload {}", name),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to discard upload {}: {}", name, e),
        }
    }
}
