//! Contract with the embedding application.
//!
//! The host decides where new uploads go ([`StorageHost::target_dir`]) and how
//! they are named ([`StorageHost::unique_file_name`]). The adapter only
//! supplies an [`ExistenceProbe`] so the host can avoid collisions.

use std::future::Future;
use std::path::PathBuf;

use chrono::Utc;

use super::key::join_key;

/// An uploaded file waiting in a local temporary location.
#[derive(Debug, Clone)]
pub struct StoredFile {
    /// Local temporary path holding the bytes.
    pub path: PathBuf,
    /// Original file name as supplied by the uploader.
    pub name: String,
    /// Declared MIME type.
    pub content_type: String,
}

impl StoredFile {
    /// Create a stored file description.
    #[must_use]
    pub fn new(
        path: impl Into<PathBuf>,
        name: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            content_type: content_type.into(),
        }
    }
}

/// Presence check used while picking a free file name.
pub trait ExistenceProbe: Send + Sync {
    /// Whether `file_name` already exists inside `target_dir`.
    fn exists(&self, file_name: &str, target_dir: &str) -> impl Future<Output = bool> + Send;
}

/// Naming policy supplied by the host application.
pub trait StorageHost: Send + Sync {
    /// Default directory for new uploads, relative to the path prefix.
    fn target_dir(&self) -> String;

    /// A collision-free path for `file` inside `target_dir`.
    ///
    /// The returned path is relative to the path prefix and includes
    /// `target_dir`.
    fn unique_file_name<P: ExistenceProbe>(
        &self,
        probe: &P,
        file: &StoredFile,
        target_dir: &str,
    ) -> impl Future<Output = String> + Send;
}

/// Uploads go under `YYYY/MM` directories.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatedDirectories;

impl StorageHost for DatedDirectories {
    fn target_dir(&self) -> String {
        Utc::now().format("%Y/%m").to_string()
    }

    async fn unique_file_name<P: ExistenceProbe>(
        &self,
        probe: &P,
        file: &StoredFile,
        target_dir: &str,
    ) -> String {
        next_free_name(probe, &file.name, target_dir).await
    }
}

/// Uploads go straight under the path prefix.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatDirectory;

impl StorageHost for FlatDirectory {
    fn target_dir(&self) -> String {
        String::new()
    }

    async fn unique_file_name<P: ExistenceProbe>(
        &self,
        probe: &P,
        file: &StoredFile,
        target_dir: &str,
    ) -> String {
        next_free_name(probe, &file.name, target_dir).await
    }
}

/// Try `stem.ext`, `stem-1.ext`, `stem-2.ext`, ... until the probe misses.
///
/// Candidates are probed lowercased since that is how they get stored.
async fn next_free_name<P: ExistenceProbe>(probe: &P, original: &str, target_dir: &str) -> String {
    let (stem, ext) = split_extension(original);
    let stem = sanitize_stem(stem);

    let mut attempt: u32 = 0;
    loop {
        let candidate = if attempt == 0 {
            format!("{stem}{ext}")
        } else {
            format!("{stem}-{attempt}{ext}")
        };
        if !probe.exists(&candidate.to_lowercase(), target_dir).await {
            return join_key(&[target_dir, candidate.as_str()]);
        }
        attempt += 1;
    }
}

/// Split `name` into stem and extension (with its dot).
fn split_extension(name: &str) -> (&str, &str) {
    let name = name.rsplit(['/', '\\']).next().unwrap_or(name);
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}

/// Sanitize a file stem for use in an object key.
///
/// Only allows ASCII alphanumeric characters, dots, hyphens, and underscores.
fn sanitize_stem(stem: &str) -> String {
    let sanitized: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    if sanitized.is_empty() {
        "upload".to_string()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    struct Taken(HashSet<String>);

    impl ExistenceProbe for Taken {
        async fn exists(&self, file_name: &str, target_dir: &str) -> bool {
            self.0.contains(&join_key(&[target_dir, file_name]))
        }
    }

    fn taken(keys: &[&str]) -> Taken {
        Taken(keys.iter().map(|k| (*k).to_string()).collect())
    }

    #[test]
    fn test_sanitize_stem() {
        assert_eq!(sanitize_stem("invoice"), "invoice");
        assert_eq!(sanitize_stem("my file (1)"), "my-file--1-");
        assert_eq!(sanitize_stem("日本語"), "---");
        assert_eq!(sanitize_stem(""), "upload");
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("Photo.JPG"), ("Photo", ".JPG"));
        assert_eq!(split_extension("archive.tar.gz"), ("archive.tar", ".gz"));
        assert_eq!(split_extension(".env"), (".env", ""));
        assert_eq!(split_extension("C:\\tmp\\a.png"), ("a", ".png"));
        assert_eq!(split_extension("README"), ("README", ""));
    }

    #[tokio::test]
    async fn test_first_candidate_when_free() {
        let file = StoredFile::new("/tmp/x", "Photo.JPG", "image/jpeg");
        let name = FlatDirectory
            .unique_file_name(&taken(&[]), &file, "")
            .await;
        assert_eq!(name, "Photo.JPG");
    }

    #[tokio::test]
    async fn test_suffix_skips_taken_names_case_insensitively() {
        let file = StoredFile::new("/tmp/x", "Photo.JPG", "image/jpeg");
        let probe = taken(&["2024/05/photo.jpg", "2024/05/photo-1.jpg"]);
        let name = DatedDirectories
            .unique_file_name(&probe, &file, "2024/05")
            .await;
        assert_eq!(name, "2024/05/Photo-2.JPG");
    }

    #[test]
    fn test_dated_target_dir_shape() {
        let dir = DatedDirectories.target_dir();
        let parts: Vec<&str> = dir.split('/').collect();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].len(), 4);
        assert_eq!(parts[1].len(), 2);
        assert!(FlatDirectory.target_dir().is_empty());
    }
}
