//! Local disk storage for artwork images and avatars.
//!
//! Files are written under `{upload_dir}/artworks` and `{upload_dir}/avatars`
//! with generated names `{unix_millis}-{random}-{sanitized original}` and
//! served from `/uploads`.

use std::path::{Component, Path, PathBuf};

use axum::body::Bytes;
use chrono::Utc;
use thiserror::Error;

/// Public URL prefix uploaded files are served under.
pub const PUBLIC_PREFIX: &str = "/uploads";

/// Largest accepted file.
pub const MAX_FILE_BYTES: usize = 5 * 1024 * 1024;

/// Most images accepted on one artwork request.
pub const MAX_ARTWORK_IMAGES: usize = 5;

const MAX_NAME_CHARS: usize = 100;

/// Errors that can occur while storing an upload.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No file uploaded")]
    Missing,
    #[error("Only image files are allowed")]
    NotAnImage,
    #[error("Only .png, .jpg and .jpeg format allowed")]
    UnsupportedAvatarType,
    #[error("File too large (max {max} bytes)")]
    TooLarge { max: usize },
    #[error("Too many images (max {max})")]
    TooMany { max: usize },
    #[error("upload I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// What an upload is for. Decides the directory and accepted types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Artwork,
    Avatar,
}

impl UploadKind {
    const fn dir(self) -> &'static str {
        match self {
            Self::Artwork => "artworks",
            Self::Avatar => "avatars",
        }
    }

    fn check(self, file: &UploadedFile) -> Result<(), UploadError> {
        if file.bytes.is_empty() {
            return Err(UploadError::Missing);
        }
        if file.bytes.len() > MAX_FILE_BYTES {
            return Err(UploadError::TooLarge {
                max: MAX_FILE_BYTES,
            });
        }

        let content_type = file
            .content_type
            .as_deref()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match self {
            Self::Artwork if !content_type.starts_with("image/") => Err(UploadError::NotAnImage),
            Self::Avatar => {
                let extension = Path::new(&file.file_name)
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(str::to_ascii_lowercase);
                let type_ok = matches!(
                    content_type.as_str(),
                    "image/jpeg" | "image/jpg" | "image/png"
                );
                let extension_ok = matches!(extension.as_deref(), Some("jpeg" | "jpg" | "png"));
                if type_ok && extension_ok {
                    Ok(())
                } else {
                    Err(UploadError::UnsupportedAvatarType)
                }
            }
            Self::Artwork => Ok(()),
        }
    }
}

/// A file received in a multipart form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Writes uploads below a root directory.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory served at [`PUBLIC_PREFIX`].
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validate every file before writing any of them.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure.
    pub fn check_all(&self, kind: UploadKind, files: &[UploadedFile]) -> Result<(), UploadError> {
        if kind == UploadKind::Artwork && files.len() > MAX_ARTWORK_IMAGES {
            return Err(UploadError::TooMany {
                max: MAX_ARTWORK_IMAGES,
            });
        }
        files.iter().try_for_each(|file| kind.check(file))
    }

    /// Store a file and return its public URL.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a rejected file, or `UploadError::Io`
    /// if the file cannot be written.
    pub async fn save(&self, kind: UploadKind, file: &UploadedFile) -> Result<String, UploadError> {
        kind.check(file)?;

        let dir = self.root.join(kind.dir());
        tokio::fs::create_dir_all(&dir).await?;

        let name = generated_name(&file.file_name);
        tokio::fs::write(dir.join(&name), &file.bytes).await?;

        tracing::debug!(kind = kind.dir(), file = %name, bytes = file.bytes.len(), "upload stored");
        Ok(format!("{PUBLIC_PREFIX}/{}/{name}", kind.dir()))
    }

    /// Store several files, returning their public URLs in order.
    ///
    /// # Errors
    ///
    /// Returns the first failure. Files written before it are removed.
    pub async fn save_all(
        &self,
        kind: UploadKind,
        files: &[UploadedFile],
    ) -> Result<Vec<String>, UploadError> {
        self.check_all(kind, files)?;

        let mut urls = Vec::with_capacity(files.len());
        for file in files {
            match self.save(kind, file).await {
                Ok(url) => urls.push(url),
                Err(e) => {
                    self.remove_all(&urls).await;
                    return Err(e);
                }
            }
        }
        Ok(urls)
    }

    /// Delete previously stored files. Failures are logged, not returned.
    pub async fn remove_all(&self, urls: &[String]) {
        for url in urls {
            let Some(path) = self.local_path(url) else {
                continue;
            };
            if let Err(e) = tokio::fs::remove_file(&path).await {
                tracing::warn!(error = %e, path = %path.display(), "failed to remove upload");
            }
        }
    }

    /// Map a public URL back to a path under the root, refusing anything
    /// that would escape it.
    fn local_path(&self, url: &str) -> Option<PathBuf> {
        let relative = Path::new(url.strip_prefix(PUBLIC_PREFIX)?.trim_start_matches('/'));
        if relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            Some(self.root.join(relative))
        } else {
            None
        }
    }
}

/// `{unix_millis}-{random}-{sanitized original name}`.
fn generated_name(original: &str) -> String {
    format!(
        "{}-{}-{}",
        Utc::now().timestamp_millis(),
        rand::random::<u32>(),
        sanitize_file_name(original)
    )
}

/// Keep ASCII letters, digits, `.`, `-` and `_`; replace everything else.
fn sanitize_file_name(original: &str) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    let truncated: String = cleaned
        .chars()
        .rev()
        .take(MAX_NAME_CHARS)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if truncated.is_empty() {
        "upload".to_string()
    } else {
        truncated
    }
}
