//! Blob storage path conventions for poster and trailer assets.

use crate::{error::Result, Error};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which asset slot of a record a blob fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Poster,
    Trailer,
}

impl AssetKind {
    /// Top-level storage namespace for this kind. Namespaces are disjoint.
    pub fn namespace(&self) -> &'static str {
        match self {
            AssetKind::Poster => "posters",
            AssetKind::Trailer => "trailers",
        }
    }

    /// Find the kind owning a storage path.
    pub fn of_path(path: &str) -> Option<AssetKind> {
        let (namespace, _) = path.split_once('/')?;
        [AssetKind::Poster, AssetKind::Trailer]
            .into_iter()
            .find(|kind| kind.namespace() == namespace)
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Poster => f.write_str("poster"),
            AssetKind::Trailer => f.write_str("trailer"),
        }
    }
}

/// Reduce a user-supplied file name to a single safe path component.
pub fn sanitize_file_name(file_name: &str) -> String {
    let last = file_name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default()
        .trim();
    let cleaned: String = last
        .chars()
        .map(|c| if c.is_control() { '_' } else { c })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => "file".to_string(),
        _ => cleaned,
    }
}

/// Storage path for an asset: `{namespace}/{id}-{file_name}`.
pub fn asset_path(kind: AssetKind, record_id: &str, file_name: &str) -> String {
    format!(
        "{}/{}-{}",
        kind.namespace(),
        record_id,
        sanitize_file_name(file_name)
    )
}

/// Check that a path names an object inside one of the asset namespaces.
pub fn validate_asset_path(path: &str) -> Result<AssetKind> {
    let invalid = |reason: &str| Error::InvalidAssetPath(format!("{path:?}: {reason}"));

    let kind = AssetKind::of_path(path).ok_or_else(|| invalid("unknown namespace"))?;
    if path.contains('\\') {
        return Err(invalid("backslash in path"));
    }
    let mut segments = path.split('/').skip(1).peekable();
    if segments.peek().is_none() {
        return Err(invalid("missing object name"));
    }
    for segment in segments {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(invalid("empty or relative segment"));
        }
    }
    Ok(kind)
}

/// Media type served for a stored object, from its extension.
pub fn content_type_for(path: &str) -> &'static str {
    let extension = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_namespaced_by_kind() {
        assert_eq!(
            asset_path(AssetKind::Poster, "t-1", "dune.jpg"),
            "posters/t-1-dune.jpg"
        );
        assert_eq!(
            asset_path(AssetKind::Trailer, "t-1", "dune.mp4"),
            "trailers/t-1-dune.mp4"
        );
    }

    #[test]
    fn file_names_lose_directories() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\Users\\me\\poster.png"), "poster.png");
        assert_eq!(sanitize_file_name(".."), "file");
        assert_eq!(sanitize_file_name(""), "file");
    }

    #[test]
    fn validate_accepts_asset_paths() {
        assert_eq!(
            validate_asset_path("posters/t-1-dune.jpg").unwrap(),
            AssetKind::Poster
        );
        assert_eq!(
            validate_asset_path("trailers/t-1-dune.mp4").unwrap(),
            AssetKind::Trailer
        );
    }

    #[test]
    fn validate_rejects_escapes() {
        assert!(validate_asset_path("posters/../secrets").is_err());
        assert!(validate_asset_path("posters/").is_err());
        assert!(validate_asset_path("avatars/me.png").is_err());
        assert!(validate_asset_path("/posters/a.png").is_err());
        assert!(validate_asset_path("posters\\a.png").is_err());
    }

    #[test]
    fn content_types() {
        assert_eq!(content_type_for("posters/a.JPG"), "image/jpeg");
        assert_eq!(content_type_for("trailers/a.mp4"), "video/mp4");
        assert_eq!(content_type_for("posters/noext"), "application/octet-stream");
    }
}
