//! Per-owner-class attachment configuration.
//!
//! Each owner class declares a map from file type name to the rules for
//! that type. The configuration is immutable and handed to the
//! [`AttachmentManager`](super::AttachmentManager) at construction, so
//! two managers for the same owner class can never disagree about what
//! is allowed.

use std::collections::HashMap;

pub const DEFAULT_STORAGE: &str = "local";
pub const DEFAULT_MAX_SIZE_KB: u64 = 102_400;

/// Accept value matching every extension.
pub const WILDCARD_ACCEPT: &str = "*/*";

/// Validation and placement rules for one file type. Unset fields fall
/// back to defaults when resolved.
#[derive(Debug, Clone, Default)]
pub struct FileTypeConfig {
    /// Comma-separated allowed extensions, or `None`/`"*/*"` for any.
    pub accept: Option<String>,
    /// Disk name; defaults to `"local"`.
    pub storage: Option<String>,
    /// Upper size bound in kilobytes; defaults to 102400 KB.
    pub max_size_kb: Option<u64>,
    /// At most one file of this type per owner; attaching replaces.
    pub unique: bool,
    /// Disk path prefix; defaults to `"<owner kind>/<type>"`.
    pub path: Option<String>,
}

impl FileTypeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    pub fn with_storage(mut self, storage: impl Into<String>) -> Self {
        self.storage = Some(storage.into());
        self
    }

    pub fn with_max_size_kb(mut self, max_size_kb: u64) -> Self {
        self.max_size_kb = Some(max_size_kb);
        self
    }

    pub fn with_unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub(crate) fn resolve(&self, owner_kind: &str, file_type: &str) -> ResolvedTypeConfig {
        ResolvedTypeConfig {
            accept: self.accept.clone(),
            storage: self
                .storage
                .clone()
                .unwrap_or_else(|| DEFAULT_STORAGE.to_string()),
            max_size_kb: self.max_size_kb.unwrap_or(DEFAULT_MAX_SIZE_KB),
            unique: self.unique,
            path: self
                .path
                .clone()
                .unwrap_or_else(|| format!("{}/{}", owner_kind.to_lowercase(), file_type)),
        }
    }
}

/// `FileTypeConfig` with every default filled in.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedTypeConfig {
    pub accept: Option<String>,
    pub storage: String,
    pub max_size_kb: u64,
    pub unique: bool,
    pub path: String,
}

/// The file types one owner class accepts.
#[derive(Debug, Clone, Default)]
pub struct OwnerFileConfig {
    types: HashMap<String, FileTypeConfig>,
    accept_any_type: bool,
}

impl OwnerFileConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, name: impl Into<String>, config: FileTypeConfig) -> Self {
        self.types.insert(name.into(), config);
        self
    }

    /// Allow attaching under type names that have no configuration; a
    /// permissive default is synthesized for them.
    pub fn with_accept_any_type(mut self) -> Self {
        self.accept_any_type = true;
        self
    }

    pub fn get(&self, file_type: &str) -> Option<&FileTypeConfig> {
        self.types.get(file_type)
    }

    pub fn accepts_any_type(&self) -> bool {
        self.accept_any_type
    }
}

/// Parse an accept string into its extension list: comma-separated,
/// whitespace trimmed, leading dots stripped.
pub(crate) fn accepted_extensions(accept: &str) -> Vec<String> {
    accept
        .split(',')
        .map(|ext| ext.trim().trim_start_matches('.').to_string())
        .filter(|ext| !ext.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_fills_defaults() {
        let resolved = FileTypeConfig::new().resolve("User", "avatar");

        assert_eq!(resolved.storage, "local");
        assert_eq!(resolved.max_size_kb, 102_400);
        assert!(!resolved.unique);
        assert_eq!(resolved.path, "user/avatar");
        assert!(resolved.accept.is_none());
    }

    #[test]
    fn resolve_keeps_explicit_values() {
        let resolved = FileTypeConfig::new()
            .with_accept("jpg,png")
            .with_storage("s3")
            .with_max_size_kb(512)
            .with_unique()
            .with_path("custom/place")
            .resolve("User", "avatar");

        assert_eq!(resolved.accept.as_deref(), Some("jpg,png"));
        assert_eq!(resolved.storage, "s3");
        assert_eq!(resolved.max_size_kb, 512);
        assert!(resolved.unique);
        assert_eq!(resolved.path, "custom/place");
    }

    #[test]
    fn accepted_extensions_parsing() {
        assert_eq!(accepted_extensions("jpg,png"), vec!["jpg", "png"]);
        assert_eq!(accepted_extensions(" .jpg , .png "), vec!["jpg", "png"]);
        assert_eq!(accepted_extensions("pdf"), vec!["pdf"]);
        assert!(accepted_extensions("").is_empty());
    }

    #[test]
    fn owner_config_lookup() {
        let config = OwnerFileConfig::new()
            .with_type("avatar", FileTypeConfig::new().with_unique())
            .with_accept_any_type();

        assert!(config.get("avatar").is_some());
        assert!(config.get("invoice").is_none());
        assert!(config.accepts_any_type());
    }
}
