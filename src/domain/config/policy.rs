use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::domain::models::file::MAX_LIFETIME;

/// Upload limits enforced by the request path. Cleanup never consults this.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct FilePolicy {
    #[serde(rename = "allowedExtensions")]
    pub allowed_extensions: Vec<String>,
    #[serde(rename = "mimeTypes")]
    pub mime_types: Vec<String>,
    #[serde(rename = "maxSize")]
    pub max_size: u64,
    #[serde(rename = "defaultLifetime")]
    pub default_lifetime: i64,
}

impl Default for FilePolicy {
    fn default() -> Self {
        Self {
            allowed_extensions: ["jpg", "jpeg", "png", "gif", "mp3", "mp4", "pdf", "txt"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            mime_types: [
                "image/jpeg",
                "image/png",
                "image/gif",
                "audio/mpeg",
                "video/mp4",
                "application/pdf",
                "text/plain",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            max_size: 100 * 1024 * 1024,
            default_lifetime: 3600,
        }
    }
}

impl FilePolicy {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Policy {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let mut policy: FilePolicy =
            serde_json::from_str(&raw).map_err(|e| ConfigError::Policy {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        policy.sanitize();
        Ok(policy)
    }

    pub fn sanitize(&mut self) {
        self.allowed_extensions.retain(|s| !s.trim().is_empty());
        for ext in self.allowed_extensions.iter_mut() {
            *ext = ext.trim().trim_start_matches('.').to_ascii_lowercase();
        }
        self.mime_types.retain(|s| !s.trim().is_empty());
        self.default_lifetime = self.default_lifetime.clamp(0, MAX_LIFETIME);
    }

    pub fn allows_extension(&self, extension: &str) -> bool {
        let extension = extension.to_ascii_lowercase();
        self.allowed_extensions.iter().any(|e| *e == extension)
    }

    pub fn allows_mime_type(&self, mime_type: &str) -> bool {
        self.mime_types.iter().any(|m| m == mime_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_policy_file_keeps_defaults_for_missing_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"maxSize": 100, "allowedExtensions": [".JPEG", " "]}}"#).unwrap();

        let policy = FilePolicy::load(file.path()).unwrap();

        assert_eq!(policy.max_size, 100);
        assert_eq!(policy.allowed_extensions, vec!["jpeg".to_string()]);
        assert_eq!(policy.default_lifetime, 3600);
        assert!(policy.allows_extension("JPEG"));
        assert!(!policy.allows_extension("bat"));
    }

    #[test]
    fn default_lifetime_is_kept_in_range() {
        let mut policy = FilePolicy {
            default_lifetime: i64::MAX,
            ..FilePolicy::default()
        };
        policy.sanitize();
        assert_eq!(policy.default_lifetime, MAX_LIFETIME);

        policy.default_lifetime = -5;
        policy.sanitize();
        assert_eq!(policy.default_lifetime, 0);
    }

    #[test]
    fn unreadable_policy_file_is_a_config_error() {
        let err = FilePolicy::load(Path::new("/nonexistent/policy.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Policy { .. }));
    }
}
