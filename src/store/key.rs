//! Composite keys for persisted artifacts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sort key of the insights/analytics record.
pub const ANALYTICS_SORT_KEY: &str = "analytics";
/// Prefix of social post sort keys.
pub const SOCIAL_SORT_PREFIX: &str = "SOCIAL#";

/// `(partition, sort)` row address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowKey {
    pub partition: String,
    pub sort: String,
}

impl RowKey {
    pub fn new(partition: impl Into<String>, sort: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            sort: sort.into(),
        }
    }

    /// Partition `"<tenantId>#<issueId>"`, kind-qualified sort key.
    pub fn for_artifact(tenant_id: &str, issue_id: &str, kind: &ArtifactKind) -> Self {
        Self::new(partition_key(tenant_id, issue_id), kind.sort_key())
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.partition, self.sort)
    }
}

pub fn partition_key(tenant_id: &str, issue_id: &str) -> String {
    format!("{}#{}", tenant_id, issue_id)
}

/// Which artifact a row holds within an issue's partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Social { platform: String },
    Analytics,
}

impl ArtifactKind {
    pub fn social(platform: impl AsRef<str>) -> Self {
        ArtifactKind::Social {
            platform: platform.as_ref().to_ascii_lowercase(),
        }
    }

    pub fn sort_key(&self) -> String {
        match self {
            ArtifactKind::Social { platform } => {
                format!("{}{}", SOCIAL_SORT_PREFIX, platform.to_ascii_lowercase())
            }
            ArtifactKind::Analytics => ANALYTICS_SORT_KEY.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_social_key_convention() {
        let key = RowKey::for_artifact("t1", "198", &ArtifactKind::social("LinkedIn"));
        assert_eq!(key, RowKey::new("t1#198", "SOCIAL#linkedin"));
        assert_eq!(key.to_string(), "(t1#198, SOCIAL#linkedin)");
    }

    #[test]
    fn test_analytics_key_convention() {
        let key = RowKey::for_artifact("t1", "198", &ArtifactKind::Analytics);
        assert_eq!(key.partition, "t1#198");
        assert_eq!(key.sort, "analytics");
    }
}
