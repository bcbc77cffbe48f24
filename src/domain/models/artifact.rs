//! Run artifacts and their classification.

use serde::{Deserialize, Serialize};

/// What an artifact is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Instance log shown as a link.
    Log,
    /// Full-screen capture shown in the gallery.
    Screenshot,
    /// Public JSON metadata; the first one is read for launch configs.
    LaunchConfig,
    Other,
}

impl ArtifactKind {
    pub fn classify(name: &str, content_type: &str) -> Self {
        if content_type.starts_with("text/plain")
            && name.starts_with("public/instance-logs/")
            && name.ends_with(".log")
        {
            Self::Log
        } else if content_type == "image/png"
            && name.starts_with("public/screenshot/full/")
            && name.ends_with(".png")
        {
            Self::Screenshot
        } else if name.starts_with("public/") && name.ends_with(".json") {
            Self::LaunchConfig
        } else {
            Self::Other
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub task_id: String,
    pub run_id: u32,
    pub name: String,
    pub content_type: String,
    pub kind: ArtifactKind,
}

impl ArtifactRecord {
    pub fn new(
        task_id: impl Into<String>,
        run_id: u32,
        name: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let content_type = content_type.into();
        let kind = ArtifactKind::classify(&name, &content_type);
        Self {
            task_id: task_id.into(),
            run_id,
            name,
            content_type,
            kind,
        }
    }
}

/// The first launch-configuration artifact, in upstream order.
pub fn launch_config(artifacts: &[ArtifactRecord]) -> Option<&ArtifactRecord> {
    artifacts
        .iter()
        .find(|a| a.kind == ArtifactKind::LaunchConfig)
}
