pub mod artifact;
pub mod batch;
pub mod commit;
pub mod config;
pub mod image;
pub mod scope;
pub mod summary;
pub mod task_state;

pub use artifact::{ArtifactKind, ArtifactRecord};
pub use batch::{NormalizedBatch, Record};
pub use commit::{CommitRecord, Identity, StatusRecord, StatusState};
pub use config::{Config, GitHubConfig, LoggingConfig, PollConfig, RateLimitConfig, TravisConfig};
pub use image::{ImageExtraction, ImageReference};
pub use scope::{NodeScope, UpstreamKind};
pub use summary::{StateMap, Summary};
pub use task_state::{JobRecord, RunRecord, TaskRecord, TaskState};
