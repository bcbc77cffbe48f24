//! Machine image identities recovered from launch-configuration references.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::errors::{FetchError, FetchResult};
use crate::domain::models::summary::Summary;

/// `<region>-<domain>-<pool>-<disk sha>-<bootstrap sha>`, e.g.
/// `east-us-2-gecko-t-win10-64-abc1234-def5678`.
const IMAGE_NAME_PATTERN: &str = r"(?i)^((north|south|east|west|(north-|south-|east-|west-)?central)-us(-2)?)-(.*)-(win.*)-([a-f0-9]{7})-([a-f0-9]{7})$";

fn image_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(IMAGE_NAME_PATTERN).expect("image name pattern is valid"))
}

/// Structured identity of one deployed machine image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageReference {
    pub region: String,
    pub domain: String,
    pub pool: String,
    pub disk_sha: String,
    pub bootstrap_sha: String,
}

impl ImageReference {
    /// Parse an opaque image reference id. Only the final `/` segment is
    /// considered, so full cloud resource ids and bare names both work.
    pub fn parse(reference: &str) -> FetchResult<Self> {
        let name = reference.rsplit('/').next().unwrap_or(reference);
        let caps = image_name_regex()
            .captures(name)
            .ok_or_else(|| FetchError::PatternMismatch(reference.to_string()))?;
        let group = |i: usize| caps.get(i).map_or(String::new(), |m| m.as_str().to_string());
        Ok(Self {
            region: group(1),
            domain: group(5),
            pool: group(6),
            disk_sha: group(7),
            bootstrap_sha: group(8),
        })
    }

    /// Worker-pool identity the image is counted under.
    pub fn pool_key(&self) -> String {
        format!("{}/{}", self.domain, self.pool)
    }
}

/// Outcome of extracting images from a batch of references.
#[derive(Debug, Default)]
pub struct ImageExtraction {
    pub images: Vec<ImageReference>,
    /// References that failed the pattern; skipped, never fatal.
    pub rejected: Vec<FetchError>,
}

impl ImageExtraction {
    /// Image counts keyed by pool, as a fresh summary contribution.
    pub fn summary(&self) -> Summary {
        let mut summary = Summary::new();
        for image in &self.images {
            summary.add_image(image.pool_key(), 1);
        }
        summary
    }
}

/// Parse every reference, keeping the ones that match.
pub fn extract_images<'a>(references: impl IntoIterator<Item = &'a str>) -> ImageExtraction {
    let mut extraction = ImageExtraction::default();
    for reference in references {
        match ImageReference::parse(reference) {
            Ok(image) => extraction.images.push(image),
            Err(err) => extraction.rejected.push(err),
        }
    }
    extraction
}
