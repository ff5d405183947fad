use std::{collections::HashSet, fs, path::Path};

use anyhow::{bail, Context, Result};
use corridor_core::SegmentTemplate;
use corridor_runtime::RunConfig;

const SUPPORTED_MANIFEST_VERSION: u32 = 1;
const DEFAULT_COURSE: &str = include_str!("../assets/course.toml");

/// Segment templates and run configuration loaded from a course manifest.
#[derive(Debug)]
pub(crate) struct Course {
    pub(crate) config: RunConfig,
    pub(crate) templates: Vec<SegmentTemplate>,
}

#[derive(Debug, serde::Deserialize)]
struct Manifest {
    version: u32,
    #[serde(default)]
    run: RunConfig,
    #[serde(default)]
    segments: Vec<SegmentTemplate>,
}

/// Loads the course at `path`, or the embedded default course when absent.
pub(crate) fn load(path: Option<&Path>) -> Result<Course> {
    match path {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read course manifest at {}", path.display()))?;
            parse_manifest(&contents)
                .with_context(|| format!("invalid course manifest at {}", path.display()))
        }
        None => parse_manifest(DEFAULT_COURSE).context("invalid embedded course manifest"),
    }
}

fn parse_manifest(contents: &str) -> Result<Course> {
    let manifest: Manifest =
        toml::from_str(contents).context("failed to parse course manifest toml contents")?;
    if manifest.version != SUPPORTED_MANIFEST_VERSION {
        bail!(
            "unsupported course manifest version {}; expected {}",
            manifest.version,
            SUPPORTED_MANIFEST_VERSION
        );
    }
    if manifest.segments.is_empty() {
        bail!("course manifest declares no segments");
    }

    let mut seen = HashSet::with_capacity(manifest.segments.len());
    for segment in &manifest.segments {
        if !seen.insert(segment.kind) {
            bail!("course manifest contains duplicate segment kind {}", segment.kind);
        }
    }

    let mut templates = manifest.segments;
    templates.sort_by_key(|template| template.kind);

    Ok(Course {
        config: manifest.run,
        templates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use corridor_core::SegmentKind;

    #[test]
    fn embedded_course_parses() {
        let course = load(None).expect("embedded course should parse");
        assert_eq!(course.templates.len(), 8);
        assert_eq!(course.config.pool.instances_per_kind(), 3);
        for (index, template) in course.templates.iter().enumerate() {
            assert_eq!(template.kind, SegmentKind::new(index as u32));
        }
    }

    #[test]
    fn manifest_rejects_unknown_versions() {
        let manifest = r#"
            version = 2

            [[segments]]
            kind = 0
            [segments.base]
            hazards = 3
        "#;
        assert!(parse_manifest(manifest).is_err());
    }

    #[test]
    fn manifest_rejects_duplicate_kinds() {
        let manifest = r#"
            version = 1

            [[segments]]
            kind = 0
            [segments.base]
            hazards = 3

            [[segments]]
            kind = 0
            [segments.base]
            hazards = 4
        "#;
        let error = parse_manifest(manifest).expect_err("duplicates must fail");
        assert!(error.to_string().contains("duplicate segment kind 0"));
    }

    #[test]
    fn manifest_orders_segments_by_kind() {
        let manifest = r#"
            version = 1

            [[segments]]
            kind = 1
            [segments.base]
            hazards = 3

            [[segments]]
            kind = 0
            bonuses = 2
            [segments.base]
            hazards = 4
            collectible_groups = [2, 2]
        "#;
        let course = parse_manifest(manifest).expect("manifest should parse");
        assert_eq!(course.templates[0].kind, SegmentKind::new(0));
        assert_eq!(course.templates[0].layout.bonuses, 2);
        assert_eq!(course.templates[1].layout.base.hazards, 3);
        assert_eq!(course.config, RunConfig::default());
    }

    #[test]
    fn manifest_requires_segments() {
        assert!(parse_manifest("version = 1").is_err());
    }
}
