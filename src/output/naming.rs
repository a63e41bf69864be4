//! Artifact file naming options.
//!
//! Prefix, suffix and extension segments are validated against an
//! allow-list pattern with per-segment length caps. The strict
//! constructor rejects invalid values; [`ArtifactNaming::safe`]
//! silently discards them instead.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

static VALID_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-zA-Z\-\s()+._]*$").unwrap());

const MAX_AFFIX_LENGTH: usize = 20;
const MAX_EXTENSION_LENGTH: usize = 10;

/// Optional prefix/suffix/extension applied to generated artifact names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ArtifactNaming {
    #[serde(default)]
    prefix: Option<String>,
    #[serde(default)]
    suffix: Option<String>,
    #[serde(default)]
    extension: Option<String>,
}

impl ArtifactNaming {
    /// Strict constructor: any invalid segment is a configuration error.
    pub fn new(
        prefix: Option<&str>,
        suffix: Option<&str>,
        extension: Option<&str>,
    ) -> anyhow::Result<Self> {
        let naming = Self {
            prefix: prefix.map(str::to_string),
            suffix: suffix.map(str::to_string),
            extension: extension.map(str::to_string),
        };
        naming.validate()?;
        Ok(naming)
    }

    /// Lenient constructor: invalid or over-long segments are silently
    /// discarded rather than rejected.
    pub fn safe(prefix: Option<&str>, suffix: Option<&str>, extension: Option<&str>) -> Self {
        Self {
            prefix: sanitize(prefix, MAX_AFFIX_LENGTH),
            suffix: sanitize(suffix, MAX_AFFIX_LENGTH),
            extension: sanitize(extension, MAX_EXTENSION_LENGTH),
        }
    }

    /// Check every configured segment; used by strict construction and
    /// config validation.
    pub fn validate(&self) -> anyhow::Result<()> {
        check_segment("prefix", &self.prefix, MAX_AFFIX_LENGTH)?;
        check_segment("suffix", &self.suffix, MAX_AFFIX_LENGTH)?;
        check_segment("extension", &self.extension, MAX_EXTENSION_LENGTH)?;
        Ok(())
    }

    pub fn prefix_or_empty(&self) -> &str {
        self.prefix.as_deref().unwrap_or("")
    }

    pub fn suffix_or_empty(&self) -> &str {
        self.suffix.as_deref().unwrap_or("")
    }

    pub fn extension_or_default<'a>(&'a self, default: &'a str) -> &'a str {
        match self.extension.as_deref() {
            Some(ext) if !ext.is_empty() => ext,
            _ => default,
        }
    }

    pub fn has_custom_naming(&self) -> bool {
        self.prefix.as_deref().is_some_and(|s| !s.is_empty())
            || self.suffix.as_deref().is_some_and(|s| !s.is_empty())
            || self.extension.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Final artifact file name for a stem.
    pub fn apply(&self, stem: &str, default_extension: &str) -> String {
        format!(
            "{}{}{}.{}",
            self.prefix_or_empty(),
            stem,
            self.suffix_or_empty(),
            self.extension_or_default(default_extension)
        )
    }
}

fn check_segment(label: &str, value: &Option<String>, max_length: usize) -> anyhow::Result<()> {
    let value = match value.as_deref() {
        Some(v) if !v.is_empty() => v,
        _ => return Ok(()),
    };

    if value.len() > max_length {
        anyhow::bail!("{} must be at most {} characters", label, max_length);
    }
    if !VALID_SEGMENT.is_match(value) {
        anyhow::bail!(
            "{} contains invalid characters; allowed: [0-9a-zA-Z- ()+._]",
            label
        );
    }
    Ok(())
}

fn sanitize(value: Option<&str>, max_length: usize) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() || trimmed.len() > max_length || !VALID_SEGMENT.is_match(trimmed) {
        return None;
    }
    Some(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_rejects_invalid_characters() {
        assert!(ArtifactNaming::new(Some("docs/"), None, None).is_err());
        assert!(ArtifactNaming::new(None, Some("a\\b"), None).is_err());
        assert!(ArtifactNaming::new(Some("api-docs"), Some("_v1"), Some("md")).is_ok());
    }

    #[test]
    fn test_strict_rejects_over_long_segments() {
        let long = "x".repeat(21);
        assert!(ArtifactNaming::new(Some(&long), None, None).is_err());
        assert!(ArtifactNaming::new(None, None, Some("extension123")).is_err());
    }

    #[test]
    fn test_safe_discards_invalid_values() {
        let naming = ArtifactNaming::safe(Some("ok prefix"), Some("bad/suffix"), Some("md"));
        assert_eq!(naming.prefix_or_empty(), "ok prefix");
        assert_eq!(naming.suffix_or_empty(), "");
        assert_eq!(naming.extension_or_default("txt"), "md");
    }

    #[test]
    fn test_safe_trims_and_drops_blank() {
        let naming = ArtifactNaming::safe(Some("  doc-  "), Some("   "), None);
        assert_eq!(naming.prefix_or_empty(), "doc-");
        assert_eq!(naming.suffix_or_empty(), "");
    }

    #[test]
    fn test_apply_builds_file_name() {
        let naming = ArtifactNaming::safe(Some("api-"), Some("-v1"), None);
        assert_eq!(naming.apply("Greeter", "md"), "api-Greeter-v1.md");

        let plain = ArtifactNaming::default();
        assert_eq!(plain.apply("Greeter", "md"), "Greeter.md");
        assert!(!plain.has_custom_naming());
    }
}
