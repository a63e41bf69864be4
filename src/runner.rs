//! Project scanning and documentation generation drivers.
//!
//! Scanning walks the project tree, analyzes each supported file in
//! parallel and aggregates the elements into a [`ProjectAnalysis`]. A
//! single file's failure degrades to an empty per-file result; it never
//! cancels sibling work. Generation turns the analysis into one
//! markdown artifact per source file, with LLM calls bounded by the
//! configured worker limit and persistence through the atomic writer.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::analysis::analyzer_for_extension;
use crate::config::DocweaverConfig;
use crate::llm::{mock_provider_for, prompts, LlmClient, ModelConfig};
use crate::model::{Element, ProjectAnalysis};
use crate::output::AtomicWriter;

/// Default extension for generated artifacts.
const ARTIFACT_EXTENSION: &str = "md";

/// Scan a project directory and inventory its declared elements.
///
/// `include_private_override` takes precedence over the configured
/// default when present. Files are analyzed concurrently; the element
/// collection is sorted by (file path, line number) afterwards so
/// consumers see deterministic output.
pub fn scan_project(
    root: &Path,
    config: &DocweaverConfig,
    include_private_override: Option<bool>,
) -> anyhow::Result<ProjectAnalysis> {
    if !root.exists() {
        anyhow::bail!("project path does not exist: {}", root.display());
    }

    let include_private =
        include_private_override.unwrap_or(config.analysis.include_private_members);
    let excludes = config.analysis.exclude_globs()?;

    let files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| analyzer_for_extension(ext).is_some())
        })
        .filter(|path| !excludes.is_match(path))
        .collect();

    info!("scanning {} source files under {}", files.len(), root.display());

    let mut elements: Vec<Element> = files
        .par_iter()
        .flat_map(|file| analyze_file(file, include_private))
        .collect();

    elements.sort_by(|a, b| {
        (a.file_path.as_str(), a.line_number, a.name.as_str()).cmp(&(
            b.file_path.as_str(),
            b.line_number,
            b.name.as_str(),
        ))
    });

    let analysis = ProjectAnalysis::new(root.to_string_lossy(), elements);
    info!("{}", analysis.stats().formatted_summary());
    Ok(analysis)
}

/// Analyze one file, degrading any failure to an empty result.
fn analyze_file(file: &Path, include_private: bool) -> Vec<Element> {
    let ext = match file.extension().and_then(|e| e.to_str()) {
        Some(ext) => ext,
        None => return Vec::new(),
    };
    let analyzer = match analyzer_for_extension(ext) {
        Some(analyzer) => analyzer,
        None => return Vec::new(),
    };

    let content = match fs::read_to_string(file) {
        Ok(content) => content,
        Err(e) => {
            warn!("failed to read {}: {}", file.display(), e);
            return Vec::new();
        }
    };

    analyzer.analyze(file, &content, include_private)
}

/// Counts from one generation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationSummary {
    pub files_written: usize,
    pub files_skipped: usize,
    pub elements_documented: usize,
}

/// Generate one markdown artifact per analyzed source file.
pub struct DocGenerator<'a> {
    config: &'a DocweaverConfig,
    writer: AtomicWriter,
    /// When set, the offline mock layer replaces HTTP calls.
    use_mock: bool,
}

impl<'a> DocGenerator<'a> {
    pub fn new(config: &'a DocweaverConfig, use_mock: bool) -> Self {
        Self {
            config,
            writer: AtomicWriter::new(config.output.collision_policy),
            use_mock,
        }
    }

    pub fn generate(&self, analysis: &ProjectAnalysis) -> anyhow::Result<GenerationSummary> {
        let model = self.config.primary_model();
        let generated = self.generate_texts(&model, &analysis.elements)?;

        let mut summary = GenerationSummary {
            elements_documented: generated.len(),
            ..Default::default()
        };

        for (file_path, elements) in analysis.elements_by_file() {
            let content = render_artifact(file_path, &elements, &generated);
            let target = self.artifact_path(file_path);

            if self.writer.write(&target, &content)? {
                summary.files_written += 1;
            } else {
                summary.files_skipped += 1;
                warn!("skipped existing artifact: {}", target.display());
            }
        }

        Ok(summary)
    }

    /// Generated documentation text keyed by element id.
    fn generate_texts(
        &self,
        model: &ModelConfig,
        elements: &[Element],
    ) -> anyhow::Result<Vec<(String, String)>> {
        if self.use_mock {
            let provider = mock_provider_for(&model.provider, &model.name);
            return Ok(elements
                .iter()
                .map(|e| (e.id(), provider.complete(&prompts::documentation_prompt(e))))
                .collect());
        }

        let prompts: Vec<(String, String)> = elements
            .iter()
            .map(|e| (e.id(), prompts::documentation_prompt(e)))
            .collect();

        let client = LlmClient::new();
        let runtime = tokio::runtime::Runtime::new()?;
        Ok(runtime.block_on(client.generate_batch(
            model,
            prompts,
            self.config.analysis.max_workers,
        )))
    }

    fn artifact_path(&self, source_file: &str) -> PathBuf {
        let stem = Path::new(source_file)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "unnamed".to_string());

        let file_name = self
            .config
            .output
            .naming
            .apply(&stem, ARTIFACT_EXTENSION);
        self.config.output.output_directory.join(file_name)
    }

    /// Path of the last artifact the writer produced.
    pub fn last_written_path(&self) -> Option<PathBuf> {
        self.writer.last_written_path()
    }
}

fn render_artifact(
    source_file: &str,
    elements: &[&Element],
    generated: &[(String, String)],
) -> String {
    let mut content = format!("# Documentation for {}\n\n", source_file);

    for element in elements {
        content.push_str(&format!(
            "## {} `{}`\n\n",
            element.kind.description(),
            element.qualified_name
        ));
        content.push_str(&format!("Declared at line {}.\n\n", element.line_number));

        if !element.documentation.is_empty() {
            content.push_str(&format!("> {}\n\n", element.documentation.replace('\n', " ")));
        }

        let id = element.id();
        if let Some((_, text)) = generated.iter().find(|(key, _)| *key == id) {
            content.push_str(text);
            content.push_str("\n\n");
        }
    }

    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_scan_collects_both_languages() {
        let temp = TempDir::new().unwrap();
        write_file(
            &temp,
            "Greeter.java",
            "public class Greeter { public void greet() {} }",
        );
        write_file(&temp, "util.py", "def helper(x):\n    return x\n");
        write_file(&temp, "notes.txt", "not source");

        let config = DocweaverConfig::default_config();
        let analysis = scan_project(temp.path(), &config, None).unwrap();

        assert!(analysis.elements.iter().any(|e| e.name == "Greeter"));
        assert!(analysis.elements.iter().any(|e| e.name == "greet"));
        assert!(analysis.elements.iter().any(|e| e.name == "helper"));
    }

    #[test]
    fn test_scan_is_sorted_by_path_then_line() {
        let temp = TempDir::new().unwrap();
        write_file(
            &temp,
            "b.py",
            "def one():\n    pass\n\ndef two():\n    pass\n",
        );
        write_file(&temp, "a.py", "def alpha():\n    pass\n");

        let config = DocweaverConfig::default_config();
        let analysis = scan_project(temp.path(), &config, None).unwrap();

        let keys: Vec<_> = analysis
            .elements
            .iter()
            .map(|e| (e.file_path.clone(), e.line_number))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn test_scan_missing_root_fails() {
        let config = DocweaverConfig::default_config();
        assert!(scan_project(Path::new("/nonexistent/project"), &config, None).is_err());
    }

    #[test]
    fn test_scan_override_beats_configured_default() {
        let temp = TempDir::new().unwrap();
        write_file(&temp, "secrets.py", "_token = 'x'\n");

        let config = DocweaverConfig::default_config();
        let without = scan_project(temp.path(), &config, None).unwrap();
        assert!(without.elements.is_empty());

        let with = scan_project(temp.path(), &config, Some(true)).unwrap();
        assert_eq!(with.elements.len(), 1);
        assert_eq!(with.elements[0].name, "_token");
    }

    #[test]
    fn test_unreadable_file_degrades_to_empty() {
        // A directory named like a source file is unreadable as text.
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("fake.java")).unwrap();
        write_file(&temp, "real.py", "def ok():\n    pass\n");

        let config = DocweaverConfig::default_config();
        let analysis = scan_project(temp.path(), &config, None).unwrap();
        assert_eq!(analysis.elements.len(), 1);
    }

    #[test]
    fn test_generate_with_mock_writes_artifacts() {
        let project = TempDir::new().unwrap();
        write_file(
            &project,
            "Greeter.java",
            "/** Greets. */\npublic class Greeter { public void greet() {} }",
        );

        let out = TempDir::new().unwrap();
        let mut config = DocweaverConfig::default_config();
        config.output.output_directory = out.path().to_path_buf();

        let analysis = scan_project(project.path(), &config, None).unwrap();
        let generator = DocGenerator::new(&config, true);
        let summary = generator.generate(&analysis).unwrap();

        assert_eq!(summary.files_written, 1);
        assert_eq!(summary.files_skipped, 0);
        assert!(summary.elements_documented >= 2);

        let artifact = out.path().join("Greeter.md");
        let content = fs::read_to_string(&artifact).unwrap();
        assert!(content.contains("# Documentation for"));
        assert!(content.contains("com") || content.contains("Greeter"));
        assert!(content.contains("[mock"));
        assert_eq!(generator.last_written_path(), Some(artifact));
    }

    #[test]
    fn test_generate_respects_exclude_patterns() {
        let temp = TempDir::new().unwrap();
        write_file(&temp, "src/keep.py", "def kept():\n    pass\n");
        write_file(&temp, "vendor/skip.py", "def skipped():\n    pass\n");

        let mut config = DocweaverConfig::default_config();
        config.analysis.exclude_patterns = vec!["**/vendor/**".to_string()];

        let analysis = scan_project(temp.path(), &config, None).unwrap();
        assert!(analysis.elements.iter().any(|e| e.name == "kept"));
        assert!(!analysis.elements.iter().any(|e| e.name == "skipped"));
    }
}
