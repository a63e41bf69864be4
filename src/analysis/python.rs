//! Python analyzer with a two-tier extraction strategy.
//!
//! The primary tier writes a fixed analysis script to a temporary file
//! and runs it under the system interpreter, reading a pipe-delimited
//! protocol from stdout: `KIND|NAME|LINE|DOCSTRING[|PARAMS]`. The
//! subprocess is an untrusted external call: it runs under a hard
//! timeout and the temporary script is removed on every exit path.
//!
//! When the interpreter is unavailable or the run fails, a line-oriented
//! scanner takes over with three ordered matchers (class definitions,
//! function definitions, assignments).

use std::io::Write;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use super::SourceAnalyzer;
use crate::model::{Element, ElementKind, Visibility};

/// Interpreter binary for the primary tier.
const PYTHON_INTERPRETER: &str = "python3";

/// Hard timeout for one interpreter run.
const PROCESS_TIMEOUT: Duration = Duration::from_secs(30);

/// Protocol lines with fewer fields than this are skipped. Multi-line
/// docstrings spill extra stdout lines; the skip rule absorbs them.
const MIN_PROTOCOL_FIELDS: usize = 4;

/// Field index of the parameter list in FUNCTION lines.
const PARAMS_FIELD: usize = 4;

/// Analysis script executed by the interpreter. Emits every declared
/// name; the visibility policy is applied on the Rust side so the
/// `include_private` override behaves identically on both tiers.
const PYTHON_AST_SCRIPT: &str = r#"
import ast
import sys

def analyze_file(filename):
    with open(filename, 'r', encoding='utf-8') as f:
        source = f.read()

    try:
        tree = ast.parse(source, filename)
        for node in ast.walk(tree):
            if isinstance(node, ast.ClassDef):
                print(f"CLASS|{node.name}|{node.lineno}|{ast.get_docstring(node) or ''}")
            elif isinstance(node, (ast.FunctionDef, ast.AsyncFunctionDef)):
                args = [arg.arg for arg in node.args.args]
                print(f"FUNCTION|{node.name}|{node.lineno}|{ast.get_docstring(node) or ''}|{','.join(args)}")
            elif isinstance(node, ast.Assign):
                for target in node.targets:
                    if isinstance(target, ast.Name):
                        print(f"VARIABLE|{target.id}|{node.lineno}||")
    except Exception as e:
        print(f"ERROR|{e}", file=sys.stderr)

if __name__ == '__main__':
    analyze_file(sys.argv[1])
"#;

static CLASS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\s*)class\s+([A-Za-z_][A-Za-z0-9_]*)\s*(?:\([^)]*\))?\s*:$").unwrap()
});
static FUNCTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\s*)def\s+([A-Za-z_][A-Za-z0-9_]*)\s*\([^)]*\)\s*(?:->\s*[^:]+)?\s*:$").unwrap()
});
static VARIABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\s*)([A-Za-z_][A-Za-z0-9_]*)\s*(?::\s*[^=]+)?\s*=\s*(.+)$").unwrap()
});

pub struct PythonAnalyzer;

impl PythonAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Primary tier: spawn the interpreter on a temp copy of the
    /// analysis script and parse the protocol output.
    fn analyze_with_interpreter(&self, path: &Path) -> anyhow::Result<Vec<Element>> {
        // NamedTempFile deletes the script on drop, covering success,
        // error and timeout paths alike.
        let mut script = tempfile::Builder::new()
            .prefix("docweaver_pyast")
            .suffix(".py")
            .tempfile()?;
        script.write_all(PYTHON_AST_SCRIPT.as_bytes())?;
        script.flush()?;

        let runtime = tokio::runtime::Runtime::new()?;
        let output = runtime.block_on(async {
            let child = tokio::process::Command::new(PYTHON_INTERPRETER)
                .arg(script.path())
                .arg(path)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .output();

            tokio::time::timeout(PROCESS_TIMEOUT, child)
                .await
                .map_err(|_| anyhow::anyhow!("interpreter timed out after {:?}", PROCESS_TIMEOUT))?
                .map_err(anyhow::Error::from)
        })?;

        if !output.status.success() {
            anyhow::bail!("interpreter exited with {}", output.status);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout
            .lines()
            .filter_map(|line| parse_protocol_line(line, path))
            .collect())
    }

    /// Fallback tier: line scanner with three ordered matchers.
    fn scan_lines(&self, path: &Path, content: &str, include_private: bool) -> Vec<Element> {
        let file_path = path.to_string_lossy().to_string();
        let lines: Vec<&str> = content.lines().collect();
        let mut elements = Vec::new();

        for (i, line) in lines.iter().enumerate() {
            let line_number = i + 1;

            if let Some(caps) = CLASS_RE.captures(line) {
                let name = caps[2].to_string();
                if should_include(&name, include_private) {
                    elements.push(Element {
                        kind: ElementKind::Type,
                        qualified_name: format!("class {}", name),
                        name,
                        file_path: file_path.clone(),
                        line_number,
                        signature: line.trim().to_string(),
                        documentation: extract_docstring(&lines, i + 1),
                        parameters: Vec::new(),
                        annotations: Vec::new(),
                    });
                }
            }

            if let Some(caps) = FUNCTION_RE.captures(line) {
                let name = caps[2].to_string();
                if should_include(&name, include_private) {
                    elements.push(Element {
                        kind: ElementKind::Function,
                        qualified_name: line.trim().to_string(),
                        name,
                        file_path: file_path.clone(),
                        line_number,
                        signature: line.trim().to_string(),
                        documentation: extract_docstring(&lines, i + 1),
                        parameters: extract_parameters(line),
                        annotations: Vec::new(),
                    });
                }
            }

            if let Some(caps) = VARIABLE_RE.captures(line) {
                let name = caps[2].to_string();
                if should_include(&name, include_private) {
                    elements.push(Element {
                        kind: ElementKind::Field,
                        qualified_name: name.clone(),
                        name,
                        file_path: file_path.clone(),
                        line_number,
                        signature: line.trim().to_string(),
                        documentation: String::new(),
                        parameters: Vec::new(),
                        annotations: Vec::new(),
                    });
                }
            }
        }

        elements
    }
}

impl Default for PythonAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceAnalyzer for PythonAnalyzer {
    fn language_id(&self) -> &'static str {
        "python"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["py"]
    }

    fn analyze(&self, path: &Path, content: &str, include_private: bool) -> Vec<Element> {
        if content.trim().is_empty() {
            return Vec::new();
        }

        match self.analyze_with_interpreter(path) {
            Ok(elements) if !elements.is_empty() => {
                return elements
                    .into_iter()
                    .filter(|e| should_include(&e.name, include_private))
                    .collect();
            }
            Ok(_) => {
                debug!(
                    "interpreter returned no elements for {}, using scanner",
                    path.display()
                );
            }
            Err(e) => {
                warn!(
                    "interpreter analysis failed for {} ({}), using scanner",
                    path.display(),
                    e
                );
            }
        }

        self.scan_lines(path, content, include_private)
    }
}

fn should_include(name: &str, include_private: bool) -> bool {
    Visibility::from_signature_and_name("", name).should_include(include_private)
}

/// Parse one `KIND|NAME|LINE|DOCSTRING[|PARAMS]` protocol line.
fn parse_protocol_line(line: &str, path: &Path) -> Option<Element> {
    let parts: Vec<&str> = line.split('|').collect();
    if parts.len() < MIN_PROTOCOL_FIELDS {
        return None;
    }

    let name = parts[1].to_string();
    let line_number: usize = parts[2].parse().ok()?;
    let docstring = parts[3].to_string();
    let file_path = path.to_string_lossy().to_string();

    match parts[0] {
        "CLASS" => Some(Element {
            kind: ElementKind::Type,
            qualified_name: format!("class {}", name),
            signature: format!("class {}:", name),
            name,
            file_path,
            line_number,
            documentation: docstring,
            parameters: Vec::new(),
            annotations: Vec::new(),
        }),
        "FUNCTION" => {
            let parameters: Vec<String> = match parts.get(PARAMS_FIELD) {
                Some(p) if !p.is_empty() => p.split(',').map(str::to_string).collect(),
                _ => Vec::new(),
            };
            let header = format!("def {}({})", name, parameters.join(", "));
            Some(Element {
                kind: ElementKind::Function,
                qualified_name: header.clone(),
                signature: format!("{}:", header),
                name,
                file_path,
                line_number,
                documentation: docstring,
                parameters,
                annotations: Vec::new(),
            })
        }
        "VARIABLE" => Some(Element {
            kind: ElementKind::Field,
            qualified_name: name.clone(),
            signature: format!("{} = ...", name),
            name,
            file_path,
            line_number,
            documentation: String::new(),
            parameters: Vec::new(),
            annotations: Vec::new(),
        }),
        _ => None,
    }
}

/// Extract a triple-quoted docstring starting at `start_index`.
///
/// The single-line form strips both quote runs via slicing; the
/// multi-line form accumulates raw lines from the opening line onward,
/// deletes every quote occurrence, and trims only the ends. The two
/// forms are intentionally asymmetric: downstream formatting was built
/// against this output.
fn extract_docstring(lines: &[&str], start_index: usize) -> String {
    let next_line = match lines.get(start_index) {
        Some(line) => line.trim(),
        None => return String::new(),
    };

    let quote = if next_line.starts_with("\"\"\"") {
        "\"\"\""
    } else if next_line.starts_with("'''") {
        "'''"
    } else {
        return String::new();
    };

    if next_line[3..].ends_with(quote) {
        return next_line[3..next_line.len() - 3].to_string();
    }

    let mut docstring = String::new();
    for (i, line) in lines.iter().enumerate().skip(start_index) {
        docstring.push_str(line);
        docstring.push('\n');
        if i > start_index && line.trim().ends_with(quote) {
            break;
        }
    }

    docstring.replace(quote, "").trim().to_string()
}

/// Split the outermost parenthesis pair on commas. A definition with no
/// parameters yields an empty list, not a list with an empty string.
fn extract_parameters(definition_line: &str) -> Vec<String> {
    let start = match definition_line.find('(') {
        Some(i) => i,
        None => return Vec::new(),
    };
    let end = match definition_line.rfind(')') {
        Some(i) if i > start => i,
        _ => return Vec::new(),
    };

    let params = definition_line[start + 1..end].trim();
    if params.is_empty() {
        return Vec::new();
    }

    params.split(',').map(|p| p.trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(content: &str, include_private: bool) -> Vec<Element> {
        PythonAnalyzer::new().scan_lines(Path::new("test.py"), content, include_private)
    }

    #[test]
    fn test_scanner_function_with_parameters() {
        let elements = scan("def foo(a, b):\n    pass\n", false);
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].kind, ElementKind::Function);
        assert_eq!(elements[0].name, "foo");
        assert_eq!(elements[0].line_number, 1);
        assert_eq!(elements[0].parameters, vec!["a", "b"]);
    }

    #[test]
    fn test_scanner_private_assignment_respects_override() {
        assert!(scan("_hidden = 1\n", false).is_empty());

        let elements = scan("_hidden = 1\n", true);
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].kind, ElementKind::Field);
        assert_eq!(elements[0].name, "_hidden");
    }

    #[test]
    fn test_scanner_class_with_docstring() {
        let source = "class Widget:\n    \"\"\"A widget.\"\"\"\n    pass\n";
        let elements = scan(source, false);
        assert_eq!(elements[0].kind, ElementKind::Type);
        assert_eq!(elements[0].name, "Widget");
        assert_eq!(elements[0].documentation, "A widget.");
    }

    #[test]
    fn test_scanner_multiline_docstring_keeps_raw_lines() {
        let source = concat!(
            "def process(data):\n",
            "    \"\"\"\n",
            "    Transforms data.\n",
            "    Returns a list.\n",
            "    \"\"\"\n",
            "    return data\n",
        );
        let elements = scan(source, false);
        let doc = &elements[0].documentation;
        assert!(doc.contains("Transforms data."));
        assert!(doc.contains("Returns a list."));
        assert!(!doc.contains("\"\"\""));
    }

    #[test]
    fn test_scanner_no_parameters_yields_empty_list() {
        let elements = scan("def noop():\n    pass\n", false);
        assert!(elements[0].parameters.is_empty());
    }

    #[test]
    fn test_scanner_skips_non_definition_lines() {
        let elements = scan("import os\nreturn 1\n", false);
        assert!(elements.is_empty());
    }

    #[test]
    fn test_empty_file_yields_no_elements() {
        let analyzer = PythonAnalyzer::new();
        assert!(analyzer.analyze(Path::new("e.py"), "", false).is_empty());
        assert!(analyzer.analyze(Path::new("e.py"), "  \n\n", false).is_empty());
    }

    #[test]
    fn test_protocol_line_class() {
        let element = parse_protocol_line("CLASS|Widget|3|A widget.", Path::new("w.py")).unwrap();
        assert_eq!(element.kind, ElementKind::Type);
        assert_eq!(element.name, "Widget");
        assert_eq!(element.line_number, 3);
        assert_eq!(element.documentation, "A widget.");
        assert_eq!(element.signature, "class Widget:");
    }

    #[test]
    fn test_protocol_line_function_with_params() {
        let element =
            parse_protocol_line("FUNCTION|run|7|Runs it.|self,count", Path::new("r.py")).unwrap();
        assert_eq!(element.kind, ElementKind::Function);
        assert_eq!(element.parameters, vec!["self", "count"]);
        assert_eq!(element.signature, "def run(self, count):");
    }

    #[test]
    fn test_protocol_line_variable() {
        let element = parse_protocol_line("VARIABLE|LIMIT|1||", Path::new("v.py")).unwrap();
        assert_eq!(element.kind, ElementKind::Field);
        assert_eq!(element.signature, "LIMIT = ...");
        assert_eq!(element.documentation, "");
    }

    #[test]
    fn test_protocol_short_and_unknown_lines_skipped() {
        assert!(parse_protocol_line("CLASS|Widget|3", Path::new("w.py")).is_none());
        assert!(parse_protocol_line("trailing docstring text", Path::new("w.py")).is_none());
        assert!(parse_protocol_line("OTHER|x|1||", Path::new("w.py")).is_none());
        assert!(parse_protocol_line("CLASS|Widget|notaline|doc", Path::new("w.py")).is_none());
    }

    #[test]
    fn test_docstring_single_quote_style() {
        let lines = vec!["def f():", "    '''Short.'''", "    pass"];
        assert_eq!(extract_docstring(&lines, 1), "Short.");
    }

    #[test]
    fn test_docstring_absent() {
        let lines = vec!["def f():", "    return 1"];
        assert_eq!(extract_docstring(&lines, 1), "");
        assert_eq!(extract_docstring(&lines, 99), "");
    }

    #[test]
    fn test_extract_parameters_outermost_pair() {
        assert_eq!(extract_parameters("def f(a, b=1):"), vec!["a", "b=1"]);
        // Commas split naively, even inside nested parens.
        assert_eq!(
            extract_parameters("def f(a, b=(1, 2)):"),
            vec!["a", "b=(1", "2)"]
        );
        assert!(extract_parameters("def f():").is_empty());
        assert!(extract_parameters("no parens here").is_empty());
    }
}
