//! Source code files.

use std::path::Path;

use serde_json::Value as JsonValue;

use super::{DocumentLoader, base_metadata, read_text};
use crate::{DocumentError, LoadedDocument};

/// Extension to language name.
const LANGUAGES: &[(&str, &str)] = &[
    ("py", "python"),
    ("js", "javascript"),
    ("jsx", "javascript"),
    ("ts", "typescript"),
    ("tsx", "typescript"),
    ("java", "java"),
    ("rs", "rust"),
    ("go", "go"),
    ("c", "c"),
    ("h", "c"),
    ("cpp", "cpp"),
    ("cc", "cpp"),
    ("hpp", "cpp"),
    ("cs", "csharp"),
    ("rb", "ruby"),
    ("php", "php"),
    ("swift", "swift"),
    ("kt", "kotlin"),
    ("scala", "scala"),
    ("sh", "shell"),
    ("bash", "shell"),
    ("sql", "sql"),
    ("r", "r"),
    ("lua", "lua"),
    ("pl", "perl"),
    ("hs", "haskell"),
];

/// Loads source files, recording the language and whether comments or
/// docstrings are present.
#[derive(Debug, Clone, Copy)]
pub struct CodeLoader;

impl DocumentLoader for CodeLoader {
    fn name(&self) -> &'static str {
        "code"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[
            ".py", ".js", ".jsx", ".ts", ".tsx", ".java", ".rs", ".go", ".c", ".h", ".cpp", ".cc",
            ".hpp", ".cs", ".rb", ".php", ".swift", ".kt", ".scala", ".sh", ".bash", ".sql", ".r",
            ".lua", ".pl", ".hs",
        ]
    }

    fn load(&self, path: &Path) -> Result<Vec<LoadedDocument>, DocumentError> {
        let text = read_text(path)?;
        let language = detect_language(path);
        let mut metadata = base_metadata(path, "code");
        metadata.insert("language".into(), JsonValue::from(language));
        metadata.insert(
            "has_comments".into(),
            JsonValue::from(has_comments(&text, language)),
        );
        metadata.insert(
            "has_docstrings".into(),
            JsonValue::from(has_docstrings(&text, language)),
        );
        metadata.insert("line_count".into(), JsonValue::from(text.lines().count()));
        Ok(vec![LoadedDocument { text, metadata }])
    }
}

/// Maps a file extension to a language name, `"unknown"` when unrecognised.
pub fn detect_language(path: &Path) -> &'static str {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return "unknown";
    };
    let ext = ext.to_ascii_lowercase();
    LANGUAGES
        .iter()
        .find(|(e, _)| *e == ext)
        .map_or("unknown", |&(_, lang)| lang)
}

/// Line comment markers for a language.
fn comment_markers(language: &str) -> &'static [&'static str] {
    match language {
        "python" | "ruby" | "shell" | "r" | "perl" => &["#"],
        "sql" | "lua" | "haskell" => &["--"],
        "php" => &["//", "#", "/*"],
        _ => &["//", "/*"],
    }
}

/// Returns true if any line starts with a comment marker, or contains one after code.
fn has_comments(text: &str, language: &str) -> bool {
    let markers = comment_markers(language);
    text.lines().any(|line| {
        let trimmed = line.trim_start();
        // A shebang is not a comment.
        if trimmed.starts_with("#!") {
            return false;
        }
        markers.iter().any(|m| trimmed.starts_with(m) || line.contains(&format!(" {m} ")))
    })
}

/// Returns true if the text contains documentation comments for the language.
fn has_docstrings(text: &str, language: &str) -> bool {
    match language {
        "python" => text.contains("\"\"\"") || text.contains("'''"),
        "rust" => text
            .lines()
            .map(str::trim_start)
            .any(|l| l.starts_with("///") || l.starts_with("//!")),
        "javascript" | "typescript" | "java" | "kotlin" | "scala" | "php" | "c" | "cpp"
        | "csharp" | "swift" | "go" => text.contains("/**"),
        "ruby" => text.contains("=begin"),
        _ => false,
    }
}
