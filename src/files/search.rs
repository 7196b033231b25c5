//! Recursive file-name search with optional content matching.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use glob::{MatchOptions, Pattern};
use ignore::WalkBuilder;
use serde::Serialize;

use super::entry::{file_name, timestamp};
use super::PathError;
use crate::error::{ToolError, ToolResult};

/// Files larger than this are never scanned for content.
const CONTENT_SIZE_LIMIT: u64 = 10 * 1024 * 1024;
const MAX_MATCHES_PER_FILE: usize = 50;
const SNIFF_BYTES: usize = 1024;

const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "py", "js", "html", "css", "json", "xml", "yaml", "yml", "csv", "log", "cfg",
    "conf", "ini", "sh", "bat", "sql", "r", "java", "c", "cpp", "h", "hpp", "php", "rb", "go",
    "rs", "ts", "vue", "toml",
];

#[derive(Debug, Clone, Serialize)]
pub struct ContentMatch {
    pub line_number: usize,
    pub line_content: String,
    pub match_position: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchMatch {
    pub path: String,
    pub name: String,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    pub match_type: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub content_matches: Vec<ContentMatch>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub directory: String,
    pub pattern: String,
    pub total_matches: usize,
    pub matches: Vec<SearchMatch>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<PathError>,
}

/// Split `name_glob:needle` into its parts. Only applies to content searches.
fn split_pattern(pattern: &str, include_content: bool) -> (&str, Option<&str>) {
    if include_content {
        if let Some((name, needle)) = pattern.split_once(':') {
            let needle = (!needle.is_empty()).then_some(needle);
            return (name, needle);
        }
    }
    (pattern, None)
}

/// The path a walk error refers to, looking through depth and line wrappers.
fn error_path(err: &ignore::Error) -> Option<&Path> {
    match err {
        ignore::Error::WithPath { path, .. } => Some(path.as_path()),
        ignore::Error::Loop { child, .. } => Some(child.as_path()),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            error_path(err)
        }
        _ => None,
    }
}

fn match_options() -> MatchOptions {
    MatchOptions {
        case_sensitive: !cfg!(any(windows, target_os = "macos")),
        require_literal_separator: false,
        require_literal_leading_dot: false,
    }
}

pub fn search(directory: &Path, pattern: &str, include_content: bool) -> ToolResult<SearchResult> {
    let (name_pattern, needle) = split_pattern(pattern, include_content);
    let name_pattern = if name_pattern.is_empty() { "*" } else { name_pattern };
    let glob = Pattern::new(name_pattern)
        .map_err(|e| ToolError::invalid(format!("Invalid glob pattern: {}", e)))?;
    let options = match_options();

    let walker = WalkBuilder::new(directory)
        .standard_filters(false)
        .follow_links(false)
        .build();

    let mut matches = Vec::new();
    let mut errors = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = error_path(&e).unwrap_or(directory);
                errors.push(PathError {
                    path: path.display().to_string(),
                    error: e.to_string(),
                });
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }

        let path = entry.path();
        let name = file_name(path);
        if !glob.matches_with(&name, options) {
            continue;
        }

        let meta = match entry.metadata() {
            Ok(meta) => meta,
            Err(e) => {
                errors.push(PathError {
                    path: path.display().to_string(),
                    error: e.to_string(),
                });
                continue;
            }
        };

        let mut found = SearchMatch {
            path: path.display().to_string(),
            name,
            size: meta.len(),
            modified: timestamp(meta.modified()),
            match_type: "filename",
            content_matches: Vec::new(),
        };

        if let Some(needle) = needle {
            if meta.len() <= CONTENT_SIZE_LIMIT && is_text_file(path) {
                match search_content(path, needle) {
                    Ok(hits) if !hits.is_empty() => {
                        found.content_matches = hits;
                        found.match_type = "content";
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "content search failed")
                    }
                }
            }
        }
        matches.push(found);
    }

    Ok(SearchResult {
        directory: directory.display().to_string(),
        pattern: pattern.to_string(),
        total_matches: matches.len(),
        matches,
        errors,
    })
}

/// Known text extension, or the first bytes decode as UTF-8.
fn is_text_file(path: &Path) -> bool {
    let known = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|e| TEXT_EXTENSIONS.contains(&e.as_str()));
    if known {
        return true;
    }

    let mut sample = Vec::with_capacity(SNIFF_BYTES);
    match File::open(path).and_then(|f| f.take(SNIFF_BYTES as u64).read_to_end(&mut sample)) {
        Ok(_) => match std::str::from_utf8(&sample) {
            Ok(_) => true,
            // a multi-byte character cut off at the sample boundary
            Err(e) => e.error_len().is_none(),
        },
        Err(_) => false,
    }
}

/// Case-insensitive substring search, line by line.
fn search_content(path: &Path, needle: &str) -> std::io::Result<Vec<ContentMatch>> {
    let needle = needle.to_lowercase();
    let mut reader = BufReader::new(File::open(path)?);
    let mut line = Vec::new();
    let mut hits = Vec::new();
    let mut line_number = 0;

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        line_number += 1;

        let text = String::from_utf8_lossy(&line);
        let lowered = text.to_lowercase();
        if let Some(pos) = lowered.find(&needle) {
            hits.push(ContentMatch {
                line_number,
                line_content: text.trim().to_string(),
                match_position: lowered[..pos].chars().count(),
            });
            if hits.len() >= MAX_MATCHES_PER_FILE {
                break;
            }
        }
    }
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(result: &SearchResult) -> Vec<String> {
        let mut names: Vec<String> = result.matches.iter().map(|m| m.name.clone()).collect();
        names.sort();
        names
    }

    #[test]
    fn test_glob_matches_names_recursively() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.py"), "print(1)").unwrap();
        std::fs::write(dir.path().join("b.txt"), "text").unwrap();
        std::fs::create_dir(dir.path().join("pkg")).unwrap();
        std::fs::write(dir.path().join("pkg").join("c.py"), "x = 2").unwrap();

        let result = search(dir.path(), "*.py", false).unwrap();
        assert_eq!(names(&result), vec!["a.py", "c.py"]);
        assert_eq!(result.total_matches, 2);
        assert!(result.matches.iter().all(|m| m.match_type == "filename"));
    }

    #[test]
    fn test_walk_error_names_failing_path() {
        let inner = ignore::Error::Io(std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        let err = ignore::Error::WithDepth {
            depth: 2,
            err: Box::new(ignore::Error::WithPath {
                path: "/data/private".into(),
                err: Box::new(inner),
            }),
        };
        assert_eq!(error_path(&err), Some(Path::new("/data/private")));
        assert_eq!(
            error_path(&ignore::Error::Io(std::io::ErrorKind::Other.into())),
            None
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdirectory_is_reported_by_path() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("top.txt"), "x").unwrap();
        let locked = dir.path().join("locked");
        std::fs::create_dir(&locked).unwrap();
        std::fs::write(locked.join("inner.txt"), "y").unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

        // permission bits do not bind a privileged user
        if std::fs::read_dir(&locked).is_ok() {
            std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let result = search(dir.path(), "*.txt", false).unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(names(&result), vec!["top.txt"]);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].path, locked.display().to_string());
    }

    #[test]
    fn test_hidden_files_are_searched() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".env"), "SECRET=1").unwrap();
        std::fs::write(dir.path().join(".gitignore"), "*.log").unwrap();
        std::fs::write(dir.path().join("out.log"), "log").unwrap();

        let result = search(dir.path(), "*", false).unwrap();
        assert_eq!(names(&result), vec![".env", ".gitignore", "out.log"]);
    }

    #[test]
    fn test_content_search_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "first\nHello World\nhello again\n").unwrap();
        std::fs::write(dir.path().join("other.txt"), "nothing here\n").unwrap();

        let result = search(dir.path(), "*.txt:HELLO", true).unwrap();
        let notes = result.matches.iter().find(|m| m.name == "notes.txt").unwrap();
        assert_eq!(notes.match_type, "content");
        assert_eq!(notes.content_matches.len(), 2);
        assert_eq!(notes.content_matches[0].line_number, 2);
        assert_eq!(notes.content_matches[0].line_content, "Hello World");
        assert_eq!(notes.content_matches[0].match_position, 0);

        let other = result.matches.iter().find(|m| m.name == "other.txt").unwrap();
        assert_eq!(other.match_type, "filename");
    }

    #[test]
    fn test_colon_is_literal_without_content_search() {
        assert_eq!(split_pattern("a:b", false), ("a:b", None));
        assert_eq!(split_pattern("*.rs:fn", true), ("*.rs", Some("fn")));
        assert_eq!(split_pattern("*.rs", true), ("*.rs", None));
    }

    #[test]
    fn test_match_limit_per_file() {
        let dir = tempfile::tempdir().unwrap();
        let body = "needle\n".repeat(80);
        std::fs::write(dir.path().join("many.txt"), body).unwrap();

        let result = search(dir.path(), "*:needle", true).unwrap();
        assert_eq!(result.matches[0].content_matches.len(), MAX_MATCHES_PER_FILE);
    }

    #[test]
    fn test_binary_files_are_not_scanned() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("blob.bin"), [0xff, 0xfe, 0x00, b'k', b'e', b'y']).unwrap();

        let result = search(dir.path(), "*:key", true).unwrap();
        assert_eq!(result.matches[0].match_type, "filename");
    }

    #[test]
    fn test_invalid_glob() {
        let dir = tempfile::tempdir().unwrap();
        let err = search(dir.path(), "[", false).unwrap_err();
        assert!(err.is_input_error());
    }
}
