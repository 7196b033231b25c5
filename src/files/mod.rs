//! File browser: directory listings, file details and search.

pub mod entry;
pub mod search;

use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{ToolError, ToolResult};
pub use entry::{EntryKind, FileEntry};
pub use search::SearchResult;

/// Text files below this size get a preview in `get_file_info`.
const PREVIEW_SIZE_LIMIT: u64 = 1024 * 1024;
const PREVIEW_CHARS: usize = 1000;

/// One path that could not be read during a listing or walk.
#[derive(Debug, Clone, Serialize)]
pub struct PathError {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ListingSummary {
    pub total_items: usize,
    pub directories: usize,
    pub files: usize,
    pub total_size: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DirectoryListing {
    pub path: String,
    pub items: Vec<FileEntry>,
    pub summary: ListingSummary,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<PathError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileDetails {
    #[serde(flatten)]
    pub entry: FileEntry,
    pub absolute_path: String,
    pub parent_directory: String,
    pub is_symlink: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symlink_target: Option<String>,
    pub is_readable: bool,
    pub is_writable: bool,
    pub is_executable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_preview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_count: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedDirectory {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FileBrowser;

impl FileBrowser {
    pub fn new() -> Self {
        Self
    }

    /// List `path`. Directories shallower than `max_depth` get their children.
    pub fn browse_directory(
        &self,
        path: &Path,
        include_hidden: bool,
        max_depth: usize,
    ) -> ToolResult<DirectoryListing> {
        let root = resolve_dir(path)?;

        let mut errors = Vec::new();
        let items = scan(&root, include_hidden, max_depth.max(1), 0, &mut errors)?;

        let mut summary = ListingSummary::default();
        for item in &items {
            summary.total_items += 1;
            if item.is_dir() {
                summary.directories += 1;
            } else {
                summary.files += 1;
                summary.total_size += item.size.unwrap_or(0);
            }
        }

        Ok(DirectoryListing {
            path: root.display().to_string(),
            items,
            summary,
            errors,
        })
    }

    pub fn get_file_info(&self, path: &Path) -> ToolResult<FileDetails> {
        if std::fs::symlink_metadata(path).is_err() {
            return Err(ToolError::NotFound(path.display().to_string()));
        }
        let is_symlink = std::fs::symlink_metadata(path)
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false);
        let symlink_target = if is_symlink {
            std::fs::read_link(path)
                .ok()
                .map(|t| t.display().to_string())
        } else {
            None
        };

        let absolute = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let entry = FileEntry::inspect(&absolute);
        let (is_readable, is_writable, is_executable) = access_flags(&absolute, &entry);

        let (content_preview, line_count) = if entry.is_file() {
            match preview(&absolute, entry.size.unwrap_or(0)) {
                Some(text) => {
                    let lines = text.matches('\n').count() + 1;
                    (Some(text), Some(lines))
                }
                None => (None, None),
            }
        } else {
            (None, None)
        };

        Ok(FileDetails {
            absolute_path: absolute.display().to_string(),
            parent_directory: absolute
                .parent()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            is_symlink,
            symlink_target,
            is_readable,
            is_writable,
            is_executable,
            content_preview,
            line_count,
            entry,
        })
    }

    pub fn search_files(
        &self,
        directory: &Path,
        pattern: &str,
        include_content: bool,
    ) -> ToolResult<SearchResult> {
        let root = resolve_dir(directory)?;
        search::search(&root, pattern, include_content)
    }

    /// Create `path` and any missing parents. An existing path is an error.
    pub fn create_directory(&self, path: &Path) -> ToolResult<CreatedDirectory> {
        if path.as_os_str().is_empty() {
            return Err(ToolError::invalid("Path cannot be empty"));
        }
        if path.exists() {
            return Err(ToolError::invalid(format!(
                "Directory already exists: {}",
                path.display()
            )));
        }
        std::fs::create_dir_all(path)?;
        tracing::info!(path = %path.display(), "created directory");
        Ok(CreatedDirectory {
            path: path.display().to_string(),
            message: "Directory created successfully".to_string(),
        })
    }
}

fn resolve_dir(path: &Path) -> ToolResult<PathBuf> {
    let path = if path.as_os_str().is_empty() {
        Path::new(".")
    } else {
        path
    };
    if !path.exists() {
        return Err(ToolError::NotFound(path.display().to_string()));
    }
    let resolved = std::fs::canonicalize(path)?;
    if !resolved.is_dir() {
        return Err(ToolError::invalid(format!(
            "Path is not a directory: {}",
            resolved.display()
        )));
    }
    Ok(resolved)
}

fn scan(
    dir: &Path,
    include_hidden: bool,
    max_depth: usize,
    depth: usize,
    errors: &mut Vec<PathError>,
) -> ToolResult<Vec<FileEntry>> {
    let read = match std::fs::read_dir(dir) {
        Ok(read) => read,
        // the root must be readable; deeper failures are reported and skipped
        Err(e) if depth > 0 => {
            errors.push(PathError {
                path: dir.display().to_string(),
                error: e.to_string(),
            });
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let mut items = Vec::new();
    for dir_entry in read {
        let dir_entry = match dir_entry {
            Ok(e) => e,
            Err(e) => {
                errors.push(PathError {
                    path: dir.display().to_string(),
                    error: e.to_string(),
                });
                continue;
            }
        };
        let name = dir_entry.file_name();
        if !include_hidden && name.to_string_lossy().starts_with('.') {
            continue;
        }

        let path = dir_entry.path();
        let mut entry = FileEntry::inspect(&path);
        if let Some(error) = &entry.error {
            errors.push(PathError {
                path: entry.path.clone(),
                error: error.clone(),
            });
            items.push(entry);
            continue;
        }
        // symlinked directories are listed but never descended into
        let real_dir = dir_entry.file_type().is_ok_and(|t| t.is_dir());
        if real_dir && depth + 1 < max_depth {
            let children = scan(&path, include_hidden, max_depth, depth + 1, errors)?;
            entry.child_count = Some(children.len());
            entry.children = Some(children);
        }
        items.push(entry);
    }

    items.sort_by(|a, b| (a.kind, &a.name).cmp(&(b.kind, &b.name)));
    Ok(items)
}

#[cfg(unix)]
fn access_flags(path: &Path, entry: &FileEntry) -> (bool, bool, bool) {
    use std::os::unix::fs::PermissionsExt;

    let mode = std::fs::metadata(path)
        .map(|m| m.permissions().mode())
        .unwrap_or(0);
    let readable = if entry.is_dir() {
        std::fs::read_dir(path).is_ok()
    } else {
        std::fs::File::open(path).is_ok()
    };
    let writable = entry
        .permissions
        .as_ref()
        .is_some_and(|p| !p.readonly);
    (readable, writable, mode & 0o111 != 0)
}

#[cfg(not(unix))]
fn access_flags(path: &Path, entry: &FileEntry) -> (bool, bool, bool) {
    let readable = if entry.is_dir() {
        std::fs::read_dir(path).is_ok()
    } else {
        std::fs::File::open(path).is_ok()
    };
    let writable = entry
        .permissions
        .as_ref()
        .is_some_and(|p| !p.readonly);
    let executable = entry
        .extension
        .as_deref()
        .is_some_and(|e| matches!(e, ".exe" | ".bat" | ".cmd"));
    (readable, writable, executable)
}

/// First characters of a small UTF-8 text file.
fn preview(path: &Path, size: u64) -> Option<String> {
    if size >= PREVIEW_SIZE_LIMIT {
        return None;
    }
    let mut bytes = Vec::new();
    std::fs::File::open(path).ok()?.read_to_end(&mut bytes).ok()?;
    let text = std::str::from_utf8(&bytes).ok()?;
    Some(text.chars().take(PREVIEW_CHARS).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "bb").unwrap();
        std::fs::write(dir.path().join("a.py"), "print('a')\n").unwrap();
        std::fs::write(dir.path().join(".hidden"), "h").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("deep.txt"), "deep").unwrap();
        dir
    }

    #[test]
    fn test_browse_summary_counts_top_level() {
        let dir = fixture();
        let listing = FileBrowser::new()
            .browse_directory(dir.path(), false, 1)
            .unwrap();

        assert_eq!(listing.summary.files, 2);
        assert_eq!(listing.summary.directories, 1);
        assert_eq!(
            listing.summary.total_items,
            listing.summary.files + listing.summary.directories
        );
        assert_eq!(listing.summary.total_size, 2 + 11);
        assert!(listing.items[0].children.is_none());
    }

    #[test]
    fn test_browse_sorts_directories_first() {
        let dir = fixture();
        let listing = FileBrowser::new()
            .browse_directory(dir.path(), false, 1)
            .unwrap();
        let names: Vec<&str> = listing.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["sub", "a.py", "b.txt"]);
    }

    #[test]
    fn test_browse_hidden_files() {
        let dir = fixture();
        let browser = FileBrowser::new();
        let without = browser.browse_directory(dir.path(), false, 1).unwrap();
        assert!(without.items.iter().all(|i| i.name != ".hidden"));

        let with = browser.browse_directory(dir.path(), true, 1).unwrap();
        assert!(with.items.iter().any(|i| i.name == ".hidden"));
        assert_eq!(with.summary.total_items, 4);
    }

    #[test]
    fn test_browse_depth_adds_children() {
        let dir = fixture();
        let listing = FileBrowser::new()
            .browse_directory(dir.path(), false, 2)
            .unwrap();
        let sub = listing.items.iter().find(|i| i.name == "sub").unwrap();
        assert_eq!(sub.child_count, Some(1));
        assert_eq!(sub.children.as_ref().unwrap()[0].name, "deep.txt");
        assert_eq!(listing.summary.total_items, 3);
    }

    #[cfg(unix)]
    #[test]
    fn test_browse_does_not_follow_directory_links() {
        let dir = fixture();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("sub").join("loop")).unwrap();

        let listing = FileBrowser::new()
            .browse_directory(dir.path(), false, 10)
            .unwrap();
        let sub = listing.items.iter().find(|i| i.name == "sub").unwrap();
        let children = sub.children.as_ref().unwrap();
        let link = children.iter().find(|c| c.name == "loop").unwrap();
        assert!(link.is_dir());
        assert!(link.children.is_none());
        assert_eq!(sub.child_count, Some(2));
        assert!(listing.errors.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_reported_once() {
        use std::os::unix::fs::PermissionsExt;

        let dir = fixture();
        let locked = dir.path().join("sub");
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();
        // permission bits do not bind a privileged user
        if std::fs::read_dir(&locked).is_ok() {
            std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let listing = FileBrowser::new().browse_directory(dir.path(), false, 3);
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
        let listing = listing.unwrap();

        assert_eq!(listing.errors.len(), 1);
        assert!(listing.errors[0].path.ends_with("sub"));
        let sub = listing.items.iter().find(|i| i.name == "sub").unwrap();
        assert!(sub.children.is_none());
    }

    #[test]
    fn test_browse_errors() {
        let browser = FileBrowser::new();
        let missing = browser
            .browse_directory(Path::new("/tmp/__no_such_dir_for_browse__"), false, 1)
            .unwrap_err();
        assert!(matches!(missing, ToolError::NotFound(_)));

        let file = tempfile::NamedTempFile::new().unwrap();
        let not_dir = browser.browse_directory(file.path(), false, 1).unwrap_err();
        assert!(not_dir.to_string().contains("not a directory"));
    }

    #[test]
    fn test_file_info_preview() {
        let dir = fixture();
        let info = FileBrowser::new()
            .get_file_info(&dir.path().join("a.py"))
            .unwrap();
        assert_eq!(info.entry.name, "a.py");
        assert!(!info.is_symlink);
        assert!(info.is_readable);
        assert_eq!(info.content_preview.as_deref(), Some("print('a')\n"));
        assert_eq!(info.line_count, Some(2));

        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(value["type"], "file");
        assert!(value["absolute_path"].as_str().unwrap().ends_with("a.py"));
    }

    #[test]
    fn test_file_info_missing() {
        let err = FileBrowser::new()
            .get_file_info(Path::new("/no/such/file.txt"))
            .unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[test]
    fn test_search_requires_directory() {
        let err = FileBrowser::new()
            .search_files(Path::new("/no/such/dir"), "*", false)
            .unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn test_create_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("x").join("y");
        let browser = FileBrowser::new();

        browser.create_directory(&target).unwrap();
        assert!(target.is_dir());

        let again = browser.create_directory(&target).unwrap_err();
        assert!(again.to_string().contains("already exists"));
    }
}
