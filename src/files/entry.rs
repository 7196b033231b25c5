//! Per-path information shared by browsing, file info and search.

use std::fs::Metadata;
use std::io::Read;
use std::path::Path;
use std::time::SystemTime;

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Files at or above this size are not hashed.
const HASH_SIZE_LIMIT: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Directory,
    File,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Permissions {
    pub readonly: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub octal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbolic: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Permissions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accessed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_human: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<FileEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileEntry {
    /// Stat `path` and fill in everything that can be read cheaply.
    ///
    /// Never fails: an unreadable path becomes an `Unknown` entry carrying
    /// the error message.
    pub fn inspect(path: &Path) -> Self {
        match std::fs::metadata(path) {
            Ok(meta) => Self::from_metadata(path, &meta),
            Err(e) => Self::unreadable(path, format!("Access denied: {}", e)),
        }
    }

    pub fn unreadable(path: &Path, error: String) -> Self {
        Self {
            error: Some(error),
            ..Self::bare(path, EntryKind::Unknown)
        }
    }

    fn bare(path: &Path, kind: EntryKind) -> Self {
        Self {
            name: file_name(path),
            path: path.display().to_string(),
            kind,
            size: None,
            permissions: None,
            created: None,
            modified: None,
            accessed: None,
            extension: None,
            size_human: None,
            sha256: None,
            item_count: None,
            children: None,
            child_count: None,
            error: None,
        }
    }

    fn from_metadata(path: &Path, meta: &Metadata) -> Self {
        let kind = if meta.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        let mut entry = Self {
            size: Some(meta.len()),
            permissions: Some(permissions(meta)),
            created: timestamp(meta.created()),
            modified: timestamp(meta.modified()),
            accessed: timestamp(meta.accessed()),
            ..Self::bare(path, kind)
        };

        match kind {
            EntryKind::File => {
                entry.extension = path
                    .extension()
                    .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()));
                entry.size_human = Some(format_size(meta.len()));
                if meta.len() < HASH_SIZE_LIMIT {
                    entry.sha256 = sha256_file(path).ok();
                }
            }
            EntryKind::Directory => match std::fs::read_dir(path) {
                Ok(entries) => entry.item_count = Some(entries.count()),
                Err(e) => entry.error = Some(format!("Access denied: {}", e)),
            },
            EntryKind::Unknown => {}
        }
        entry
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn timestamp(time: std::io::Result<SystemTime>) -> Option<String> {
    time.ok()
        .map(|t| chrono::DateTime::<chrono::Local>::from(t).to_rfc3339())
}

pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["KB", "MB", "GB", "TB", "PB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut size = bytes as f64 / 1024.0;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}

fn sha256_file(path: &Path) -> std::io::Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(unix)]
fn permissions(meta: &Metadata) -> Permissions {
    use std::os::unix::fs::PermissionsExt;

    let mode = meta.permissions().mode();
    let type_char = if meta.is_dir() {
        'd'
    } else if meta.file_type().is_symlink() {
        'l'
    } else {
        '-'
    };
    let mut symbolic = String::with_capacity(10);
    symbolic.push(type_char);
    for shift in [6, 3, 0] {
        let bits = (mode >> shift) & 0o7;
        symbolic.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        symbolic.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        symbolic.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }

    Permissions {
        readonly: meta.permissions().readonly(),
        octal: Some(format!("0o{:o}", mode & 0o7777)),
        symbolic: Some(symbolic),
    }
}

#[cfg(not(unix))]
fn permissions(meta: &Metadata) -> Permissions {
    Permissions {
        readonly: meta.permissions().readonly(),
        octal: None,
        symbolic: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size_units() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1_048_576), "1.0 MB");
        assert_eq!(format_size(2_621_440), "2.5 MB");
    }

    #[test]
    fn test_inspect_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Hello.TXT");
        std::fs::write(&path, "abc").unwrap();

        let entry = FileEntry::inspect(&path);
        assert!(entry.is_file());
        assert_eq!(entry.name, "Hello.TXT");
        assert_eq!(entry.size, Some(3));
        assert_eq!(entry.extension.as_deref(), Some(".txt"));
        assert_eq!(
            entry.sha256.as_deref(),
            Some("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
        );
        assert!(entry.modified.is_some());
    }

    #[test]
    fn test_inspect_directory_counts_items() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a"), "").unwrap();
        std::fs::create_dir(dir.path().join("b")).unwrap();

        let entry = FileEntry::inspect(dir.path());
        assert!(entry.is_dir());
        assert_eq!(entry.item_count, Some(2));
        assert!(entry.sha256.is_none());
    }

    #[test]
    fn test_missing_path_is_unknown() {
        let entry = FileEntry::inspect(Path::new("/no/such/path/here"));
        assert_eq!(entry.kind, EntryKind::Unknown);
        assert!(entry.error.is_some());
    }

    #[cfg(unix)]
    #[test]
    fn test_unix_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("script.sh");
        std::fs::write(&path, "#!/bin/sh").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o754)).unwrap();

        let perms = FileEntry::inspect(&path).permissions.unwrap();
        assert_eq!(perms.octal.as_deref(), Some("0o754"));
        assert_eq!(perms.symbolic.as_deref(), Some("-rwxr-xr--"));
    }

    #[test]
    fn test_kind_ordering() {
        assert!(EntryKind::Directory < EntryKind::File);
        assert!(EntryKind::File < EntryKind::Unknown);
    }
}
