//! TOON file serialization.
//!
//! TOON is the structured text encoding used for every entity under the
//! workspace. Values are encoded via serde; the on-disk representation is
//! YAML-compatible, so files stay hand-editable.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::Result;

/// Read a TOON file and decode it into `T`.
///
/// A missing file is an error; best-effort readers chain
/// `.unwrap_or_default()` to get first-write semantics.
pub fn parse_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data = fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&data)?)
}

/// Encode `value` and write it to `path`, replacing any existing file.
pub fn write_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let data = serde_yaml::to_string(value)?;
    fs::write(path, data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Issue, IssueKind, ProjectSummary, Status};
    use tempfile::TempDir;

    #[test]
    fn test_write_parse_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("task.toon");
        let mut issue = Issue::new("TA-3".to_string(), IssueKind::Task, "API".to_string());
        issue.description = Some("Build the API".to_string());
        issue.status = Status::InProgress;

        write_file(&path, &issue).unwrap();
        let back: Issue = parse_file(&path).unwrap();
        assert_eq!(back.id, issue.id);
        assert_eq!(back.title, issue.title);
        assert_eq!(back.status, Status::InProgress);
        assert_eq!(back.description.as_deref(), Some("Build the API"));
    }

    #[test]
    fn test_parse_missing_file_is_error() {
        let temp = TempDir::new().unwrap();
        let err = parse_file::<ProjectSummary>(&temp.path().join("nope.toon")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_missing_file_default_fallback() {
        let temp = TempDir::new().unwrap();
        let ps: ProjectSummary = parse_file(&temp.path().join("nope.toon")).unwrap_or_default();
        assert!(ps.project.is_empty());
        assert_eq!(ps.issue_count(), 0);
    }

    #[test]
    fn test_write_overwrites() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("x.toon");
        let a = Issue::new("A-1".to_string(), IssueKind::Task, "first".to_string());
        let b = Issue::new("A-2".to_string(), IssueKind::Task, "second".to_string());
        write_file(&path, &a).unwrap();
        write_file(&path, &b).unwrap();
        let back: Issue = parse_file(&path).unwrap();
        assert_eq!(back.id, "A-2");
    }
}
