//! In-memory snapshot of an ingested repository.
//!
//! The snapshot, not the on-disk clone, is the system of record for the rest
//! of a session. It is keyed by forward-slash relative paths and backed by an
//! ordered map, so every rendering below is deterministic.

use std::collections::BTreeMap;

/// Mapping from relative file path to decoded content or a placeholder marker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoSnapshot {
    files: BTreeMap<String, String>,
}

impl RepoSnapshot {
    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().map(|(p, c)| (p.as_str(), c.as_str()))
    }

    /// Render every file as a headed block, in path order.
    ///
    /// Each entry becomes `=== File: <path> ===`, its content, and a blank
    /// separator line.
    pub fn flatten(&self) -> String {
        let mut out = String::new();
        for (path, content) in &self.files {
            out.push_str("=== File: ");
            out.push_str(path);
            out.push_str(" ===\n");
            out.push_str(content);
            out.push_str("\n\n");
        }
        out
    }

    /// Paths only, one per line. Used by prompts that must not embed content.
    pub fn file_list(&self) -> String {
        self.files
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl FromIterator<(String, String)> for RepoSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}

impl<const N: usize> From<[(&str, &str); N]> for RepoSnapshot {
    fn from(entries: [(&str, &str); N]) -> Self {
        entries
            .into_iter()
            .map(|(p, c)| (p.to_string(), c.to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_heads_every_file_in_path_order() {
        let snapshot = RepoSnapshot::from([("src/b.rs", "fn b() {}"), ("README.md", "# hi")]);
        let flat = snapshot.flatten();

        assert_eq!(
            flat,
            "=== File: README.md ===\n# hi\n\n=== File: src/b.rs ===\nfn b() {}\n\n"
        );
        for path in snapshot.paths() {
            assert!(flat.contains(&format!("=== File: {path} ===")));
        }
    }

    #[test]
    fn file_list_has_no_content() {
        let snapshot = RepoSnapshot::from([("a.txt", "secret"), ("dir/b.txt", "other")]);
        assert_eq!(snapshot.file_list(), "a.txt\ndir/b.txt");
    }

    #[test]
    fn empty_snapshot_renders_empty() {
        let snapshot = RepoSnapshot::default();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.flatten(), "");
        assert_eq!(snapshot.file_list(), "");
    }
}
