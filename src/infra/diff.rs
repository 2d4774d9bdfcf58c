use similar::{ChangeTag, TextDiff};

/// Lines of context around each hunk, as in `diff -u`.
const CONTEXT_LINES: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffStat {
    pub added: usize,
    pub removed: usize,
}

/// Line-based unified diff of one file, labelled `original/<path>` and `modified/<path>`.
///
/// Identical inputs produce an empty string.
pub fn unified_diff(path: &str, original: &str, modified: &str) -> String {
    if original == modified {
        return String::new();
    }

    let diff = TextDiff::from_lines(original, modified);
    let mut unified = diff.unified_diff();
    unified
        .context_radius(CONTEXT_LINES)
        .header(&format!("original/{path}"), &format!("modified/{path}"));
    unified.to_string()
}

pub fn line_stats(original: &str, modified: &str) -> DiffStat {
    let diff = TextDiff::from_lines(original, modified);
    let mut stat = DiffStat::default();
    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Insert => stat.added += 1,
            ChangeTag::Delete => stat.removed += 1,
            ChangeTag::Equal => {}
        }
    }
    stat
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_inputs_have_no_diff() {
        assert_eq!(unified_diff("a.rs", "x\ny\n", "x\ny\n"), "");
        assert_eq!(line_stats("x\n", "x\n"), DiffStat::default());
    }

    #[test]
    fn diff_carries_original_and_modified_labels() {
        let diff = unified_diff("src/lib.rs", "a\nb\nc\n", "a\nB\nc\n");
        assert!(diff.starts_with("--- original/src/lib.rs\n+++ modified/src/lib.rs\n"));
        assert!(diff.contains("-b\n"));
        assert!(diff.contains("+B\n"));
    }

    #[test]
    fn added_file_diffs_against_empty() {
        let diff = unified_diff("new.txt", "", "hello\n");
        assert!(diff.contains("+hello"));
        assert_eq!(line_stats("", "hello\n"), DiffStat { added: 1, removed: 0 });
    }

    #[test]
    fn stats_count_changed_lines() {
        let stat = line_stats("a\nb\nc\n", "a\nc\nd\ne\n");
        assert_eq!(stat, DiffStat { added: 2, removed: 1 });
    }
}
