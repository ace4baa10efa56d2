//! Template diffs
//!
//! Compares a deployed template against a freshly synthesized one. Both sides
//! are normalized to pretty-printed JSON first, so formatting differences in
//! what CloudFormation hands back do not show up as changes.

use colored::Colorize;
use serde_json::Value;
use similar::{ChangeTag, TextDiff};

/// Type of change in a diff line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeType {
    /// Line was inserted
    Insert,
    /// Line was deleted
    Delete,
    /// Line is unchanged (context)
    Equal,
}

/// A single line in a diff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    /// The content of the line, newline stripped
    pub content: String,
    /// The type of change
    pub change_type: ChangeType,
}

/// A hunk (group of changes) in a diff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffHunk {
    /// Starting line number in the deployed template
    pub old_start: usize,
    /// Number of lines from the deployed template
    pub old_count: usize,
    /// Starting line number in the synthesized template
    pub new_start: usize,
    /// Number of lines from the synthesized template
    pub new_count: usize,
    /// Lines in this hunk
    pub lines: Vec<DiffLine>,
}

/// Difference between the deployed and synthesized template of one stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDiff {
    /// Stack name
    pub stack: String,
    /// Whether the stack exists yet
    pub deployed: bool,
    /// Hunks, empty when nothing changed
    pub hunks: Vec<DiffHunk>,
    /// Lines added
    pub insertions: usize,
    /// Lines removed
    pub deletions: usize,
}

impl TemplateDiff {
    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        self.insertions > 0 || self.deletions > 0
    }

    /// Render as a unified diff, colored when `color` is set
    pub fn render(&self, color: bool) -> String {
        let old_label = if self.deployed {
            format!("{} (deployed)", self.stack)
        } else {
            "/dev/null".to_string()
        };
        let mut out = format!(
            "--- {}\n+++ {} (synthesized)\n",
            old_label, self.stack
        );

        for hunk in &self.hunks {
            let header = format!(
                "@@ -{},{} +{},{} @@",
                hunk.old_start, hunk.old_count, hunk.new_start, hunk.new_count
            );
            if color {
                out.push_str(&header.cyan().to_string());
            } else {
                out.push_str(&header);
            }
            out.push('\n');

            for line in &hunk.lines {
                let (sign, text) = match line.change_type {
                    ChangeType::Insert => ("+", &line.content),
                    ChangeType::Delete => ("-", &line.content),
                    ChangeType::Equal => (" ", &line.content),
                };
                let rendered = format!("{}{}", sign, text);
                let rendered = match (color, line.change_type) {
                    (true, ChangeType::Insert) => rendered.green().to_string(),
                    (true, ChangeType::Delete) => rendered.red().to_string(),
                    _ => rendered,
                };
                out.push_str(&rendered);
                out.push('\n');
            }
        }

        out
    }
}

fn normalize(template: Option<&Value>) -> String {
    match template {
        Some(value) => {
            let mut text = serde_json::to_string_pretty(value).unwrap_or_default();
            text.push('\n');
            text
        }
        None => String::new(),
    }
}

/// Diff `deployed` (absent when the stack does not exist) against `synthesized`
pub fn diff_templates(
    stack: &str,
    deployed: Option<&Value>,
    synthesized: &Value,
    context_lines: usize,
) -> TemplateDiff {
    let old = normalize(deployed);
    let new = normalize(Some(synthesized));

    let text_diff = TextDiff::from_lines(&old, &new);
    let mut unified = text_diff.unified_diff();
    unified.context_radius(context_lines);

    let mut hunks = Vec::new();
    let mut insertions = 0;
    let mut deletions = 0;

    for hunk in unified.iter_hunks() {
        let mut lines = Vec::new();
        let mut old_range = (usize::MAX, 0usize);
        let mut new_range = (usize::MAX, 0usize);

        for change in hunk.iter_changes() {
            if let Some(idx) = change.old_index() {
                old_range = (old_range.0.min(idx), old_range.1 + 1);
            }
            if let Some(idx) = change.new_index() {
                new_range = (new_range.0.min(idx), new_range.1 + 1);
            }

            let change_type = match change.tag() {
                ChangeTag::Delete => {
                    deletions += 1;
                    ChangeType::Delete
                }
                ChangeTag::Insert => {
                    insertions += 1;
                    ChangeType::Insert
                }
                ChangeTag::Equal => ChangeType::Equal,
            };

            lines.push(DiffLine {
                content: change.value().trim_end_matches('\n').to_string(),
                change_type,
            });
        }

        let start = |range: (usize, usize)| if range.1 == 0 { 0 } else { range.0 + 1 };
        hunks.push(DiffHunk {
            old_start: start(old_range),
            old_count: old_range.1,
            new_start: start(new_range),
            new_count: new_range.1,
            lines,
        });
    }

    TemplateDiff {
        stack: stack.to_string(),
        deployed: deployed.is_some(),
        hunks,
        insertions,
        deletions,
    }
}
