//! # Sync Reports
//!
//! Human-readable summaries of one sync operation, built incrementally and
//! discarded after presentation. The textual format is a stable contract
//! consumed by downstream display tooling: a leading count line such as
//! `"2 files are modified:"`, one tab-prefixed path per following line,
//! sections separated by a blank line.

use crate::classify::ReconciliationPlan;
use crate::path::RelativePath;

/// Accumulated report for one operation.
#[derive(Clone, Debug, Default)]
pub struct SyncReport {
    sections: Vec<String>,
}

impl SyncReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a preformatted section.
    pub fn add_section(&mut self, section: String) {
        if !section.is_empty() {
            self.sections.push(section);
        }
    }

    /// Append a count-header section with a sorted, tab-indented path list.
    pub fn add_path_section(&mut self, header: String, paths: &[RelativePath]) {
        let mut lines: Vec<String> = paths.iter().map(|p| format!("\t{}", p)).collect();
        lines.sort();
        let mut section = header;
        for line in lines {
            section.push('\n');
            section.push_str(&line);
        }
        self.sections.push(section);
    }

    /// Fold another report's sections onto this one.
    pub fn extend(&mut self, other: SyncReport) {
        self.sections.extend(other.sections);
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Render the report: sections separated by a blank line, trailing
    /// newline. An empty report renders as `"Nothing to do"`.
    pub fn render(&self) -> String {
        if self.sections.is_empty() {
            return "Nothing to do".to_string();
        }
        let mut out = self.sections.join("\n\n");
        out.push('\n');
        out
    }
}

/// The status report for a reconciliation plan.
///
/// Section order and wording match the long-standing output: modified,
/// local-only files, local-only directories, remote-only files, remote-only
/// directories, unchanged.
pub fn status_report(plan: &ReconciliationPlan) -> SyncReport {
    let mut report = SyncReport::new();
    if !plan.modified_files.is_empty() {
        report.add_path_section(
            format!("{} files are modified:", plan.modified_files.len()),
            &plan.modified_files,
        );
    }
    if !plan.local_only_files.is_empty() {
        report.add_path_section(
            format!("{} files are local only:", plan.local_only_files.len()),
            &plan.local_only_files,
        );
    }
    if !plan.local_only_dirs.is_empty() {
        report.add_path_section(
            format!("{} directories are local only:", plan.local_only_dirs.len()),
            &plan.local_only_dirs,
        );
    }
    if !plan.remote_only_files.is_empty() {
        report.add_path_section(
            format!("{} files are remote only:", plan.remote_only_files.len()),
            &plan.remote_only_files,
        );
    }
    if !plan.remote_only_dirs.is_empty() {
        report.add_path_section(
            format!("{} directories are remote only:", plan.remote_only_dirs.len()),
            &plan.remote_only_dirs,
        );
    }
    if plan.same_count > 0 {
        report.add_section(format!("{} files are unchanged", plan.same_count));
    }
    report
}
