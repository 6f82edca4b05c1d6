//! Append-only issue collection.

use crate::{Issue, IssueKind};

/// Issues of one processed unit, in encounter order.
#[derive(Clone, Debug, Default)]
pub struct IssueLog {
    path: String,
    issues: Vec<Issue>,
}

impl IssueLog {
    /// Create an empty log whose issues are attributed to `path`.
    pub fn new(path: impl Into<String>) -> Self {
        IssueLog {
            path: path.into(),
            issues: Vec::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Record an issue at `line` of this log's unit.
    pub fn report(&mut self, kind: IssueKind, line: u32, message: impl Into<String>) {
        let issue = Issue::new(kind, self.path.clone(), line, message);
        tracing::debug!(code = kind.code(), %issue, "issue reported");
        self.issues.push(issue);
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Number of issues recorded so far; pair with [`IssueLog::since`].
    pub fn mark(&self) -> usize {
        self.issues.len()
    }

    /// Issues recorded after `mark`.
    pub fn since(&self, mark: usize) -> &[Issue] {
        self.issues.get(mark..).unwrap_or(&[])
    }

    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }
}
