use std::fmt;

use crate::IssueKind;

/// Path reported when a unit was processed without one.
pub const UNKNOWN_PATH: &str = "(unknown)";

/// A single problem found in the analyzed program.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Issue {
    /// Source path of the unit, or [`UNKNOWN_PATH`].
    pub path: String,
    /// 1-based line of the offending node.
    pub line: u32,
    pub message: String,
    pub kind: IssueKind,
}

impl Issue {
    pub fn new(kind: IssueKind, path: impl Into<String>, line: u32, message: impl Into<String>) -> Self {
        Issue {
            path: path.into(),
            line,
            message: message.into(),
            kind,
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} {}", self.path, self.line, self.message)
    }
}
