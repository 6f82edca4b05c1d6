use std::fmt;

/// Category of a reported issue.
///
/// Codes are grouped by phase:
/// - Q0xxx: input problems
/// - Q1xxx: name resolution
/// - Q2xxx: call checking
/// - Q3xxx: definitions and control flow
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum IssueKind {
    /// The parser collaborator rejected the source.
    ParseFailure,
    /// No local variable or method with that name.
    UndefinedLocalOrMethod,
    /// No constant with that name.
    UndefinedConstant,
    /// Call arguments do not satisfy any signature of the method.
    ArgumentMismatch,
    /// `yield` in a method invoked without a block.
    MissingBlock,
    /// `return` outside of a method body.
    UnexpectedReturn,
    /// Class definition or reopening inside a conditional branch.
    ReopenInBranch,
    /// Reopened class names a different superclass.
    SuperclassMismatch,
}

impl IssueKind {
    pub fn code(self) -> &'static str {
        match self {
            IssueKind::ParseFailure => "Q0001",
            IssueKind::UndefinedLocalOrMethod => "Q1001",
            IssueKind::UndefinedConstant => "Q1002",
            IssueKind::ArgumentMismatch => "Q2001",
            IssueKind::MissingBlock => "Q2002",
            IssueKind::UnexpectedReturn => "Q3001",
            IssueKind::ReopenInBranch => "Q3002",
            IssueKind::SuperclassMismatch => "Q3003",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
