//! Issue reporting for the analyzer.
//!
//! Analysis never aborts on a problem in the analyzed program. Each problem
//! becomes an [`Issue`] appended to an [`IssueLog`], and the offending
//! expression evaluates to `Broken` so analysis continues.
//!
//! Issues carry a searchable code (see [`IssueKind`]) but render in the
//! plain `path:line message` form.

mod issue;
mod kind;
mod log;

pub use issue::{Issue, UNKNOWN_PATH};
pub use kind::IssueKind;
pub use log::IssueLog;
