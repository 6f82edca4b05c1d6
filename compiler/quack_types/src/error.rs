//! Registry API errors.
//!
//! These describe misuse of the registry by the embedding code (bootstrap
//! tables, the evaluator), not problems in the analyzed program; those are
//! reported as issues.

use quack_ir::Name;

use crate::SignatureError;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("class {name:?} is already defined")]
    DuplicateClass { name: Name },

    #[error("{operation} is only allowed while bootstrapping")]
    Sealed { operation: &'static str },

    #[error("invalid signature for method {method:?}: {source}")]
    InvalidSignature {
        method: Name,
        #[source]
        source: SignatureError,
    },
}
