use std::fmt;

/// Flattening failure.
///
/// Unresolvable identifiers are not errors; they are left verbatim. The only
/// failures are reference chains that never bottom out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlattenError {
    /// An identifier was reached again while it was still being resolved
    CyclicReference {
        /// Identifiers on the resolution path, ending with the repeated one
        chain: Vec<String>,
    },
    /// The resolution path grew past the configured maximum depth
    DepthExceeded {
        /// Configured limit
        max_depth: usize,
        /// Identifier whose resolution would have exceeded the limit
        identifier: String,
    },
}

impl fmt::Display for FlattenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlattenError::CyclicReference { chain } => {
                write!(f, "Cyclic schema reference: {}", chain.join(" -> "))
            }
            FlattenError::DepthExceeded {
                max_depth,
                identifier,
            } => {
                write!(
                    f,
                    "Schema reference chain deeper than {max_depth} while resolving '{identifier}'"
                )
            }
        }
    }
}

impl std::error::Error for FlattenError {}
