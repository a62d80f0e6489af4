//! Context output shape extraction.
//!
//! Middleware contributes to a procedure's context; the contributed part shows
//! up in the rendered middleware result type as `_ctx_out: { ... }`. The
//! extraction is textual, not structural: no brace balancing is performed, so
//! the first `}` ends the match and nested object shapes are truncated.

use once_cell::sync::Lazy;
use regex::Regex;

#[allow(clippy::expect_used)]
static CTX_OUT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_ctx_out:\s*\{([^}]*)\}").expect("valid context output regex"));

/// Return the trimmed text between the braces of the first `_ctx_out: { ... }`
/// in `type_text`, or `None` when the marker is absent or has no closing brace.
///
/// # Example
///
/// ```rust
/// use trpcgen::context::find_context_output_shape;
///
/// let shape = find_context_output_shape("MiddlewareResult<{ _ctx_out: { user: string } }>");
/// assert_eq!(shape.as_deref(), Some("user: string"));
/// ```
pub fn find_context_output_shape(type_text: &str) -> Option<String> {
    CTX_OUT_PATTERN
        .captures(type_text)
        .and_then(|captures| captures.get(1))
        .map(|inner| inner.as_str().trim().to_string())
}
