//! Parser configuration.

use serde::{Deserialize, Serialize};

/// Options for a [`crate::Parser`].
///
/// Missing fields take their defaults when deserialised.
///
/// # Examples
///
/// ```rust
/// use hive_ast::ParserConfig;
/// let config = ParserConfig {
///     max_statements: Some(10),
///     ..ParserConfig::default()
/// };
/// assert!(config.reuse_cst);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Reuse the previous CST when the same text is parsed twice in a row.
    pub reuse_cst: bool,
    /// Transform at most this many top-level statements, semicolons included.
    pub max_statements: Option<usize>,
    /// Name shown in rendered syntax errors.
    pub source_name: String,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            reuse_cst: true,
            max_statements: None,
            source_name: "<input>".to_string(),
        }
    }
}
