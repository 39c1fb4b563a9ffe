//! Security utilities for Salesforce API operations.
//!
//! All user-provided values in SOQL queries MUST be escaped using the
//! functions in this module. Failure to do so creates injection
//! vulnerabilities.
//!
//! ```rust
//! use sfmx_client::security::soql;
//!
//! let name = soql::escape_string("O'Brien");
//! let query = format!("SELECT Id FROM User WHERE Username = '{}'", name);
//! ```

/// SOQL escaping utilities for injection prevention.
pub mod soql {
    /// Escape a string value for use in SOQL queries.
    ///
    /// This function escapes characters that have special meaning in SOQL
    /// string literals:
    /// - Single quotes (`'`) are escaped to (`\'`)
    /// - Backslashes (`\`) are escaped to (`\\`)
    /// - Newlines are escaped to (`\n`)
    /// - Carriage returns are escaped to (`\r`)
    /// - Tabs are escaped to (`\t`)
    ///
    /// # Example
    ///
    /// ```rust
    /// use sfmx_client::security::soql;
    ///
    /// let safe = soql::escape_string("O'Brien & Co.");
    /// assert_eq!(safe, "O\\'Brien & Co.");
    /// ```
    #[must_use]
    pub fn escape_string(value: &str) -> String {
        let mut escaped = String::with_capacity(value.len() + 16);
        for ch in value.chars() {
            match ch {
                '\'' => escaped.push_str("\\'"),
                '\\' => escaped.push_str("\\\\"),
                '\n' => escaped.push_str("\\n"),
                '\r' => escaped.push_str("\\r"),
                '\t' => escaped.push_str("\\t"),
                _ => escaped.push(ch),
            }
        }
        escaped
    }

    /// Validate that an SObject name is safe to embed in a URL path.
    ///
    /// SObject API names contain only ASCII alphanumerics and underscores
    /// and start with a letter. Anything else is rejected before it can
    /// reach a path segment or a FROM clause.
    #[must_use]
    pub fn is_safe_sobject_name(name: &str) -> bool {
        if name.is_empty() || name.len() > 255 {
            return false;
        }
        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }
}
