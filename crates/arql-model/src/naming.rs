//! Identifier safety rules shared by model validation and the fragment
//! builder. Everything that fails the whitelist must be bound as a
//! parameter instead of being emitted as query text.

/// True if `name` may be emitted verbatim as an unquoted identifier.
///
/// Whitelist: `[A-Za-z_][A-Za-z0-9_]*`. Empty names fail.
#[must_use]
pub fn is_safe_identifier(name: &str) -> bool {
    let mut chars = name.chars();

    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }

    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
