//! Wildcard name matching used for banned character names.
//!
//! Patterns are case-insensitive:
//! - `*foo*` matches any name containing `foo`
//! - `*foo` matches names ending in `foo`
//! - `foo*` matches names starting with `foo`
//! - `foo` (no wildcard) never matches

/// How a single pattern is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameMatch {
    Contains,
    Suffix,
    Prefix,
    Inert,
}

/// Split a pattern into its match mode and lowercase needle.
pub fn parse_pattern(pattern: &str) -> (NameMatch, String) {
    let lowered = pattern.trim().to_lowercase();
    let leading = lowered.starts_with('*');
    let trailing = lowered.len() > 1 && lowered.ends_with('*');
    let start = usize::from(leading);
    let end = lowered.len() - usize::from(trailing);
    let needle = if start <= end {
        lowered[start..end].to_string()
    } else {
        String::new()
    };
    let mode = match (leading, trailing) {
        (true, true) => NameMatch::Contains,
        (true, false) => NameMatch::Suffix,
        (false, true) => NameMatch::Prefix,
        (false, false) => NameMatch::Inert,
    };
    (mode, needle)
}

/// True if `name` matches `pattern`.
pub fn matches_pattern(pattern: &str, name: &str) -> bool {
    let (mode, needle) = parse_pattern(pattern);
    if needle.is_empty() {
        return false;
    }
    let name = name.trim().to_lowercase();
    match mode {
        NameMatch::Contains => name.contains(&needle),
        NameMatch::Suffix => name.ends_with(&needle),
        NameMatch::Prefix => name.starts_with(&needle),
        NameMatch::Inert => false,
    }
}

/// True if any of `patterns` matches `name`.
pub fn is_banned_name<S: AsRef<str>>(patterns: &[S], name: &str) -> bool {
    patterns.iter().any(|p| matches_pattern(p.as_ref(), name))
}
