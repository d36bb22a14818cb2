//! Character-level helpers shared by the compiler and the scanner.
//!
//! Folding is per character: a character is lowercased only when its
//! lowercase form is a single character, so folding never changes the number
//! of characters and positions stay aligned with the input.

/// Fold `c` to lowercase unless `case_sensitive`.
pub(crate) fn fold_char(c: char, case_sensitive: bool) -> char {
    if case_sensitive {
        return c;
    }
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}

pub(crate) fn fold_str(s: &str, case_sensitive: bool) -> String {
    s.chars().map(|c| fold_char(c, case_sensitive)).collect()
}

/// Coarse class used for automatic boundary insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CharClass {
    Alphabetic,
    Numeric,
    Other,
}

impl CharClass {
    pub(crate) fn of(c: char) -> Self {
        if c.is_alphabetic() {
            CharClass::Alphabetic
        } else if c.is_numeric() {
            CharClass::Numeric
        } else {
            CharClass::Other
        }
    }
}

/// Re-case `replacement` after the letters of `source`.
///
/// - two or more letters, all uppercase: uppercase
/// - first letter uppercase, the rest not: capitalized
/// - anything else: unchanged
pub(crate) fn align_case(replacement: &str, source: &str) -> String {
    let letters: Vec<char> = source.chars().filter(|c| c.is_alphabetic()).collect();

    if letters.len() > 1 && letters.iter().all(|c| c.is_uppercase()) {
        return replacement.to_uppercase();
    }

    match letters.split_first() {
        Some((first, rest)) if first.is_uppercase() && !rest.iter().any(|c| c.is_uppercase()) => {
            let mut chars = replacement.chars();
            match chars.next() {
                Some(head) => head.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }
        _ => replacement.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folding_keeps_length() {
        assert_eq!(fold_str("ABC def", false), "abc def");
        assert_eq!(fold_str("ABC", true), "ABC");
        // 'İ' lowercases to two chars and is left alone.
        assert_eq!(fold_char('İ', false), 'İ');
    }

    #[test]
    fn classes() {
        assert_eq!(CharClass::of('a'), CharClass::Alphabetic);
        assert_eq!(CharClass::of('α'), CharClass::Alphabetic);
        assert_eq!(CharClass::of('7'), CharClass::Numeric);
        assert_eq!(CharClass::of('-'), CharClass::Other);
        assert_eq!(CharClass::of(' '), CharClass::Other);
    }

    #[test]
    fn case_alignment() {
        assert_eq!(align_case("spelling", "SPELING"), "SPELLING");
        assert_eq!(align_case("spelling", "Speling"), "Spelling");
        assert_eq!(align_case("spelling", "SpeLING"), "spelling");
        assert_eq!(align_case("spelling", "speling"), "spelling");
        assert_eq!(align_case("correct", "I"), "Correct");
        assert_eq!(align_case("", "Abc"), "");
    }
}
