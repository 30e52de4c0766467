//! Guess normalization and acceptance-set matching.
//!
//! All answer comparison goes through [`normalize`]: NFKD decomposition with
//! combining marks stripped, lowercased, everything outside `[a-z0-9 ]` mapped
//! to a space, whitespace collapsed. The canonical empty string never matches.

use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Fold a display string into its canonical comparable form. Pure and total;
/// idempotent by construction.
#[must_use]
pub fn normalize(input: &str) -> String {
    let mut folded = String::with_capacity(input.len());
    for ch in input.nfkd() {
        if is_combining_mark(ch) {
            continue;
        }
        for lower in ch.to_lowercase() {
            if lower.is_ascii_alphanumeric() {
                folded.push(lower);
            } else {
                folded.push(' ');
            }
        }
    }

    let mut out = String::with_capacity(folded.len());
    for word in folded.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Canonical forms accepted as a correct answer: the primary name plus every
/// alias, normalized and de-duplicated. The empty form is dropped.
#[must_use]
pub fn acceptance_set(primary: &str, aliases: &[String]) -> HashSet<String> {
    let mut set: HashSet<String> = HashSet::with_capacity(aliases.len() + 1);
    set.insert(normalize(primary));
    for alias in aliases {
        set.insert(normalize(alias));
    }
    set.remove("");
    set
}

/// Test a raw guess against a primary name and its aliases. Guesses that
/// normalize to empty are always rejected.
#[must_use]
pub fn matches(guess: &str, primary: &str, aliases: &[String]) -> bool {
    let canonical = normalize(guess);
    if canonical.is_empty() {
        return false;
    }
    acceptance_set(primary, aliases).contains(&canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_diacritics_and_case() {
        assert_eq!(normalize("Reykjavík"), "reykjavik");
        assert_eq!(normalize("SÃO TOMÉ"), "sao tome");
        assert_eq!(normalize("Bogotá"), "bogota");
    }

    #[test]
    fn punctuation_becomes_space_and_collapses() {
        assert_eq!(normalize("Côte d'Ivoire"), "cote d ivoire");
        assert_eq!(normalize("  N'Djamena   "), "n djamena");
        assert_eq!(normalize("Port-au-Prince"), "port au prince");
    }

    #[test]
    fn normalize_is_idempotent() {
        for s in [
            "Reykjavík",
            "Côte d'Ivoire",
            "  mixed   CASE  ",
            "",
            "1,000 Islands",
            "Åland",
        ] {
            let once = normalize(s);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn empty_forms_never_match() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize("!?!"), "");
        assert!(!matches("", "France", &[]));
        assert!(!matches("   ", "France", &[]));
        // An alias of pure punctuation must not admit punctuation guesses.
        assert!(!matches("?!", "France", &["?!".to_string()]));
    }

    #[test]
    fn primary_name_is_in_own_acceptance_set() {
        let aliases = vec!["République française".to_string()];
        let set = acceptance_set("French Republic", &aliases);
        assert!(set.contains(&normalize("French Republic")));
        assert!(matches("french republic", "French Republic", &aliases));
        assert!(matches("republique francaise", "French Republic", &aliases));
    }

    #[test]
    fn duplicate_canonical_aliases_collapse() {
        let aliases = vec!["FRANCE".to_string(), "france".to_string(), "Fránce".to_string()];
        let set = acceptance_set("France", &aliases);
        assert_eq!(set.len(), 1);
    }
}
