use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Fold a string for accent- and case-insensitive prefix comparison.
///
/// Lowercases, decomposes to NFD and drops diacritic code points, so
/// `"Café"` and `"cafe"` produce the same key.
pub fn normalize(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }
    s.to_lowercase().nfd().filter(|c| !is_diacritic(*c)).collect()
}

/// Combining marks plus the spacing code points of Unicode's `Diacritic`
/// property that survive NFD on their own: ASCII/Latin-1 accents, modifier
/// letters, Greek tonos and breathings, kana voicing marks and their
/// fullwidth/halfwidth forms.
fn is_diacritic(c: char) -> bool {
    is_combining_mark(c)
        || matches!(
            c,
            '^' | '`'
                | '\u{a8}'
                | '\u{af}'
                | '\u{b4}'
                | '\u{b7}'
                | '\u{b8}'
                | '\u{2b0}'..='\u{2ff}'
                | '\u{374}'..='\u{375}'
                | '\u{37a}'
                | '\u{384}'..='\u{385}'
                | '\u{559}'
                | '\u{1fbd}'
                | '\u{1fbf}'..='\u{1fc1}'
                | '\u{1fcd}'..='\u{1fcf}'
                | '\u{1fdd}'..='\u{1fdf}'
                | '\u{1fed}'..='\u{1fef}'
                | '\u{1ffd}'..='\u{1ffe}'
                | '\u{2e2f}'
                | '\u{309b}'..='\u{309c}'
                | '\u{30fc}'
                | '\u{a700}'..='\u{a721}'
                | '\u{a788}'..='\u{a78a}'
                | '\u{ab5b}'
                | '\u{ab69}'..='\u{ab6b}'
                | '\u{ff3e}'
                | '\u{ff40}'
                | '\u{ff70}'
                | '\u{ff9e}'..='\u{ff9f}'
                | '\u{ffe3}'
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_case_and_accents() {
        assert_eq!(normalize("Café"), "cafe");
        assert_eq!(normalize("CAFE\u{301}"), "cafe");
        assert_eq!(normalize("Ärlig Öl på Åland"), "arlig ol pa aland");
        assert_eq!(normalize("naïve résumé"), "naive resume");
    }

    #[test]
    fn strips_spacing_diacritics() {
        assert_eq!(normalize("a^b`c\u{b4}d"), "abcd");
    }

    #[test]
    fn strips_greek_and_kana_spacing_marks() {
        assert_eq!(normalize("\u{384}a\u{1fbd}b\u{1fef}"), "ab");
        assert_eq!(normalize("x\u{309b}\u{ff9e}y"), "xy");
    }

    #[test]
    fn empty_and_plain_inputs() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("börs 2024!"), "bors 2024!");
        assert_eq!(normalize("ß"), "ß");
    }

    #[test]
    fn idempotent() {
        for s in ["Crème Brûlée", "Ångström", "plain"] {
            let once = normalize(s);
            assert_eq!(normalize(&once), once);
        }
    }
}
