// src/extractors/names.rs
use regex::Regex;

use crate::config::Vocabulary;

/// Removes legal-form suffixes ("Kft.", "Nyrt", ...) so names can be compared.
#[derive(Debug, Clone)]
pub struct NameNormalizer {
    suffix_re: Option<Regex>,
}

impl NameNormalizer {
    pub fn new(vocabulary: &Vocabulary) -> Self {
        // Longest first, so "Rt" never wins over "Nyrt" inside the alternation.
        let mut suffixes: Vec<&str> = vocabulary
            .legal_suffixes
            .iter()
            .map(|s| s.trim().trim_end_matches('.'))
            .filter(|s| !s.is_empty())
            .collect();
        suffixes.sort_by_key(|s| std::cmp::Reverse(s.chars().count()));

        let alternation = suffixes
            .iter()
            .map(|s| regex::escape(s))
            .collect::<Vec<_>>()
            .join("|");
        // The suffix must stand alone as a word: "Kert" keeps its "rt".
        let suffix_re = if alternation.is_empty() {
            None
        } else {
            Regex::new(&format!(r"(?i)(?:^|\s)(?:{})\.?\s*$", alternation))
                .map_err(|e| tracing::error!("Legal suffix list rejected, names stay unstripped: {}", e))
                .ok()
        };

        Self { suffix_re }
    }

    /// Strips trailing legal-form suffixes until none is left, then trims.
    pub fn strip_legal_suffix(&self, name: &str) -> String {
        let mut current = name.trim().to_string();
        let Some(suffix_re) = &self.suffix_re else {
            return current;
        };
        loop {
            let stripped = suffix_re.replace(&current, "").trim().to_string();
            if stripped == current {
                return current;
            }
            current = stripped;
        }
    }

    /// Comparison key: suffix-stripped and uppercased.
    pub fn normalize_key(&self, name: &str) -> String {
        self.strip_legal_suffix(name).to_uppercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> NameNormalizer {
        NameNormalizer::new(&Vocabulary::default())
    }

    #[test]
    fn strips_common_forms() {
        let n = normalizer();
        assert_eq!(n.strip_legal_suffix("OTP Bank Nyrt."), "OTP Bank");
        assert_eq!(n.strip_legal_suffix("Minta Kft"), "Minta");
        assert_eq!(n.strip_legal_suffix("  Minta kft.  "), "Minta");
        assert_eq!(n.strip_legal_suffix("Példa Korlátolt Felelősségű Társaság"), "Példa");
    }

    #[test]
    fn strips_repeated_suffixes() {
        assert_eq!(normalizer().strip_legal_suffix("Alfa Bt. Kft."), "Alfa");
    }

    #[test]
    fn suffix_must_be_a_separate_word() {
        let n = normalizer();
        assert_eq!(n.strip_legal_suffix("Kert"), "Kert");
        assert_eq!(n.strip_legal_suffix("Zöld Kert Kft."), "Zöld Kert");
    }

    #[test]
    fn strip_is_idempotent() {
        let n = normalizer();
        for name in ["OTP Bank Nyrt.", "Alfa Bt. Kft.", "Mol", "Kft.", " Richter Gedeon Nyrt "] {
            let once = n.strip_legal_suffix(name);
            assert_eq!(n.strip_legal_suffix(&once), once);
        }
    }

    #[test]
    fn key_is_uppercase_and_unicode_aware() {
        assert_eq!(normalizer().normalize_key("Szőlő Zrt."), "SZŐLŐ");
    }

    #[test]
    fn suffixes_come_from_vocabulary() {
        let vocab = Vocabulary { legal_suffixes: vec!["GmbH".to_string()], ..Vocabulary::default() };
        let n = NameNormalizer::new(&vocab);
        assert_eq!(n.strip_legal_suffix("Muster GmbH"), "Muster");
        assert_eq!(n.strip_legal_suffix("Minta Kft."), "Minta Kft.");
    }
}
