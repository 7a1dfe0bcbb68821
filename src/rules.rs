//! The labeled-field rule table for the inspection report template.
//!
//! Each rule names the field it fills, which page text it reads, how it
//! matches, and how the captured value is post-processed. The table is
//! consumed by [`crate::extract_fields`]; adding a field means adding a row
//! here, not another branch in the extractor.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use crate::Field;

/// Which page text a rule is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageScope {
    First,
    Second,
    /// First and second page joined by a line break.
    Both,
}

/// How a rule finds its value.
#[derive(Debug, Clone, Copy)]
pub enum Matcher {
    /// Patterns tried in order. The first capture group of the first pattern
    /// that yields a non-empty value wins.
    Labeled(&'static [&'static str]),
    /// Literal tokens searched (case-sensitively) in order; the first one
    /// present becomes the value. Falls back to a labeled capture.
    Verdict {
        tokens: &'static [&'static str],
        fallback: &'static str,
    },
}

/// Post-processing applied to a captured value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    None,
    Uppercase,
}

/// One row of the rule table.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: Field,
    pub scope: PageScope,
    pub matcher: Matcher,
    pub transform: Transform,
}

const fn labeled(field: Field, scope: PageScope, patterns: &'static [&'static str]) -> FieldRule {
    FieldRule {
        field,
        scope,
        matcher: Matcher::Labeled(patterns),
        transform: Transform::None,
    }
}

const fn yes_no(field: Field, pattern: &'static [&'static str]) -> FieldRule {
    FieldRule {
        field,
        scope: PageScope::Second,
        matcher: Matcher::Labeled(pattern),
        transform: Transform::Uppercase,
    }
}

/// "NON SATISFAISANT" contains "SATISFAISANT", so it is tested first.
pub const VERDICT_TOKENS: &[&str] = &["NON SATISFAISANT", "SATISFAISANT"];

/// Rule table, in extraction order. All patterns are compiled case-insensitive
/// with `.` matching line breaks.
pub const RULES: &[FieldRule] = &[
    labeled(
        Field::ReferenceRapport,
        PageScope::First,
        &[r"Référence du rapport\s+(.*?)(?:\n|$)"],
    ),
    labeled(Field::Fos, PageScope::Both, &[r"(BAR-TH-\d+)"]),
    labeled(
        Field::AdresseTravaux,
        PageScope::Second,
        &[
            r"Adresse des travaux\s+(.*?)\nNom du bénéficiaire",
            r"Adresse des travaux\s+(.*?)(?:\n\s*\n|(?-i:\n\p{Lu}))",
        ],
    ),
    labeled(
        Field::NomBeneficiaire,
        PageScope::Second,
        &[r"Nom du bénéficiaire\s+(.*?)(?:\n|$)"],
    ),
    labeled(
        Field::RaisonSocialeProfessionnel,
        PageScope::Second,
        &[r"Raison sociale du professionnel\s+(.*?)(?:\n|$)"],
    ),
    yes_no(Field::BeneficiaireJoint, &[r"Bénéficiaire joint\s+(OUI|NON)\b"]),
    yes_no(
        Field::TelephoneErrone,
        &[r"Numéro de téléphone erroné\s+(OUI|NON)\b"],
    ),
    yes_no(Field::ControleRealise, &[r"Contrôle réalisé\s+(OUI|NON)\b"]),
    labeled(
        Field::DateControle,
        PageScope::Second,
        &[r"Date du contrôle\s+([\d/]+)"],
    ),
    yes_no(
        Field::SystemeRegulationInstalle,
        &[r"pièce par pièce installé\s+(OUI|NON)\b"],
    ),
    yes_no(
        Field::ReceptionConsignesEmetteurs,
        &[r"température de consigne\s+(OUI|NON)\b"],
    ),
    labeled(
        Field::CommentaireNonReception,
        PageScope::Second,
        &[r"n['’]est pas assurée\s+([^\n]*)"],
    ),
    yes_no(
        Field::AbsenceNonQualiteManifeste,
        &[r"détectée par le bénéficiaire\s+(OUI|NON)\b"],
    ),
    labeled(
        Field::CommentaireNonQualiteRelevee,
        PageScope::Second,
        &[r"non-qualité relevée\s+([^\n]*)"],
    ),
    FieldRule {
        field: Field::ConclusionControle,
        scope: PageScope::Second,
        matcher: Matcher::Verdict {
            tokens: VERDICT_TOKENS,
            fallback: r"Conclusion du contrôle\s+([^\n]*)",
        },
        transform: Transform::None,
    },
];

// ── Compiled form ────────────────────────────────────────────────────────────

enum CompiledMatcher {
    Labeled(Vec<Regex>),
    Verdict {
        tokens: &'static [&'static str],
        fallback: Regex,
    },
}

/// A [`FieldRule`] with its patterns compiled.
pub struct CompiledRule {
    rule: FieldRule,
    matcher: CompiledMatcher,
}

fn compile(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
        .expect("field rule patterns are static and valid")
}

/// [`RULES`], compiled once on first use.
pub static COMPILED_RULES: LazyLock<Vec<CompiledRule>> = LazyLock::new(|| {
    RULES
        .iter()
        .map(|rule| {
            let matcher = match rule.matcher {
                Matcher::Labeled(patterns) => {
                    CompiledMatcher::Labeled(patterns.iter().map(|p| compile(p)).collect())
                }
                Matcher::Verdict { tokens, fallback } => CompiledMatcher::Verdict {
                    tokens,
                    fallback: compile(fallback),
                },
            };
            CompiledRule {
                rule: *rule,
                matcher,
            }
        })
        .collect()
});

impl CompiledRule {
    pub fn field(&self) -> Field {
        self.rule.field
    }

    pub fn scope(&self) -> PageScope {
        self.rule.scope
    }

    /// Apply the rule to `text`. Returns the trimmed, post-processed value, or
    /// `None` when nothing matched.
    pub fn apply(&self, text: &str) -> Option<String> {
        let raw = match &self.matcher {
            CompiledMatcher::Labeled(patterns) => {
                patterns.iter().find_map(|re| first_group(re, text))
            }
            CompiledMatcher::Verdict { tokens, fallback } => tokens
                .iter()
                .find(|t| text.contains(**t))
                .map(|t| (*t).to_string())
                .or_else(|| first_group(fallback, text)),
        }?;

        Some(match self.rule.transform {
            Transform::None => raw,
            Transform::Uppercase => raw.to_uppercase(),
        })
    }
}

/// First capture group of the first match, trimmed; `None` if absent or blank.
fn first_group(re: &Regex, text: &str) -> Option<String> {
    let value = re.captures(text)?.get(1)?.as_str().trim();
    if value.is_empty() {
        None
    } else {
        Some(value.replace(['\r', '\n'], " "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(field: Field) -> &'static CompiledRule {
        COMPILED_RULES
            .iter()
            .find(|r| r.field() == field)
            .expect("rule exists")
    }

    #[test]
    fn every_extracted_field_has_exactly_one_rule() {
        for field in Field::EXTRACTED {
            let count = RULES.iter().filter(|r| r.field == field).count();
            assert_eq!(count, 1, "{field}");
        }
        assert_eq!(COMPILED_RULES.len(), RULES.len());
    }

    #[test]
    fn reference_stops_at_line_end() {
        let text = "Référence du rapport   GP-2024-0042  \nDate d'édition 01/02/2024";
        assert_eq!(
            rule(Field::ReferenceRapport).apply(text).as_deref(),
            Some("GP-2024-0042")
        );
    }

    #[test]
    fn labels_match_case_insensitively() {
        let text = "RÉFÉRENCE DU RAPPORT abc\n";
        assert_eq!(rule(Field::ReferenceRapport).apply(text).as_deref(), Some("abc"));
    }

    #[test]
    fn fos_takes_whole_code() {
        let text = "Opération BAR-TH-171 : pompe à chaleur";
        assert_eq!(rule(Field::Fos).apply(text).as_deref(), Some("BAR-TH-171"));
    }

    #[test]
    fn address_prefers_block_up_to_beneficiary_label() {
        let text = "Adresse des travaux 3 allée des Pins\n33000 Bordeaux\nNom du bénéficiaire M. Durand";
        assert_eq!(
            rule(Field::AdresseTravaux).apply(text).as_deref(),
            Some("3 allée des Pins 33000 Bordeaux")
        );
    }

    #[test]
    fn address_falls_back_to_next_capitalised_line() {
        let text = "Adresse des travaux 3 allée des Pins\n33000 Bordeaux\nRaison sociale du professionnel X";
        assert_eq!(
            rule(Field::AdresseTravaux).apply(text).as_deref(),
            Some("3 allée des Pins 33000 Bordeaux")
        );
    }

    #[test]
    fn address_fallback_stops_at_blank_line() {
        let text = "Adresse des travaux 3 allée des pins\n\nsuite du document";
        assert_eq!(
            rule(Field::AdresseTravaux).apply(text).as_deref(),
            Some("3 allée des pins")
        );
    }

    #[test]
    fn yes_no_tokens_are_uppercased() {
        let text = "Bénéficiaire joint oui\n";
        assert_eq!(rule(Field::BeneficiaireJoint).apply(text).as_deref(), Some("OUI"));
    }

    #[test]
    fn yes_no_ignores_longer_words() {
        let text = "Contrôle réalisé NONE\n";
        assert_eq!(rule(Field::ControleRealise).apply(text), None);
    }

    #[test]
    fn comment_takes_rest_of_line() {
        let text = "la réception n'est pas assurée radiateur de l'entrée absent\nAutre";
        assert_eq!(
            rule(Field::CommentaireNonReception).apply(text).as_deref(),
            Some("radiateur de l'entrée absent")
        );
    }

    #[test]
    fn verdict_negative_wins_over_its_substring() {
        let text = "Conclusion du contrôle\nNON SATISFAISANT\n";
        assert_eq!(
            rule(Field::ConclusionControle).apply(text).as_deref(),
            Some("NON SATISFAISANT")
        );
    }

    #[test]
    fn verdict_positive() {
        let text = "Conclusion du contrôle\nSATISFAISANT\n";
        assert_eq!(
            rule(Field::ConclusionControle).apply(text).as_deref(),
            Some("SATISFAISANT")
        );
    }

    #[test]
    fn verdict_falls_back_to_label() {
        let text = "Conclusion du contrôle A revoir\n";
        assert_eq!(
            rule(Field::ConclusionControle).apply(text).as_deref(),
            Some("A revoir")
        );
    }

    #[test]
    fn missing_label_yields_none() {
        assert_eq!(rule(Field::DateControle).apply("rien ici"), None);
    }
}
