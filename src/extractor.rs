use crate::document::{PageTextSource, PageTexts};
use crate::rules::{PageScope, COMPILED_RULES};
use crate::{ExtractedRecord, Result};
use std::path::Path;

/// Apply every field rule to the two page texts.
///
/// Never fails: a field whose label is absent is left as `""`.
pub fn extract_fields(first_page: &str, second_page: &str) -> ExtractedRecord {
    let both = format!("{first_page}\n{second_page}");
    let mut record = ExtractedRecord::new();

    for rule in COMPILED_RULES.iter() {
        let text = match rule.scope() {
            PageScope::First => first_page,
            PageScope::Second => second_page,
            PageScope::Both => both.as_str(),
        };
        if let Some(value) = rule.apply(text) {
            record.set(rule.field(), &value);
        }
    }

    record
}

/// Extract the record from a report file.
///
/// Only a document-level fault is an `Err`. A missing reference is logged as
/// a warning and the partial record is still returned.
pub fn extract_document(source: &dyn PageTextSource, path: &Path) -> Result<ExtractedRecord> {
    let PageTexts { first, second } = source.page_texts(path)?;
    let record = extract_fields(&first, &second);

    if record.reference().is_empty() {
        log::warn!(
            "no report reference found in {}; extracted data may be incomplete",
            display_name(path)
        );
    }

    Ok(record)
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Field;

    const PAGE_ONE: &str = "\
RAPPORT DE CONTRÔLE
Référence du rapport GP-2024-0042
Opération BAR-TH-171
";

    const PAGE_TWO: &str = "\
Adresse des travaux 3 allée des Pins
33000 Bordeaux
Nom du bénéficiaire Mme Claire Durand
Raison sociale du professionnel Chauffage Plus SARL
Bénéficiaire joint OUI
Numéro de téléphone erroné NON
Contrôle réalisé OUI
Date du contrôle 12/03/2024
Système de régulation pièce par pièce installé OUI
Les émetteurs reçoivent la température de consigne NON
Si la réception n'est pas assurée thermostat hors service
Absence de non-qualité manifeste détectée par le bénéficiaire OUI
Commentaire sur la non-qualité relevée RAS
Conclusion du contrôle
NON SATISFAISANT
";

    #[test]
    fn extracts_every_field_from_template() {
        let record = extract_fields(PAGE_ONE, PAGE_TWO);
        assert_eq!(record.get(Field::ReferenceRapport), "GP-2024-0042");
        assert_eq!(record.get(Field::Fos), "BAR-TH-171");
        assert_eq!(record.get(Field::AdresseTravaux), "3 allée des Pins 33000 Bordeaux");
        assert_eq!(record.get(Field::NomBeneficiaire), "Mme Claire Durand");
        assert_eq!(
            record.get(Field::RaisonSocialeProfessionnel),
            "Chauffage Plus SARL"
        );
        assert_eq!(record.get(Field::BeneficiaireJoint), "OUI");
        assert_eq!(record.get(Field::TelephoneErrone), "NON");
        assert_eq!(record.get(Field::ControleRealise), "OUI");
        assert_eq!(record.get(Field::DateControle), "12/03/2024");
        assert_eq!(record.get(Field::SystemeRegulationInstalle), "OUI");
        assert_eq!(record.get(Field::ReceptionConsignesEmetteurs), "NON");
        assert_eq!(
            record.get(Field::CommentaireNonReception),
            "thermostat hors service"
        );
        assert_eq!(record.get(Field::AbsenceNonQualiteManifeste), "OUI");
        assert_eq!(record.get(Field::CommentaireNonQualiteRelevee), "RAS");
        assert_eq!(record.get(Field::ConclusionControle), "NON SATISFAISANT");
    }

    #[test]
    fn reference_is_only_read_from_first_page() {
        let page_two = PAGE_TWO.replace("Adresse", "Référence du rapport X9\nAdresse");
        let record = extract_fields("page de garde", &page_two);
        assert_eq!(record.reference(), "");
    }

    #[test]
    fn fos_is_found_on_second_page_too() {
        let record = extract_fields("Référence du rapport R1\n", "Fiche BAR-TH-104\n");
        assert_eq!(record.get(Field::Fos), "BAR-TH-104");
    }

    #[test]
    fn empty_text_gives_all_empty_fields() {
        let record = extract_fields("", "");
        for field in Field::EXTRACTED {
            assert!(record.contains(field));
            assert_eq!(record.get(field), "");
        }
    }

    #[test]
    fn missing_reference_keeps_other_fields() {
        let page_one = PAGE_ONE.replace("Référence du rapport GP-2024-0042\n", "");
        let record = extract_fields(&page_one, PAGE_TWO);
        assert_eq!(record.reference(), "");
        assert_eq!(record.get(Field::NomBeneficiaire), "Mme Claire Durand");
        assert_eq!(record.get(Field::DateControle), "12/03/2024");
    }
}
