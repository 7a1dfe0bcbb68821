use std::collections::BTreeMap;

// ── Field ────────────────────────────────────────────────────────────────────

/// One column of the summary spreadsheet.
///
/// Variants are declared in spreadsheet order; the derived `Ord` follows that
/// order, so a `BTreeMap<Field, _>` iterates columns left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    OriginalFileName,
    NewFileName,
    ReferenceRapport,
    Fos,
    AdresseTravaux,
    NomBeneficiaire,
    RaisonSocialeProfessionnel,
    BeneficiaireJoint,
    TelephoneErrone,
    ControleRealise,
    DateControle,
    SystemeRegulationInstalle,
    ReceptionConsignesEmetteurs,
    CommentaireNonReception,
    AbsenceNonQualiteManifeste,
    CommentaireNonQualiteRelevee,
    ConclusionControle,
}

impl Field {
    /// Every spreadsheet column, in output order.
    pub const ALL: [Self; 17] = [
        Self::OriginalFileName,
        Self::NewFileName,
        Self::ReferenceRapport,
        Self::Fos,
        Self::AdresseTravaux,
        Self::NomBeneficiaire,
        Self::RaisonSocialeProfessionnel,
        Self::BeneficiaireJoint,
        Self::TelephoneErrone,
        Self::ControleRealise,
        Self::DateControle,
        Self::SystemeRegulationInstalle,
        Self::ReceptionConsignesEmetteurs,
        Self::CommentaireNonReception,
        Self::AbsenceNonQualiteManifeste,
        Self::CommentaireNonQualiteRelevee,
        Self::ConclusionControle,
    ];

    /// The fields read out of the document text. Always present in a record.
    pub const EXTRACTED: [Self; 15] = [
        Self::ReferenceRapport,
        Self::Fos,
        Self::AdresseTravaux,
        Self::NomBeneficiaire,
        Self::RaisonSocialeProfessionnel,
        Self::BeneficiaireJoint,
        Self::TelephoneErrone,
        Self::ControleRealise,
        Self::DateControle,
        Self::SystemeRegulationInstalle,
        Self::ReceptionConsignesEmetteurs,
        Self::CommentaireNonReception,
        Self::AbsenceNonQualiteManifeste,
        Self::CommentaireNonQualiteRelevee,
        Self::ConclusionControle,
    ];

    /// Column header used in the spreadsheet.
    pub const fn name(self) -> &'static str {
        match self {
            Self::OriginalFileName => "OriginalFileName",
            Self::NewFileName => "NewFileName",
            Self::ReferenceRapport => "ReferenceRapport",
            Self::Fos => "FOS",
            Self::AdresseTravaux => "AdresseTravaux",
            Self::NomBeneficiaire => "NomBeneficiaire",
            Self::RaisonSocialeProfessionnel => "RaisonSocialeProfessionnel",
            Self::BeneficiaireJoint => "BeneficiaireJoint",
            Self::TelephoneErrone => "TelephoneErrone",
            Self::ControleRealise => "ControleRealise",
            Self::DateControle => "DateControle",
            Self::SystemeRegulationInstalle => "SystemeRegulationInstalle",
            Self::ReceptionConsignesEmetteurs => "ReceptionConsignesEmetteurs",
            Self::CommentaireNonReception => "CommentaireNonReception",
            Self::AbsenceNonQualiteManifeste => "AbsenceNonQualiteManifeste",
            Self::CommentaireNonQualiteRelevee => "CommentaireNonQualiteRelevee",
            Self::ConclusionControle => "ConclusionControle",
        }
    }

    /// Reverse of [`Field::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ── ExtractedRecord ──────────────────────────────────────────────────────────

/// The flat set of values read from one report.
///
/// Every [`Field::EXTRACTED`] key is present from construction onwards (empty
/// string when the document did not contain it). The two file-name columns are
/// only present once the file has been through disposition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedRecord {
    values: BTreeMap<Field, String>,
}

impl Default for ExtractedRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractedRecord {
    /// A record with every extracted field set to the empty string.
    pub fn new() -> Self {
        let values = Field::EXTRACTED
            .into_iter()
            .map(|f| (f, String::new()))
            .collect();
        Self { values }
    }

    /// Value of `field`, or `""` when the field is not set.
    pub fn get(&self, field: Field) -> &str {
        self.values.get(&field).map(String::as_str).unwrap_or("")
    }

    /// Store `value` after collapsing every whitespace run to a single space.
    pub fn set(&mut self, field: Field, value: &str) {
        self.values.insert(field, normalize_whitespace(value));
    }

    /// Append the two file-name columns. Stored verbatim: file names are not
    /// whitespace-normalized.
    pub fn set_file_names(&mut self, original: &str, new: &str) {
        self.values.insert(Field::OriginalFileName, original.to_string());
        self.values.insert(Field::NewFileName, new.to_string());
    }

    /// Returns `true` when `field` has an entry, even an empty one.
    pub fn contains(&self, field: Field) -> bool {
        self.values.contains_key(&field)
    }

    /// The report reference, trimmed. Empty when not found.
    pub fn reference(&self) -> &str {
        self.get(Field::ReferenceRapport)
    }

    /// One value per spreadsheet column, missing columns rendered as `""`.
    pub fn to_row(&self) -> Vec<&str> {
        Field::ALL.iter().map(|f| self.get(*f)).collect()
    }
}

/// Trim and collapse all whitespace (line breaks included) to single spaces.
pub fn normalize_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_has_every_extracted_field_empty() {
        let record = ExtractedRecord::new();
        for field in Field::EXTRACTED {
            assert!(record.contains(field), "{field} missing");
            assert_eq!(record.get(field), "");
        }
        assert!(!record.contains(Field::OriginalFileName));
        assert!(!record.contains(Field::NewFileName));
    }

    #[test]
    fn set_collapses_line_breaks() {
        let mut record = ExtractedRecord::new();
        record.set(Field::AdresseTravaux, "  12 rue des Lilas\n 75001   Paris \r\n");
        assert_eq!(record.get(Field::AdresseTravaux), "12 rue des Lilas 75001 Paris");
    }

    #[test]
    fn row_follows_column_order() {
        let mut record = ExtractedRecord::new();
        record.set(Field::ConclusionControle, "SATISFAISANT");
        record.set(Field::OriginalFileName, "a.pdf");
        let row = record.to_row();
        assert_eq!(row.len(), 17);
        assert_eq!(row[0], "a.pdf");
        assert_eq!(row[1], "");
        assert_eq!(row[16], "SATISFAISANT");
    }

    #[test]
    fn names_round_trip() {
        for field in Field::ALL {
            assert_eq!(Field::from_name(field.name()), Some(field));
        }
        assert_eq!(Field::Fos.name(), "FOS");
    }
}
