//! Fair-price reference table for known overcharge categories.
//!
//! Each entry maps a lowercase keyword to the typical billed amount, a fair
//! (Medicare-reference) amount, and the fraction of the charge that is
//! typically negotiable. Tables are immutable once built and validated on
//! construction; a JSON file may replace the built-in table.

use std::collections::HashSet;
use std::path::Path;

use billbot_core::{CoreError, load_json};
use serde::{Deserialize, Serialize};

/// Built-in table: `(keyword, typical, fair, negotiable)`.
pub const BUILTIN_REFERENCE: &[(&str, f64, f64, f64)] = &[
    ("facility fee", 847.0, 200.0, 0.76),
    ("emergency room", 3200.0, 800.0, 0.75),
    ("emergency", 3200.0, 800.0, 0.75),
    ("bandage", 200.0, 5.0, 0.975),
    ("ibuprofen", 43.0, 0.5, 0.98),
    ("acetaminophen", 38.0, 0.5, 0.98),
    ("tylenol", 38.0, 0.5, 0.98),
    ("aspirin", 25.0, 1.25, 0.95),
    ("lab processing", 395.0, 120.0, 0.69),
    ("lab", 395.0, 138.0, 0.65),
    ("anesthesia", 2100.0, 900.0, 0.57),
    ("iv therapy", 787.0, 150.0, 0.81),
    ("room charge", 4800.0, 1200.0, 0.75),
    ("operating room", 7800.0, 2400.0, 0.69),
    ("recovery room", 1200.0, 400.0, 0.67),
    ("supplies", 567.0, 50.0, 0.91),
    ("pharmacy", 892.0, 200.0, 0.78),
    ("radiology", 1200.0, 400.0, 0.67),
    ("ct scan", 3400.0, 800.0, 0.76),
    ("mri", 5200.0, 1200.0, 0.77),
    ("x-ray", 450.0, 150.0, 0.67),
    ("ultrasound", 800.0, 200.0, 0.75),
    ("blood test", 320.0, 50.0, 0.84),
    ("urine test", 280.0, 30.0, 0.89),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    /// Lowercase substring matched against charge descriptions.
    pub keyword: String,
    /// Typical billed amount in dollars.
    pub typical: f64,
    /// Fair-market / Medicare-reference amount in dollars.
    pub fair: f64,
    /// Typical negotiable fraction, in (0, 1].
    pub negotiable: f64,
}

/// Ordered keyword table. Order matters: it is the order flags are emitted in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ReferenceEntry>", into = "Vec<ReferenceEntry>")]
pub struct ReferenceTable {
    entries: Vec<ReferenceEntry>,
}

impl Default for ReferenceTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ReferenceTable {
    /// The built-in table from [`BUILTIN_REFERENCE`].
    pub fn builtin() -> Self {
        let entries = BUILTIN_REFERENCE
            .iter()
            .map(|&(keyword, typical, fair, negotiable)| ReferenceEntry {
                keyword: keyword.to_string(),
                typical,
                fair,
                negotiable,
            })
            .collect();
        Self { entries }
    }

    /// Build a table, rejecting entries that would break the fair-price
    /// invariants.
    ///
    /// Keywords must be non-empty, lowercase, and unique; `negotiable` must
    /// lie in (0, 1]; `fair` must not exceed `typical`.
    pub fn from_entries(entries: Vec<ReferenceEntry>) -> Result<Self, CoreError> {
        if entries.is_empty() {
            return Err(CoreError::InvalidReference("table has no entries".into()));
        }

        let mut seen = HashSet::new();
        for entry in &entries {
            let kw = entry.keyword.trim();
            if kw.is_empty() {
                return Err(CoreError::InvalidReference("empty keyword".into()));
            }
            if kw != entry.keyword || kw.to_lowercase() != kw {
                return Err(CoreError::InvalidReference(format!(
                    "keyword '{}' must be trimmed lowercase",
                    entry.keyword
                )));
            }
            if !seen.insert(kw) {
                return Err(CoreError::InvalidReference(format!(
                    "duplicate keyword '{kw}'"
                )));
            }
            if !(entry.negotiable > 0.0 && entry.negotiable <= 1.0) {
                return Err(CoreError::InvalidReference(format!(
                    "'{kw}': negotiable {} outside (0, 1]",
                    entry.negotiable
                )));
            }
            if !(entry.fair >= 0.0 && entry.fair <= entry.typical) {
                return Err(CoreError::InvalidReference(format!(
                    "'{kw}': fair {} must be within [0, typical {}]",
                    entry.fair, entry.typical
                )));
            }
        }

        Ok(Self { entries })
    }

    /// Load a table from a JSON array of entries.
    pub fn from_json_file(path: &Path) -> Result<Self, CoreError> {
        load_json(path)
    }

    pub fn entries(&self) -> &[ReferenceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, keyword: &str) -> Option<&ReferenceEntry> {
        self.entries.iter().find(|e| e.keyword == keyword)
    }

    /// Entries whose keyword occurs in `description_lower`, in table order.
    ///
    /// Matching is plain substring containment, so `lab` also matches
    /// `laboratory`.
    pub fn matches<'a>(
        &'a self,
        description_lower: &'a str,
    ) -> impl Iterator<Item = &'a ReferenceEntry> + 'a {
        self.entries
            .iter()
            .filter(move |e| description_lower.contains(e.keyword.as_str()))
    }
}

impl TryFrom<Vec<ReferenceEntry>> for ReferenceTable {
    type Error = CoreError;

    fn try_from(entries: Vec<ReferenceEntry>) -> Result<Self, Self::Error> {
        Self::from_entries(entries)
    }
}

impl From<ReferenceTable> for Vec<ReferenceEntry> {
    fn from(table: ReferenceTable) -> Self {
        table.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn entry(keyword: &str, typical: f64, fair: f64, negotiable: f64) -> ReferenceEntry {
        ReferenceEntry {
            keyword: keyword.to_string(),
            typical,
            fair,
            negotiable,
        }
    }

    #[test]
    fn builtin_is_valid() {
        let table = ReferenceTable::builtin();
        assert!(ReferenceTable::from_entries(table.entries().to_vec()).is_ok());
    }

    #[test]
    fn builtin_covers_minimum_keywords() {
        let table = ReferenceTable::builtin();
        for kw in [
            "facility fee",
            "emergency room",
            "bandage",
            "ibuprofen",
            "acetaminophen",
            "lab processing",
            "anesthesia",
            "iv therapy",
            "room charge",
            "operating room",
            "recovery room",
            "supplies",
            "pharmacy",
            "radiology",
            "ct scan",
            "mri",
            "x-ray",
            "ultrasound",
            "blood test",
            "urine test",
        ] {
            assert!(table.get(kw).is_some(), "missing keyword {kw}");
        }
        assert_eq!(table.get("facility fee").unwrap().negotiable, 0.76);
        assert_eq!(table.get("ibuprofen").unwrap().negotiable, 0.98);
        assert_eq!(table.get("lab").unwrap().negotiable, 0.65);
        assert_eq!(table.get("emergency").unwrap().negotiable, 0.75);
        assert_eq!(table.get("aspirin").unwrap().negotiable, 0.95);
    }

    #[test]
    fn matches_in_table_order() {
        let table = ReferenceTable::builtin();
        let hits: Vec<&str> = table
            .matches("emergency room visit - lab processing")
            .map(|e| e.keyword.as_str())
            .collect();
        assert_eq!(
            hits,
            vec!["emergency room", "emergency", "lab processing", "lab"]
        );
    }

    #[test]
    fn rejects_bad_entries() {
        assert!(ReferenceTable::from_entries(vec![]).is_err());
        assert!(ReferenceTable::from_entries(vec![entry("", 10.0, 1.0, 0.5)]).is_err());
        assert!(ReferenceTable::from_entries(vec![entry("MRI", 10.0, 1.0, 0.5)]).is_err());
        assert!(ReferenceTable::from_entries(vec![entry("mri", 10.0, 1.0, 0.0)]).is_err());
        assert!(ReferenceTable::from_entries(vec![entry("mri", 10.0, 1.0, 1.2)]).is_err());
        assert!(ReferenceTable::from_entries(vec![entry("mri", 10.0, 11.0, 0.5)]).is_err());
        assert!(
            ReferenceTable::from_entries(vec![
                entry("mri", 10.0, 1.0, 0.5),
                entry("mri", 12.0, 1.0, 0.5),
            ])
            .is_err()
        );
    }

    #[test]
    fn json_roundtrip_validates() {
        let table = ReferenceTable::builtin();
        let json = serde_json::to_string(&table).unwrap();
        let parsed: ReferenceTable = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, table);

        let bad = r#"[{"keyword":"mri","typical":10,"fair":1,"negotiable":2.0}]"#;
        assert!(serde_json::from_str::<ReferenceTable>(bad).is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"keyword":"oxygen","typical":240,"fair":40,"negotiable":0.83}}]"#
        )
        .unwrap();
        let table = ReferenceTable::from_json_file(file.path()).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("oxygen").unwrap().fair, 40.0);
    }
}
