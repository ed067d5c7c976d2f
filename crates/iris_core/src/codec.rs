//! Label codec
//!
//! Fixed bidirectional mapping between canonical species names and small
//! positive integer codes. The tables are a constant of the system, not a
//! function of any dataset, so label semantics cannot drift between
//! retrainings on different CSVs.

use crate::errors::SchemaError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Canonical species in code order (setosa = 1, versicolor = 2, virginica = 3).
pub const IRIS_SPECIES: [&str; 3] = ["setosa", "versicolor", "virginica"];

/// Prefixes removed by [`LabelCodec::normalize`], e.g. `Iris-setosa`.
const SPECIES_PREFIXES: [&str; 3] = ["iris-", "iris ", "iris_"];

/// Immutable species <-> code tables.
///
/// Constructed once at startup and passed to every component that needs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCodec {
    species_to_int: BTreeMap<String, u32>,
    int_to_species: BTreeMap<u32, String>,
}

impl LabelCodec {
    /// The three-class Iris codec.
    pub fn iris() -> Self {
        Self::from_names(&IRIS_SPECIES)
    }

    /// Build a codec assigning contiguous codes from 1 in the given order.
    ///
    /// Names are normalized first; duplicates keep their first code.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        let mut species_to_int = BTreeMap::new();
        let mut int_to_species = BTreeMap::new();
        let mut next = 1u32;
        for name in names {
            let name = Self::normalize(name.as_ref());
            if species_to_int.contains_key(&name) {
                continue;
            }
            species_to_int.insert(name.clone(), next);
            int_to_species.insert(next, name);
            next += 1;
        }
        Self {
            species_to_int,
            int_to_species,
        }
    }

    /// Rebuild a codec from persisted tables, checking they are mutual inverses.
    pub fn from_tables(
        species_to_int: BTreeMap<String, u32>,
        int_to_species: BTreeMap<u32, String>,
    ) -> Result<Self, String> {
        if species_to_int.len() != int_to_species.len() {
            return Err(format!(
                "species_to_int has {} entries but int_to_species has {}",
                species_to_int.len(),
                int_to_species.len()
            ));
        }
        for (name, code) in &species_to_int {
            match int_to_species.get(code) {
                Some(back) if back == name => {}
                Some(back) => {
                    return Err(format!(
                        "code {code} maps to '{back}' but '{name}' maps to {code}"
                    ))
                }
                None => return Err(format!("code {code} for '{name}' has no inverse entry")),
            }
        }
        Ok(Self {
            species_to_int,
            int_to_species,
        })
    }

    /// Lowercase, trim and strip any leading `iris-`, `iris ` or `iris_`.
    ///
    /// Pure and total; idempotent on its own output.
    pub fn normalize(raw: &str) -> String {
        let mut name = raw.trim().to_lowercase();
        while let Some(rest) = SPECIES_PREFIXES
            .iter()
            .find_map(|prefix| name.strip_prefix(prefix))
        {
            name = rest.trim().to_string();
        }
        name
    }

    /// Fail listing every normalized name that is not a codec key.
    pub fn validate<'a, I>(&self, normalized_names: I) -> Result<(), SchemaError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let unknown: BTreeSet<String> = normalized_names
            .into_iter()
            .filter(|name| !self.species_to_int.contains_key(*name))
            .map(str::to_string)
            .collect();

        if unknown.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::UnknownLabels(unknown.into_iter().collect()))
        }
    }

    /// Code for an already-normalized species name.
    pub fn encode(&self, species: &str) -> Option<u32> {
        self.species_to_int.get(species).copied()
    }

    pub fn decode(&self, code: u32) -> Option<&str> {
        self.int_to_species.get(&code).map(String::as_str)
    }

    /// Codes in ascending order; this is the row/column order of every report.
    pub fn labels(&self) -> Vec<u32> {
        self.int_to_species.keys().copied().collect()
    }

    /// Species names in the same order as [`LabelCodec::labels`].
    pub fn target_names(&self) -> Vec<String> {
        self.int_to_species.values().cloned().collect()
    }

    pub fn species_to_int(&self) -> &BTreeMap<String, u32> {
        &self.species_to_int
    }

    pub fn int_to_species(&self) -> &BTreeMap<u32, String> {
        &self.int_to_species
    }

    pub fn len(&self) -> usize {
        self.species_to_int.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species_to_int.is_empty()
    }
}

impl Default for LabelCodec {
    fn default() -> Self {
        Self::iris()
    }
}
