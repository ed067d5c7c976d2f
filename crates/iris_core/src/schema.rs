//! Feature schema resolution
//!
//! Maps the raw, arbitrarily-named columns of a CSV onto the four canonical
//! measurement slots. The resolved raw names, in slot order, are what gets
//! frozen into the model artifact and replayed at inference time.

use crate::errors::SchemaError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of canonical feature slots.
pub const FEATURE_COUNT: usize = 4;

/// Raw column names resolved for each slot, in canonical slot order.
pub type FeatureColumns = [String; FEATURE_COUNT];

/// One of the four fixed measurement roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureSlot {
    SepalLength,
    SepalWidth,
    PetalLength,
    PetalWidth,
}

impl FeatureSlot {
    /// Every slot in canonical order.
    pub const ALL: [FeatureSlot; FEATURE_COUNT] = [
        FeatureSlot::SepalLength,
        FeatureSlot::SepalWidth,
        FeatureSlot::PetalLength,
        FeatureSlot::PetalWidth,
    ];

    /// Canonical key used by keyed and form input.
    pub fn base_name(self) -> &'static str {
        match self {
            FeatureSlot::SepalLength => "sepal_length",
            FeatureSlot::SepalWidth => "sepal_width",
            FeatureSlot::PetalLength => "petal_length",
            FeatureSlot::PetalWidth => "petal_width",
        }
    }

    /// Human label for forms and tables.
    pub fn display_name(self) -> &'static str {
        match self {
            FeatureSlot::SepalLength => "Sepal Length (cm)",
            FeatureSlot::SepalWidth => "Sepal Width (cm)",
            FeatureSlot::PetalLength => "Petal Length (cm)",
            FeatureSlot::PetalWidth => "Petal Width (cm)",
        }
    }

    /// Accepted column-name variants, in declared order.
    pub fn variants(self) -> &'static [&'static str] {
        match self {
            FeatureSlot::SepalLength => &[
                "sepal_length",
                "sepal.length",
                "sepal length",
                "sepal_length_cm",
                "sepal length (cm)",
                "sepallength",
                "sepallengthcm",
            ],
            FeatureSlot::SepalWidth => &[
                "sepal_width",
                "sepal.width",
                "sepal width",
                "sepal_width_cm",
                "sepal width (cm)",
                "sepalwidth",
                "sepalwidthcm",
            ],
            FeatureSlot::PetalLength => &[
                "petal_length",
                "petal.length",
                "petal length",
                "petal_length_cm",
                "petal length (cm)",
                "petallength",
                "petallengthcm",
            ],
            FeatureSlot::PetalWidth => &[
                "petal_width",
                "petal.width",
                "petal width",
                "petal_width_cm",
                "petal width (cm)",
                "petalwidth",
                "petalwidthcm",
            ],
        }
    }

    /// True if `raw` normalizes to any of this slot's variants.
    pub fn matches(self, raw: &str) -> bool {
        let key = normalize_key(raw);
        self.variants().iter().any(|v| normalize_key(v) == key)
    }

    /// Slot whose variants match a raw column name, if any.
    pub fn for_column(raw: &str) -> Option<FeatureSlot> {
        Self::ALL.into_iter().find(|slot| slot.matches(raw))
    }
}

impl fmt::Display for FeatureSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.base_name())
    }
}

/// Lowercase and keep only alphanumerics, so `Sepal.Length`,
/// `sepal length` and `sepal_length` collapse to one key.
pub fn normalize_key(raw: &str) -> String {
    raw.chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// Resolve the four feature columns of a raw table.
///
/// For each slot in canonical order, the first raw column (left to right)
/// matching any variant wins. Later duplicates are ignored. Fails on the
/// first slot with no match.
pub fn resolve<S: AsRef<str>>(raw_columns: &[S]) -> Result<FeatureColumns, SchemaError> {
    let mut resolved: FeatureColumns = Default::default();

    for (slot, out) in FeatureSlot::ALL.into_iter().zip(resolved.iter_mut()) {
        let mut matching = raw_columns
            .iter()
            .map(AsRef::as_ref)
            .filter(|column| slot.matches(column));

        let Some(first) = matching.next() else {
            return Err(SchemaError::MissingFeature {
                slot,
                available: raw_columns.iter().map(|c| c.as_ref().to_string()).collect(),
            });
        };

        let shadowed: Vec<&str> = matching.collect();
        if !shadowed.is_empty() {
            tracing::debug!(
                slot = %slot,
                chosen = first,
                ?shadowed,
                "several columns match one feature slot; keeping the first"
            );
        }

        *out = first.to_string();
    }

    Ok(resolved)
}

/// Map a raw artifact column name back to its canonical base key.
///
/// Uses the slot variants first; otherwise lowercases, folds `.` and spaces
/// into `_` and strips a trailing `_cm` / `_(cm)` unit suffix.
pub fn base_feature_key(column: &str) -> String {
    if let Some(slot) = FeatureSlot::for_column(column) {
        return slot.base_name().to_string();
    }

    let folded: String = column
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == '.' || c == ' ' { '_' } else { c })
        .collect();

    ["_(cm)", "_cm"]
        .iter()
        .find_map(|suffix| folded.strip_suffix(suffix))
        .map(str::to_string)
        .unwrap_or(folded)
}
