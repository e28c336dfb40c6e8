//! The fixed five-tier severity taxonomy.
//!
//! Every backend scores the same five classes in the same order, and the
//! executor, the aggregator and the serving layer all share this enumeration.
//! The class index produced by a backend maps positionally onto the tiers
//! below; changing the order would silently re-grade every prediction, so
//! the ordering is part of the wire contract.

use serde::{Deserialize, Serialize};

/// Number of severity classes every backend scores.
pub const NUM_CLASSES: usize = 5;

/// Clinical severity tier for diabetic retinopathy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// No signs of retinopathy.
    None,
    /// Mild non-proliferative retinopathy.
    Mild,
    /// Moderate non-proliferative retinopathy.
    Moderate,
    /// Severe non-proliferative retinopathy.
    Severe,
    /// Proliferative retinopathy.
    Proliferative,
}

impl Severity {
    /// All tiers in canonical class order.
    pub const ALL: [Severity; NUM_CLASSES] = [
        Severity::None,
        Severity::Mild,
        Severity::Moderate,
        Severity::Severe,
        Severity::Proliferative,
    ];

    /// Maps a class index onto its severity tier.
    pub fn from_index(index: usize) -> Option<Severity> {
        Self::ALL.get(index).copied()
    }

    /// Returns the class index of this tier.
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Returns the canonical wire name (`"none"`, `"mild"`, ...).
    pub fn wire_name(&self) -> &'static str {
        match self {
            Severity::None => "none",
            Severity::Mild => "mild",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
            Severity::Proliferative => "proliferative",
        }
    }

    /// Returns the human-readable class label for this tier.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::None => "No Diabetic Retinopathy",
            Severity::Mild => "Mild Diabetic Retinopathy",
            Severity::Moderate => "Moderate Diabetic Retinopathy",
            Severity::Severe => "Severe Diabetic Retinopathy",
            Severity::Proliferative => "Proliferative Diabetic Retinopathy",
        }
    }

    /// Returns the clinical recommendation for this tier.
    pub fn recommendation(&self) -> &'static str {
        match self {
            Severity::None => {
                "No signs of diabetic retinopathy detected. Routine annual screening is recommended."
            }
            Severity::Mild => {
                "Mild signs of diabetic retinopathy detected. Consult your ophthalmologist for evaluation and follow-up."
            }
            Severity::Moderate => {
                "Moderate signs of diabetic retinopathy detected. An ophthalmologist consultation is recommended soon."
            }
            Severity::Severe => {
                "Severe signs of diabetic retinopathy detected. Urgent ophthalmological attention is required."
            }
            Severity::Proliferative => {
                "Proliferative diabetic retinopathy detected. Immediate ophthalmological attention is required."
            }
        }
    }

    /// Generic recommendation for verdicts outside the fixed table.
    pub fn fallback_recommendation() -> &'static str {
        "Consult a specialist for evaluation."
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}
