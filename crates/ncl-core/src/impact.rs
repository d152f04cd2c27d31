//! Impact vectors and the classifier that derives them from choice text.
//!
//! An [`ImpactVector`] is computed once when a consequence is recorded and is
//! only ever amplified afterwards. The classifier is a policy behind the
//! [`ImpactClassifier`] trait so a model-backed implementation can replace
//! the keyword heuristics without touching scoring or escalation.

use serde::{Deserialize, Serialize};

use crate::house::House;

/// Five-dimensional qualitative effect of a consequence.
///
/// Signed dimensions live in [-1, 1], unsigned ones in [0, 1]. Every
/// constructor and mutation clamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ImpactVector {
    political_pressure: f64,
    resource_delta: f64,
    alliance_shift: f64,
    corruption_level: f64,
    survival_threat: f64,
}

impl ImpactVector {
    /// Create a vector, clamping each dimension to its bounds.
    pub fn new(
        political_pressure: f64,
        resource_delta: f64,
        alliance_shift: f64,
        corruption_level: f64,
        survival_threat: f64,
    ) -> Self {
        Self {
            political_pressure: clamp_signed(political_pressure),
            resource_delta: clamp_signed(resource_delta),
            alliance_shift: clamp_signed(alliance_shift),
            corruption_level: clamp_unsigned(corruption_level),
            survival_threat: clamp_unsigned(survival_threat),
        }
    }

    /// Political pressure in [-1, 1]. Negative is coercive.
    pub fn political_pressure(&self) -> f64 {
        self.political_pressure
    }

    /// Resource delta in [-1, 1].
    pub fn resource_delta(&self) -> f64 {
        self.resource_delta
    }

    /// Alliance shift in [-1, 1]. Positive draws houses together.
    pub fn alliance_shift(&self) -> f64 {
        self.alliance_shift
    }

    /// Corruption level in [0, 1].
    pub fn corruption_level(&self) -> f64 {
        self.corruption_level
    }

    /// Survival threat in [0, 1].
    pub fn survival_threat(&self) -> f64 {
        self.survival_threat
    }

    /// Weighted magnitude used to derive severity.
    pub fn magnitude(&self) -> f64 {
        self.weighted().iter().sum()
    }

    /// Scale every dimension by `factor`, clamped to bounds.
    pub fn amplified(&self, factor: f64) -> Self {
        Self::new(
            self.political_pressure * factor,
            self.resource_delta * factor,
            self.alliance_shift * factor,
            self.corruption_level * factor,
            self.survival_threat * factor,
        )
    }

    /// One-word tone of the dominant dimension, for synthesized descriptions.
    pub fn tone(&self) -> &'static str {
        let weighted = self.weighted();
        let (idx, &max) = weighted
            .iter()
            .enumerate()
            .fold((0, &0.0), |best, cur| if cur.1 > best.1 { cur } else { best });
        if max <= 0.0 {
            return "quiet";
        }
        match idx {
            0 if self.political_pressure < 0.0 => "coercive",
            0 => "conciliatory",
            1 if self.resource_delta < 0.0 => "costly",
            1 => "enriching",
            2 if self.alliance_shift < 0.0 => "divisive",
            2 => "unifying",
            3 => "corrupting",
            _ => "perilous",
        }
    }

    fn weighted(&self) -> [f64; 5] {
        [
            2.0 * self.political_pressure.abs(),
            1.5 * self.resource_delta.abs(),
            2.0 * self.alliance_shift.abs(),
            2.5 * self.corruption_level,
            3.0 * self.survival_threat,
        ]
    }
}

fn clamp_signed(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(-1.0, 1.0) }
}

fn clamp_unsigned(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

/// Derives an impact vector from a choice.
pub trait ImpactClassifier {
    /// Classify the winning choice's text for the given houses.
    fn classify(&self, text: &str, houses: &[House]) -> ImpactVector;
}

const COERCIVE: &[&str] = &[
    "force", "demand", "threaten", "coerce", "seize", "execute", "imprison", "decree",
];
const DIPLOMATIC: &[&str] = &["negotiate", "petition", "pardon", "concede"];
const RESOURCE_GAIN: &[&str] = &["trade", "tax", "harvest", "mine", "claim"];
const RESOURCE_LOSS: &[&str] = &["burn", "spend", "sacrifice", "plunder", "destroy"];
const ALLIANCE: &[&str] = &["ally", "alliance", "unite", "unity", "marry", "pact", "treaty"];
const BETRAYAL: &[&str] = &["betray", "abandon", "sever", "break"];
const CORRUPTION: &[&str] = &["bribe", "blood", "forbidden", "dark", "poison", "curse", "lie"];
const SURVIVAL: &[&str] = &[
    "war", "kill", "plague", "invade", "siege", "starve", "assassinate",
];

/// Default classifier: fixed keyword lists with per-hit contributions.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl ImpactClassifier for KeywordClassifier {
    fn classify(&self, text: &str, houses: &[House]) -> ImpactVector {
        let lower = text.to_lowercase();
        let tokens: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();
        let hits = |words: &[&str]| -> f64 {
            tokens
                .iter()
                .filter(|t| words.iter().any(|w| matches_stem(t, w)))
                .count() as f64
        };

        let mut political = hits(DIPLOMATIC) * 0.3 - hits(COERCIVE) * 0.4;
        let resource = hits(RESOURCE_GAIN) * 0.3 - hits(RESOURCE_LOSS) * 0.4;
        let alliance = hits(ALLIANCE) * 0.4 - hits(BETRAYAL) * 0.5;
        let corruption = hits(CORRUPTION) * 0.3;
        let survival = hits(SURVIVAL) * 0.35;

        // More houses at the table means more pressure, in whichever direction it already leans.
        let extra = houses.len().saturating_sub(1) as f64 * 0.1;
        if political > 0.0 {
            political += extra;
        } else {
            political -= extra;
        }

        ImpactVector::new(political, resource, alliance, corruption, survival)
    }
}

/// Whole-word match allowing a few inflection suffixes ("threatens", "seized").
fn matches_stem(token: &str, word: &str) -> bool {
    token
        .strip_prefix(word)
        .is_some_and(|rest| matches!(rest, "" | "s" | "es" | "d" | "ed" | "ing" | "ment"))
}
