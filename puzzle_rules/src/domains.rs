//! Cognitive domains a round can exercise, and per-domain weighting.

use serde::{Deserialize, Serialize};

/// The five skill domains tracked by the player model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CognitiveDomain {
    Perception,
    Spatial,
    Logic,
    Temporal,
    Meta,
}

impl CognitiveDomain {
    pub const ALL: [CognitiveDomain; 5] = [
        CognitiveDomain::Perception,
        CognitiveDomain::Spatial,
        CognitiveDomain::Logic,
        CognitiveDomain::Temporal,
        CognitiveDomain::Meta,
    ];
}

/// Relative weighting across domains used to bias generation. Weights sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DomainWeights {
    pub perception: f64,
    pub spatial: f64,
    pub logic: f64,
    pub temporal: f64,
    pub meta: f64,
}

impl Default for DomainWeights {
    fn default() -> Self {
        Self::uniform()
    }
}

impl DomainWeights {
    /// Equal weight on every domain.
    pub fn uniform() -> Self {
        Self {
            perception: 0.2,
            spatial: 0.2,
            logic: 0.2,
            temporal: 0.2,
            meta: 0.2,
        }
    }

    /// All weight on a single domain.
    pub fn focused(domain: CognitiveDomain) -> Self {
        let mut weights = Self {
            perception: 0.0,
            spatial: 0.0,
            logic: 0.0,
            temporal: 0.0,
            meta: 0.0,
        };
        weights.set(domain, 1.0);
        weights
    }

    pub fn weight(&self, domain: CognitiveDomain) -> f64 {
        match domain {
            CognitiveDomain::Perception => self.perception,
            CognitiveDomain::Spatial => self.spatial,
            CognitiveDomain::Logic => self.logic,
            CognitiveDomain::Temporal => self.temporal,
            CognitiveDomain::Meta => self.meta,
        }
    }

    pub fn set(&mut self, domain: CognitiveDomain, weight: f64) {
        let slot = match domain {
            CognitiveDomain::Perception => &mut self.perception,
            CognitiveDomain::Spatial => &mut self.spatial,
            CognitiveDomain::Logic => &mut self.logic,
            CognitiveDomain::Temporal => &mut self.temporal,
            CognitiveDomain::Meta => &mut self.meta,
        };
        *slot = weight.max(0.0);
    }

    pub fn total(&self) -> f64 {
        CognitiveDomain::ALL.iter().map(|d| self.weight(*d)).sum()
    }

    /// Domain with the largest weight; earlier domains win ties.
    pub fn heaviest(&self) -> CognitiveDomain {
        CognitiveDomain::ALL
            .iter()
            .copied()
            .fold(CognitiveDomain::Perception, |best, d| {
                if self.weight(d) > self.weight(best) {
                    d
                } else {
                    best
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_sums_to_one() {
        assert!((DomainWeights::uniform().total() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_focused() {
        let weights = DomainWeights::focused(CognitiveDomain::Temporal);
        assert_eq!(weights.weight(CognitiveDomain::Temporal), 1.0);
        assert_eq!(weights.weight(CognitiveDomain::Logic), 0.0);
        assert_eq!(weights.heaviest(), CognitiveDomain::Temporal);
    }

    #[test]
    fn test_set_clamps_negative() {
        let mut weights = DomainWeights::uniform();
        weights.set(CognitiveDomain::Meta, -1.0);
        assert_eq!(weights.meta, 0.0);
    }
}
