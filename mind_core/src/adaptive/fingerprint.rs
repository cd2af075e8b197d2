//! The long-lived cognitive fingerprint.

use puzzle_rules::CognitiveDomain;
use serde::{Deserialize, Serialize};

/// Cross-session skill and behaviour profile.
///
/// Every dimension moves by exponential smoothing after each trial. Nothing
/// here is reset within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CognitiveFingerprint {
    /// Domain scores, 0 - 100.
    pub perception: f64,
    pub spatial: f64,
    pub logic: f64,
    pub temporal: f64,
    pub meta: f64,
    /// -1.0 (deliberate) to 1.0 (impulsive).
    pub impulsivity_bias: f64,
    /// 0.0 - 1.0.
    pub risk_tolerance: f64,
    /// How quickly the player recovers after a rule change, 0.0 - 1.0.
    pub adaptation_rate: f64,
    /// 1 - variance of recent accuracy, 0.0 - 1.0.
    pub consistency_score: f64,
    /// 0.0 - 1.0.
    pub trap_susceptibility: f64,
}

impl Default for CognitiveFingerprint {
    fn default() -> Self {
        Self {
            perception: 50.0,
            spatial: 50.0,
            logic: 50.0,
            temporal: 50.0,
            meta: 50.0,
            impulsivity_bias: 0.0,
            risk_tolerance: 0.5,
            adaptation_rate: 0.5,
            consistency_score: 0.5,
            trap_susceptibility: 0.3,
        }
    }
}

impl CognitiveFingerprint {
    pub fn domain_score(&self, domain: CognitiveDomain) -> f64 {
        match domain {
            CognitiveDomain::Perception => self.perception,
            CognitiveDomain::Spatial => self.spatial,
            CognitiveDomain::Logic => self.logic,
            CognitiveDomain::Temporal => self.temporal,
            CognitiveDomain::Meta => self.meta,
        }
    }

    pub fn domain_score_mut(&mut self, domain: CognitiveDomain) -> &mut f64 {
        match domain {
            CognitiveDomain::Perception => &mut self.perception,
            CognitiveDomain::Spatial => &mut self.spatial,
            CognitiveDomain::Logic => &mut self.logic,
            CognitiveDomain::Temporal => &mut self.temporal,
            CognitiveDomain::Meta => &mut self.meta,
        }
    }

    /// Lowest-scoring domain; earlier domains win ties.
    pub fn weakest_domain(&self) -> CognitiveDomain {
        CognitiveDomain::ALL
            .iter()
            .copied()
            .fold(CognitiveDomain::Perception, |best, d| {
                if self.domain_score(d) < self.domain_score(best) {
                    d
                } else {
                    best
                }
            })
    }

    /// Highest-scoring domain; earlier domains win ties.
    pub fn strongest_domain(&self) -> CognitiveDomain {
        CognitiveDomain::ALL
            .iter()
            .copied()
            .fold(CognitiveDomain::Perception, |best, d| {
                if self.domain_score(d) > self.domain_score(best) {
                    d
                } else {
                    best
                }
            })
    }

    /// Force every dimension into its legal range.
    pub fn clamp_all(&mut self) {
        for domain in CognitiveDomain::ALL {
            let score = self.domain_score_mut(domain);
            *score = score.clamp(0.0, 100.0);
        }
        self.impulsivity_bias = self.impulsivity_bias.clamp(-1.0, 1.0);
        self.risk_tolerance = self.risk_tolerance.clamp(0.0, 1.0);
        self.adaptation_rate = self.adaptation_rate.clamp(0.0, 1.0);
        self.consistency_score = self.consistency_score.clamp(0.0, 1.0);
        self.trap_susceptibility = self.trap_susceptibility.clamp(0.0, 1.0);
    }
}

/// Move `current` a `rate` fraction of the way toward `target`.
pub fn smooth(current: f64, target: f64, rate: f64) -> f64 {
    current + rate * (target - current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weakest_and_strongest() {
        let mut fingerprint = CognitiveFingerprint::default();
        fingerprint.logic = 20.0;
        fingerprint.meta = 90.0;
        assert_eq!(fingerprint.weakest_domain(), CognitiveDomain::Logic);
        assert_eq!(fingerprint.strongest_domain(), CognitiveDomain::Meta);
    }

    #[test]
    fn test_ties_go_to_first_domain() {
        let fingerprint = CognitiveFingerprint::default();
        assert_eq!(fingerprint.weakest_domain(), CognitiveDomain::Perception);
        assert_eq!(fingerprint.strongest_domain(), CognitiveDomain::Perception);
    }

    #[test]
    fn test_clamp_all() {
        let mut fingerprint = CognitiveFingerprint {
            spatial: 140.0,
            impulsivity_bias: -3.0,
            trap_susceptibility: 1.5,
            ..CognitiveFingerprint::default()
        };
        fingerprint.clamp_all();
        assert_eq!(fingerprint.spatial, 100.0);
        assert_eq!(fingerprint.impulsivity_bias, -1.0);
        assert_eq!(fingerprint.trap_susceptibility, 1.0);
    }

    #[test]
    fn test_smooth() {
        assert!((smooth(0.0, 1.0, 0.1) - 0.1).abs() < 1e-12);
        assert_eq!(smooth(0.5, 0.5, 0.1), 0.5);
    }
}
