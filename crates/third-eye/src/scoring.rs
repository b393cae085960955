//! Similarity scoring over the three final statements.
//!
//! Embeddings come in from the embedder in a fixed agent, anti_agent,
//! observer order; this module computes the pairwise cosine matrix and the
//! categorical verdicts derived from it. All verdicts are informational,
//! never fatal.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Above this, Agent and Anti-Agent converged on one reading.
pub const CONVERGENCE_THRESHOLD: f64 = 0.7;
/// Below this, the two positions fully diverged.
pub const DIVERGENCE_THRESHOLD: f64 = 0.3;
/// Equidistance below this marks a genuinely novel observer position.
pub const NOVEL_THRESHOLD: f64 = 0.1;
/// Equidistance below this (but not novel) marks a leaning observer.
pub const LEANS_THRESHOLD: f64 = 0.2;

/// Cosine similarity between two embedding vectors, accumulated in f64.
///
/// Returns 0.0 when either vector has a negligible norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        dot += f64::from(x) * f64::from(y);
        norm_a += f64::from(x) * f64::from(x);
        norm_b += f64::from(y) * f64::from(y);
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-9 {
        return 0.0;
    }
    dot / denom
}

/// Which debate side a measurement favors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Agent,
    AntiAgent,
}

/// Pairwise similarities among the three final statements.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Similarities {
    /// Agent final vs Anti-Agent final
    pub agent_anti: f64,
    /// Agent final vs Observer synthesis
    pub agent_observer: f64,
    /// Anti-Agent final vs Observer synthesis
    pub anti_observer: f64,
}

impl Similarities {
    /// Score three embeddings given in agent, anti_agent, observer order.
    pub fn from_embeddings(embeddings: &[Vec<f32>]) -> Result<Self> {
        let [agent, anti, observer] = embeddings else {
            bail!(
                "similarity scoring needs exactly three embeddings, got {}",
                embeddings.len()
            );
        };
        Ok(Self {
            agent_anti: cosine_similarity(agent, anti),
            agent_observer: cosine_similarity(agent, observer),
            anti_observer: cosine_similarity(anti, observer),
        })
    }

    /// Side the Observer's synthesis sits closer to. `None` on an exact tie.
    pub fn observer_closer_to(&self) -> Option<Side> {
        if self.agent_observer < self.anti_observer {
            Some(Side::AntiAgent)
        } else if self.agent_observer > self.anti_observer {
            Some(Side::Agent)
        } else {
            None
        }
    }

    pub fn converged(&self) -> bool {
        self.agent_anti > CONVERGENCE_THRESHOLD
    }

    pub fn diverged(&self) -> bool {
        self.agent_anti < DIVERGENCE_THRESHOLD
    }

    /// Absolute gap between the two observer-pair similarities.
    pub fn equidistance(&self) -> f64 {
        (self.agent_observer - self.anti_observer).abs()
    }

    /// True when the Observer is close to equidistant from both sides.
    pub fn genuinely_novel(&self) -> bool {
        self.equidistance() < NOVEL_THRESHOLD
    }

    /// Winner column for the cross-seed table. An exact tie reads NOVEL.
    pub fn winner_label(&self) -> &'static str {
        match self.observer_closer_to() {
            Some(Side::Agent) => "AGENT",
            Some(Side::AntiAgent) => "SKEPTIC",
            None => "NOVEL",
        }
    }
}

/// Label for an equidistance value: NOVEL under 0.1, LEANS under 0.2,
/// otherwise SIDED.
pub fn equidistance_label(equidistance: f64) -> &'static str {
    if equidistance < NOVEL_THRESHOLD {
        "NOVEL"
    } else if equidistance < LEANS_THRESHOLD {
        "LEANS"
    } else {
        "SIDED"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sims(agent_anti: f64, agent_observer: f64, anti_observer: f64) -> Similarities {
        Similarities {
            agent_anti,
            agent_observer,
            anti_observer,
        }
    }

    #[test]
    fn test_cosine_of_vector_with_itself_is_one() {
        let v = vec![0.3f32, -1.2, 0.5, 2.0];
        let sim = cosine_similarity(&v, &v);
        assert!((sim - 1.0).abs() < 1e-6, "got {}", sim);
    }

    #[test]
    fn test_cosine_of_orthogonal_vectors_is_zero() {
        let a = vec![1.0f32, 0.0];
        let b = vec![0.0f32, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_guards_negligible_norms() {
        let a = vec![0.0f32, 0.0];
        let b = vec![1.0f32, 1.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_from_embeddings_requires_exactly_three() {
        let two = vec![vec![1.0f32], vec![1.0f32]];
        assert!(Similarities::from_embeddings(&two).is_err());
    }

    #[test]
    fn test_from_embeddings_orders_pairs() {
        // Unit basis vectors: agent == observer, anti orthogonal to both
        let embeddings = vec![
            vec![1.0f32, 0.0],
            vec![0.0f32, 1.0],
            vec![1.0f32, 0.0],
        ];
        let sims = Similarities::from_embeddings(&embeddings).unwrap();
        assert!(sims.agent_anti.abs() < 1e-9);
        assert!((sims.agent_observer - 1.0).abs() < 1e-9);
        assert!(sims.anti_observer.abs() < 1e-9);
        assert_eq!(sims.observer_closer_to(), Some(Side::Agent));
        assert_eq!(sims.winner_label(), "AGENT");
    }

    #[test]
    fn test_equidistance_is_absolute_difference() {
        let s = sims(0.5, 0.40, 0.81);
        assert!((s.equidistance() - 0.41).abs() < 1e-9);
        assert!(s.equidistance() >= 0.0);

        let flipped = sims(0.5, 0.81, 0.40);
        assert!((flipped.equidistance() - 0.41).abs() < 1e-9);
    }

    #[test]
    fn test_agent_sided_verdict() {
        let s = sims(0.5, 0.81, 0.40);
        assert_eq!(s.observer_closer_to(), Some(Side::Agent));
        assert_eq!(s.winner_label(), "AGENT");
        assert_eq!(equidistance_label(s.equidistance()), "SIDED");
    }

    #[test]
    fn test_near_tie_reads_novel() {
        let s = sims(0.5, 0.55, 0.50);
        assert!((s.equidistance() - 0.05).abs() < 1e-9);
        assert!(s.genuinely_novel());
        assert_eq!(equidistance_label(s.equidistance()), "NOVEL");
    }

    #[test]
    fn test_exact_tie_has_no_verdict() {
        let s = sims(0.5, 0.6, 0.6);
        assert_eq!(s.observer_closer_to(), None);
        assert_eq!(s.winner_label(), "NOVEL");
    }

    #[test]
    fn test_convergence_thresholds_are_strict() {
        assert!(sims(0.71, 0.0, 0.0).converged());
        assert!(!sims(0.7, 0.0, 0.0).converged());
        assert!(sims(0.29, 0.0, 0.0).diverged());
        assert!(!sims(0.3, 0.0, 0.0).diverged());
    }

    #[test]
    fn test_equidistance_label_bands() {
        assert_eq!(equidistance_label(0.05), "NOVEL");
        assert_eq!(equidistance_label(0.15), "LEANS");
        assert_eq!(equidistance_label(0.25), "SIDED");
    }
}
