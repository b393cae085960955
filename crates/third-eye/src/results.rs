//! Result records and persistence for dialectic runs.
//!
//! Captures, per seed:
//! - The full turn-by-turn transcript
//! - Observer round reports and the final synthesis
//! - Both sides' one-sentence final positions
//! - Similarity verdicts, when all three final texts exist

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::scoring::{equidistance_label, Similarities};

/// Speaker tag on a transcript turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    Agent,
    AntiAgent,
    Observer,
    ObserverSynthesis,
}

/// Round marker on a transcript turn.
///
/// Serializes as a bare number for debate rounds (the initial interpretation
/// is round 0) and as the string `"final"` for the synthesis turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundTag {
    Numbered(u32),
    Final,
}

impl Serialize for RoundTag {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Numbered(round) => serializer.serialize_u32(*round),
            Self::Final => serializer.serialize_str("final"),
        }
    }
}

impl<'de> Deserialize<'de> for RoundTag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u32),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(round) => Ok(Self::Numbered(round)),
            Raw::Text(tag) if tag == "final" => Ok(Self::Final),
            Raw::Text(tag) => Err(de::Error::custom(format!("unknown round tag: {}", tag))),
        }
    }
}

/// One utterance in the debate transcript. Immutable once recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Debate round, or `"final"` for the synthesis turn
    pub round: RoundTag,
    /// Which voice produced the text
    pub role: TurnRole,
    /// Full response text
    pub text: String,
}

/// Observer commentary for one debate round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObserverReport {
    /// Round the report covers (1-based)
    pub round: u32,
    /// Full report text
    pub text: String,
}

/// Everything recorded about one seed's dialectic run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialecticResult {
    /// The seed text under debate
    pub seed: String,
    /// Short name of the seed case
    pub seed_name: String,
    /// Configured round count for the run
    pub rounds: u32,
    /// Start time
    pub started_at: DateTime<Utc>,
    /// End time
    pub ended_at: DateTime<Utc>,
    /// Wall-clock duration of the seed run
    pub duration_ms: u64,
    /// Ordered transcript of every produced turn
    pub transcript: Vec<Turn>,
    /// Observer per-round reports (omitting rounds whose call failed)
    pub observer_reports: Vec<ObserverReport>,
    /// Observer's final synthesis, if the call succeeded
    pub final_synthesis: Option<String>,
    /// Agent's one-sentence final position, if the call succeeded
    pub agent_final: Option<String>,
    /// Anti-Agent's one-sentence final position, if the call succeeded
    pub anti_final: Option<String>,
    /// Pairwise similarities among the three finals (only when all exist)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarities: Option<Similarities>,
    /// |agent_observer - anti_observer|, recorded alongside similarities
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observer_equidistance: Option<f64>,
}

impl DialecticResult {
    /// Create an empty result for a seed, stamping the start time.
    pub fn new(seed_name: &str, seed_text: &str, rounds: u32) -> Self {
        let now = Utc::now();
        Self {
            seed: seed_text.to_string(),
            seed_name: seed_name.to_string(),
            rounds,
            started_at: now,
            ended_at: now,
            duration_ms: 0,
            transcript: Vec::new(),
            observer_reports: Vec::new(),
            final_synthesis: None,
            agent_final: None,
            anti_final: None,
            similarities: None,
            observer_equidistance: None,
        }
    }

    /// Stamp the end time and duration.
    pub fn finish(&mut self) {
        self.ended_at = Utc::now();
        self.duration_ms = (self.ended_at - self.started_at).num_milliseconds().max(0) as u64;
    }

    /// Record the similarity matrix and its derived equidistance.
    pub fn attach_similarities(&mut self, similarities: Similarities) {
        self.observer_equidistance = Some(similarities.equidistance());
        self.similarities = Some(similarities);
    }

    /// The three final texts in agent, anti_agent, observer order, or `None`
    /// when any of them is missing or empty.
    pub fn finals_for_scoring(&self) -> Option<[&str; 3]> {
        let agent = self.agent_final.as_deref().filter(|t| !t.is_empty())?;
        let anti = self.anti_final.as_deref().filter(|t| !t.is_empty())?;
        let synthesis = self.final_synthesis.as_deref().filter(|t| !t.is_empty())?;
        Some([agent, anti, synthesis])
    }
}

/// Outcome recorded for a seed: a full result, or an error marker when the
/// opening interpretation never succeeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SeedOutcome {
    Completed(Box<DialecticResult>),
    Failed { error: String },
}

impl SeedOutcome {
    pub fn as_completed(&self) -> Option<&DialecticResult> {
        match self {
            Self::Completed(result) => Some(result),
            Self::Failed { .. } => None,
        }
    }
}

/// All seed outcomes for one run, keyed by seed name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunResults {
    seeds: BTreeMap<String, SeedOutcome>,
}

impl RunResults {
    /// Create an empty results map.
    pub fn new() -> Self {
        Self {
            seeds: BTreeMap::new(),
        }
    }

    /// Record the outcome for a seed, replacing any earlier entry.
    pub fn insert(&mut self, seed_name: &str, outcome: SeedOutcome) {
        self.seeds.insert(seed_name.to_string(), outcome);
    }

    pub fn get(&self, seed_name: &str) -> Option<&SeedOutcome> {
        self.seeds.get(seed_name)
    }

    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SeedOutcome)> {
        self.seeds.iter()
    }

    /// Save results to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load results from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let results = serde_json::from_str(&json)?;
        Ok(results)
    }

    /// Print the cross-seed comparison table and equidistance listing.
    /// Seeds without similarity data are skipped in both.
    pub fn print_cross_seed_analysis(&self) {
        println!(
            "\n  {:<15} {:<14} {:<14} {:<14} {}",
            "Seed", "Agent<->Anti", "Agent<->Obs", "Anti<->Obs", "Who won?"
        );
        println!("  {}", "-".repeat(60));
        for (name, outcome) in &self.seeds {
            let Some(result) = outcome.as_completed() else {
                continue;
            };
            let Some(sims) = result.similarities else {
                continue;
            };
            println!(
                "  {:<15} {:<14.3} {:<14.3} {:<14.3} {}",
                name,
                sims.agent_anti,
                sims.agent_observer,
                sims.anti_observer,
                sims.winner_label()
            );
        }

        println!("\n  Observer equidistance (low = genuinely novel perspective):");
        for (name, outcome) in &self.seeds {
            let Some(result) = outcome.as_completed() else {
                continue;
            };
            let Some(equidistance) = result.observer_equidistance else {
                continue;
            };
            println!(
                "    {:<15} {:.3}  ({})",
                name,
                equidistance,
                equidistance_label(equidistance)
            );
        }
    }
}

impl Default for RunResults {
    fn default() -> Self {
        Self::new()
    }
}

/// Print a section banner.
pub fn section(title: &str) {
    println!("\n{}", "=".repeat(74));
    println!("  {}", title);
    println!("{}", "=".repeat(74));
}

/// Collapse newlines to spaces and truncate to `max_chars`, marking the cut
/// with a `...` suffix.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let flattened = text.replace('\n', " ");
    if flattened.chars().count() <= max_chars {
        flattened
    } else {
        let truncated: String = flattened.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

/// Format a duration in milliseconds for display.
pub fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        format!("{:.1}m", ms as f64 / 60_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result() -> DialecticResult {
        let mut result = DialecticResult::new("noise", "Purple telephone sandwich.", 2);
        result.transcript.push(Turn {
            round: RoundTag::Numbered(0),
            role: TurnRole::Agent,
            text: "An initial reading.".to_string(),
        });
        result.transcript.push(Turn {
            round: RoundTag::Final,
            role: TurnRole::ObserverSynthesis,
            text: "A synthesis.".to_string(),
        });
        result.final_synthesis = Some("A synthesis.".to_string());
        result
    }

    #[test]
    fn test_round_tag_serializes_numbers_and_final() {
        let numbered = serde_json::to_value(RoundTag::Numbered(3)).unwrap();
        assert_eq!(numbered, serde_json::json!(3));

        let initial = serde_json::to_value(RoundTag::Numbered(0)).unwrap();
        assert_eq!(initial, serde_json::json!(0));

        let synthesis = serde_json::to_value(RoundTag::Final).unwrap();
        assert_eq!(synthesis, serde_json::json!("final"));
    }

    #[test]
    fn test_round_tag_round_trips_and_rejects_unknown() {
        let tag: RoundTag = serde_json::from_value(serde_json::json!(7)).unwrap();
        assert_eq!(tag, RoundTag::Numbered(7));

        let tag: RoundTag = serde_json::from_value(serde_json::json!("final")).unwrap();
        assert_eq!(tag, RoundTag::Final);

        let err = serde_json::from_value::<RoundTag>(serde_json::json!("opening")).unwrap_err();
        assert!(err.to_string().contains("unknown round tag"));
    }

    #[test]
    fn test_turn_role_uses_snake_case() {
        assert_eq!(
            serde_json::to_value(TurnRole::AntiAgent).unwrap(),
            serde_json::json!("anti_agent")
        );
        assert_eq!(
            serde_json::to_value(TurnRole::ObserverSynthesis).unwrap(),
            serde_json::json!("observer_synthesis")
        );
    }

    #[test]
    fn test_missing_finals_serialize_as_null_but_similarities_are_omitted() {
        let result = DialecticResult::new("recipe", "Combine two cups of flour.", 10);
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(value.get("agent_final"), Some(&serde_json::Value::Null));
        assert_eq!(value.get("anti_final"), Some(&serde_json::Value::Null));
        assert_eq!(value.get("final_synthesis"), Some(&serde_json::Value::Null));
        assert!(value.get("similarities").is_none());
        assert!(value.get("observer_equidistance").is_none());
    }

    #[test]
    fn test_attach_similarities_records_equidistance() {
        let mut result = sample_result();
        result.attach_similarities(Similarities {
            agent_anti: 0.5,
            agent_observer: 0.81,
            anti_observer: 0.40,
        });

        let eq = result.observer_equidistance.unwrap();
        assert!((eq - 0.41).abs() < 1e-9);

        let value = serde_json::to_value(&result).unwrap();
        assert!(value.get("similarities").is_some());
        assert!(value.get("observer_equidistance").is_some());
    }

    #[test]
    fn test_finals_for_scoring_requires_all_three_nonempty() {
        let mut result = DialecticResult::new("math", "More reals than integers.", 10);
        assert!(result.finals_for_scoring().is_none());

        result.agent_final = Some("Deep reading.".to_string());
        result.anti_final = Some("Plain reading.".to_string());
        assert!(result.finals_for_scoring().is_none());

        result.final_synthesis = Some(String::new());
        assert!(result.finals_for_scoring().is_none());

        result.final_synthesis = Some("Both miss the point.".to_string());
        let [agent, anti, synthesis] = result.finals_for_scoring().unwrap();
        assert_eq!(agent, "Deep reading.");
        assert_eq!(anti, "Plain reading.");
        assert_eq!(synthesis, "Both miss the point.");
    }

    #[test]
    fn test_seed_outcome_untagged_shapes() {
        let failed = SeedOutcome::Failed {
            error: "Agent failed on initial interpretation".to_string(),
        };
        let value = serde_json::to_value(&failed).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"error": "Agent failed on initial interpretation"})
        );
        assert!(failed.as_completed().is_none());

        let parsed: SeedOutcome = serde_json::from_value(value).unwrap();
        assert!(matches!(parsed, SeedOutcome::Failed { .. }));

        let completed = SeedOutcome::Completed(Box::new(sample_result()));
        let value = serde_json::to_value(&completed).unwrap();
        let parsed: SeedOutcome = serde_json::from_value(value).unwrap();
        let result = parsed.as_completed().unwrap();
        assert_eq!(result.seed_name, "noise");
        assert_eq!(result.transcript.len(), 2);
        assert_eq!(result.transcript[1].round, RoundTag::Final);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let mut results = RunResults::new();
        results.insert("noise", SeedOutcome::Completed(Box::new(sample_result())));
        results.insert(
            "math",
            SeedOutcome::Failed {
                error: "Agent failed on initial interpretation".to_string(),
            },
        );

        let path = std::env::temp_dir().join(format!("third_eye_test_{}.json", std::process::id()));
        results.save(&path).unwrap();
        let loaded = RunResults::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded.len(), 2);
        let noise = loaded.get("noise").unwrap().as_completed().unwrap();
        assert_eq!(noise.transcript[1].role, TurnRole::ObserverSynthesis);
        assert!(loaded.get("math").unwrap().as_completed().is_none());
    }

    #[test]
    fn test_excerpt_flattens_and_truncates() {
        assert_eq!(excerpt("line one\nline two", 80), "line one line two");
        assert_eq!(excerpt("", 10), "");

        let long = "x".repeat(100);
        let cut = excerpt(&long, 80);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), 83);
    }
}
