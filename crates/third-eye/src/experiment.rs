//! The run driver: every seed through the dialectic, then scoring,
//! persistence and the cross-seed report.
//!
//! Seeds are processed strictly in order. After every seed the full results
//! map is rewritten to the partial snapshot so progress survives a crash;
//! the final document is written once at the end.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::anthropic_client::{AnthropicClient, CompletionConfig};
use crate::dialectic::run_dialectic;
use crate::embedder::{Embedder, EmbedderConfig};
use crate::results::{format_duration, section, DialecticResult, RunResults, SeedOutcome};
use crate::scoring::{Side, Similarities};
use crate::seeds::SEED_CASES;

/// Snapshot rewritten after every completed seed.
pub const PARTIAL_RESULTS_FILE: &str = "third_eye_partial.json";
/// Combined document written once after all seeds.
pub const FINAL_RESULTS_FILE: &str = "third_eye_results.json";

/// Settings for a full run.
#[derive(Debug, Clone)]
pub struct ThirdEyeConfig {
    /// Debate rounds per seed
    pub rounds: u32,
    /// Output directory for result snapshots
    pub data_dir: PathBuf,
    /// Completion endpoint settings
    pub completion: CompletionConfig,
    /// Local embedding model settings
    pub embedder: EmbedderConfig,
}

impl Default for ThirdEyeConfig {
    fn default() -> Self {
        Self {
            rounds: 10,
            data_dir: PathBuf::from("data"),
            completion: CompletionConfig::default(),
            embedder: EmbedderConfig::default(),
        }
    }
}

/// Drives the full experiment: dialectic per seed, similarity scoring,
/// snapshots, cross-seed report.
pub struct ThirdEye {
    config: ThirdEyeConfig,
    client: AnthropicClient,
    embedder: Embedder,
}

impl ThirdEye {
    /// Build the client, load the embedding model and create the output
    /// directory. Any failure here is fatal before the run starts.
    pub fn new(api_key: String, config: ThirdEyeConfig) -> Result<Self> {
        let client = AnthropicClient::new(api_key, config.completion.clone())?;
        let embedder = Embedder::load(&config.embedder)?;
        std::fs::create_dir_all(&config.data_dir).with_context(|| {
            format!("Failed to create data directory {}", config.data_dir.display())
        })?;

        Ok(Self {
            config,
            client,
            embedder,
        })
    }

    /// Run the dialectic for every seed in order.
    pub async fn run(&self) -> Result<RunResults> {
        let mut results = RunResults::new();

        for seed in SEED_CASES {
            let mut outcome = run_dialectic(&self.client, seed, self.config.rounds).await;
            if let SeedOutcome::Completed(result) = &mut outcome {
                self.score_finals(result);
                info!(
                    seed = seed.name,
                    duration = format_duration(result.duration_ms),
                    "seed recorded"
                );
            }
            results.insert(seed.name, outcome);

            let partial_path = self.config.data_dir.join(PARTIAL_RESULTS_FILE);
            results.save(&partial_path).with_context(|| {
                format!("Failed to write partial results to {}", partial_path.display())
            })?;
        }

        section("CROSS-SEED ANALYSIS");
        results.print_cross_seed_analysis();

        let final_path = self.config.data_dir.join(FINAL_RESULTS_FILE);
        results.save(&final_path).with_context(|| {
            format!("Failed to write final results to {}", final_path.display())
        })?;
        println!("\n  Results saved to: {}", final_path.display());

        Ok(results)
    }

    /// Score the three final texts when all are present. Never fatal: any
    /// failure leaves the similarity block absent.
    fn score_finals(&self, result: &mut DialecticResult) {
        let similarities = {
            let Some(finals) = result.finals_for_scoring() else {
                debug!(
                    seed = %result.seed_name,
                    "not all three finals present, skipping similarity scoring"
                );
                return;
            };
            let texts: Vec<String> = finals.iter().map(|text| text.to_string()).collect();

            let embeddings = match self.embedder.embed(&texts) {
                Ok(embeddings) => embeddings,
                Err(error) => {
                    warn!(
                        seed = %result.seed_name,
                        error = format!("{:#}", error),
                        "embedding failed, skipping similarity scoring"
                    );
                    return;
                }
            };
            match Similarities::from_embeddings(&embeddings) {
                Ok(similarities) => similarities,
                Err(error) => {
                    warn!(
                        seed = %result.seed_name,
                        error = format!("{:#}", error),
                        "similarity scoring failed"
                    );
                    return;
                }
            }
        };

        println!("\n  SIMILARITIES:");
        println!("    Agent <-> Anti-Agent:   {:.3}", similarities.agent_anti);
        println!("    Agent <-> Observer:     {:.3}", similarities.agent_observer);
        println!("    Anti-Agent <-> Observer: {:.3}", similarities.anti_observer);

        match similarities.observer_closer_to() {
            Some(Side::AntiAgent) => {
                println!("    Observer is CLOSER to the Anti-Agent (skeptic won)")
            }
            Some(Side::Agent) => println!("    Observer is CLOSER to the Agent (depth won)"),
            None => {}
        }
        if similarities.converged() {
            println!("    Agent and Anti-Agent CONVERGED (dialectic produced agreement)");
        } else if similarities.diverged() {
            println!("    Agent and Anti-Agent fully DIVERGED");
        }
        if similarities.genuinely_novel() {
            println!("    Observer is EQUIDISTANT (genuine third perspective)");
        }

        result.attach_similarities(similarities);
    }
}
