//! The dialectic orchestrator: one seed's full debate.
//!
//! Per seed: an initial Agent interpretation, then up to R rounds of
//! challenge / defend / observe, then the Observer's synthesis and each
//! side's one-sentence final position. Every call is sequential; each turn
//! feeds the next.
//!
//! Failure policy:
//! - Initial interpretation fails: the seed yields an error outcome and no
//!   transcript.
//! - A challenge or defend call fails: the round loop stops, turns gathered
//!   so far are kept, synthesis still runs on the last successful positions.
//! - An observer, synthesis, or final-position call fails: that field is
//!   omitted and the run continues.

use std::future::Future;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::conversation::{ConversationHistory, DebateRole, Message, PromptTemplates};
use crate::results::{
    excerpt, section, DialecticResult, ObserverReport, RoundTag, SeedOutcome, Turn, TurnRole,
};
use crate::seeds::SeedCase;

/// Completion source for dialectic turns. The production implementation is
/// the Anthropic client; tests substitute scripted responses.
pub trait Completions {
    /// Complete the next turn for `messages` under `system_prompt`.
    fn complete(
        &self,
        messages: &[Message],
        system_prompt: &str,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// Run the full dialectic for one seed and package the outcome.
pub async fn run_dialectic<C: Completions>(
    client: &C,
    seed: SeedCase,
    rounds: u32,
) -> SeedOutcome {
    match drive_seed(client, seed, rounds).await {
        Ok(result) => SeedOutcome::Completed(Box::new(result)),
        Err(error) => {
            warn!(
                seed = seed.name,
                error = format!("{:#}", error),
                "seed run aborted"
            );
            SeedOutcome::Failed {
                error: error.to_string(),
            }
        }
    }
}

async fn drive_seed<C: Completions>(
    client: &C,
    seed: SeedCase,
    rounds: u32,
) -> Result<DialecticResult> {
    section(&format!("SEED: {}", seed.name));
    println!("  \"{}\"\n", excerpt(seed.text, 70));
    info!(seed = seed.name, rounds, "starting dialectic");

    let mut result = DialecticResult::new(seed.name, seed.text, rounds);
    let mut agent_history = ConversationHistory::new();
    let mut anti_history = ConversationHistory::new();

    agent_history.push_user(PromptTemplates::initial_interpretation(seed.text))?;
    let mut agent_position = client
        .complete(agent_history.messages(), DebateRole::Agent.system_prompt())
        .await
        .context("Agent failed on initial interpretation")?;
    agent_history.push_assistant(agent_position.clone())?;

    println!("  [AGENT  0] {}", excerpt(&agent_position, 80));
    result.transcript.push(Turn {
        round: RoundTag::Numbered(0),
        role: TurnRole::Agent,
        text: agent_position.clone(),
    });

    // Last successful Anti-Agent position, fed to the synthesis prompt.
    let mut anti_position: Option<String> = None;

    for round in 1..=rounds {
        println!("\n  --- Round {}/{} ---", round, rounds);

        anti_history.push_user(PromptTemplates::challenge(&agent_position, seed.text))?;
        let challenge = match client
            .complete(
                anti_history.messages(),
                DebateRole::AntiAgent.system_prompt(),
            )
            .await
        {
            Ok(text) => text,
            Err(error) => {
                warn!(
                    round,
                    error = format!("{:#}", error),
                    "challenge call failed, stopping round loop"
                );
                break;
            }
        };
        anti_history.push_assistant(challenge.clone())?;

        println!("  [ANTI   {}] {}", round, excerpt(&challenge, 80));
        result.transcript.push(Turn {
            round: RoundTag::Numbered(round),
            role: TurnRole::AntiAgent,
            text: challenge.clone(),
        });

        agent_history.push_user(PromptTemplates::defend(&challenge))?;
        let defense = match client
            .complete(agent_history.messages(), DebateRole::Agent.system_prompt())
            .await
        {
            Ok(text) => text,
            Err(error) => {
                warn!(
                    round,
                    error = format!("{:#}", error),
                    "defend call failed, stopping round loop"
                );
                anti_position = Some(challenge);
                break;
            }
        };
        agent_history.push_assistant(defense.clone())?;

        println!("  [AGENT  {}] {}", round, excerpt(&defense, 80));
        result.transcript.push(Turn {
            round: RoundTag::Numbered(round),
            role: TurnRole::Agent,
            text: defense.clone(),
        });
        agent_position = defense;

        // Observer sees only this round, never its own prior reports.
        let observation =
            PromptTemplates::observe(round, seed.text, &agent_position, &challenge);
        let observer_message = [Message::user(observation)];
        match client
            .complete(&observer_message, DebateRole::Observer.system_prompt())
            .await
        {
            Ok(text) => {
                result.observer_reports.push(ObserverReport {
                    round,
                    text: text.clone(),
                });
                println!("  [OBSERVE {}] {}", round, excerpt(&text, 80));
                result.transcript.push(Turn {
                    round: RoundTag::Numbered(round),
                    role: TurnRole::Observer,
                    text,
                });
            }
            Err(error) => {
                warn!(
                    round,
                    error = format!("{:#}", error),
                    "observer call failed, omitting this round's report"
                );
            }
        }

        anti_position = Some(challenge);
        debug!(round, "round complete");
    }

    section(&format!("FINAL SYNTHESIS: {}", seed.name));

    let synthesis_prompt = PromptTemplates::synthesis(
        rounds,
        seed.text,
        &agent_position,
        anti_position.as_deref().unwrap_or("(no position recorded)"),
    );
    let synthesis_message = [Message::user(synthesis_prompt)];
    match client
        .complete(&synthesis_message, DebateRole::Observer.system_prompt())
        .await
    {
        Ok(text) => {
            println!("\n  OBSERVER'S FINAL SYNTHESIS:");
            for line in text.lines() {
                println!("    {}", line);
            }
            result.transcript.push(Turn {
                round: RoundTag::Final,
                role: TurnRole::ObserverSynthesis,
                text: text.clone(),
            });
            result.final_synthesis = Some(text);
        }
        Err(error) => {
            warn!(
                error = format!("{:#}", error),
                "synthesis call failed, leaving synthesis absent"
            );
        }
    }

    result.agent_final =
        final_position(client, &mut agent_history, DebateRole::Agent).await;
    if let Some(agent_final) = &result.agent_final {
        println!("\n  AGENT FINAL: {}", agent_final);
    }

    result.anti_final =
        final_position(client, &mut anti_history, DebateRole::AntiAgent).await;
    if let Some(anti_final) = &result.anti_final {
        println!("  ANTI FINAL:  {}", anti_final);
    }

    result.finish();
    info!(
        seed = seed.name,
        transcript_turns = result.transcript.len(),
        observer_reports = result.observer_reports.len(),
        duration_ms = result.duration_ms,
        "dialectic complete"
    );
    Ok(result)
}

/// Ask one side for a one-sentence final position using its accumulated
/// history. Skipped when the history still holds an unanswered prompt from
/// an aborted round.
async fn final_position<C: Completions>(
    client: &C,
    history: &mut ConversationHistory,
    role: DebateRole,
) -> Option<String> {
    if history.awaiting_reply() {
        debug!(role = %role, "history has an unanswered prompt, skipping final position");
        return None;
    }

    history.push_user(PromptTemplates::final_position()).ok()?;
    match client.complete(history.messages(), role.system_prompt()).await {
        Ok(text) => Some(text),
        Err(error) => {
            warn!(
                role = %role,
                error = format!("{:#}", error),
                "final position call failed"
            );
            None
        }
    }
}
