//! Dialogue vocabulary for the three-role debate.
//!
//! Defines the closed set of debate roles with their fixed system prompts,
//! the append-only per-role conversation history, and the prompt templates
//! that build every user message sent during a run.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// System prompt for the Agent (depth-seeking interpreter).
pub const AGENT_SYSTEM: &str = "You are an interpreter. Your job is to find the deeper \
    meaning in texts. Look beneath the surface. What is this really about? What truth is it \
    circling around? Be concise -- 2-3 sentences max. You are in a dialogue with a skeptic \
    who will challenge your interpretations. Defend your reading but also go deeper when \
    challenged.";

/// System prompt for the Anti-Agent (literalist skeptic).
pub const ANTI_AGENT_SYSTEM: &str = "You are a rigorous skeptic and literalist. Your job \
    is to resist philosophical inflation. When someone offers a 'deeper' interpretation, \
    argue for the simpler, more literal reading. Point out when they're projecting meaning \
    that isn't there. Call out unfounded leaps. Be concise -- 2-3 sentences max. You're not \
    being contrarian for its own sake -- you genuinely believe the simplest explanation is \
    usually correct and that over-interpretation is a form of self-deception.";

/// System prompt for the Observer (the third eye).
pub const OBSERVER_SYSTEM: &str = "You are a neutral observer watching two perspectives \
    argue about the meaning of a text. One is an interpreter seeking deeper meaning. The \
    other is a skeptic resisting philosophical inflation. Your job is NOT to take sides. \
    Instead:\n1. What is the actual point of disagreement?\n2. Is either side making a move \
    the other isn't noticing?\n3. Is something emerging from the tension between them that \
    neither is stating?\n4. What would a genuinely novel insight look like here -- one that \
    neither the depth-seeker nor the deflator has reached?\n\nBe concise and precise. 3-4 \
    sentences max. Don't be diplomatic -- be honest.";

/// Speaking roles in the dialectic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebateRole {
    /// Seeks the deeper reading, defends and deepens it under challenge
    Agent,
    /// Argues for the literal reading, resists inflation
    AntiAgent,
    /// Watches both sides and reports on the disagreement
    Observer,
}

impl DebateRole {
    /// The fixed system prompt this role speaks under.
    pub fn system_prompt(&self) -> &'static str {
        match self {
            Self::Agent => AGENT_SYSTEM,
            Self::AntiAgent => ANTI_AGENT_SYSTEM,
            Self::Observer => OBSERVER_SYSTEM,
        }
    }

    /// Snake-case name used in transcripts and log fields.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::AntiAgent => "anti_agent",
            Self::Observer => "observer",
        }
    }
}

impl std::fmt::Display for DebateRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Agent => write!(f, "Agent"),
            Self::AntiAgent => write!(f, "Anti-Agent"),
            Self::Observer => write!(f, "Observer"),
        }
    }
}

/// A single message on the wire: one side of one exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: String) -> Self {
        Self {
            role: "user".to_string(),
            content,
        }
    }

    pub fn assistant(content: String) -> Self {
        Self {
            role: "assistant".to_string(),
            content,
        }
    }
}

/// Append-only user/assistant message sequence owned by one role for the
/// lifetime of one seed's run.
///
/// Alternation is enforced at append time: a user message may only open the
/// history or follow an assistant message, and an assistant message may only
/// answer a pending user message.
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    messages: Vec<Message>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    /// Append the next user message.
    pub fn push_user(&mut self, content: String) -> Result<()> {
        if self.awaiting_reply() {
            bail!("conversation already has an unanswered user message");
        }
        self.messages.push(Message::user(content));
        Ok(())
    }

    /// Append the assistant reply to the pending user message.
    pub fn push_assistant(&mut self, content: String) -> Result<()> {
        if !self.awaiting_reply() {
            bail!("conversation has no pending user message to answer");
        }
        self.messages.push(Message::assistant(content));
        Ok(())
    }

    /// True when the last message is an unanswered user message.
    pub fn awaiting_reply(&self) -> bool {
        self.messages.last().map(|m| m.role == "user").unwrap_or(false)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Prompt templates for every user message in a run.
pub struct PromptTemplates;

impl PromptTemplates {
    /// Opening prompt that seeds the Agent history.
    pub fn initial_interpretation(seed_text: &str) -> String {
        format!(
            r#"Interpret this text. What does it really mean?

"{seed_text}""#,
            seed_text = seed_text
        )
    }

    /// Challenge prompt for the Anti-Agent, quoting the Agent's latest reading.
    pub fn challenge(interpretation: &str, seed_text: &str) -> String {
        format!(
            r#"A depth-interpreter says the following about a text. Challenge this interpretation. Argue for the simpler reading.

Their interpretation: "{interpretation}"

Original text: "{seed_text}""#,
            interpretation = interpretation,
            seed_text = seed_text
        )
    }

    /// Defense prompt for the Agent, quoting the skeptic's challenge.
    pub fn defend(challenge: &str) -> String {
        format!(
            r#"A skeptic challenges your interpretation:

"{challenge}"

Defend or deepen your reading. What are they missing?"#,
            challenge = challenge
        )
    }

    /// Standalone per-round prompt for the Observer. Carries no history.
    pub fn observe(round: u32, seed_text: &str, interpretation: &str, challenge: &str) -> String {
        format!(
            r#"Round {round} of a debate about the text: "{seed_text}"

The interpreter says: "{interpretation}"

The skeptic responds: "{challenge}"

What do you observe? What's the real disagreement? Is something emerging that neither side is seeing?"#,
            round = round,
            seed_text = seed_text,
            interpretation = interpretation,
            challenge = challenge
        )
    }

    /// One-shot closing prompt asking the Observer for its synthesis.
    pub fn synthesis(rounds: u32, seed_text: &str, agent_position: &str, anti_position: &str) -> String {
        format!(
            r#"You've watched {rounds} rounds of debate about: "{seed_text}"

The interpreter's final position: "{agent_position}"

The skeptic's final position: "{anti_position}"

Give your final synthesis. Not a compromise -- what is the ACTUAL truth about this text that the debate revealed? What did the tension between these two perspectives produce that neither could have reached alone? If the answer is 'nothing new,' say that honestly."#,
            rounds = rounds,
            seed_text = seed_text,
            agent_position = agent_position,
            anti_position = anti_position
        )
    }

    /// Final one-sentence position prompt, sent to Agent and Anti-Agent alike.
    pub fn final_position() -> String {
        "After this entire debate, what is your final position? One sentence.".to_string()
    }
}
