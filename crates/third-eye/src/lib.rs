//! The Third Eye: a three-role dialectic over fixed seed texts.
//!
//! Three fixed roles debate what a short text means:
//! - The Agent argues for the deeper reading and defends it under challenge
//! - The Anti-Agent argues for the surface reading
//! - The Observer watches each round and synthesizes what the tension produced
//!
//! Final positions are compared by cosine similarity of local sentence
//! embeddings to measure whether the Observer sided with either voice or
//! reached something genuinely novel.

pub mod anthropic_client;
pub mod conversation;
pub mod dialectic;
pub mod embedder;
pub mod experiment;
pub mod results;
pub mod retry;
pub mod scoring;
pub mod seeds;
