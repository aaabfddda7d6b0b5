//! Multi-turn conversation state over one indexed document
//!
//! A session owns an ordered, append-only transcript and mediates between
//! the retriever and the grounding engine. One question is fully retrieved,
//! grounded, and appended before the next is accepted, so every turn sees
//! all prior turns.

use std::sync::Arc;
use uuid::Uuid;

use crate::error::Result;
use crate::generation::GroundingEngine;
use crate::retrieval::Retriever;
use crate::types::{GroundedAnswer, Turn};

/// One conversation against an indexed document
pub struct Session {
    id: Uuid,
    turns: Vec<Turn>,
    retriever: Arc<Retriever>,
    engine: Arc<GroundingEngine>,
}

impl Session {
    /// Open a new, empty session
    pub fn new(retriever: Arc<Retriever>, engine: Arc<GroundingEngine>) -> Self {
        Self {
            id: Uuid::new_v4(),
            turns: Vec::new(),
            retriever,
            engine,
        }
    }

    /// Session id
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Ask a question and return the resulting assistant turn.
    ///
    /// Appends exactly one user turn and, on completion, exactly one
    /// assistant turn. If generation is unavailable the user turn remains
    /// on the transcript (turns are never deleted) and the error
    /// propagates with no assistant turn recorded.
    pub async fn ask(&mut self, query_text: &str) -> Result<Turn> {
        let (turn, _) = self.ask_with_trace(query_text).await?;
        Ok(turn)
    }

    /// Like [`ask`](Self::ask), also returning the full answer payload with
    /// the ranked retrieval trace for this question
    pub async fn ask_with_trace(
        &mut self,
        query_text: &str,
    ) -> Result<(Turn, GroundedAnswer)> {
        // History snapshot for the prompt: everything said before this
        // question
        let prior = self.turns.clone();

        self.turns.push(Turn::user(query_text));

        let evidence = self
            .retriever
            .retrieve(query_text, self.retriever.default_top_k())
            .await?;
        let grounded = self.engine.answer(query_text, &evidence, &prior).await?;

        let turn = Turn::assistant(grounded.answer.clone(), grounded.citations.clone());
        self.turns.push(turn.clone());

        tracing::info!(
            session = %self.id,
            turns = self.turns.len(),
            refused = grounded.is_refusal(),
            "turn recorded"
        );
        Ok((turn, grounded))
    }

    /// Append an externally produced turn
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// The full transcript, oldest turn first
    pub fn history(&self) -> &[Turn] {
        &self.turns
    }
}
