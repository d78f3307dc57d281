//! The in-memory conversation log.
//!
//! A transcript always starts with two seed turns: the system instruction
//! (sent as a user turn) and the greeting reply. They give the model its
//! behavioral context, are transmitted with every request, and are never
//! displayed. Everything after them is appended in order and never removed.

use crate::core::config::defaults::DEFAULT_GREETING;
use crate::core::config::ConfigError;
use crate::core::image::{decode_image, ImageDecodeError};
use crate::core::message::{Part, Role, Turn};

/// Number of hidden turns at the head of every transcript.
pub const SEED_TURNS: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    turns: Vec<Turn>,
}

/// What `append_user_turn` produced: the stored turn and any attachments
/// that had to be dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct UserTurnOutcome {
    pub turn: Turn,
    pub image_errors: Vec<ImageDecodeError>,
}

impl Transcript {
    pub fn initialize(system_instruction: &str) -> Result<Self, ConfigError> {
        Self::initialize_with_greeting(system_instruction, DEFAULT_GREETING)
    }

    pub fn initialize_with_greeting(
        system_instruction: &str,
        greeting: &str,
    ) -> Result<Self, ConfigError> {
        if system_instruction.trim().is_empty() {
            return Err(ConfigError::EmptySystemInstruction);
        }

        Ok(Self {
            turns: vec![
                Turn::user_text(system_instruction),
                Turn::assistant_text(greeting),
            ],
        })
    }

    /// Append a user turn built from optional text and raw image buffers.
    ///
    /// Images that are not valid PNG/JPEG data are skipped and reported; they
    /// never prevent the rest of the turn from being stored. A submission with
    /// no text and no usable image still appends a turn with no parts.
    pub fn append_user_turn(&mut self, text: Option<&str>, images: &[Vec<u8>]) -> UserTurnOutcome {
        let mut parts = Vec::with_capacity(images.len() + 1);
        let mut image_errors = Vec::new();

        if let Some(text) = text.filter(|text| !text.is_empty()) {
            parts.push(Part::text(text));
        }

        for (index, bytes) in images.iter().enumerate() {
            match decode_image(index, bytes) {
                Ok(image) => parts.push(Part::Image(image)),
                Err(err) => {
                    tracing::warn!(index, reason = %err.reason, "dropping attachment");
                    image_errors.push(err);
                }
            }
        }

        let turn = Turn::new(Role::User, parts);
        self.turns.push(turn.clone());

        UserTurnOutcome { turn, image_errors }
    }

    pub fn append_assistant_turn(&mut self, text: &str) -> &Turn {
        self.turns.push(Turn::assistant_text(text));
        &self.turns[self.turns.len() - 1]
    }

    /// Turns shown to the user: everything except the two seed turns.
    pub fn visible_turns(&self) -> &[Turn] {
        &self.turns[SEED_TURNS..]
    }

    /// Every turn, seeds included, in order.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Always false: the seed turns are never removed.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
