use crate::core::message::Turn;

/// Appended to the partial reply while it is still streaming. Display only:
/// it never reaches the transcript.
pub const STREAM_CURSOR: &str = "▌";

/// Where the conversation is shown.
pub trait ChatSurface {
    fn display_user_turn(&mut self, turn: &Turn);

    /// Called after every fragment with the reply so far, cursor included.
    fn display_assistant_stream(&mut self, partial: &str);

    /// Called once the reply is stored, whether it completed or not.
    fn display_assistant_turn(&mut self, turn: &Turn);

    fn display_error(&mut self, message: &str);
}

/// Surface event, as recorded by [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    User(Turn),
    Stream(String),
    Assistant(Turn),
    Error(String),
}

/// Keeps everything it is asked to show. Useful for tests and for driving a
/// session without a terminal.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub events: Vec<SurfaceEvent>,
}

impl RecordingSurface {
    pub fn errors(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                SurfaceEvent::Error(message) => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn stream_updates(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                SurfaceEvent::Stream(partial) => Some(partial.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl ChatSurface for RecordingSurface {
    fn display_user_turn(&mut self, turn: &Turn) {
        self.events.push(SurfaceEvent::User(turn.clone()));
    }

    fn display_assistant_stream(&mut self, partial: &str) {
        self.events.push(SurfaceEvent::Stream(partial.to_string()));
    }

    fn display_assistant_turn(&mut self, turn: &Turn) {
        self.events.push(SurfaceEvent::Assistant(turn.clone()));
    }

    fn display_error(&mut self, message: &str) {
        self.events.push(SurfaceEvent::Error(message.to_string()));
    }
}
