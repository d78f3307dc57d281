//! One conversation: the transcript plus the flow that moves a submission
//! through the gateway and back.

use tracing::{info, warn};

use crate::core::chat_stream::StreamHandle;
use crate::core::gateway::{build_request, GatewayError, GenerationSettings, ModelGateway};
use crate::core::image::ImageDecodeError;
use crate::core::message::Turn;
use crate::core::transcript::Transcript;
use crate::ui::surface::{ChatSurface, STREAM_CURSOR};
use crate::utils::logging::TranscriptLog;

/// What happened to one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnReport {
    /// The stored reply; the partial prefix when the stream failed.
    pub reply: Option<String>,
    pub image_errors: Vec<ImageDecodeError>,
    pub error: Option<GatewayError>,
}

impl TurnReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

pub fn generation_error_message(err: &GatewayError) -> String {
    format!("An error occurred while generating response: {}", err.reason())
}

/// Owns the transcript. Taking `&mut self` in [`ChatSession::submit`] keeps
/// at most one request in flight per session.
pub struct ChatSession {
    transcript: Transcript,
    gateway: Box<dyn ModelGateway>,
    settings: GenerationSettings,
    log: Option<TranscriptLog>,
}

impl ChatSession {
    pub fn new(
        transcript: Transcript,
        gateway: Box<dyn ModelGateway>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            transcript,
            gateway,
            settings,
            log: None,
        }
    }

    pub fn with_log(mut self, log: Option<TranscriptLog>) -> Self {
        self.log = log;
        self
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Store the user's submission, stream the reply to `surface`, and store
    /// the reply.
    ///
    /// Errors never escape: bad images and gateway failures are shown on the
    /// surface and returned in the report. If the stream breaks after some
    /// text arrived, that text is kept as the assistant turn.
    pub async fn submit(
        &mut self,
        text: Option<&str>,
        images: &[Vec<u8>],
        surface: &mut dyn ChatSurface,
    ) -> TurnReport {
        let outcome = self.transcript.append_user_turn(text, images);
        for err in &outcome.image_errors {
            surface.display_error(&err.to_string());
        }
        surface.display_user_turn(&outcome.turn);
        self.log_turn(&outcome.turn);

        let request = build_request(&self.transcript);
        info!(
            turns = request.contents.len(),
            images = outcome.turn.images().count(),
            "requesting reply"
        );

        let mut handle = match self.gateway.generate(&request, &self.settings).await {
            Ok(handle) => handle,
            Err(err) => {
                warn!("generation request failed: {err}");
                surface.display_error(&generation_error_message(&err));
                return TurnReport {
                    reply: None,
                    image_errors: outcome.image_errors,
                    error: Some(err),
                };
            }
        };

        let (reply, error) = stream_reply(&mut handle, surface).await;
        let turn = self.transcript.append_assistant_turn(&reply).clone();
        surface.display_assistant_turn(&turn);
        self.log_turn(&turn);

        if let Some(err) = &error {
            warn!(kept = reply.len(), "reply stream failed: {err}");
            surface.display_error(&generation_error_message(err));
        }

        TurnReport {
            reply: Some(reply),
            image_errors: outcome.image_errors,
            error,
        }
    }

    fn log_turn(&self, turn: &Turn) {
        if let Some(log) = &self.log {
            if let Err(err) = log.log_turn(turn) {
                warn!(path = %log.path().display(), "failed to write transcript log: {err}");
            }
        }
    }
}

/// Drain `handle`, echoing the growing reply. Returns whatever text arrived
/// and the error that ended the stream, if any.
async fn stream_reply(
    handle: &mut StreamHandle,
    surface: &mut dyn ChatSurface,
) -> (String, Option<GatewayError>) {
    let mut reply = String::new();
    while let Some(next) = handle.next_fragment().await {
        match next {
            Ok(fragment) => {
                reply.push_str(&fragment);
                surface.display_assistant_stream(&format!("{reply}{STREAM_CURSOR}"));
            }
            Err(err) => return (reply, Some(err)),
        }
    }
    (reply, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::image::fixtures::png_bytes;
    use crate::core::message::{Part, Role};
    use crate::ui::surface::{RecordingSurface, SurfaceEvent};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    type Script = Result<Vec<Result<String, GatewayError>>, GatewayError>;

    /// Replays canned replies and remembers every request it saw.
    #[derive(Clone, Default)]
    struct ScriptedGateway {
        replies: Arc<Mutex<VecDeque<Script>>>,
        seen: Arc<Mutex<Vec<crate::core::gateway::ModelRequest>>>,
    }

    impl ScriptedGateway {
        fn push(&self, script: Script) -> &Self {
            self.replies.lock().expect("lock").push_back(script);
            self
        }

        fn fragments(&self, fragments: &[&str]) -> &Self {
            self.push(Ok(fragments.iter().map(|f| Ok(f.to_string())).collect()))
        }
    }

    #[async_trait]
    impl ModelGateway for ScriptedGateway {
        async fn generate(
            &self,
            request: &crate::core::gateway::ModelRequest,
            _settings: &GenerationSettings,
        ) -> Result<StreamHandle, GatewayError> {
            self.seen.lock().expect("lock").push(request.clone());
            let script = self
                .replies
                .lock()
                .expect("lock")
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()));
            script.map(StreamHandle::from_fragments)
        }
    }

    fn session(gateway: &ScriptedGateway) -> ChatSession {
        ChatSession::new(
            Transcript::initialize("Fix my code.").expect("seeded"),
            Box::new(gateway.clone()),
            GenerationSettings::new(0.7, 1024).expect("valid settings"),
        )
    }

    #[tokio::test]
    async fn reply_is_assembled_from_fragments() {
        let gateway = ScriptedGateway::default();
        gateway.fragments(&["It ", "fails because..."]);
        let mut session = session(&gateway);
        let mut surface = RecordingSurface::default();

        let report = session
            .submit(Some("Why does this loop fail?"), &[], &mut surface)
            .await;

        assert!(report.is_success());
        assert_eq!(report.reply.as_deref(), Some("It fails because..."));

        let visible = session.transcript().visible_turns();
        assert_eq!(visible.len(), 2);
        assert_eq!(visible[0].text(), "Why does this loop fail?");
        assert_eq!(visible[1].role, Role::Assistant);
        assert_eq!(visible[1].text(), "It fails because...");

        assert_eq!(
            surface.stream_updates(),
            vec!["It ▌", "It fails because...▌"]
        );
        assert!(matches!(
            surface.events.last(),
            Some(SurfaceEvent::Assistant(turn)) if turn.text() == "It fails because..."
        ));
    }

    #[tokio::test]
    async fn request_includes_seed_turns_and_new_input() {
        let gateway = ScriptedGateway::default();
        gateway.fragments(&["ok"]);
        let mut session = session(&gateway);
        let mut surface = RecordingSurface::default();

        session.submit(Some("hello"), &[], &mut surface).await;

        let seen = gateway.seen.lock().expect("lock");
        assert_eq!(seen.len(), 1);
        let roles: Vec<&str> = seen[0].contents.iter().map(|c| c.role.as_str()).collect();
        assert_eq!(roles, vec!["user", "model", "user"]);
    }

    #[tokio::test]
    async fn mid_stream_failure_keeps_prefix() {
        let gateway = ScriptedGateway::default();
        gateway.push(Ok(vec![
            Ok("Here".to_string()),
            Ok("'s a fix: ".to_string()),
            Err(GatewayError::Transport {
                reason: "connection reset".to_string(),
            }),
        ]));
        let mut session = session(&gateway);
        let mut surface = RecordingSurface::default();

        let report = session.submit(Some("fix it"), &[], &mut surface).await;

        assert_eq!(
            report.error,
            Some(GatewayError::Transport {
                reason: "connection reset".to_string()
            })
        );
        let last = session.transcript().last().expect("assistant turn");
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.text(), "Here's a fix: ");
        assert_eq!(
            surface.errors(),
            vec!["An error occurred while generating response: connection reset"]
        );
    }

    #[tokio::test]
    async fn transcript_stays_usable_after_failure() {
        let gateway = ScriptedGateway::default();
        gateway
            .push(Err(GatewayError::Request {
                reason: "API Error: API key not valid.".to_string(),
            }))
            .fragments(&["second try"]);
        let mut session = session(&gateway);
        let mut surface = RecordingSurface::default();

        let first = session.submit(Some("one"), &[], &mut surface).await;
        assert_eq!(first.reply, None);
        assert_eq!(session.transcript().visible_turns().len(), 1);

        let second = session.submit(Some("two"), &[], &mut surface).await;
        assert!(second.is_success());
        let visible = session.transcript().visible_turns();
        assert_eq!(visible.len(), 3);
        assert_eq!(visible[2].text(), "second try");
    }

    #[tokio::test]
    async fn empty_stream_stores_empty_reply() {
        let gateway = ScriptedGateway::default();
        gateway.fragments(&[]);
        let mut session = session(&gateway);
        let mut surface = RecordingSurface::default();

        let report = session.submit(Some("anything?"), &[], &mut surface).await;

        assert!(report.is_success());
        assert_eq!(report.reply.as_deref(), Some(""));
        assert_eq!(session.transcript().last().map(Turn::text).as_deref(), Some(""));
        assert!(surface.stream_updates().is_empty());
    }

    #[tokio::test]
    async fn bad_image_is_reported_and_text_still_sent() {
        let gateway = ScriptedGateway::default();
        gateway.fragments(&["Looks fine."]);
        let mut session = session(&gateway);
        let mut surface = RecordingSurface::default();

        let report = session
            .submit(
                Some("check this"),
                &[b"not an image".to_vec(), png_bytes()],
                &mut surface,
            )
            .await;

        assert_eq!(report.image_errors.len(), 1);
        assert_eq!(surface.errors().len(), 1);
        assert!(surface.errors()[0].starts_with("Image 1 skipped"));

        let user_turn = &session.transcript().visible_turns()[0];
        assert_eq!(user_turn.parts.len(), 2);
        assert!(matches!(user_turn.parts[1], Part::Image(_)));
        assert!(report.is_success());
    }

    #[tokio::test]
    async fn visible_turns_track_every_exchange() {
        let gateway = ScriptedGateway::default();
        gateway.fragments(&["a"]).fragments(&["b"]).fragments(&["c"]);
        let mut session = session(&gateway);
        let mut surface = RecordingSurface::default();

        for prompt in ["one", "two", "three"] {
            session.submit(Some(prompt), &[], &mut surface).await;
        }

        assert_eq!(session.transcript().visible_turns().len(), 6);
        assert_eq!(session.transcript().len(), 8);
    }

    #[tokio::test]
    async fn transcript_log_receives_visible_turns() {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp directory");
        let log_path = temp_dir.path().join("chat.log");
        let gateway = ScriptedGateway::default();
        gateway.fragments(&["Use ", "<=."]);
        let mut session =
            session(&gateway).with_log(Some(TranscriptLog::new(&log_path).expect("log opens")));
        let mut surface = RecordingSurface::default();

        session.submit(Some("bound?"), &[], &mut surface).await;

        let written = std::fs::read_to_string(&log_path).expect("read log");
        assert_eq!(written, "You: bound?\n\nUse <=.\n\n");
    }
}
