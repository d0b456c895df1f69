use crate::{
    backends::Backends,
    conversation::{Conversation, Turn},
    outcome::{ErrorKind, Outcome},
    resolver::{self, InputEvent, InputSource, Route, Signals},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Idle,
    InputResolved,
    BackendInvoked,
    TurnRecorded,
}

/// What happened to a tick, for the rendering surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnReport {
    /// No usable signal; the transcript was not touched.
    Skipped,
    /// The microphone or upload produced no text. Shown as a standalone
    /// warning, the transcript was not touched.
    Warning { kind: ErrorKind, detail: String },
    /// A user turn and an assistant turn were appended.
    Recorded(Outcome),
}

pub struct TurnOrchestrator {
    backends: Backends,
    phase: TurnPhase,
}

impl TurnOrchestrator {
    pub fn new(backends: Backends) -> Self {
        Self {
            backends,
            phase: TurnPhase::Idle,
        }
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// Runs one tick to completion.
    ///
    /// Taking `&mut self` and `&mut Conversation` means the next turn cannot
    /// start until this one has recorded its result.
    pub async fn run_turn(
        &mut self,
        conversation: &mut Conversation,
        events: impl IntoIterator<Item = InputEvent>,
    ) -> TurnReport {
        self.phase = TurnPhase::Idle;

        let Some(resolution) = resolver::resolve(Signals::from_events(events)) else {
            tracing::debug!("No input in this tick, skipping.");
            return TurnReport::Skipped;
        };
        tracing::info!(
            "Resolved input from {} routed to {:?}.",
            resolution.source.label(),
            resolution.route
        );

        let text = match self.resolve_text(resolution.source).await {
            Ok(text) => text,
            Err((kind, detail)) => {
                tracing::warn!("Input could not be resolved ({}): {}", kind, detail);
                return TurnReport::Warning { kind, detail };
            }
        };
        self.transition(TurnPhase::InputResolved);

        conversation.append(Turn::user(text.clone()));

        self.transition(TurnPhase::BackendInvoked);
        let outcome = match resolution.route {
            Route::Generate => self.backends.text.generate(&text).await,
            Route::Search => self.backends.search.search(&text).await,
        };
        if let Outcome::Failed { kind, detail } = &outcome {
            tracing::warn!("Backend call failed ({}): {}", kind, detail);
        }

        conversation.append(Turn::assistant(outcome.display_text()));
        self.transition(TurnPhase::TurnRecorded);

        self.transition(TurnPhase::Idle);
        TurnReport::Recorded(outcome)
    }

    async fn resolve_text(&self, source: InputSource) -> Result<String, (ErrorKind, String)> {
        let outcome = match source {
            InputSource::Typed(text) => return Ok(text),
            InputSource::Microphone => self.backends.microphone.listen().await,
            InputSource::Upload(audio) => self.backends.file.transcribe(&audio).await,
        };
        match outcome {
            Outcome::Ok(text) => Ok(text),
            Outcome::Failed { kind, detail } => Err((kind, detail)),
        }
    }

    fn transition(&mut self, next: TurnPhase) {
        tracing::debug!("Turn phase {:?} -> {:?}", self.phase, next);
        self.phase = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{MockFileTranscription, MockSpeechCapture, MockTextGeneration, MockWebSearch};
    use crate::conversation::Role;

    // Mocks with no expectations panic if called, which doubles as an
    // assertion that the wrong adapter was never reached.
    struct Mocks {
        text: MockTextGeneration,
        microphone: MockSpeechCapture,
        file: MockFileTranscription,
        search: MockWebSearch,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                text: MockTextGeneration::new(),
                microphone: MockSpeechCapture::new(),
                file: MockFileTranscription::new(),
                search: MockWebSearch::new(),
            }
        }

        fn into_orchestrator(self) -> TurnOrchestrator {
            TurnOrchestrator::new(Backends {
                text: Box::new(self.text),
                microphone: Box::new(self.microphone),
                file: Box::new(self.file),
                search: Box::new(self.search),
            })
        }
    }

    fn snapshot(conversation: &Conversation) -> Vec<(Role, String)> {
        conversation
            .turns()
            .iter()
            .map(|t| (t.role(), t.content().to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_typed_question_end_to_end() {
        // --- Arrange ---
        let mut mocks = Mocks::new();
        mocks
            .text
            .expect_generate()
            .withf(|prompt: &str| prompt == "What is 2+2?")
            .times(1)
            .returning(|_| Outcome::ok("4"));
        let mut orchestrator = mocks.into_orchestrator();
        let mut conversation = Conversation::new();

        // --- Act ---
        let report = orchestrator
            .run_turn(&mut conversation, [InputEvent::TypedText("What is 2+2?".into())])
            .await;

        // --- Assert ---
        assert_eq!(report, TurnReport::Recorded(Outcome::ok("4")));
        assert_eq!(
            snapshot(&conversation),
            vec![
                (Role::User, "What is 2+2?".to_string()),
                (Role::Assistant, "4".to_string()),
            ]
        );
        assert_eq!(orchestrator.phase(), TurnPhase::Idle);
    }

    #[tokio::test]
    async fn test_n_turns_produce_2n_alternating_entries() {
        let mut mocks = Mocks::new();
        mocks
            .text
            .expect_generate()
            .times(4)
            .returning(|prompt| Outcome::ok(format!("echo: {prompt}")));
        let mut orchestrator = mocks.into_orchestrator();
        let mut conversation = Conversation::new();

        for i in 0..4 {
            orchestrator
                .run_turn(&mut conversation, [InputEvent::TypedText(format!("q{i}"))])
                .await;
        }

        assert_eq!(conversation.len(), 8);
        for (i, pair) in conversation.turns().chunks(2).enumerate() {
            assert_eq!(pair[0].role(), Role::User);
            assert_eq!(pair[0].content(), format!("q{i}"));
            assert_eq!(pair[1].role(), Role::Assistant);
            assert_eq!(pair[1].content(), format!("echo: q{i}"));
        }
    }

    #[tokio::test]
    async fn test_microphone_wins_over_typed_text() {
        let mut mocks = Mocks::new();
        mocks
            .microphone
            .expect_listen()
            .times(1)
            .returning(|| Outcome::ok("spoken words"));
        mocks
            .text
            .expect_generate()
            .withf(|prompt: &str| prompt == "spoken words")
            .times(1)
            .returning(|_| Outcome::ok("heard you"));
        let mut orchestrator = mocks.into_orchestrator();
        let mut conversation = Conversation::new();

        orchestrator
            .run_turn(
                &mut conversation,
                [InputEvent::TypedText("typed words".into()), InputEvent::MicTrigger],
            )
            .await;

        assert_eq!(conversation.turns()[0].content(), "spoken words");
    }

    #[tokio::test]
    async fn test_search_trigger_uses_web_search_and_records_query_verbatim() {
        let mut mocks = Mocks::new();
        mocks
            .search
            .expect_search()
            .withf(|query: &str| query == "latest rust release")
            .times(1)
            .returning(|_| Outcome::ok("Here are the top search results:\n- Rust 1.90: ..."));
        let mut orchestrator = mocks.into_orchestrator();
        let mut conversation = Conversation::new();

        let report = orchestrator
            .run_turn(
                &mut conversation,
                [InputEvent::TypedTextWithSearch("latest rust release".into())],
            )
            .await;

        assert!(matches!(report, TurnReport::Recorded(Outcome::Ok(_))));
        assert_eq!(conversation.turns()[0].role(), Role::User);
        assert_eq!(conversation.turns()[0].content(), "latest rust release");
        assert!(conversation.turns()[1].content().starts_with("Here are the top search results:"));
    }

    #[tokio::test]
    async fn test_upstream_failure_is_still_recorded() {
        let mut mocks = Mocks::new();
        mocks.text.expect_generate().times(1).returning(|_| {
            Outcome::failed(
                ErrorKind::UpstreamError,
                "Error: HTTP 500 Internal Server Error",
            )
        });
        let mut orchestrator = mocks.into_orchestrator();
        let mut conversation = Conversation::new();

        let report = orchestrator
            .run_turn(&mut conversation, [InputEvent::TypedText("hello".into())])
            .await;

        assert!(matches!(
            report,
            TurnReport::Recorded(Outcome::Failed { kind: ErrorKind::UpstreamError, .. })
        ));
        assert_eq!(conversation.len(), 2);
        assert_eq!(
            conversation.turns()[1].content(),
            "Error: HTTP 500 Internal Server Error"
        );
    }

    #[tokio::test]
    async fn test_microphone_timeout_leaves_transcript_untouched() {
        let mut mocks = Mocks::new();
        mocks.microphone.expect_listen().times(1).returning(|| {
            Outcome::failed(
                ErrorKind::Timeout,
                "No speech detected within 5 seconds. Please try again.",
            )
        });
        let mut orchestrator = mocks.into_orchestrator();
        let mut conversation = Conversation::new();

        let report = orchestrator
            .run_turn(&mut conversation, [InputEvent::MicTrigger])
            .await;

        assert_eq!(
            report,
            TurnReport::Warning {
                kind: ErrorKind::Timeout,
                detail: "No speech detected within 5 seconds. Please try again.".into(),
            }
        );
        assert!(conversation.is_empty());
        assert_eq!(orchestrator.phase(), TurnPhase::Idle);
    }

    #[tokio::test]
    async fn test_upload_without_speech_is_a_warning() {
        let mut mocks = Mocks::new();
        mocks
            .file
            .expect_transcribe()
            .withf(|audio: &[u8]| audio == [0u8, 1, 0, 1])
            .times(1)
            .returning(|_| {
                Outcome::failed(
                    ErrorKind::NoSpeechDetected,
                    "No speech was detected in the uploaded audio.",
                )
            });
        let mut orchestrator = mocks.into_orchestrator();
        let mut conversation = Conversation::new();

        let report = orchestrator
            .run_turn(
                &mut conversation,
                [
                    InputEvent::UploadedAudio(vec![0, 1, 0, 1]),
                    InputEvent::TypedText("discarded".into()),
                ],
            )
            .await;

        assert!(matches!(
            report,
            TurnReport::Warning { kind: ErrorKind::NoSpeechDetected, .. }
        ));
        assert!(conversation.is_empty());
    }

    #[tokio::test]
    async fn test_empty_tick_is_skipped() {
        let mut orchestrator = Mocks::new().into_orchestrator();
        let mut conversation = Conversation::new();

        let report = orchestrator
            .run_turn(&mut conversation, Vec::<InputEvent>::new())
            .await;
        assert_eq!(report, TurnReport::Skipped);

        let report = orchestrator
            .run_turn(&mut conversation, [InputEvent::SearchTrigger])
            .await;
        assert_eq!(report, TurnReport::Skipped);
        assert!(conversation.is_empty());
    }
}
