//! Mock backends for testing
//!
//! These mocks enable session testing without real I/O.

use crate::backend::{AskRequest, BackendError, BackendReply, QaService};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub const MOCK_ENDPOINT: &str = "http://mock.invalid/medical";

// ============================================================================
// Mock Backend
// ============================================================================

/// Mock backend that returns queued replies
pub struct MockQaService {
    replies: Mutex<VecDeque<Result<BackendReply, BackendError>>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<AskRequest>>,
}

impl MockQaService {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a well-formed reply
    pub fn queue_reply(&self, reply: BackendReply) {
        self.replies.lock().unwrap().push_back(Ok(reply));
    }

    /// Queue a transport failure
    pub fn queue_error(&self, error: BackendError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_requests(&self) -> Vec<AskRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_reply(&self, request: &AskRequest) -> Result<BackendReply, BackendError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::network("No mock reply queued")))
    }
}

impl Default for MockQaService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QaService for MockQaService {
    async fn ask(&self, request: &AskRequest) -> Result<BackendReply, BackendError> {
        self.next_reply(request)
    }

    fn endpoint(&self) -> &str {
        MOCK_ENDPOINT
    }
}

// ============================================================================
// Gated Mock Backend (for in-flight testing)
// ============================================================================

/// Mock backend that holds every request until released
pub struct GatedMockQaService {
    inner: MockQaService,
    /// Notified when a request reaches the backend
    pub request_started: Arc<Notify>,
    /// Each `notify_one` lets one held request complete
    pub release: Arc<Notify>,
}

impl GatedMockQaService {
    pub fn new() -> Self {
        Self {
            inner: MockQaService::new(),
            request_started: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        }
    }

    pub fn queue_reply(&self, reply: BackendReply) {
        self.inner.queue_reply(reply);
    }

    pub fn recorded_requests(&self) -> Vec<AskRequest> {
        self.inner.recorded_requests()
    }
}

#[async_trait]
impl QaService for GatedMockQaService {
    async fn ask(&self, request: &AskRequest) -> Result<BackendReply, BackendError> {
        self.request_started.notify_one();
        self.release.notified().await;
        self.inner.next_reply(request)
    }

    fn endpoint(&self) -> &str {
        MOCK_ENDPOINT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendErrorKind, HttpQaService, ReplyPayload, FALLBACK_REPLY};
    use crate::config::BackendConfig;
    use crate::conversation::{ConversationEvent, Role, GREETING};
    use crate::runtime::{ConversationSession, SubmitOutcome};
    use crate::state_machine::state::{unreachable_message, UNREACHABLE_BANNER};
    use serde_json::json;
    use std::io;
    use std::time::Duration;
    use tracing_subscriber::fmt::writer::MakeWriter;

    /// Captures formatted log output for assertions
    #[derive(Clone, Default)]
    struct LogBuffer {
        inner: Arc<Mutex<Vec<u8>>>,
    }

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.inner.lock().unwrap()).to_string()
        }
    }

    struct LogBufferWriter {
        inner: Arc<Mutex<Vec<u8>>>,
    }

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = LogBufferWriter;

        fn make_writer(&'a self) -> Self::Writer {
            LogBufferWriter {
                inner: Arc::clone(&self.inner),
            }
        }
    }

    impl io::Write for LogBufferWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.inner.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn session_with(mock: &Arc<MockQaService>) -> ConversationSession<Arc<MockQaService>> {
        ConversationSession::new(mock.clone())
    }

    fn texts(session: &ConversationSession<impl QaService>) -> Vec<(Role, String)> {
        session
            .view()
            .turns
            .iter()
            .map(|t| (t.role(), t.text().to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_new_session_has_greeting_only() {
        let session = session_with(&Arc::new(MockQaService::new()));
        let view = session.view();
        assert_eq!(view.turns.len(), 1);
        assert_eq!(view.turns[0].text(), GREETING);
        assert!(!view.pending);
        assert!(view.last_error.is_none());
    }

    #[tokio::test]
    async fn test_blank_submit_is_silent_noop() {
        let mock = Arc::new(MockQaService::new());
        let session = session_with(&mock);

        assert_eq!(session.submit("").await, SubmitOutcome::Ignored);
        assert_eq!(session.submit("   ").await, SubmitOutcome::Ignored);
        assert_eq!(session.submit("\n\t").await, SubmitOutcome::Ignored);

        assert_eq!(session.view().turns.len(), 1);
        assert!(!session.view().pending);
        assert!(mock.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_text_reply_round_trip() {
        let mock = Arc::new(MockQaService::new());
        mock.queue_reply(BackendReply::answered_text("Take two aspirin."));
        let session = session_with(&mock);

        let outcome = session.submit("  I have a headache  ").await;

        assert_eq!(outcome, SubmitOutcome::Succeeded);
        assert_eq!(
            texts(&session),
            vec![
                (Role::Assistant, GREETING.to_string()),
                (Role::User, "I have a headache".to_string()),
                (Role::Assistant, "Take two aspirin.".to_string()),
            ]
        );
        assert_eq!(
            mock.recorded_requests(),
            vec![AskRequest::new("I have a headache")]
        );
        assert!(!session.view().pending);
        assert!(session.view().last_error.is_none());
    }

    #[tokio::test]
    async fn test_structured_reply_is_rendered_as_text() {
        let mock = Arc::new(MockQaService::new());
        mock.queue_reply(BackendReply::Answered(ReplyPayload::Structured(
            json!({ "dose": "2 units" }),
        )));
        let session = session_with(&mock);

        session.submit("insulin dose?").await;

        let view = session.view();
        let text = view.turns[2].text();
        assert!(text.contains("\"dose\"") && text.contains("\"2 units\""));
    }

    #[tokio::test]
    async fn test_declined_reply_is_a_turn_not_an_error() {
        let mock = Arc::new(MockQaService::new());
        mock.queue_reply(BackendReply::declined(Some("no match")));
        mock.queue_reply(BackendReply::declined(None));
        let session = session_with(&mock);

        assert_eq!(session.submit("first").await, SubmitOutcome::Succeeded);
        assert_eq!(session.submit("second").await, SubmitOutcome::Succeeded);

        let view = session.view();
        assert_eq!(view.turns.len(), 5);
        assert_eq!(view.turns[2].text(), "no match");
        assert_eq!(view.turns[4].text(), FALLBACK_REPLY);
        assert!(view.last_error.is_none());
    }

    #[tokio::test]
    async fn test_transport_failure_apologizes_and_sets_error() {
        let mock = Arc::new(MockQaService::new());
        mock.queue_error(BackendError::http_status(500, "Backend returned status 500"));
        let session = session_with(&mock);

        let outcome = session.submit("anyone there?").await;

        assert_eq!(outcome, SubmitOutcome::Failed);
        let view = session.view();
        assert_eq!(view.turns.len(), 3);
        assert_eq!(view.turns[2].role(), Role::Assistant);
        assert_eq!(view.turns[2].text(), unreachable_message(MOCK_ENDPOINT));
        assert!(!view.pending);

        let error = view.last_error.expect("last error");
        assert_eq!(error.kind, BackendErrorKind::HttpStatus(500));
        assert_eq!(error.banner, UNREACHABLE_BANNER);
        assert!(!error.detail.is_empty());
    }

    #[tokio::test]
    async fn test_next_accepted_submit_clears_error() {
        let mock = Arc::new(MockQaService::new());
        mock.queue_error(BackendError::network("Connection failed"));
        mock.queue_reply(BackendReply::answered_text("Back online."));
        let session = session_with(&mock);

        session.submit("one").await;
        assert!(session.view().last_error.is_some());

        // A rejected submit leaves the error in place
        session.submit("  ").await;
        assert!(session.view().last_error.is_some());

        session.submit("two").await;
        assert!(session.view().last_error.is_none());
        assert_eq!(session.view().turns.len(), 5);
    }

    #[tokio::test]
    async fn test_submit_while_pending_is_ignored() {
        let mock = Arc::new(GatedMockQaService::new());
        mock.queue_reply(BackendReply::answered_text("done"));
        let session = Arc::new(ConversationSession::new(mock.clone()));

        let first = tokio::spawn({
            let session = session.clone();
            async move { session.submit("first").await }
        });
        mock.request_started.notified().await;

        assert!(session.view().pending);
        assert_eq!(session.submit("second").await, SubmitOutcome::Ignored);
        assert_eq!(session.view().turns.len(), 2);

        mock.release.notify_one();
        assert_eq!(first.await.unwrap(), SubmitOutcome::Succeeded);
        assert_eq!(mock.recorded_requests(), vec![AskRequest::new("first")]);
        assert_eq!(session.view().turns.len(), 3);
        assert!(!session.view().pending);
    }

    #[tokio::test]
    async fn test_reset_while_pending_discards_late_reply() {
        let mock = Arc::new(GatedMockQaService::new());
        mock.queue_reply(BackendReply::answered_text("late answer"));
        let session = Arc::new(ConversationSession::new(mock.clone()));

        let in_flight = tokio::spawn({
            let session = session.clone();
            async move { session.submit("question").await }
        });
        mock.request_started.notified().await;
        assert_eq!(session.view().turns.len(), 2);

        session.reset();
        let view = session.view();
        assert_eq!(view.turns.len(), 1);
        assert!(view.turns[0].is_greeting());
        assert!(!view.pending);

        mock.release.notify_one();
        assert_eq!(in_flight.await.unwrap(), SubmitOutcome::Discarded);

        let view = session.view();
        assert_eq!(view.turns.len(), 1);
        assert_eq!(view.turns[0].text(), GREETING);
        assert!(!view.pending);
        assert!(view.last_error.is_none());
    }

    #[tokio::test]
    async fn test_dropped_submit_still_completes_cycle() {
        let mock = Arc::new(GatedMockQaService::new());
        let session = Arc::new(ConversationSession::new(mock.clone()));

        let in_flight = tokio::spawn({
            let session = session.clone();
            async move { session.submit("question").await }
        });
        mock.request_started.notified().await;
        assert!(session.view().pending);

        in_flight.abort();
        assert!(in_flight.await.unwrap_err().is_cancelled());

        let view = session.view();
        assert!(!view.pending);
        assert_eq!(view.turns.len(), 3);
        assert_eq!(view.turns[2].text(), unreachable_message(MOCK_ENDPOINT));
        assert_eq!(
            view.last_error.map(|e| e.kind),
            Some(BackendErrorKind::Network)
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_dropped_submit_is_logged_as_abandoned_not_outage() {
        let logs = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .without_time()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(logs.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let mock = Arc::new(GatedMockQaService::new());
        let session = Arc::new(ConversationSession::new(mock.clone()));

        let in_flight = tokio::spawn({
            let session = session.clone();
            async move { session.submit("question").await }
        });
        mock.request_started.notified().await;
        in_flight.abort();
        assert!(in_flight.await.unwrap_err().is_cancelled());
        assert!(!session.view().pending);

        let output = logs.contents();
        assert!(output.contains("Submit abandoned"), "{output}");
        assert!(!output.contains("Backend unreachable"), "{output}");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_transport_failure_is_logged_as_unreachable() {
        let logs = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .without_time()
            .with_writer(logs.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let mock = Arc::new(MockQaService::new());
        mock.queue_error(BackendError::network("Connection failed"));
        let session = session_with(&mock);

        assert_eq!(session.submit("hello").await, SubmitOutcome::Failed);

        let output = logs.contents();
        assert!(output.contains("Backend unreachable"), "{output}");
        assert!(!output.contains("Submit abandoned"), "{output}");
    }

    #[tokio::test]
    async fn test_mutations_are_notified_in_order() {
        let mock = Arc::new(MockQaService::new());
        mock.queue_reply(BackendReply::answered_text("Rest.\nFluids."));
        let session = session_with(&mock);
        let mut rx = session.subscribe();

        session.submit("flu?").await;

        let mut seen = Vec::new();
        while let Ok(event) = rx.try_recv() {
            seen.push(match event {
                ConversationEvent::TurnAppended(turn) => format!("turn:{}:{}", turn.role(), turn.text()),
                ConversationEvent::PendingChanged(p) => format!("pending:{p}"),
                ConversationEvent::ErrorChanged(e) => format!("error:{}", e.is_some()),
                ConversationEvent::Reset(_) => "reset".to_string(),
            });
        }
        assert_eq!(
            seen,
            vec![
                "turn:user:flu?",
                "pending:true",
                "turn:assistant:Rest.\nFluids.",
                "pending:false",
            ]
        );
    }

    #[tokio::test]
    async fn test_reset_after_exchange_restores_greeting() {
        let mock = Arc::new(MockQaService::new());
        mock.queue_error(BackendError::timeout("Request timeout"));
        let session = session_with(&mock);

        session.submit("hello").await;
        assert_eq!(session.view().turns.len(), 3);

        session.reset();
        let view = session.view();
        assert_eq!(view.turns.len(), 1);
        assert!(view.turns[0].is_greeting());
        assert!(view.last_error.is_none());
    }

    #[tokio::test]
    async fn test_http_backend_failure_end_to_end() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let backend = HttpQaService::new(&BackendConfig {
            base_url: server.uri(),
            request_timeout: Some(Duration::from_secs(5)),
            connect_timeout: None,
        })
        .unwrap();
        let session = ConversationSession::new(backend);

        assert_eq!(session.submit("anyone?").await, SubmitOutcome::Failed);

        let view = session.view();
        assert_eq!(
            view.turns[2].text(),
            unreachable_message(&format!("{}/medical", server.uri()))
        );
        assert_eq!(
            view.last_error.map(|e| e.kind),
            Some(BackendErrorKind::HttpStatus(500))
        );
    }
}
