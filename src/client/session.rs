//! Per-user editing session: the current image, instruction and sliders, and
//! the submission state machine `idle -> submitting -> succeeded | failed`.
//!
//! At most one submission is in flight. A `submit` while one is running is
//! ignored and reported as [`SubmitOutcome::Ignored`], whether it comes from
//! a UI or from code.

use crate::{
    client::EditService,
    config::ClientConfig,
    encoder::{self, EncodedImage},
    error::{EditError, Result},
    models::{
        edit::{EditRequest, EditResult, EditedImage},
        media::MediaType,
    },
    prompt::{self, Adjustment, AdjustmentSet},
};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;

pub const DEFAULT_INSTRUCTION: &str = "A fluffy cat wearing sunglasses on a beach.";
const MISSING_INPUT: &str = "Please select an image and provide a prompt.";
const EMPTY_RESULT: &str = "The AI model did not return an image. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    Path(PathBuf),
    Memory { bytes: Vec<u8>, media_type: MediaType },
}

impl ImageSource {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        ImageSource::Path(path.into())
    }

    pub fn from_bytes(bytes: Vec<u8>, media_type: MediaType) -> Self {
        ImageSource::Memory { bytes, media_type }
    }

    pub async fn encode(&self) -> Result<EncodedImage> {
        let encoded = match self {
            ImageSource::Path(path) => encoder::read_image(path).await?,
            ImageSource::Memory { bytes, media_type } => {
                EncodedImage::from_bytes(bytes, *media_type)
            }
        };
        if encoded.data.is_empty() {
            return Err(EditError::EncodingError("The selected image is empty.".into()));
        }
        Ok(encoded)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Succeeded(EditedImage),
    /// Another submission was already in flight; nothing was sent.
    Ignored,
}

/// What the UI surfaces need to render.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub has_image: bool,
    pub instruction: String,
    pub adjustments: AdjustmentSet,
    pub status: SessionStatus,
    pub result: Option<EditResult>,
}

impl SessionSnapshot {
    pub fn is_loading(&self) -> bool {
        self.status == SessionStatus::Submitting
    }

    pub fn can_submit(&self) -> bool {
        !self.is_loading() && self.has_image && !self.instruction.trim().is_empty()
    }

    pub fn edited_image(&self) -> Option<&EditedImage> {
        self.result.as_ref().and_then(EditResult::image)
    }

    pub fn error(&self) -> Option<&str> {
        self.result.as_ref().and_then(EditResult::error)
    }
}

#[derive(Debug)]
struct SessionState {
    image: Option<ImageSource>,
    instruction: String,
    adjustments: AdjustmentSet,
    status: SessionStatus,
    result: Option<EditResult>,
}

pub struct EditSession<S: EditService> {
    service: S,
    state: Mutex<SessionState>,
    cancel: Notify,
    timeout: Duration,
}

impl<S: EditService> EditSession<S> {
    pub fn new(service: S, timeout: Duration) -> Self {
        Self {
            service,
            state: Mutex::new(SessionState {
                image: None,
                instruction: DEFAULT_INSTRUCTION.to_string(),
                adjustments: AdjustmentSet::default(),
                status: SessionStatus::Idle,
                result: None,
            }),
            cancel: Notify::new(),
            timeout,
        }
    }

    pub fn with_config(service: S, config: &ClientConfig) -> Self {
        Self::new(service, config.timeout())
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A new image clears the previous result.
    pub fn set_image(&self, image: ImageSource) {
        let mut state = self.state();
        state.image = Some(image);
        if state.status != SessionStatus::Submitting {
            state.status = SessionStatus::Idle;
            state.result = None;
        }
    }

    pub fn clear_image(&self) {
        self.state().image = None;
    }

    pub fn set_instruction(&self, instruction: impl Into<String>) {
        self.state().instruction = instruction.into();
    }

    pub fn set_adjustment(&self, adjustment: Adjustment, value: i32) {
        self.state().adjustments.set(adjustment, value);
    }

    pub fn set_adjustments(&self, adjustments: AdjustmentSet) {
        self.state().adjustments = adjustments;
    }

    pub fn status(&self) -> SessionStatus {
        self.state().status
    }

    pub fn result(&self) -> Option<EditResult> {
        self.state().result.clone()
    }

    /// The instruction that a submit would send right now.
    pub fn composed_instruction(&self) -> String {
        let state = self.state();
        prompt::compose(&state.instruction, &state.adjustments)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state();
        SessionSnapshot {
            has_image: state.image.is_some(),
            instruction: state.instruction.clone(),
            adjustments: state.adjustments,
            status: state.status,
            result: state.result.clone(),
        }
    }

    /// Aborts the wait for an in-flight submission. Returns whether one was running.
    pub fn cancel(&self) -> bool {
        let running = self.status() == SessionStatus::Submitting;
        if running {
            log::info!("Cancelling in-flight edit request");
            self.cancel.notify_waiters();
        }
        running
    }

    pub async fn submit(&self) -> Result<SubmitOutcome> {
        // Registered before the state flips so a cancel cannot slip in between
        let cancelled = self.cancel.notified();
        tokio::pin!(cancelled);

        let (image, instruction, adjustments) = {
            let mut state = self.state();
            if state.status == SessionStatus::Submitting {
                log::debug!("Submit ignored: a request is already in flight");
                return Ok(SubmitOutcome::Ignored);
            }

            let image = match &state.image {
                Some(image) if !state.instruction.trim().is_empty() => image.clone(),
                _ => {
                    // Stays idle, but the message remains visible until the next change
                    state.status = SessionStatus::Idle;
                    state.result = Some(EditResult::Error(MISSING_INPUT.into()));
                    return Err(EditError::ValidationError(MISSING_INPUT.into()));
                }
            };

            state.status = SessionStatus::Submitting;
            state.result = None;
            (image, state.instruction.clone(), state.adjustments)
        };

        let outcome = tokio::select! {
            outcome = self.run(image, &instruction, &adjustments) => outcome,
            _ = &mut cancelled => Err(EditError::Cancelled),
        };

        let mut state = self.state();
        match outcome {
            Ok(image) => {
                log::info!("✅ Edit succeeded ({} base64 chars)", image.data.len());
                state.status = SessionStatus::Succeeded;
                state.result = Some(EditResult::Image(image.clone()));
                Ok(SubmitOutcome::Succeeded(image))
            }
            Err(err) => {
                log::error!("❌ Edit failed: {}", err);
                state.status = SessionStatus::Failed;
                state.result = Some(EditResult::Error(err.user_message()));
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        image: ImageSource,
        instruction: &str,
        adjustments: &AdjustmentSet,
    ) -> Result<EditedImage> {
        let encoded = image.encode().await?;
        let media_type = encoded.media_type;
        let request = EditRequest::new(encoded, prompt::compose(instruction, adjustments));
        log::debug!("Composed instruction: {}", request.prompt);

        let reply = tokio::time::timeout(self.timeout, self.service.edit(&request))
            .await
            .map_err(|_| {
                EditError::TransportError(format!(
                    "no response within {}s",
                    self.timeout.as_secs_f32()
                ))
            })??;

        match reply {
            Some(data) => Ok(EditedImage::new(data, media_type)),
            None => Err(EditError::ModelEmptyResult(EMPTY_RESULT.into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const PNG: [u8; 10] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 1, 2];

    enum Reply {
        Image(&'static str),
        Empty,
        Reject(&'static str),
        Hang,
    }

    struct MockService {
        calls: Arc<AtomicUsize>,
        requests: Arc<Mutex<Vec<EditRequest>>>,
        gate: Option<Arc<Notify>>,
        reply: Reply,
    }

    impl MockService {
        fn new(reply: Reply) -> Self {
            Self {
                calls: Arc::new(AtomicUsize::new(0)),
                requests: Arc::new(Mutex::new(Vec::new())),
                gate: None,
                reply,
            }
        }

        fn gated(reply: Reply, gate: Arc<Notify>) -> Self {
            Self {
                gate: Some(gate),
                ..Self::new(reply)
            }
        }
    }

    #[async_trait]
    impl EditService for MockService {
        async fn edit(&self, request: &EditRequest) -> Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request.clone());
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            match self.reply {
                Reply::Image(data) => Ok(Some(data.to_string())),
                Reply::Empty => Ok(None),
                Reply::Reject(message) => Err(EditError::ProxyRejection {
                    status: 500,
                    message: message.to_string(),
                }),
                Reply::Hang => std::future::pending().await,
            }
        }
    }

    fn session(service: MockService) -> EditSession<MockService> {
        EditSession::new(service, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn submit_without_image_is_a_validation_error() {
        let service = MockService::new(Reply::Image("AAAA"));
        let calls = service.calls.clone();
        let session = session(service);

        let err = session.submit().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(session.status(), SessionStatus::Idle);
        assert_eq!(session.snapshot().error(), Some(MISSING_INPUT));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cleared_image_after_success_reports_missing_input() {
        let service = MockService::new(Reply::Image("AAAA"));
        let calls = service.calls.clone();
        let session = session(service);
        session.set_image(ImageSource::from_bytes(PNG.to_vec(), MediaType::Png));
        assert!(session.submit().await.is_ok());
        assert_eq!(session.status(), SessionStatus::Succeeded);

        session.clear_image();
        assert!(!session.snapshot().can_submit());

        let err = session.submit().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let snapshot = session.snapshot();
        assert_eq!(snapshot.status, SessionStatus::Idle);
        assert!(snapshot.edited_image().is_none());
        assert_eq!(snapshot.error(), Some(MISSING_INPUT));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn replaced_adjustments_are_composed_into_the_prompt() {
        let service = MockService::new(Reply::Image("AAAA"));
        let requests = service.requests.clone();
        let session = session(service);
        session.set_image(ImageSource::from_bytes(PNG.to_vec(), MediaType::Png));
        session.set_instruction("Add snow");
        session.set_adjustment(Adjustment::Brightness, 30);
        session.set_adjustments(AdjustmentSet::new(0, 15, 0).unwrap());

        session.submit().await.unwrap();
        assert_eq!(
            requests.lock().unwrap()[0].prompt,
            "Add snow. Additionally, please apply the following adjustments: increase contrast by 15%."
        );
    }

    #[tokio::test]
    async fn submit_with_empty_instruction_is_a_validation_error() {
        let service = MockService::new(Reply::Image("AAAA"));
        let calls = service.calls.clone();
        let session = session(service);
        session.set_image(ImageSource::from_bytes(PNG.to_vec(), MediaType::Png));
        session.set_instruction("");

        let err = session.submit().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!session.snapshot().can_submit());
    }

    #[tokio::test]
    async fn successful_submit_sends_composed_prompt() {
        let service = MockService::new(Reply::Image("ZWRpdGVk"));
        let requests = service.requests.clone();
        let session = session(service);
        session.set_image(ImageSource::from_bytes(PNG.to_vec(), MediaType::Png));
        session.set_instruction("Make this a futuristic cyberpunk scene");
        session.set_adjustment(Adjustment::Brightness, 20);
        session.set_adjustment(Adjustment::Saturation, -10);

        let outcome = session.submit().await.unwrap();
        let image = match outcome {
            SubmitOutcome::Succeeded(image) => image,
            other => panic!("unexpected outcome: {:?}", other),
        };
        assert_eq!(image.data_url(), "data:image/png;base64,ZWRpdGVk");

        let sent = requests.lock().unwrap()[0].clone();
        assert_eq!(sent.mime_type, "image/png");
        assert_eq!(sent.base64_image_data, encoder::encode(&PNG));
        assert_eq!(
            sent.prompt,
            "Make this a futuristic cyberpunk scene. Additionally, please apply the following adjustments: increase brightness by 20%, decrease saturation by 10%."
        );

        let snapshot = session.snapshot();
        assert_eq!(snapshot.status, SessionStatus::Succeeded);
        assert!(snapshot.edited_image().is_some());
        assert!(snapshot.error().is_none());
    }

    #[tokio::test]
    async fn empty_reply_fails_without_exposing_an_image() {
        let session = session(MockService::new(Reply::Empty));
        session.set_image(ImageSource::from_bytes(PNG.to_vec(), MediaType::Png));

        let err = session.submit().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelEmptyResult);
        let snapshot = session.snapshot();
        assert_eq!(snapshot.status, SessionStatus::Failed);
        assert!(snapshot.edited_image().is_none());
        assert_eq!(snapshot.error(), Some(EMPTY_RESULT));
    }

    #[tokio::test]
    async fn rejection_message_reaches_the_user() {
        let session = session(MockService::new(Reply::Reject("Missing required parameters.")));
        session.set_image(ImageSource::from_bytes(PNG.to_vec(), MediaType::Png));

        let err = session.submit().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProxyRejection);
        assert_eq!(session.snapshot().error(), Some("Missing required parameters."));
    }

    #[tokio::test]
    async fn unreadable_image_fails_before_any_call() {
        let service = MockService::new(Reply::Image("AAAA"));
        let calls = service.calls.clone();
        let session = session(service);
        let dir = tempfile::tempdir().unwrap();
        session.set_image(ImageSource::from_path(dir.path().join("gone.png")));

        let err = session.submit().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Encoding);
        assert_eq!(session.status(), SessionStatus::Failed);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn second_submit_while_in_flight_is_ignored() {
        let gate = Arc::new(Notify::new());
        let service = MockService::gated(Reply::Image("AAAA"), gate.clone());
        let calls = service.calls.clone();
        let session = session(service);
        session.set_image(ImageSource::from_bytes(PNG.to_vec(), MediaType::Png));

        let second = async {
            while session.status() != SessionStatus::Submitting {
                tokio::task::yield_now().await;
            }
            assert!(session.snapshot().is_loading());
            let outcome = session.submit().await;
            gate.notify_one();
            outcome
        };
        let (first, second) = tokio::join!(session.submit(), second);

        assert!(matches!(first.unwrap(), SubmitOutcome::Succeeded(_)));
        assert_eq!(second.unwrap(), SubmitOutcome::Ignored);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancel_aborts_in_flight_submission() {
        let session = session(MockService::new(Reply::Hang));
        session.set_image(ImageSource::from_bytes(PNG.to_vec(), MediaType::Png));
        assert!(!session.cancel());

        let canceller = async {
            while session.status() != SessionStatus::Submitting {
                tokio::task::yield_now().await;
            }
            assert!(session.cancel());
        };
        let (outcome, _) = tokio::join!(session.submit(), canceller);

        assert_eq!(outcome.unwrap_err().kind(), ErrorKind::Cancelled);
        assert_eq!(session.status(), SessionStatus::Failed);
    }

    #[tokio::test]
    async fn slow_proxy_times_out_as_transport_error() {
        let session = EditSession::new(MockService::new(Reply::Hang), Duration::from_millis(50));
        session.set_image(ImageSource::from_bytes(PNG.to_vec(), MediaType::Png));

        let err = session.submit().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[tokio::test]
    async fn new_image_resets_to_idle_and_allows_resubmission() {
        let session = session(MockService::new(Reply::Empty));
        session.set_image(ImageSource::from_bytes(PNG.to_vec(), MediaType::Png));
        assert!(session.submit().await.is_err());
        assert_eq!(session.status(), SessionStatus::Failed);

        session.set_image(ImageSource::from_bytes(PNG.to_vec(), MediaType::Png));
        assert_eq!(session.status(), SessionStatus::Idle);
        assert!(session.result().is_none());
    }
}
