//! Per-connection session controller.
//!
//! The controller owns the conversation state of one WebSocket client and makes
//! sure that at most one generation call is in flight for it. Audio turns that
//! arrive while a call is running are queued and drained by the session's worker
//! task in arrival order; text turns arriving at that time are dropped.
//!
//! Interrupts and teardown bump the session `epoch` and abort the worker, so a
//! call that resolves afterwards can never reach the client.

use super::protocol::{AudioPayload, ClientMessage, ServerMessage, now_millis};
use revolt_core::{
    GenerationError,
    llm_client::{GenerationModel, ModelProvider, generate_with_deadline},
    prompt::{InputSource, compose_prompt, voice_input_or_fallback},
};
use std::{collections::VecDeque, sync::Arc, time::Duration};
use tokio::{
    sync::{Mutex, OnceCell, mpsc},
    task::JoinHandle,
};
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

/// One unit of user input accepted by the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionInput {
    /// An `audio_data` turn. The only kind that is queued while busy.
    Audio(AudioPayload),
    /// A `voice_text_input` turn.
    VoiceText(String),
    /// A `text_input` turn.
    Text(String),
}

impl SessionInput {
    pub fn source(&self) -> InputSource {
        match self {
            SessionInput::Audio(_) | SessionInput::VoiceText(_) => InputSource::Voice,
            SessionInput::Text(_) => InputSource::Typed,
        }
    }

    /// Name of the input modality used in client-facing error messages.
    pub fn modality(&self) -> &'static str {
        match self.source() {
            InputSource::Voice => "voice",
            InputSource::Typed => "text",
        }
    }

    pub fn prompt(&self) -> String {
        match self {
            SessionInput::Audio(audio) => compose_prompt(
                InputSource::Voice,
                voice_input_or_fallback(audio.text.as_deref()),
            ),
            SessionInput::VoiceText(text) | SessionInput::Text(text) => {
                compose_prompt(self.source(), text)
            }
        }
    }

    fn failure_message(&self, err: &GenerationError) -> String {
        if err.is_timeout() {
            format!("Timed out processing {} input", self.modality())
        } else {
            format!("Failed to process {} input", self.modality())
        }
    }
}

/// What `submit` did with an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A worker was started for it.
    Started,
    /// Appended to the pending queue behind the in-flight call.
    Queued,
    /// A text turn arrived while busy and was discarded.
    Dropped,
    /// The session has been torn down.
    Closed,
}

#[derive(Default)]
struct ControllerState {
    processing: bool,
    pending: VecDeque<AudioPayload>,
    /// Bumped by interrupt and cleanup. Workers started under an older epoch are stale.
    epoch: u64,
    closed: bool,
    model: Option<Arc<dyn GenerationModel>>,
    worker: Option<JoinHandle<()>>,
}

/// Coordinates one client connection with the generation backend.
pub struct SessionController {
    id: Uuid,
    provider: Arc<dyn ModelProvider>,
    generation_timeout: Duration,
    outbound: mpsc::UnboundedSender<ServerMessage>,
    model_ready: OnceCell<bool>,
    state: Mutex<ControllerState>,
}

impl SessionController {
    /// Creates a controller with a fresh session id.
    ///
    /// Messages for the client are pushed into `outbound`; the connection's
    /// writer task forwards them to the socket.
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        generation_timeout: Duration,
        outbound: mpsc::UnboundedSender<ServerMessage>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            provider,
            generation_timeout,
            outbound,
            model_ready: OnceCell::new(),
            state: Mutex::new(ControllerState::default()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Creates the session's model handle. Runs at most once per session;
    /// concurrent callers wait for the same attempt and see its outcome.
    ///
    /// Failure leaves the session usable in a degraded state: every later
    /// generation call fails with [`GenerationError::ModelUnavailable`].
    pub async fn initialize_model(&self) -> bool {
        *self
            .model_ready
            .get_or_init(|| async {
                match self.provider.create_model().await {
                    Ok(model) => {
                        let mut state = self.state.lock().await;
                        if state.closed {
                            return false;
                        }
                        state.model = Some(model);
                        info!("Model initialized");
                        true
                    }
                    Err(e) => {
                        error!(error = %e, "Model initialization failed");
                        false
                    }
                }
            })
            .await
    }

    /// Tells the client the session is ready, with the outcome of model initialization.
    pub fn announce_ready(&self, model_ready: bool) {
        self.emit(ServerMessage::SessionReady {
            session_id: self.id,
            model_ready,
            timestamp: now_millis(),
        });
    }

    /// Decodes one inbound frame and acts on it. Malformed frames are answered
    /// with an `error` message; the connection stays open.
    pub async fn handle_frame(self: &Arc<Self>, raw: &str) {
        match serde_json::from_str::<ClientMessage>(raw) {
            Ok(msg) => self.handle_message(msg).await,
            Err(e) => self.reject_frame(&e),
        }
    }

    /// Answers a frame that could not be decoded.
    pub fn reject_frame(&self, reason: &dyn std::error::Error) {
        warn!(error = %reason, "Error processing message");
        self.emit(ServerMessage::Error {
            message: "Invalid message format".to_string(),
            session_id: self.id,
        });
    }

    pub async fn handle_message(self: &Arc<Self>, msg: ClientMessage) {
        match msg {
            ClientMessage::AudioData { audio } => {
                self.submit(SessionInput::Audio(audio)).await;
            }
            ClientMessage::VoiceTextInput { text } => {
                debug!(%text, "Processing voice-to-text");
                self.submit(SessionInput::VoiceText(text)).await;
            }
            ClientMessage::TextInput { text } => {
                self.submit(SessionInput::Text(text)).await;
            }
            ClientMessage::Interrupt => self.interrupt().await,
            ClientMessage::Ping => self.emit(ServerMessage::Pong {
                timestamp: now_millis(),
            }),
            ClientMessage::Unknown => {
                info!("Unknown message type");
            }
        }
    }

    /// Accepts one input under single-flight rules.
    pub async fn submit(self: &Arc<Self>, input: SessionInput) -> SubmitOutcome {
        let mut state = self.state.lock().await;
        if state.closed {
            debug!("Ignoring input for closed session");
            return SubmitOutcome::Closed;
        }

        if state.processing {
            return match input {
                SessionInput::Audio(audio) => {
                    state.pending.push_back(audio);
                    info!(
                        queued = state.pending.len(),
                        "Already processing, queuing audio"
                    );
                    SubmitOutcome::Queued
                }
                other => {
                    info!(
                        modality = other.modality(),
                        "Already processing, dropping input"
                    );
                    SubmitOutcome::Dropped
                }
            };
        }

        state.processing = true;
        let epoch = state.epoch;
        let model = state.model.clone();
        let span = info_span!("generation", epoch);
        let worker = tokio::spawn(self.clone().run_worker(input, epoch, model).instrument(span));
        state.worker = Some(worker);
        SubmitOutcome::Started
    }

    /// Runs generation calls back to back until the pending queue is empty.
    async fn run_worker(
        self: Arc<Self>,
        first: SessionInput,
        epoch: u64,
        model: Option<Arc<dyn GenerationModel>>,
    ) {
        let mut next = Some(first);
        while let Some(input) = next.take() {
            let outcome = match &model {
                Some(model) => {
                    generate_with_deadline(model.as_ref(), &input.prompt(), self.generation_timeout)
                        .await
                }
                None => Err(GenerationError::ModelUnavailable),
            };

            let mut state = self.state.lock().await;
            if state.epoch != epoch {
                debug!("Discarding result of an interrupted generation call");
                return;
            }

            match outcome {
                Ok(text) => {
                    info!(
                        modality = input.modality(),
                        preview = %text.chars().take(100).collect::<String>(),
                        "Response generated"
                    );
                    self.emit(ServerMessage::AiResponse {
                        text,
                        session_id: self.id,
                        is_voice_response: input.source().is_voice(),
                        timestamp: now_millis(),
                    });
                }
                Err(e) => {
                    error!(modality = input.modality(), error = %e, "Generation call failed");
                    self.emit(ServerMessage::Error {
                        message: input.failure_message(&e),
                        session_id: self.id,
                    });
                }
            }

            next = state.pending.pop_front().map(SessionInput::Audio);
            if next.is_none() {
                state.processing = false;
            }
        }
    }

    /// Drops queued work, releases the processing flag and confirms to the client.
    /// A call already in flight is abandoned and its result discarded.
    pub async fn interrupt(&self) {
        let mut state = self.state.lock().await;
        info!(
            was_processing = state.processing,
            dropped = state.pending.len(),
            "Interruption triggered"
        );
        state.processing = false;
        state.pending.clear();
        state.epoch += 1;
        if let Some(worker) = state.worker.take() {
            worker.abort();
        }
        self.emit(ServerMessage::Interrupted {
            session_id: self.id,
            timestamp: now_millis(),
        });
    }

    /// Releases the model handle and all queued work. Safe to call repeatedly.
    pub async fn cleanup(&self) {
        let mut state = self.state.lock().await;
        if state.closed {
            return;
        }
        state.closed = true;
        state.processing = false;
        state.pending.clear();
        state.epoch += 1;
        state.model = None;
        if let Some(worker) = state.worker.take() {
            worker.abort();
        }
        info!("Cleaned up");
    }

    pub async fn is_processing(&self) -> bool {
        self.state.lock().await.processing
    }

    pub async fn pending_len(&self) -> usize {
        self.state.lock().await.pending.len()
    }

    pub async fn is_closed(&self) -> bool {
        self.state.lock().await.closed
    }

    fn emit(&self, msg: ServerMessage) {
        if self.outbound.send(msg).is_err() {
            debug!("Client channel closed, dropping message");
        }
    }
}
