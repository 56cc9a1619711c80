//! Session orchestrator.
//!
//! Owns the conversation log and the capability session state, turns user
//! intents into dispatches, and folds every result back into the log as at
//! most one model turn. One submission is in flight at a time; the session
//! lock is never held across a service call.

use std::sync::Arc;

use parking_lot::Mutex;
use providers::{GenerativeService, ServiceResult, TextAction};
use shared::capability::{ActivationMode, CapabilityId};
use shared::conversation::{Timestamp, Turn};
use shared::events::SessionEvent;
use shared::session::{
    CurrentAction, DocumentAttachment, FileAttachment, ImageAttachment, ModelOption,
    SessionSnapshot, SessionState,
};
use shared::settings::AppSettings;
use shared::store::MessageStore;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::capabilities::CapabilityRegistry;
use crate::handlers::{
    DispatchContext, DispatchProgress, DispatchRequest, DispatchTable, HandlerReply, SessionEffect,
};
use crate::outcome::{
    ActivationError, AttachError, AttachOutcome, ModelError, RejectReason, SubmitOutcome,
};
use crate::prompts;
use crate::request::ComposedRequest;
use crate::suggestions;

/// Mutable per-session data, always accessed under the orchestrator's lock
struct Session {
    id: Uuid,
    /// Bumped on reset so late results can be recognised and dropped
    epoch: u64,
    store: MessageStore,
    state: SessionState,
    is_loading: bool,
    current_action: CurrentAction,
    cancel: CancellationToken,
    /// Events produced under the lock, sent once it is released
    pending_events: Vec<SessionEvent>,
}

impl Session {
    fn new(default_model: ModelOption, epoch: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            epoch,
            store: MessageStore::new(),
            state: SessionState::new(default_model),
            is_loading: false,
            current_action: CurrentAction::Chat,
            cancel: CancellationToken::new(),
            pending_events: Vec::new(),
        }
    }

    fn append(&mut self, turn: Turn) -> Timestamp {
        let created_at = self.store.append(turn);
        self.pending_events
            .push(SessionEvent::TurnAppended { created_at });
        created_at
    }

    fn retract(&mut self, stamp: Timestamp) {
        if self.store.retract_transient(stamp) {
            self.pending_events
                .push(SessionEvent::TurnRetracted { created_at: stamp });
        }
    }

    fn set_loading(&mut self, is_loading: bool) {
        self.is_loading = is_loading;
        if !is_loading {
            self.current_action = CurrentAction::Chat;
        }
        self.pending_events
            .push(SessionEvent::LoadingChanged { is_loading });
    }

    fn set_capability(&mut self, active: Option<CapabilityId>) {
        if self.state.active_capability != active {
            self.state.active_capability = active;
            self.pending_events
                .push(SessionEvent::CapabilityChanged { active });
        }
    }

    fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.pending_events)
    }
}

/// Progress sink for one dispatch. Working turns it inserts are retracted
/// in the same lock section that appends the result.
struct DispatchScope<'a> {
    orchestrator: &'a Orchestrator,
    epoch: u64,
    working: Mutex<Vec<Timestamp>>,
}

impl<'a> DispatchScope<'a> {
    fn new(orchestrator: &'a Orchestrator, epoch: u64) -> Self {
        Self {
            orchestrator,
            epoch,
            working: Mutex::new(Vec::new()),
        }
    }
}

impl DispatchProgress for DispatchScope<'_> {
    fn working(&self, text: &str) {
        let events = {
            let mut session = self.orchestrator.session.lock();
            if session.epoch != self.epoch {
                return;
            }
            let stamp = session.append(Turn::transient(text));
            self.working.lock().push(stamp);
            session.take_events()
        };
        self.orchestrator.emit(events);
    }

    fn action(&self, action: CurrentAction) {
        let mut session = self.orchestrator.session.lock();
        if session.epoch == self.epoch {
            session.current_action = action;
        }
    }
}

pub struct Orchestrator {
    service: Arc<dyn GenerativeService>,
    registry: CapabilityRegistry,
    dispatch: DispatchTable,
    models: Vec<ModelOption>,
    default_model: ModelOption,
    session: Mutex<Session>,
    event_sender: Option<mpsc::UnboundedSender<SessionEvent>>,
}

impl Orchestrator {
    pub fn new(service: Arc<dyn GenerativeService>, settings: &AppSettings) -> Self {
        let default_model = settings.default_model();
        let models = if settings.models.is_empty() {
            vec![default_model.clone()]
        } else {
            settings.models.clone()
        };
        Self {
            service,
            registry: CapabilityRegistry::standard(),
            dispatch: DispatchTable::standard(),
            models,
            session: Mutex::new(Session::new(default_model.clone(), 0)),
            default_model,
            event_sender: None,
        }
    }

    /// Report every state change on `event_sender`.
    pub fn with_events(mut self, event_sender: mpsc::UnboundedSender<SessionEvent>) -> Self {
        self.event_sender = Some(event_sender);
        self
    }

    pub fn with_registry(mut self, registry: CapabilityRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    pub fn models(&self) -> &[ModelOption] {
        &self.models
    }

    fn emit(&self, events: Vec<SessionEvent>) {
        if let Some(ref sender) = self.event_sender {
            for event in events {
                // Ignore send errors (receiver may have dropped)
                let _ = sender.send(event);
            }
        }
    }

    /// Capability override if there is one, else the persona-aware default.
    fn system_instruction(&self, state: &SessionState) -> String {
        state
            .active_capability
            .and_then(|id| self.registry.get(id))
            .and_then(|spec| spec.system_instruction_override)
            .map(str::to_string)
            .unwrap_or_else(|| prompts::assistant_instruction(state.adopted_persona.as_deref()))
    }

    /// The active capability wants an image and none is pending.
    fn needs_image(&self, state: &SessionState) -> bool {
        state.pending_image.is_none()
            && state
                .active_capability
                .and_then(|id| self.registry.get(id))
                .is_some_and(|spec| spec.requires_attachment_before_text)
    }

    fn refresh_gate(&self, state: &mut SessionState) {
        state.is_awaiting_required_attachment = self.needs_image(state);
    }

    fn input_hint(&self, state: &SessionState) -> &'static str {
        if state.is_awaiting_required_attachment {
            return prompts::AWAITING_IMAGE_HINT;
        }
        state
            .active_capability
            .and_then(|id| self.registry.get(id))
            .map(|spec| spec.input_hint)
            .unwrap_or(prompts::DEFAULT_INPUT_HINT)
    }

    /// Send `text` together with whatever is attached.
    ///
    /// Refused without touching the log while another submission is in
    /// flight, when there is nothing to send, or while a capability waits
    /// for an image. Otherwise appends the user turn, dispatches, and
    /// appends at most one model turn (or the failure turn).
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        let (handler, request, epoch, cancel, events) = {
            let mut session = self.session.lock();
            if session.is_loading {
                return SubmitOutcome::Rejected(RejectReason::Busy);
            }
            let Some(composed) = ComposedRequest::compose(
                text,
                session.state.pending_image.as_ref(),
                session.state.pending_document.as_ref(),
            ) else {
                return SubmitOutcome::Rejected(RejectReason::Empty);
            };
            if self.needs_image(&session.state) {
                return SubmitOutcome::Rejected(RejectReason::AwaitingAttachment);
            }

            let active = session.state.active_capability;
            let handler = Arc::clone(self.dispatch.select(active, &composed));
            let request = DispatchRequest::new(
                &composed,
                active,
                session.store.turns().to_vec(),
                session.state.selected_model_id(),
                session.state.adopted_persona.clone(),
                self.system_instruction(&session.state),
            );

            session.state.clear_attachments();
            session.append(Turn::user(composed.display));
            session.set_loading(true);
            info!(
                "dispatching to {} (capability: {:?})",
                handler.name(),
                active.map(|id| id.as_str())
            );
            (
                handler,
                request,
                session.epoch,
                session.cancel.clone(),
                session.take_events(),
            )
        };
        self.emit(events);

        let scope = DispatchScope::new(self, epoch);
        let ctx = DispatchContext {
            service: self.service.as_ref(),
            cancel: &cancel,
            progress: &scope,
        };
        let result = handler.handle(&request, &ctx).await;
        self.settle(&scope, request.capability, result)
    }

    /// Fold a dispatch result into the log and run the capability lifecycle.
    fn settle(
        &self,
        scope: &DispatchScope<'_>,
        dispatched: Option<CapabilityId>,
        result: ServiceResult<HandlerReply>,
    ) -> SubmitOutcome {
        let (outcome, events) = {
            let mut session = self.session.lock();
            if session.epoch != scope.epoch {
                debug!("session was reset, dropping result");
                return SubmitOutcome::Discarded;
            }

            for stamp in scope.working.lock().drain(..) {
                session.retract(stamp);
            }

            let outcome = match result {
                Ok(reply) => {
                    let (turn, effect) = reply.into_turn();
                    let model_turn = turn.is_some();
                    if let Some(turn) = turn {
                        session.append(turn);
                    }
                    match effect {
                        Some(SessionEffect::AdoptPersona(persona)) => {
                            session.state.adopted_persona = Some(persona);
                        }
                        Some(SessionEffect::Activate(id)) => {
                            if let Err(e) = self.activate_in(&mut session, id, ActivationMode::Announced)
                            {
                                warn!("redirect activation failed: {}", e);
                            }
                        }
                        None => {}
                    }
                    SubmitOutcome::Completed { model_turn }
                }
                Err(e) => {
                    error!("dispatch failed: {}", e);
                    session.append(Turn::model_text(prompts::FAILURE_TEXT));
                    SubmitOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            };

            // Only the capability that handled this submission is retired;
            // one activated meanwhile stays.
            if let Some(id) = dispatched {
                if !self.registry.is_sticky(id) && session.state.active_capability == Some(id) {
                    session.set_capability(None);
                }
            }
            self.refresh_gate(&mut session.state);
            session.set_loading(false);
            (outcome, session.take_events())
        };
        self.emit(events);
        outcome
    }

    /// Switch to a capability. `Announced` appends the banner and the
    /// activation prompt; `Silent` only changes state.
    pub fn activate(&self, id: CapabilityId, mode: ActivationMode) -> Result<(), ActivationError> {
        let events = {
            let mut session = self.session.lock();
            if session.is_loading {
                return Err(ActivationError::Busy);
            }
            self.activate_in(&mut session, id, mode)?;
            session.take_events()
        };
        self.emit(events);
        Ok(())
    }

    fn activate_in(
        &self,
        session: &mut Session,
        id: CapabilityId,
        mode: ActivationMode,
    ) -> Result<(), ActivationError> {
        let spec = self.registry.get(id).ok_or(ActivationError::Unknown(id))?;
        session.set_capability(Some(spec.id));
        self.refresh_gate(&mut session.state);

        if mode == ActivationMode::Announced {
            session.append(Turn::banner(prompts::activation_banner(
                spec.display_label,
            )));
            if let Some(prompt) = spec.activation_prompt {
                let element = spec.interactive_affordance.map(|a| a.element());
                session.append(Turn::model_text(prompt).with_interactive(element));
            }
        }
        info!("capability {} active ({:?})", spec.id, mode);
        Ok(())
    }

    /// Leave the current capability and drop any adopted persona.
    pub fn cancel_capability(&self) {
        let events = {
            let mut session = self.session.lock();
            session.set_capability(None);
            session.state.is_awaiting_required_attachment = false;
            session.state.adopted_persona = None;
            session.take_events()
        };
        self.emit(events);
    }

    /// Shorten or summarize `source_text`. A transient loading turn stands in
    /// for the result and is swapped for it (or for the failure turn).
    pub async fn modify_turn(&self, source_text: &str, action: TextAction) -> SubmitOutcome {
        let (stamp, model_id, epoch, events) = {
            let mut session = self.session.lock();
            if session.is_loading {
                return SubmitOutcome::Rejected(RejectReason::Busy);
            }
            if source_text.trim().is_empty() {
                return SubmitOutcome::Rejected(RejectReason::Empty);
            }
            let stamp = session.append(Turn::transient(prompts::MODIFY_LOADING_TEXT));
            session.set_loading(true);
            (
                stamp,
                session.state.selected_model_id().to_string(),
                session.epoch,
                session.take_events(),
            )
        };
        self.emit(events);

        let result = self
            .service
            .transform_text(source_text, &model_id, action)
            .await;

        let (outcome, events) = {
            let mut session = self.session.lock();
            if session.epoch != epoch {
                return SubmitOutcome::Discarded;
            }
            let (turn, outcome) = match result {
                Ok(text) => (
                    Turn::model_text(text),
                    SubmitOutcome::Completed { model_turn: true },
                ),
                Err(e) => {
                    error!("{:?} failed: {}", action, e);
                    (
                        Turn::model_text(prompts::FAILURE_TEXT),
                        SubmitOutcome::Failed {
                            error: e.to_string(),
                        },
                    )
                }
            };
            session.retract(stamp);
            session.append(turn);
            session.set_loading(false);
            (outcome, session.take_events())
        };
        self.emit(events);
        outcome
    }

    /// [`Self::modify_turn`] on the text of the turn at `index`.
    pub async fn modify_turn_at(&self, index: usize, action: TextAction) -> SubmitOutcome {
        let text = self.session.lock().store.get(index).map(Turn::text_content);
        match text {
            Some(text) => self.modify_turn(&text, action).await,
            None => SubmitOutcome::Rejected(RejectReason::Empty),
        }
    }

    /// Cut the log back to before `index` and hand back that turn's text for
    /// re-editing. The removed turns are gone for good; there is no undo.
    pub fn edit_request(&self, index: usize) -> Option<String> {
        let (text, events) = {
            let mut session = self.session.lock();
            if session.is_loading {
                return None;
            }
            let removed = session.store.truncate_before(index)?;
            let len = session.store.len();
            session.pending_events.push(SessionEvent::LogTruncated { len });
            (removed.text_content(), session.take_events())
        };
        self.emit(events);
        Some(text)
    }

    /// Select a model from the catalog by name. `Ok(false)` if it was
    /// already selected.
    pub fn change_model(&self, name: &str) -> Result<bool, ModelError> {
        let model = self
            .models
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| ModelError::Unknown(name.to_string()))?;

        let events = {
            let mut session = self.session.lock();
            if session.is_loading {
                return Err(ModelError::Busy);
            }
            if session.state.selected_model.name == model.name {
                return Ok(false);
            }
            session.append(Turn::banner(prompts::model_switched(&model.name)));
            session.pending_events.push(SessionEvent::ModelChanged {
                name: model.name.clone(),
            });
            session.state.selected_model = model;
            session.take_events()
        };
        self.emit(events);
        Ok(true)
    }

    /// Stage a file for the next submission. Images replace any document
    /// and lift the upload gate; with `describe_image` active the image is
    /// sent right away. Text documents replace any image and switch to
    /// document analysis silently.
    pub async fn attach_file(&self, file: FileAttachment) -> Result<AttachOutcome, AttachError> {
        if file.bytes.is_empty() {
            return Err(AttachError::Empty { name: file.name });
        }

        if file.is_image() {
            let describe_now = {
                let mut session = self.session.lock();
                session.state.pending_image = Some(ImageAttachment {
                    bytes: file.bytes,
                    mime_type: file.mime_type,
                });
                session.state.pending_document = None;
                self.refresh_gate(&mut session.state);
                session.state.active_capability == Some(CapabilityId::DESCRIBE_IMAGE)
            };
            if describe_now {
                debug!("image attached in describe mode, submitting");
                return Ok(AttachOutcome::Submitted(self.submit("").await));
            }
            return Ok(AttachOutcome::ImageStaged);
        }

        if file.is_text_document() {
            let events = {
                let mut session = self.session.lock();
                session.state.pending_document = Some(DocumentAttachment {
                    text_content: String::from_utf8_lossy(&file.bytes).into_owned(),
                    name: file.name,
                });
                session.state.pending_image = None;
                if session.state.active_capability != Some(CapabilityId::ANALYZE_DOCUMENT) {
                    if let Err(e) = self.activate_in(
                        &mut session,
                        CapabilityId::ANALYZE_DOCUMENT,
                        ActivationMode::Silent,
                    ) {
                        warn!("could not enter document analysis: {}", e);
                    }
                }
                self.refresh_gate(&mut session.state);
                session.take_events()
            };
            self.emit(events);
            return Ok(AttachOutcome::DocumentStaged);
        }

        Err(AttachError::Unsupported {
            mime_type: file.mime_type,
        })
    }

    /// Drop both staged attachments. A capability that needs an image
    /// goes back to waiting for one.
    pub fn remove_attachments(&self) {
        let mut session = self.session.lock();
        session.state.clear_attachments();
        self.refresh_gate(&mut session.state);
    }

    /// Submit the picked story choice as the next request.
    pub async fn choose_story_option(&self, choice: &str) -> SubmitOutcome {
        self.submit(choice).await
    }

    pub async fn surprise_story(&self) -> SubmitOutcome {
        self.submit(prompts::SURPRISE_ME_TEXT).await
    }

    /// Start over: empty log, default state, first model of the catalog.
    /// A call still in flight is cancelled and its result dropped.
    pub fn reset(&self) {
        let events = {
            let mut session = self.session.lock();
            session.cancel.cancel();
            let epoch = session.epoch + 1;
            *session = Session::new(self.default_model.clone(), epoch);
            session.pending_events.push(SessionEvent::SessionReset);
            session.take_events()
        };
        info!("session reset");
        self.emit(events);
    }

    /// Abort the pending long-running call, if any. It settles as a failure.
    pub fn cancel_in_flight(&self) -> bool {
        let mut session = self.session.lock();
        if !session.is_loading {
            return false;
        }
        session.cancel.cancel();
        session.cancel = CancellationToken::new();
        info!("in-flight request cancelled");
        true
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let session = self.session.lock();
        let state = &session.state;
        SessionSnapshot {
            session_id: session.id,
            turns: session.store.turns().to_vec(),
            is_loading: session.is_loading,
            current_action: session.current_action,
            active_capability: state.active_capability,
            is_awaiting_required_attachment: state.is_awaiting_required_attachment,
            adopted_persona: state.adopted_persona.clone(),
            selected_model: state.selected_model.clone(),
            pending_image_mime: state.pending_image.as_ref().map(|i| i.mime_type.clone()),
            pending_document_name: state.pending_document.as_ref().map(|d| d.name.clone()),
            input_hint: self.input_hint(state).to_string(),
        }
    }

    pub fn starter_suggestions(&self, count: usize) -> Vec<&'static str> {
        suggestions::starter_suggestions(count)
    }
}
