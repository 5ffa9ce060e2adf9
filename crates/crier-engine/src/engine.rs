use tracing::{debug, info, instrument};

use crier_core::content::{BroadcastContent, Button};
use crier_core::draft::{Draft, DraftState, NO_BUTTON_SENTINEL};
use crier_core::events::{EngineReply, OperatorEvent};
use crier_core::ids::OperatorId;
use crier_store::DraftStore;

use crate::dispatcher::DeliveryDispatcher;
use crate::error::EngineError;
use crate::prompts;

/// Finite-state dialog driving draft collection, preview, confirmation
/// and dispatch. Transitions are strictly forward; Cancel is the one
/// edge back to idle from any state. Events with no defined effect in
/// the current state are absorbed silently.
pub struct ConversationEngine {
    admin: OperatorId,
    drafts: DraftStore,
    dispatcher: DeliveryDispatcher,
}

impl ConversationEngine {
    pub fn new(admin: OperatorId, drafts: DraftStore, dispatcher: DeliveryDispatcher) -> Self {
        Self {
            admin,
            drafts,
            dispatcher,
        }
    }

    /// Current dialog state for an operator; None means idle.
    pub fn state(&self, operator: &OperatorId) -> Option<DraftState> {
        self.drafts.get(operator).map(|draft| draft.state)
    }

    /// Handle one operator event.
    #[instrument(skip(self, event), fields(operator = %operator, event = event.event_type()))]
    pub async fn handle(
        &self,
        operator: &OperatorId,
        event: OperatorEvent,
    ) -> Result<EngineReply, EngineError> {
        // Authorization is evaluated once, before any event reaches the
        // state machine. A non-admin operator gets no reply and no
        // state change.
        if *operator != self.admin {
            debug!("event from non-admin operator ignored");
            return Ok(EngineReply::Silent);
        }

        match event {
            OperatorEvent::StartBroadcast => Ok(self.start(operator)),
            OperatorEvent::SubmitContent { input } => Ok(self.submit_content(operator, input)),
            OperatorEvent::SubmitButtonLabel { text } => {
                Ok(self.submit_button_label(operator, text))
            }
            OperatorEvent::SubmitButtonLink { text } => Ok(self.submit_button_link(operator, text)),
            OperatorEvent::Preview => Ok(self.preview(operator)),
            OperatorEvent::Confirm => self.confirm(operator).await,
            OperatorEvent::Cancel => Ok(self.cancel(operator)),
        }
    }

    fn start(&self, operator: &OperatorId) -> EngineReply {
        if self.drafts.get(operator).is_some() {
            debug!("start ignored: draft already in progress");
            return EngineReply::Silent;
        }
        self.drafts.set(operator, Draft::new());
        info!("broadcast draft started");
        EngineReply::Prompt {
            text: prompts::CONTENT_PROMPT.into(),
        }
    }

    fn submit_content(
        &self,
        operator: &OperatorId,
        input: crier_core::content::ContentInput,
    ) -> EngineReply {
        let Some(mut draft) = self.drafts.get(operator) else {
            return EngineReply::Silent;
        };
        if draft.state != DraftState::AwaitingContent {
            return EngineReply::Silent;
        }

        match BroadcastContent::classify(input) {
            None => EngineReply::Retry {
                text: prompts::INVALID_CONTENT.into(),
            },
            Some(content) => {
                debug!(kind = content.kind(), "content accepted");
                draft.content = Some(content);
                draft.state = DraftState::AwaitingButtonLabel;
                self.drafts.set(operator, draft);
                EngineReply::Prompt {
                    text: prompts::BUTTON_LABEL_PROMPT.into(),
                }
            }
        }
    }

    fn submit_button_label(&self, operator: &OperatorId, text: String) -> EngineReply {
        let Some(mut draft) = self.drafts.get(operator) else {
            return EngineReply::Silent;
        };
        if draft.state != DraftState::AwaitingButtonLabel {
            return EngineReply::Silent;
        }

        if text == NO_BUTTON_SENTINEL {
            draft.button = None;
            draft.state = DraftState::AwaitingConfirmation;
            let reply = preview_reply(&draft);
            self.drafts.set(operator, draft);
            return reply;
        }

        draft.state = DraftState::AwaitingButtonLink { label: text };
        self.drafts.set(operator, draft);
        EngineReply::Prompt {
            text: prompts::BUTTON_LINK_PROMPT.into(),
        }
    }

    fn submit_button_link(&self, operator: &OperatorId, text: String) -> EngineReply {
        let Some(mut draft) = self.drafts.get(operator) else {
            return EngineReply::Silent;
        };
        let DraftState::AwaitingButtonLink { label } = draft.state.clone() else {
            return EngineReply::Silent;
        };

        draft.button = Some(Button::new(label, text));
        draft.state = DraftState::AwaitingConfirmation;
        let reply = preview_reply(&draft);
        self.drafts.set(operator, draft);
        reply
    }

    fn preview(&self, operator: &OperatorId) -> EngineReply {
        match self.drafts.get(operator) {
            Some(draft) => preview_reply(&draft),
            None => EngineReply::Silent,
        }
    }

    async fn confirm(&self, operator: &OperatorId) -> Result<EngineReply, EngineError> {
        let Some(draft) = self.drafts.get(operator) else {
            return Ok(EngineReply::Silent);
        };
        if draft.state != DraftState::AwaitingConfirmation {
            return Ok(EngineReply::Silent);
        }
        let Some(content) = draft.content.as_ref() else {
            return Ok(EngineReply::Silent);
        };

        info!(kind = content.kind(), "broadcast confirmed, dispatching");
        let result = self.dispatcher.run(content, draft.button.as_ref()).await?;
        self.drafts.clear(operator);
        Ok(EngineReply::Completed { result })
    }

    fn cancel(&self, operator: &OperatorId) -> EngineReply {
        if self.drafts.clear(operator) {
            info!("broadcast cancelled");
            EngineReply::Cancelled {
                text: prompts::CANCELLED.into(),
            }
        } else {
            EngineReply::Silent
        }
    }
}

fn preview_reply(draft: &Draft) -> EngineReply {
    match draft.content.as_ref() {
        Some(content) => EngineReply::Preview {
            rendering: prompts::render_preview(content, draft.button.as_ref()),
        },
        None => EngineReply::Silent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;
    use std::sync::Arc;

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use crier_core::content::{ButtonTarget, ContentInput};
    use crier_core::delivery::{MessageSender, RecipientSource};
    use crier_core::errors::{SendError, SourceError};
    use crier_core::ids::RecipientId;

    struct StaticRoster(Vec<RecipientId>);

    #[async_trait]
    impl RecipientSource for StaticRoster {
        async fn list_recipients(&self) -> Result<Vec<RecipientId>, SourceError> {
            Ok(self.0.clone())
        }
    }

    struct FailingRoster;

    #[async_trait]
    impl RecipientSource for FailingRoster {
        async fn list_recipients(&self) -> Result<Vec<RecipientId>, SourceError> {
            Err(SourceError("roster offline".into()))
        }
    }

    struct RecordingSender {
        sent: Mutex<Vec<String>>,
        fail_for: HashSet<String>,
    }

    impl RecordingSender {
        fn new(fail_for: &[&str]) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail_for: fail_for.iter().map(|s| s.to_string()).collect(),
            }
        }
    }

    #[async_trait]
    impl MessageSender for RecordingSender {
        async fn send(
            &self,
            recipient: &RecipientId,
            _content: &BroadcastContent,
            _button: Option<&Button>,
        ) -> Result<(), SendError> {
            self.sent.lock().push(recipient.as_str().to_owned());
            if self.fail_for.contains(recipient.as_str()) {
                return Err(SendError("rejected".into()));
            }
            Ok(())
        }
    }

    struct Fixture {
        engine: ConversationEngine,
        store: DraftStore,
        sender: Arc<RecordingSender>,
    }

    fn fixture(recipients: &[&str], fail_for: &[&str]) -> Fixture {
        let sender = Arc::new(RecordingSender::new(fail_for));
        let roster = Arc::new(StaticRoster(
            recipients.iter().map(|s| RecipientId::from_raw(*s)).collect(),
        ));
        let store = DraftStore::new();
        let engine = ConversationEngine::new(
            admin(),
            store.clone(),
            DeliveryDispatcher::new(roster, sender.clone()),
        );
        Fixture { engine, store, sender }
    }

    fn admin() -> OperatorId {
        OperatorId::from_raw("admin")
    }

    fn guest() -> OperatorId {
        OperatorId::from_raw("guest")
    }

    async fn drive(engine: &ConversationEngine, op: &OperatorId, events: Vec<OperatorEvent>) {
        for event in events {
            engine.handle(op, event).await.unwrap();
        }
    }

    fn to_confirmation() -> Vec<OperatorEvent> {
        vec![
            OperatorEvent::StartBroadcast,
            OperatorEvent::SubmitContent { input: ContentInput::text("Hello") },
            OperatorEvent::SubmitButtonLabel { text: NO_BUTTON_SENTINEL.into() },
        ]
    }

    #[tokio::test(start_paused = true)]
    async fn text_broadcast_skipped_button_one_failure() {
        let f = fixture(&["1", "2", "3"], &["2"]);
        let op = admin();

        let reply = f.engine.handle(&op, OperatorEvent::StartBroadcast).await.unwrap();
        assert!(matches!(reply, EngineReply::Prompt { .. }));

        let reply = f
            .engine
            .handle(&op, OperatorEvent::SubmitContent { input: ContentInput::text("Hello") })
            .await
            .unwrap();
        assert!(matches!(reply, EngineReply::Prompt { .. }));

        let reply = f
            .engine
            .handle(&op, OperatorEvent::SubmitButtonLabel { text: "-".into() })
            .await
            .unwrap();
        assert!(matches!(reply, EngineReply::Preview { .. }));
        assert_eq!(f.engine.state(&op), Some(DraftState::AwaitingConfirmation));
        assert!(f.store.get(&op).unwrap().button.is_none());

        let reply = f.engine.handle(&op, OperatorEvent::Confirm).await.unwrap();
        match reply {
            EngineReply::Completed { result } => {
                assert_eq!(result.to_string(), "attempted 3, succeeded 2");
            }
            other => panic!("expected completion report, got {other:?}"),
        }

        // Draft cleared, back to idle, sends in roster order.
        assert_eq!(f.engine.state(&op), None);
        assert_eq!(*f.sender.sent.lock(), vec!["1", "2", "3"]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_from_button_link_discards_everything() {
        let f = fixture(&["1"], &[]);
        let op = admin();

        drive(
            &f.engine,
            &op,
            vec![
                OperatorEvent::StartBroadcast,
                OperatorEvent::SubmitContent { input: ContentInput::text("draft one") },
                OperatorEvent::SubmitButtonLabel { text: "Open".into() },
            ],
        )
        .await;
        assert!(matches!(
            f.engine.state(&op),
            Some(DraftState::AwaitingButtonLink { .. })
        ));

        let reply = f.engine.handle(&op, OperatorEvent::Cancel).await.unwrap();
        assert!(matches!(reply, EngineReply::Cancelled { .. }));
        assert_eq!(f.engine.state(&op), None);

        // A fresh start yields an empty draft with no leftovers.
        f.engine.handle(&op, OperatorEvent::StartBroadcast).await.unwrap();
        let draft = f.store.get(&op).unwrap();
        assert_eq!(draft.state, DraftState::AwaitingContent);
        assert!(draft.content.is_none());
        assert!(draft.button.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn non_admin_confirm_does_not_dispatch() {
        let f = fixture(&["1", "2"], &[]);
        let op = admin();

        drive(&f.engine, &op, to_confirmation()).await;
        assert_eq!(f.engine.state(&op), Some(DraftState::AwaitingConfirmation));

        let reply = f.engine.handle(&guest(), OperatorEvent::Confirm).await.unwrap();
        assert!(reply.is_silent());
        assert_eq!(f.engine.state(&op), Some(DraftState::AwaitingConfirmation));
        assert!(f.sender.sent.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn non_admin_start_changes_nothing() {
        let f = fixture(&[], &[]);
        let intruder = guest();

        let before = f.engine.state(&intruder);
        let reply = f.engine.handle(&intruder, OperatorEvent::StartBroadcast).await.unwrap();
        assert!(reply.is_silent());
        assert_eq!(f.engine.state(&intruder), before);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_content_allows_resubmission() {
        let f = fixture(&[], &[]);
        let op = admin();

        f.engine.handle(&op, OperatorEvent::StartBroadcast).await.unwrap();
        let reply = f
            .engine
            .handle(&op, OperatorEvent::SubmitContent { input: ContentInput::default() })
            .await
            .unwrap();
        assert!(matches!(reply, EngineReply::Retry { .. }));
        assert_eq!(f.engine.state(&op), Some(DraftState::AwaitingContent));

        let reply = f
            .engine
            .handle(
                &op,
                OperatorEvent::SubmitContent {
                    input: ContentInput::photo("file_p", Some("caption".into())),
                },
            )
            .await
            .unwrap();
        assert!(matches!(reply, EngineReply::Prompt { .. }));
        assert_eq!(f.engine.state(&op), Some(DraftState::AwaitingButtonLabel));
    }

    #[tokio::test(start_paused = true)]
    async fn button_link_is_classified() {
        let f = fixture(&[], &[]);
        let op = admin();

        drive(
            &f.engine,
            &op,
            vec![
                OperatorEvent::StartBroadcast,
                OperatorEvent::SubmitContent { input: ContentInput::text("hi") },
                OperatorEvent::SubmitButtonLabel { text: "Open shop".into() },
                OperatorEvent::SubmitButtonLink { text: "https://shop.example".into() },
            ],
        )
        .await;

        let button = f.store.get(&op).unwrap().button.unwrap();
        assert_eq!(button.label, "Open shop");
        assert!(matches!(button.target, ButtonTarget::External { .. }));

        // And the in-app branch.
        f.engine.handle(&op, OperatorEvent::Cancel).await.unwrap();
        drive(
            &f.engine,
            &op,
            vec![
                OperatorEvent::StartBroadcast,
                OperatorEvent::SubmitContent { input: ContentInput::text("hi") },
                OperatorEvent::SubmitButtonLabel { text: "Catalog".into() },
                OperatorEvent::SubmitButtonLink { text: "shop/catalog".into() },
            ],
        )
        .await;
        let button = f.store.get(&op).unwrap().button.unwrap();
        assert!(matches!(button.target, ButtonTarget::InAppView { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn preview_is_a_pure_read() {
        let f = fixture(&[], &[]);
        let op = admin();

        assert!(f.engine.handle(&op, OperatorEvent::Preview).await.unwrap().is_silent());

        drive(&f.engine, &op, to_confirmation()).await;
        let before = f.store.get(&op).unwrap();

        let reply = f.engine.handle(&op, OperatorEvent::Preview).await.unwrap();
        match reply {
            EngineReply::Preview { rendering } => assert!(rendering.contains("Hello")),
            other => panic!("expected preview, got {other:?}"),
        }
        assert_eq!(f.store.get(&op).unwrap(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn out_of_order_events_are_absorbed() {
        let f = fixture(&["1"], &[]);
        let op = admin();

        // Idle: nothing but StartBroadcast has an effect.
        assert!(f.engine.handle(&op, OperatorEvent::Confirm).await.unwrap().is_silent());
        assert!(f
            .engine
            .handle(&op, OperatorEvent::SubmitButtonLink { text: "x".into() })
            .await
            .unwrap()
            .is_silent());
        assert!(f.engine.handle(&op, OperatorEvent::Cancel).await.unwrap().is_silent());

        // AwaitingContent: a second start and a premature confirm are no-ops.
        f.engine.handle(&op, OperatorEvent::StartBroadcast).await.unwrap();
        assert!(f.engine.handle(&op, OperatorEvent::StartBroadcast).await.unwrap().is_silent());
        assert!(f.engine.handle(&op, OperatorEvent::Confirm).await.unwrap().is_silent());
        assert_eq!(f.engine.state(&op), Some(DraftState::AwaitingContent));
        assert!(f.sender.sent.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn every_state_event_pair_is_defined() {
        let all_events = || {
            vec![
                OperatorEvent::StartBroadcast,
                OperatorEvent::SubmitContent { input: ContentInput::text("t") },
                OperatorEvent::SubmitContent { input: ContentInput::default() },
                OperatorEvent::SubmitButtonLabel { text: "label".into() },
                OperatorEvent::SubmitButtonLabel { text: "-".into() },
                OperatorEvent::SubmitButtonLink { text: "https://x".into() },
                OperatorEvent::Preview,
                OperatorEvent::Confirm,
                OperatorEvent::Cancel,
            ]
        };

        // Stage 0 = idle through stage 4 = awaiting confirmation.
        for stage in 0..5 {
            for event in all_events() {
                let f = fixture(&["1"], &[]);
                let op = admin();
                let mut setup = Vec::new();
                if stage >= 1 {
                    setup.push(OperatorEvent::StartBroadcast);
                }
                if stage >= 2 {
                    setup.push(OperatorEvent::SubmitContent { input: ContentInput::text("hi") });
                }
                if stage >= 3 {
                    setup.push(OperatorEvent::SubmitButtonLabel { text: "Open".into() });
                }
                if stage >= 4 {
                    setup.push(OperatorEvent::SubmitButtonLink { text: "https://x".into() });
                }
                drive(&f.engine, &op, setup).await;

                let kind = event.event_type();
                let result = f.engine.handle(&op, event).await;
                assert!(result.is_ok(), "stage {stage}, event {kind} returned an error");
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn roster_failure_keeps_draft_pending() {
        let sender = Arc::new(RecordingSender::new(&[]));
        let store = DraftStore::new();
        let engine = ConversationEngine::new(
            admin(),
            store.clone(),
            DeliveryDispatcher::new(Arc::new(FailingRoster), sender),
        );
        let op = admin();

        drive(&engine, &op, to_confirmation()).await;
        let err = engine.handle(&op, OperatorEvent::Confirm).await.unwrap_err();
        assert!(matches!(err, EngineError::Source(_)));
        // The draft survives so the operator can retry or cancel.
        assert_eq!(engine.state(&op), Some(DraftState::AwaitingConfirmation));
    }
}
