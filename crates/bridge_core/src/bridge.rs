//! Correlated calls on top of a [`Boundary`].

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use serde_json::Value;
use shared::{
    domain::{CallId, WindowConfig},
    error::ProtocolError,
    protocol::{OutboundMessage, ReplyFrame, WINDOW_STATE_INFO},
};
use tracing::{debug, warn};

use crate::{
    boundary::Boundary,
    correlator::{CallCorrelator, PendingCall},
    error::{BridgeError, CallError},
};

pub struct Bridge {
    boundary: Arc<dyn Boundary>,
    correlator: CallCorrelator,
    call_timeout: Option<Duration>,
    /// Call waiting for the next `window-state-info`.
    window_state_call: Mutex<Option<CallId>>,
}

impl Bridge {
    pub fn new(boundary: Arc<dyn Boundary>, call_timeout: Option<Duration>) -> Self {
        Self {
            boundary,
            correlator: CallCorrelator::new(),
            call_timeout,
            window_state_call: Mutex::new(None),
        }
    }

    pub fn correlator(&self) -> &CallCorrelator {
        &self.correlator
    }

    pub fn send(&self, message: OutboundMessage) -> Result<(), BridgeError> {
        self.boundary.send(message)
    }

    /// Issues a correlated call. `request` builds the outbound message for the
    /// freshly allocated id; the returned value is whatever the far side
    /// answers under that id.
    pub async fn call<F>(&self, request: F) -> Result<Value, BridgeError>
    where
        F: FnOnce(CallId) -> OutboundMessage,
    {
        let id = self.correlator.next_id();
        let pending = self.correlator.issue(id)?;
        if let Err(err) = self.boundary.send(request(id)) {
            self.correlator.forget(id);
            return Err(err);
        }
        self.settle(pending).await
    }

    /// Asks the far side for the initial window configuration. The answer
    /// arrives as `window-state-info` and is matched to this call by
    /// [`Bridge::accept_window_state`].
    pub async fn request_window_state(&self) -> Result<WindowConfig, BridgeError> {
        let id = self.correlator.next_id();
        let pending = self.correlator.issue(id)?;
        *self.window_state_slot() = Some(id);
        if let Err(err) = self.boundary.send(OutboundMessage::WindowStateRequest) {
            self.window_state_slot().take();
            self.correlator.forget(id);
            return Err(err);
        }

        let value = self.settle(pending).await?;
        serde_json::from_value(value).map_err(|source| {
            BridgeError::Protocol(ProtocolError::InvalidWindowConfig {
                topic: WINDOW_STATE_INFO.to_string(),
                source,
            })
        })
    }

    /// Completes the outstanding window-state call with `config`. Returns
    /// `false` when no such call exists.
    pub fn accept_window_state(&self, config: WindowConfig) -> Result<bool, BridgeError> {
        let Some(id) = self.window_state_slot().take() else {
            return Ok(false);
        };
        self.correlator.complete(id, Ok(serde_json::to_value(config)?))?;
        Ok(true)
    }

    /// Answers a call the far side issued, reusing the `(id, isError, ...args)`
    /// shape on `topic`.
    pub fn reply(
        &self,
        topic: &'static str,
        id: CallId,
        result: anyhow::Result<Vec<Value>>,
    ) -> Result<(), BridgeError> {
        let frame = match result {
            Ok(args) => ReplyFrame::ok(id, args),
            Err(err) => {
                debug!(topic, call_id = id.0, error = %err, "bridge: replying with error");
                ReplyFrame::err(id, vec![Value::String(format!("{err:#}"))])
            }
        };
        self.boundary.send(OutboundMessage::Reply { topic, frame })
    }

    async fn settle(&self, pending: PendingCall) -> Result<Value, BridgeError> {
        let Some(limit) = self.call_timeout else {
            return Ok(pending.await?);
        };
        let id = pending.id();
        match tokio::time::timeout(limit, pending).await {
            Ok(result) => Ok(result?),
            Err(_) => {
                self.correlator.forget(id);
                let mut slot = self.window_state_slot();
                if *slot == Some(id) {
                    slot.take();
                }
                warn!(call_id = id.0, "bridge: correlated call timed out");
                Err(CallError::TimedOut { id }.into())
            }
        }
    }

    fn window_state_slot(&self) -> MutexGuard<'_, Option<CallId>> {
        self.window_state_call
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use shared::protocol::{
        BoundaryMessage, CALL_REPLY, CURRENT_TABS_COUNT, WINDOW_STATE_REQUEST,
    };
    use tokio::sync::mpsc::UnboundedReceiver;

    use super::*;
    use crate::boundary::ChannelBoundary;

    fn bridge(
        call_timeout: Option<Duration>,
    ) -> (Arc<Bridge>, UnboundedReceiver<BoundaryMessage>) {
        let (boundary, rx) = ChannelBoundary::channel();
        (Arc::new(Bridge::new(Arc::new(boundary), call_timeout)), rx)
    }

    #[tokio::test]
    async fn call_sends_request_and_resolves_with_reply() {
        let (bridge, mut outbound) = bridge(None);

        let caller = Arc::clone(&bridge);
        let call = tokio::spawn(async move {
            caller
                .call(|id| OutboundMessage::Reply {
                    topic: CALL_REPLY,
                    frame: ReplyFrame::ok(id, vec![json!("ping")]),
                })
                .await
        });

        let sent = outbound.recv().await.expect("request");
        let id = CallId(sent.args[0].as_u64().expect("id"));
        bridge
            .correlator()
            .complete(id, Ok(json!("pong")))
            .expect("complete");

        assert_eq!(call.await.expect("join").expect("value"), json!("pong"));
    }

    #[tokio::test]
    async fn window_state_request_is_answered_by_accept() {
        let (bridge, mut outbound) = bridge(None);

        let requester = Arc::clone(&bridge);
        let request = tokio::spawn(async move { requester.request_window_state().await });

        let sent = outbound.recv().await.expect("request");
        assert_eq!(sent.topic, WINDOW_STATE_REQUEST);

        let config = WindowConfig {
            start_path: Some("history".into()),
            ..WindowConfig::default()
        };
        assert!(bridge.accept_window_state(config.clone()).expect("accept"));
        assert_eq!(request.await.expect("join").expect("config"), config);

        assert!(!bridge
            .accept_window_state(WindowConfig::default())
            .expect("second accept"));
    }

    #[tokio::test(start_paused = true)]
    async fn configured_timeout_forgets_the_call() {
        let (bridge, _outbound) = bridge(Some(Duration::from_millis(500)));

        let err = bridge
            .call(|id| OutboundMessage::Reply {
                topic: CALL_REPLY,
                frame: ReplyFrame::ok(id, Vec::new()),
            })
            .await
            .expect_err("times out");

        assert!(matches!(err, BridgeError::Call(CallError::TimedOut { id }) if id == CallId(1)));
        assert_eq!(bridge.correlator().outstanding(), 0);
        assert!(bridge.correlator().complete(CallId(1), Ok(json!(1))).is_err());
    }

    #[test]
    fn reply_encodes_errors_as_flagged_frames() {
        let (bridge, mut outbound) = bridge(None);

        bridge
            .reply(CURRENT_TABS_COUNT, CallId(4), Ok(vec![json!(2)]))
            .expect("ok reply");
        bridge
            .reply(
                CURRENT_TABS_COUNT,
                CallId(5),
                Err(anyhow::anyhow!("no workspace")),
            )
            .expect("err reply");

        let ok = outbound.try_recv().expect("ok");
        assert_eq!(ok.args, vec![json!(4), json!(false), json!(2)]);
        let err = outbound.try_recv().expect("err");
        assert_eq!(err.args, vec![json!(5), json!(true), json!("no workspace")]);
    }
}
