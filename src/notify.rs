// Post-commit notification dispatch - fire and forget

use anyhow::anyhow;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn, Instrument};

use crate::lifecycle::traits::{ActorResolver, NotificationSink};
use crate::lifecycle::types::{NotificationEvent, NotificationPlan};

/// Hands events to a sink on a background task.
///
/// The caller gets control back immediately. Role pools in the plan are
/// expanded on the background task, so no lookup sits on the request path.
/// Delivery failures are logged and left to the sink's own retry policy.
#[derive(Clone)]
pub struct NotificationDispatcher {
    sink: Arc<dyn NotificationSink>,
    actors: Arc<dyn ActorResolver>,
}

impl NotificationDispatcher {
    pub fn new(sink: Arc<dyn NotificationSink>, actors: Arc<dyn ActorResolver>) -> Self {
        Self { sink, actors }
    }

    pub fn dispatch(&self, plan: NotificationPlan) -> JoinHandle<()> {
        let sink = Arc::clone(&self.sink);
        let actors = Arc::clone(&self.actors);
        let span = tracing::info_span!(
            "gatepass_notification",
            event = ?plan.event_type,
            gatepass.number = %plan.gatepass_number,
        );

        tokio::spawn(
            async move {
                let event = expand(actors.as_ref(), plan).await;
                match sink.deliver(&event).await {
                    Ok(()) => debug!(recipients = event.recipients.len(), "Notification delivered"),
                    Err(e) => warn!(error = %e, "Notification delivery failed"),
                }
            }
            .instrument(span),
        )
    }
}

/// Resolve role pools into user ids. A pool that cannot be read is skipped
/// and the direct recipients still get the event.
async fn expand(actors: &dyn ActorResolver, plan: NotificationPlan) -> NotificationEvent {
    let mut recipients = plan.recipients;
    for role in &plan.pools {
        match actors.active_pool(*role).await {
            Ok(ids) => recipients.extend(ids),
            Err(e) => warn!(role = %role, error = %e, "Could not resolve recipient pool"),
        }
    }
    recipients.sort_unstable();
    recipients.dedup();

    NotificationEvent {
        event_type: plan.event_type,
        gatepass_id: plan.gatepass_id,
        gatepass_number: plan.gatepass_number,
        recipients,
        new_state: plan.new_state,
    }
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationDispatcher").finish_non_exhaustive()
    }
}

/// Sink that only writes events to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn deliver(&self, event: &NotificationEvent) -> anyhow::Result<()> {
        info!(
            event = ?event.event_type,
            gatepass.id = event.gatepass_id,
            gatepass.number = %event.gatepass_number,
            new_state = %event.new_state,
            recipients = ?event.recipients,
            "Gatepass notification"
        );
        Ok(())
    }
}

/// Sink that forwards events over a channel to a delivery worker
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<NotificationEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<NotificationEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl NotificationSink for ChannelSink {
    async fn deliver(&self, event: &NotificationEvent) -> anyhow::Result<()> {
        self.sender
            .send(event.clone())
            .map_err(|_| anyhow!("notification receiver dropped"))
    }
}
