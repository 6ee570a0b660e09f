//! Event dispatcher
//!
//! TRANSPORT → CHANNEL → DIALOG → REPLY
//!
//! A single task owns the dialogue state machine and drains one bounded
//! channel, so events are processed strictly one at a time and the
//! conversation state needs no locking.

use crate::dialog::DialogStateMachine;
use crate::error::ExchangeBotError;
use crate::models::{InboundEvent, OutboundMessage};
use crate::Result;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const CHANNEL_CAPACITY: usize = 256;

/// An inbound event together with the slot its replies go to
struct Envelope {
    event: InboundEvent,
    respond_to: oneshot::Sender<Vec<OutboundMessage>>,
}

/// Cloneable handle that transports use to submit events
#[derive(Clone)]
pub struct DispatchHandle {
    sender: mpsc::Sender<Envelope>,
}

impl DispatchHandle {
    /// Submit an event and wait for the replies it produced.
    pub async fn submit(&self, event: InboundEvent) -> Result<Vec<OutboundMessage>> {
        let (respond_to, response) = oneshot::channel();

        self.sender
            .send(Envelope { event, respond_to })
            .await
            .map_err(|_| ExchangeBotError::DispatcherClosed)?;

        response.await.map_err(|_| ExchangeBotError::DispatcherClosed)
    }
}

/// Start the dispatch loop on its own task.
///
/// The loop ends once every handle has been dropped.
pub fn spawn(machine: DialogStateMachine) -> (DispatchHandle, JoinHandle<()>) {
    let (sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);
    let task = tokio::spawn(run(machine, receiver));
    (DispatchHandle { sender }, task)
}

async fn run(mut machine: DialogStateMachine, mut receiver: mpsc::Receiver<Envelope>) {
    info!("Dispatcher started");

    while let Some(Envelope { event, respond_to }) = receiver.recv().await {
        let replies = machine.handle(&event).await;

        debug!(
            conversation_id = %event.conversation_id,
            replies = replies.len(),
            "Event processed"
        );

        if respond_to.send(replies).is_err() {
            warn!(
                conversation_id = %event.conversation_id,
                "Transport dropped before replies were delivered"
            );
        }
    }

    info!(
        conversations = machine.conversation_count(),
        "Dispatcher stopped"
    );
}
