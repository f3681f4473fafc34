//! Per-conversation workers.
//!
//! The polling loop must not wait on a slow publication, but the messages of
//! one conversation have to be processed in arrival order. Each active
//! conversation gets a task fed through its own channel; the task exits
//! after a quiet period and is recreated on the next message. A recreated
//! task waits for its predecessor to finish draining first.

use std::{collections::HashMap, sync::Arc, time::Duration};

use {
    reelpost_sessions::ConversationKey,
    reelpost_workflow::Inbound,
    tokio::{sync::mpsc, task::JoinHandle},
    tracing::{debug, error},
};

use crate::{handlers, state::BotState};

pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(600);

struct Worker {
    tx: mpsc::UnboundedSender<Inbound>,
    handle: JoinHandle<()>,
}

pub struct ConversationWorkers {
    state: Arc<BotState>,
    workers: HashMap<ConversationKey, Worker>,
    idle_timeout: Duration,
}

impl ConversationWorkers {
    #[must_use]
    pub fn new(state: Arc<BotState>) -> Self {
        Self::with_idle_timeout(state, DEFAULT_IDLE_TIMEOUT)
    }

    #[must_use]
    pub fn with_idle_timeout(state: Arc<BotState>, idle_timeout: Duration) -> Self {
        Self {
            state,
            workers: HashMap::new(),
            idle_timeout,
        }
    }

    /// Queue an input on its conversation's worker, starting one if needed.
    pub fn dispatch(&mut self, key: ConversationKey, input: Inbound) {
        self.workers.retain(|_, w| !w.handle.is_finished());

        let (input, previous) = match self.workers.remove(&key) {
            Some(worker) => match worker.tx.send(input) {
                Ok(()) => {
                    self.workers.insert(key, worker);
                    return;
                },
                // closed but possibly still draining
                Err(mpsc::error::SendError(input)) => (input, Some(worker.handle)),
            },
            None => (input, None),
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(input);
        debug!(conversation = %key, "starting conversation worker");
        let handle = tokio::spawn(run_worker(
            Arc::clone(&self.state),
            key,
            rx,
            self.idle_timeout,
            previous,
        ));
        self.workers.insert(key, Worker { tx, handle });
    }

    #[cfg(test)]
    fn active(&self) -> usize {
        self.workers
            .values()
            .filter(|w| !w.handle.is_finished())
            .count()
    }
}

async fn run_worker(
    state: Arc<BotState>,
    key: ConversationKey,
    mut rx: mpsc::UnboundedReceiver<Inbound>,
    idle_timeout: Duration,
    previous: Option<JoinHandle<()>>,
) {
    if let Some(previous) = previous
        && let Err(e) = previous.await
    {
        error!(conversation = %key, error = %e, "previous conversation worker failed");
    }

    loop {
        let next = tokio::select! {
            _ = state.cancel.cancelled() => break,
            next = tokio::time::timeout(idle_timeout, rx.recv()) => next,
        };
        match next {
            Ok(Some(input)) => process(&state, key, input).await,
            Ok(None) => break,
            Err(_) => {
                // stop accepting, then finish what was already queued
                rx.close();
                while let Ok(input) = rx.try_recv() {
                    process(&state, key, input).await;
                }
                break;
            },
        }
    }
    let pruned = state.conversations.prune_idle();
    debug!(conversation = %key, pruned, "conversation worker stopped");
}

async fn process(state: &BotState, key: ConversationKey, input: Inbound) {
    if let Err(e) = handlers::process(state, key, input).await {
        error!(conversation = %key, error = %e, "error handling telegram message");
    }
}
