//! Long-poll loop that feeds updates to the dispatcher.
//!
//! The loop alternates between two states. `Polling` waits on `getUpdates`
//! at `last_update_id + 1`. `Draining` hands each update of a batch to the
//! dispatcher in id order and only then acknowledges the batch's highest id.
//! A crash mid-batch therefore redelivers the whole batch on the next poll.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::handlers::Dispatcher;
use super::update::Update;
use crate::session::Session;
use crate::telegram::{Transport, TransportError};

/// Delay before retrying a failed poll.
pub trait Backoff: Send + Sync {
    /// `attempt` counts consecutive failures, starting at 1.
    fn delay(&self, attempt: u32) -> Duration;
}

/// Same delay after every failure.
#[derive(Debug, Clone, Copy)]
pub struct FixedBackoff(pub Duration);

impl Default for FixedBackoff {
    fn default() -> Self {
        Self(Duration::from_secs(5))
    }
}

impl Backoff for FixedBackoff {
    fn delay(&self, _attempt: u32) -> Duration {
        self.0
    }
}

enum State {
    Polling,
    Draining(Vec<Update>),
}

pub struct Ingestor {
    session: Arc<Session>,
    transport: Arc<dyn Transport>,
    dispatcher: Arc<Dispatcher>,
    backoff: Box<dyn Backoff>,
    poll_timeout: Duration,
}

impl Ingestor {
    pub fn new(
        session: Arc<Session>,
        transport: Arc<dyn Transport>,
        dispatcher: Arc<Dispatcher>,
        poll_timeout: Duration,
    ) -> Self {
        Self {
            session,
            transport,
            dispatcher,
            backoff: Box::new(FixedBackoff::default()),
            poll_timeout,
        }
    }

    pub fn with_backoff(mut self, backoff: impl Backoff + 'static) -> Self {
        self.backoff = Box::new(backoff);
        self
    }

    /// Run until `shutdown` turns true or its sender is dropped.
    ///
    /// Shutdown interrupts a pending poll or backoff sleep. A batch that is
    /// already draining is finished and acknowledged first.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!("🤖 Ingestor started at offset {}", self.session.next_offset());
        let mut state = State::Polling;
        let mut failures: u32 = 0;

        loop {
            state = match state {
                State::Polling => {
                    let polled = tokio::select! {
                        biased;
                        _ = stopped(&mut shutdown) => break,
                        polled = self.poll() => polled,
                    };
                    match polled {
                        Ok(batch) => {
                            failures = 0;
                            if batch.is_empty() {
                                State::Polling
                            } else {
                                State::Draining(batch)
                            }
                        }
                        Err(e) => {
                            failures = failures.saturating_add(1);
                            let delay = self.backoff.delay(failures);
                            warn!("❌ Polling failed ({}), retrying in {:?} (attempt {})", e, delay, failures);
                            tokio::select! {
                                biased;
                                _ = stopped(&mut shutdown) => break,
                                _ = tokio::time::sleep(delay) => {}
                            }
                            State::Polling
                        }
                    }
                }
                State::Draining(batch) => {
                    self.drain(batch).await;
                    State::Polling
                }
            };
        }

        info!("🛑 Ingestor stopped at last_update_id {}", self.session.last_update_id());
    }

    /// One poll followed by a full drain. Returns the batch size.
    pub async fn poll_once(&self) -> Result<usize, TransportError> {
        let batch = self.poll().await?;
        let size = batch.len();
        if size > 0 {
            self.drain(batch).await;
        }
        Ok(size)
    }

    async fn poll(&self) -> Result<Vec<Update>, TransportError> {
        let offset = self.session.next_offset();
        let batch = self.transport.get_updates(offset, self.poll_timeout).await?;
        if !batch.is_empty() {
            debug!("📥 {} updates at offset {}", batch.len(), offset);
        }
        Ok(batch)
    }

    /// Dispatch every update in order, then acknowledge the batch.
    async fn drain(&self, batch: Vec<Update>) -> i64 {
        let acknowledged = self.session.last_update_id();
        let mut highest = acknowledged;
        for update in &batch {
            highest = highest.max(update.update_id);
            if update.update_id <= acknowledged {
                debug!("Skipping already acknowledged update {}", update.update_id);
                continue;
            }
            let delivery = self.dispatcher.dispatch(update).await;
            if delivery.failed > 0 {
                warn!(
                    "Update {}: {} of {} sends failed",
                    update.update_id,
                    delivery.failed,
                    delivery.sent + delivery.failed
                );
            }
        }
        let last = self.session.acknowledge(highest);
        debug!("✅ Acknowledged through update {}", last);
        last
    }
}

async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    // A dropped sender also means stop.
    let _ = shutdown.wait_for(|stop| *stop).await;
}
