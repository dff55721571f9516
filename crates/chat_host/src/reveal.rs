//! Progressive display of a finished reply.
//!
//! A `Reveal` appends one chunk of the reply per frame to a placeholder
//! message. It is tied to the session version it was created under: after
//! `Session::reset` every further step is `Orphaned` and touches nothing.

use futures::future::{AbortHandle, Abortable};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealStep {
    /// One chunk was appended.
    Appended,
    /// Nothing left to append; typing flag cleared.
    Finished,
    /// The target message no longer belongs to this conversation.
    Orphaned,
}

#[derive(Debug, Clone)]
pub struct Reveal {
    index: usize,
    version: u64,
    chunks: Vec<String>,
    next: usize,
    follow: bool,
}

impl Reveal {
    /// `follow` is whether the view was at the bottom when the reveal
    /// started; if so every step asks the view to scroll.
    pub fn new(index: usize, version: u64, text: &str, chunk_size: usize, follow: bool) -> Self {
        Self {
            index,
            version,
            chunks: split_chunks(text, chunk_size),
            next: 0,
            follow,
        }
    }

    pub fn total_steps(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_done(&self) -> bool {
        self.next >= self.chunks.len()
    }

    pub fn step(&mut self, session: &mut Session) -> RevealStep {
        if session.version() != self.version {
            return RevealStep::Orphaned;
        }
        let Some(chunk) = self.chunks.get(self.next) else {
            session.finish_typing();
            return RevealStep::Finished;
        };
        if !session.append_to_message(self.index, chunk) {
            return RevealStep::Orphaned;
        }
        self.next += 1;

        if self.follow {
            session.request_scroll();
        }
        if self.is_done() {
            session.finish_typing();
        }
        RevealStep::Appended
    }
}

/// Split on character boundaries so multi-byte text is never cut mid-char.
fn split_chunks(text: &str, chunk_size: usize) -> Vec<String> {
    let size = chunk_size.max(1);
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(size).map(|c| c.iter().collect()).collect()
}

/// Source of display refresh ticks.
#[async_trait::async_trait]
pub trait FrameClock: Send + Sync {
    async fn next_frame(&self);
}

/// Ticks at a fixed interval. Used when no UI drives the frames.
pub struct IntervalClock {
    pub interval: Duration,
}

impl Default for IntervalClock {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(16),
        }
    }
}

#[async_trait::async_trait]
impl FrameClock for IntervalClock {
    async fn next_frame(&self) {
        tokio::time::sleep(self.interval).await;
    }
}

/// Running reveal task.
#[derive(Debug)]
pub struct RevealHandle {
    abort: AbortHandle,
    task: JoinHandle<()>,
}

impl RevealHandle {
    pub fn cancel(&self) {
        self.abort.abort();
    }

    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Wait for the reveal to finish or be cancelled.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            tracing::warn!("reveal task failed: {}", e);
        }
    }
}

/// Run `reveal` on the tokio runtime, one chunk per frame.
pub fn spawn_reveal(
    session: Arc<Mutex<Session>>,
    mut reveal: Reveal,
    clock: Arc<dyn FrameClock>,
) -> RevealHandle {
    let (abort, registration) = AbortHandle::new_pair();
    tracing::debug!(steps = reveal.total_steps(), "reveal started");

    let run = async move {
        loop {
            let step = reveal.step(&mut session.lock());
            match step {
                RevealStep::Appended if !reveal.is_done() => clock.next_frame().await,
                RevealStep::Orphaned => {
                    tracing::debug!("reveal orphaned by a reset");
                    break;
                }
                _ => break,
            }
        }
    };

    let task = tokio::spawn(async move {
        if Abortable::new(run, registration).await.is_err() {
            tracing::debug!("reveal aborted");
        }
    });

    RevealHandle { abort, task }
}
