//! Sender mode: host lifecycle events as newline-delimited JSON
//!
//! Each input line is one hook call:
//!
//! ```json
//! {"hook":"pre_update","record":{"id":9,"post_type":"product","product":{"sku":"A1","name":"Old"}}}
//! {"hook":"post_save","record":{"id":9,"post_type":"product","product":{"sku":"A1","name":"New"}},"autosave":false}
//! ```
//!
//! A malformed line is logged and skipped; it never stops the loop.

use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tokio::io::AsyncBufRead;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::LinesStream;
use tracing::{debug, info, warn};
use wrc_core::engine::{HookOutcome, SyncEngine};
use wrc_core::record::{Record, SaveContext};

/// How often expired snapshots are purged while idle
pub const PURGE_INTERVAL: Duration = Duration::from_secs(300);

/// Which hook a line targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hook {
    PreUpdate,
    PostSave,
}

/// One host lifecycle event
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HostEvent {
    pub hook: Hook,
    pub record: Record,
    #[serde(default)]
    pub autosave: bool,
    #[serde(default)]
    pub revision: bool,
}

impl HostEvent {
    /// Decode one input line
    pub fn parse(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line)
    }

    /// Save flags of the event
    pub fn context(&self) -> SaveContext {
        SaveContext {
            autosave: self.autosave,
            revision: self.revision,
        }
    }
}

/// Counters for one sender run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SenderStats {
    pub processed: usize,
    pub malformed: usize,
    pub sent: usize,
    pub failed: usize,
}

impl SenderStats {
    fn record(&mut self, outcome: &HookOutcome) {
        self.processed += 1;
        match outcome {
            HookOutcome::Sent { .. } => self.sent += 1,
            HookOutcome::Failed(_) | HookOutcome::Fatal(_) => self.failed += 1,
            HookOutcome::Captured | HookOutcome::Skipped(_) => {}
        }
    }
}

/// Feed host events into the engine until input ends or `shutdown` resolves
pub async fn run_sender<R, S>(engine: &SyncEngine, input: R, shutdown: S) -> std::io::Result<SenderStats>
where
    R: AsyncBufRead + Unpin,
    S: Future<Output = ()>,
{
    use tokio::io::AsyncBufReadExt;

    let mut lines = LinesStream::new(input.lines());
    let mut stats = SenderStats::default();
    let mut purge = tokio::time::interval(PURGE_INTERVAL);
    purge.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown requested, stopping sender");
                break;
            }
            _ = purge.tick() => {
                engine.purge_expired_snapshots().await;
            }
            line = lines.next() => {
                let Some(line) = line else {
                    info!("Host event stream closed");
                    break;
                };
                let line = match line {
                    Ok(line) => line,
                    Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                        warn!("Skipping host event that is not valid UTF-8: {}", e);
                        stats.malformed += 1;
                        continue;
                    }
                    Err(e) => return Err(e),
                };
                if line.trim().is_empty() {
                    continue;
                }

                let event = match HostEvent::parse(&line) {
                    Ok(event) => event,
                    Err(e) => {
                        warn!("Skipping malformed host event: {}", e);
                        stats.malformed += 1;
                        continue;
                    }
                };

                let ctx = event.context();
                let outcome = match event.hook {
                    Hook::PreUpdate => engine.on_pre_update(&ctx, &event.record).await,
                    Hook::PostSave => engine.on_post_save(&ctx, &event.record).await,
                };
                debug!("{:?} for record {}: {:?}", event.hook, event.record.id, outcome);
                stats.record(&outcome);
            }
        }
    }

    Ok(stats)
}
