use futures::{stream, Stream, StreamExt};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::config::Pacing;
use crate::enrich::Enricher;
use crate::limiter::{RateLimitedExt, RateLimiter};
use crate::model::{BusinessId, BusinessRecord};
use crate::signal::{is_cancelled, pause, Stop};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum Progress {
    Started {
        total: usize,
    },
    Enriched {
        id: BusinessId,
        done: usize,
        total: usize,
    },
    Skipped {
        id: BusinessId,
        done: usize,
        total: usize,
    },
    Finished {
        done: usize,
        total: usize,
        cancelled: bool,
    },
}

impl Progress {
    /// Rounded completion percentage
    pub fn percent(&self) -> u8 {
        match *self {
            Self::Started { .. } => 0,
            Self::Enriched { done, total, .. }
            | Self::Skipped { done, total, .. }
            | Self::Finished { done, total, .. } => percent(done, total),
        }
    }
}

pub(crate) fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((done.min(total) as f64 / total as f64) * 100.0).round() as u8
}

#[derive(Debug, Clone, Default)]
pub struct ProgressTx {
    tx: Option<mpsc::UnboundedSender<Progress>>,
}

impl ProgressTx {
    pub fn new(tx: mpsc::UnboundedSender<Progress>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Drops every event
    pub fn discard() -> Self {
        Self { tx: None }
    }

    pub fn send(&self, event: Progress) {
        if let Some(tx) = &self.tx {
            if let Err(e) = tx.send(event) {
                log::debug!("Couldn't send progress: {e}");
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichmentReport {
    /// Enriched records in input order
    pub enriched: Vec<BusinessRecord>,
    /// Records the enrichment step had nothing for, in input order
    pub skipped: Vec<BusinessId>,
    pub cancelled: bool,
}

type Outcome = (usize, BusinessId, anyhow::Result<Option<BusinessRecord>>);

/// Runs the enrichment step over `records` with the given pacing.
///
/// Results keep the input order whatever the pacing. A stop request ends
/// the run early with whatever finished so far.
pub async fn enrich_all(
    enricher: &Enricher,
    records: &[BusinessRecord],
    pacing: Pacing,
    stop: &Stop,
    progress: &ProgressTx,
) -> anyhow::Result<EnrichmentReport> {
    let total = records.len();
    progress.send(Progress::Started { total });
    log::info!("Enriching {total} businesses with {pacing:?}");

    let items = stream::iter(records.iter().enumerate());

    let mut outcomes = match pacing {
        Pacing::Sequential { delay_ms } => {
            let paced = items.then(move |(idx, record)| async move {
                if idx > 0 {
                    if let Err(e) = pause(delay_ms, stop).await {
                        return (idx, record.id, Err(e));
                    }
                }
                extract_one(enricher, idx, record, stop).await
            });
            collect(paced, stop, progress, total).await?
        }
        Pacing::Concurrent(n) => {
            let running = items
                .map(move |(idx, record)| extract_one(enricher, idx, record, stop))
                .buffer_unordered(n.get());
            collect(running, stop, progress, total).await?
        }
        Pacing::PerSecond(n) => {
            let running = items
                .map(move |(idx, record)| extract_one(enricher, idx, record, stop))
                .rate_limited(RateLimiter::new(n.get()));
            collect(running, stop, progress, total).await?
        }
    };

    outcomes.sort_by_key(|(idx, _, _)| *idx);

    let mut report = EnrichmentReport::default();
    for (_, id, outcome) in outcomes {
        match outcome {
            Ok(Some(record)) => report.enriched.push(record),
            Ok(None) => report.skipped.push(id),
            Err(_) => report.cancelled = true,
        }
    }
    report.cancelled |= stop.is_stopped();

    let done = report.enriched.len() + report.skipped.len();
    progress.send(Progress::Finished {
        done,
        total,
        cancelled: report.cancelled,
    });
    if report.cancelled {
        log::warn!("Enrichment stopped after {done} of {total} businesses");
    } else {
        log::info!(
            "Enriched {} businesses, skipped {}",
            report.enriched.len(),
            report.skipped.len()
        );
    }

    Ok(report)
}

async fn extract_one(
    enricher: &Enricher,
    idx: usize,
    record: &BusinessRecord,
    stop: &Stop,
) -> Outcome {
    (idx, record.id, enricher.extract(record, stop).await)
}

async fn collect<S>(
    outcomes: S,
    stop: &Stop,
    progress: &ProgressTx,
    total: usize,
) -> anyhow::Result<Vec<Outcome>>
where
    S: Stream<Item = Outcome>,
{
    let mut done = 0;
    let mut collected = vec![];
    let mut outcomes = Box::pin(outcomes.take_until(stop.stopped()));
    while let Some((idx, id, outcome)) = outcomes.next().await {
        match &outcome {
            Ok(Some(_)) => {
                done += 1;
                progress.send(Progress::Enriched { id, done, total });
            }
            Ok(None) => {
                done += 1;
                progress.send(Progress::Skipped { id, done, total });
            }
            Err(e) if is_cancelled(e) => {}
            Err(e) => return Err(anyhow::anyhow!("Enrichment of {id} failed: {e}")),
        }
        collected.push((idx, id, outcome));
    }
    Ok(collected)
}
