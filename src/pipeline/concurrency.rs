// src/pipeline/concurrency.rs
//!
//! Producer, worker and consumer stages for loading card artwork.
//!
//! ```text
//! Producer -> Channel -> Workers (N) -> Channel -> Consumer
//!    |                      |                         |
//! Card names         Resolve + fetch          Write by index
//! ```
//!
//! Every job carries its index. Workers finish in any order; the consumer
//! writes each result into its pre-assigned position.

use crate::pipeline::api::{BuildProgress, ProgressCallback};
use cardsheet_core::{CardError, CardLoader, SharedBitmap};
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::task::JoinSet;

// ============================================================================
// Type Aliases for Channel Types
// ============================================================================

/// Work item sent from producer to workers (index + card name).
pub(crate) type LoadJob = (usize, String);

/// Outcome of loading one card name.
pub(crate) type LoadOutcome = Result<SharedBitmap, CardError>;

/// Result sent from workers to consumer (index + name + outcome).
pub(crate) type LoadResult = (usize, String, LoadOutcome);

pub(crate) type LoadJobSender = async_channel::Sender<LoadJob>;
pub(crate) type LoadJobReceiver = async_channel::Receiver<LoadJob>;
pub(crate) type LoadResultSender = async_channel::Sender<LoadResult>;
pub(crate) type LoadResultReceiver = async_channel::Receiver<LoadResult>;

// ============================================================================
// Producer
// ============================================================================

/// Sends each name with its index to the workers, in order.
pub(crate) async fn producer_task(names: Vec<String>, tx: LoadJobSender) {
    info!("[PRODUCER] Queueing {} card names.", names.len());
    for (i, name) in names.into_iter().enumerate() {
        debug!("[PRODUCER] Sending #{} {:?} to workers.", i, name);
        if tx.send((i, name)).await.is_err() {
            warn!("[PRODUCER] Work channel closed, stopping producer.");
            break;
        }
    }
    info!("[PRODUCER] Finished.");
}

// ============================================================================
// Workers
// ============================================================================

/// Spawns `num_workers` tasks that load cards until the job channel closes.
pub(crate) fn spawn_workers(
    num_workers: usize,
    loader: &Arc<CardLoader>,
    rx: LoadJobReceiver,
    tx: LoadResultSender,
    tasks: &mut JoinSet<()>,
) {
    for worker_id in 0..num_workers {
        let rx = rx.clone();
        let tx = tx.clone();
        let loader = Arc::clone(loader);

        tasks.spawn(async move {
            debug!("[WORKER-{}] Started.", worker_id);
            while let Ok((index, name)) = rx.recv().await {
                let outcome = loader.load(&name).await;
                if let Err(e) = &outcome {
                    warn!("[WORKER-{}] {:?} failed: {}", worker_id, name, e);
                }
                if tx.send((index, name, outcome)).await.is_err() {
                    warn!("[WORKER-{}] Consumer channel closed.", worker_id);
                    break;
                }
            }
            debug!("[WORKER-{}] Shutting down.", worker_id);
        });
    }
}

// ============================================================================
// Consumer
// ============================================================================

/// Collects `total` results into index order, reporting progress as they land.
///
/// Returns early only if every worker is gone; missing entries are then `None`.
pub(crate) async fn collect_in_order(
    rx: LoadResultReceiver,
    total: usize,
    progress: Option<&ProgressCallback>,
) -> Vec<Option<LoadOutcome>> {
    let mut outcomes: Vec<Option<LoadOutcome>> = (0..total).map(|_| None).collect();
    let mut completed = 0;

    while completed < total {
        let (index, name, outcome) = match rx.recv().await {
            Ok(item) => item,
            Err(_) => {
                warn!("[CONSUMER] Result channel closed with {}/{} loads done.", completed, total);
                break;
            }
        };

        let Some(entry) = outcomes.get_mut(index).filter(|entry| entry.is_none()) else {
            warn!("[CONSUMER] Ignoring unexpected result #{} for {:?}.", index, name);
            continue;
        };
        *entry = Some(outcome);
        completed += 1;

        debug!("[CONSUMER] {}/{} loaded ({:?}).", completed, total, name);
        if let Some(callback) = progress {
            callback(&BuildProgress {
                completed,
                total,
                name,
            });
        }
    }
    outcomes
}

/// Loads every name with at most `concurrency` loads in flight.
///
/// Dropping the returned future aborts all stage tasks; the caches are left
/// consistent because each insert is a complete value.
pub(crate) async fn load_all(
    loader: &Arc<CardLoader>,
    names: Vec<String>,
    concurrency: usize,
    progress: Option<&ProgressCallback>,
) -> Vec<Option<LoadOutcome>> {
    let total = names.len();
    if total == 0 {
        return Vec::new();
    }
    let num_workers = concurrency.clamp(1, total);
    let channel_buffer_size = num_workers;
    info!("Loading {} distinct cards with {} workers.", total, num_workers);

    let (job_tx, job_rx) = async_channel::bounded::<LoadJob>(channel_buffer_size);
    let (result_tx, result_rx) = async_channel::bounded::<LoadResult>(channel_buffer_size);

    let mut tasks = JoinSet::new();
    tasks.spawn(producer_task(names, job_tx));
    spawn_workers(num_workers, loader, job_rx, result_tx, &mut tasks);

    let outcomes = collect_in_order(result_rx, total, progress).await;

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            warn!("Pipeline task ended abnormally: {}", e);
        }
    }
    outcomes
}
