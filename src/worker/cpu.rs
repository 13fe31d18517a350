//! Worker thread for the nonce sweep.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;

use super::{SweepJob, SweepResult};

#[derive(Debug, Default)]
pub struct SweepStats {
    pub predicted: AtomicU64,
}

impl SweepStats {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn total_predicted(&self) -> u64 {
        self.predicted.load(Ordering::Relaxed)
    }
}

/// Handles offsets `id, id + stride, id + 2 * stride, ..` of the sweep.
pub struct CpuWorker {
    id: usize,
    stride: u64,
    job: Arc<SweepJob>,
    result_tx: Sender<SweepResult>,
    stop_flag: Arc<AtomicBool>,
    stats: Arc<SweepStats>,
}

impl CpuWorker {
    pub fn new(
        id: usize,
        stride: u64,
        job: Arc<SweepJob>,
        result_tx: Sender<SweepResult>,
        stop_flag: Arc<AtomicBool>,
        stats: Arc<SweepStats>,
    ) -> Self {
        Self {
            id,
            stride,
            job,
            result_tx,
            stop_flag,
            stats,
        }
    }

    pub fn run(&self) {
        let mut offset = self.id as u64;

        while offset < self.job.count {
            if self.stop_flag.load(Ordering::Relaxed) {
                break;
            }
            // past 2^256 - 1 there are no more nonces
            let Some(nonce) = self.job.start.checked_add(offset) else {
                break;
            };

            let salt = self
                .job
                .variant
                .compose_with_hash(&self.job.initializer_hash, &nonce);
            let address = self.job.deployment.address(&salt);

            if self
                .result_tx
                .send(SweepResult {
                    nonce,
                    salt,
                    address,
                })
                .is_err()
            {
                break;
            }
            self.stats.predicted.fetch_add(1, Ordering::Relaxed);

            let Some(next) = offset.checked_add(self.stride) else {
                break;
            };
            offset = next;
        }
    }
}
