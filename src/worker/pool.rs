//! Worker pool for the nonce sweep.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use tracing::{error, info, warn};

use crate::crypto::{initializer_hash, Address, SaltVariant, Word};
use crate::predict::ProxyDeployment;

use super::cpu::{CpuWorker, SweepStats};

/// One sweep over nonces `[start, start + count)`.
///
/// The deployment is prepared from creation code read once before the sweep,
/// so every result reflects that single snapshot of the factory.
#[derive(Debug, Clone)]
pub struct SweepJob {
    pub deployment: ProxyDeployment,
    pub initializer_hash: [u8; 32],
    pub variant: SaltVariant,
    pub start: Word,
    pub count: u64,
}

impl SweepJob {
    pub fn new(
        deployment: ProxyDeployment,
        initializer: &[u8],
        variant: SaltVariant,
        start: Word,
        count: u64,
    ) -> Self {
        Self {
            deployment,
            initializer_hash: initializer_hash(initializer),
            variant,
            start,
            count,
        }
    }
}

/// A predicted proxy address for one nonce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepResult {
    /// Salt nonce to pass to the factory.
    pub nonce: Word,
    /// CREATE2 salt the factory derives from it.
    pub salt: [u8; 32],
    pub address: Address,
}

/// Some workers died mid-sweep, so the results have gaps.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{panicked} of {workers} sweep workers panicked")]
pub struct WorkerPanicked {
    pub panicked: usize,
    pub workers: usize,
}

impl SweepResult {
    pub fn salt_hex(&self) -> String {
        hex::encode(self.salt)
    }

    /// One line of `--check-deployed` output.
    pub fn deployment_status(&self, deployed: bool) -> String {
        let label = if deployed { "Already deployed:" } else { "Free:" };
        format!("{:<18}{} (nonce {})", label, self.address, self.nonce)
    }
}

pub struct WorkerPool {
    num_workers: usize,
    count: u64,
    handles: Option<Vec<JoinHandle<()>>>,
    result_rx: Receiver<SweepResult>,
    stop_flag: Arc<AtomicBool>,
    stats: Arc<SweepStats>,
    start_time: Instant,
}

impl WorkerPool {
    pub fn new(num_workers: usize, job: SweepJob) -> Self {
        let num_workers = num_workers.max(1);
        let (result_tx, result_rx) = bounded(100);
        let stop_flag = Arc::new(AtomicBool::new(false));
        let stats = Arc::new(SweepStats::new());
        let count = job.count;
        let job = Arc::new(job);

        let handles = (0..num_workers)
            .filter_map(|id| {
                let job = job.clone();
                let result_tx = result_tx.clone();
                let stop_flag = stop_flag.clone();
                let stats = stats.clone();

                thread::Builder::new()
                    .name(format!("sweep-worker-{}", id))
                    .spawn(move || {
                        let worker = CpuWorker::new(
                            id,
                            num_workers as u64,
                            job,
                            result_tx,
                            stop_flag,
                            stats,
                        );
                        worker.run();
                    })
                    .inspect_err(|e| warn!(worker = id, error = %e, "failed to spawn sweep worker"))
                    .ok()
            })
            .collect::<Vec<_>>();

        // with fewer threads the strides leave gaps
        if handles.len() < num_workers {
            stop_flag.store(true, Ordering::Relaxed);
        }

        drop(result_tx);

        Self {
            num_workers,
            count,
            handles: Some(handles),
            result_rx,
            stop_flag,
            stats,
            start_time: Instant::now(),
        }
    }

    /// Receives results until every worker has finished or stopped, logging
    /// progress every `report_interval`. Results are ordered by nonce.
    pub fn collect(self, report_interval: Duration) -> Result<Vec<SweepResult>, WorkerPanicked> {
        let mut results = Vec::with_capacity(self.count.min(1 << 16) as usize);

        loop {
            match self.result_rx.recv_timeout(report_interval) {
                Ok(result) => results.push(result),
                Err(RecvTimeoutError::Timeout) => info!(
                    predicted = self.total_predicted(),
                    target = self.count,
                    rate = %format!("{:.0}/s", self.predictions_per_second()),
                    "sweep in progress"
                ),
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        info!(
            predicted = results.len(),
            elapsed = %format!("{:.2}s", self.elapsed().as_secs_f64()),
            "sweep finished"
        );

        let workers = self.num_workers;
        let panicked = self.join();
        if panicked > 0 {
            return Err(WorkerPanicked { panicked, workers });
        }
        results.sort_by(|a, b| a.nonce.cmp(&b.nonce));
        Ok(results)
    }

    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Relaxed);
    }

    /// Stops and joins every worker. Returns how many of them panicked.
    pub fn join(mut self) -> usize {
        self.stop();
        self.handles.take().map(join_workers).unwrap_or(0)
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }
    pub fn total_predicted(&self) -> u64 {
        self.stats.total_predicted()
    }
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
    pub fn predictions_per_second(&self) -> f64 {
        let t = self.elapsed().as_secs_f64();
        if t > 0.0 {
            self.total_predicted() as f64 / t
        } else {
            0.0
        }
    }
    pub fn stop_flag_clone(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }
    pub fn is_stopped(&self) -> bool {
        self.stop_flag.load(Ordering::Relaxed)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.stop();
        if let Some(h) = self.handles.take() {
            join_workers(h);
        }
    }
}

fn join_workers(handles: Vec<JoinHandle<()>>) -> usize {
    let mut panicked = 0;
    for handle in handles {
        let name = handle.thread().name().unwrap_or("sweep-worker").to_string();
        if let Err(payload) = handle.join() {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(worker = %name, %reason, "sweep worker panicked");
            panicked += 1;
        }
    }
    panicked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::{derive_address, Backend};

    const CODE: [u8; 4] = [0x60, 0x80, 0x60, 0x40];

    fn deployment() -> ProxyDeployment {
        ProxyDeployment::prepare(
            Backend::Standard,
            &Address::from_bytes([0xaa; 20]),
            &Address::from_bytes([0x41; 20]),
            &CODE,
        )
        .unwrap()
    }

    #[test]
    fn test_sweep_covers_range_in_order() {
        let job = SweepJob::new(deployment(), b"setup", SaltVariant::Plain, Word::from_u64(10), 37);
        let results = WorkerPool::new(4, job).collect(Duration::from_secs(5)).unwrap();

        assert_eq!(results.len(), 37);
        for (i, result) in results.iter().enumerate() {
            let nonce = Word::from_u64(10 + i as u64);
            assert_eq!(result.nonce, nonce);
            let salt = SaltVariant::Plain.compose(b"setup", &nonce);
            assert_eq!(result.salt, salt);
            let expected = derive_address(
                Backend::Standard,
                &Address::from_bytes([0xaa; 20]),
                &Address::from_bytes([0x41; 20]),
                &salt,
                &CODE,
            )
            .unwrap();
            assert_eq!(result.address, expected);
        }
    }

    #[test]
    fn test_sweep_stops_at_max_nonce() {
        let max = Word::from_be_bytes([0xff; 32]);
        let start = Word::from_be_bytes({
            let mut b = [0xff; 32];
            b[31] = 0xfd;
            b
        });
        let job = SweepJob::new(deployment(), &[], SaltVariant::Plain, start, 10);
        let results = WorkerPool::new(3, job).collect(Duration::from_secs(5)).unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results.last().map(|r| r.nonce), Some(max));
    }

    #[test]
    fn test_sweep_more_workers_than_nonces() {
        let job = SweepJob::new(
            deployment(),
            &[],
            SaltVariant::ChainSpecific(Word::from_u64(1)),
            Word::ZERO,
            2,
        );
        let pool = WorkerPool::new(8, job);
        assert_eq!(pool.num_workers(), 8);
        let results = pool.collect(Duration::from_secs(5)).unwrap();
        assert_eq!(results.len(), 2);
        assert_ne!(results[0].address, results[1].address);
    }

    #[test]
    fn test_stopped_pool_yields_partial_results() {
        let job = SweepJob::new(deployment(), &[], SaltVariant::Plain, Word::ZERO, u64::MAX);
        let pool = WorkerPool::new(2, job);
        pool.stop();
        assert!(pool.is_stopped());
        let results = pool.collect(Duration::from_millis(50)).unwrap();
        // channel capacity plus one in-flight send per worker
        assert!(results.len() <= 102);
    }

    #[test]
    fn test_join_counts_panicked_workers() {
        let handles = vec![
            thread::spawn(|| {}),
            thread::spawn(|| panic!("boom")),
            thread::spawn(|| panic!("{}", String::from("bad nonce"))),
        ];
        assert_eq!(join_workers(handles), 2);
    }

    #[test]
    fn test_worker_panicked_message() {
        let err = WorkerPanicked {
            panicked: 1,
            workers: 4,
        };
        assert_eq!(err.to_string(), "1 of 4 sweep workers panicked");
    }

    #[test]
    fn test_deployment_status_lines() {
        let result = SweepResult {
            nonce: Word::from_u64(7),
            salt: [0u8; 32],
            address: "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed".parse().unwrap(),
        };
        assert_eq!(
            result.deployment_status(true),
            "Already deployed: 0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed (nonce 7)"
        );
        assert_eq!(
            result.deployment_status(false),
            "Free:             0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed (nonce 7)"
        );
    }
}
