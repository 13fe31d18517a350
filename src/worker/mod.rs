//! Parallel nonce sweep: predicts the addresses of a range of salt nonces.

mod cpu;
mod pool;

pub use cpu::{CpuWorker, SweepStats};
pub use pool::{SweepJob, SweepResult, WorkerPanicked, WorkerPool};
