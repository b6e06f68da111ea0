//! Fetch pool: fans passenger names out to a bounded set of workers
//!
//! - `queue`: closable FIFO queue with cloneable sender/receiver handles
//! - `worker`: worker task that fetches one name at a time
//! - `fetch_pool`: producer, workers, supervisor and collector wiring

mod fetch_pool;
pub mod queue;
mod worker;

pub use fetch_pool::{FetchPool, ProgressCallback};
pub use queue::{closable_queue, QueueReceiver, QueueSender, QueueStats};
pub use worker::{Worker, WorkerStats};
