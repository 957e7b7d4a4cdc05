//! Analysis module: batch extraction of structured market records
//!
//! - `partition`: per-board batching of accepted posts
//! - `prompt`: the instruction and input table sent with each batch
//! - `extractor`: the `Extractor` trait and the chat-completion backend
//! - `pool`: bounded concurrent execution with retries

mod extractor;
mod partition;
pub mod prompt;
mod pool;

pub use extractor::{BatchRequest, ChatCompletionExtractor, Extractor};
pub use partition::{partition, Batch, BoardBatches};
pub use pool::{check_output, AnalysisPool, BatchResult, BoardResults, PoolSettings};
