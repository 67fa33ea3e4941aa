//! courseindex-pipeline — drives the course-registry event stream into the
//! reconciliation store.
//!
//! # Components
//!
//! - [`PipelineConfig`]: contract, starting block, store URL
//! - [`EventRouter`]: address filter + selector dispatch
//! - [`Pipeline`]: the block-at-a-time driver with cursor commits
//! - [`BlockSource`]: transport abstraction the driver pulls blocks from
//!
//! # Example
//!
//! ```no_run
//! use courseindex_pipeline::{Pipeline, PipelineConfig};
//! use courseindex_store::SqliteStore;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig::default();
//! let store = SqliteStore::open("courseindex.db").await?;
//! let pipeline = Pipeline::new(config, store).await?;
//! println!("resume from block {}", pipeline.resume_block());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod handlers;
pub mod router;

pub use config::PipelineConfig;
pub use driver::{BlockOutcome, BlockSource, Pipeline, StreamSource};
pub use error::IndexError;
pub use router::{EventRouter, RouterState};
