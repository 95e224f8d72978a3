//! Atomic publishing and rollback for the survey pipeline.
//!
//! This crate owns the promotion of cleaned survey datasets from the
//! staging area into the stable directory that the dashboard reads.
//!
//! # Publish flow
//!
//! A publish validates the staging area, backs up the previous stable
//! generation, consolidates scattered run subdirectories into one flat
//! source, atomically swaps it into place, writes a publication record
//! beside the new datasets, and archives the consumed staging content:
//!
//! ```no_run
//! use sp_common::RunTimestamp;
//! use sp_config::PipelineConfig;
//! use sp_publish::PublishEngine;
//!
//! let engine = PublishEngine::new(PipelineConfig::default(), "/srv/survey");
//! let receipt = engine.publish(&RunTimestamp::now(), false).unwrap();
//! println!("published {} records", receipt.total_records);
//! ```
//!
//! # Guarantees
//!
//! - The stable directory is never observed in a partially written
//!   state: the swap renames the old generation aside and only removes
//!   it once the new generation is in place.
//! - Every replaced generation is backed up first (`stable_backup_<ts>`)
//!   unless the backup policy is disabled.
//! - Rollback restores a backup through the same swap primitive, after
//!   snapshotting the current state (`pre_rollback_<ts>`).
//! - Publish and rollback are mutually excluded by an advisory lock
//!   file; contention is an immediate error, not a wait.

pub mod engine;
pub mod error;
pub mod fsops;
pub mod lock;
pub mod record;
pub mod staging;

pub use engine::{
    PublicationStatus, PublishEngine, PublishReceipt, RollbackReceipt, PRE_ROLLBACK_PREFIX,
    STABLE_BACKUP_PREFIX,
};
pub use error::{PublishError, Result};
pub use lock::{PublishLock, LOCK_FILE_NAME};
pub use record::{PublicationRecord, RecordStore, RECORD_PREFIX};
pub use staging::{validate_staging, DatasetDescriptor, StagingReport};
