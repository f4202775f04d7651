//! Forge: bookkeeping for agent work.
//!
//! Shards are units of work owned by agents. Every record agents exchange is
//! validated field by field ([`schema`]), then checked against policy
//! ([`policy`]). Shards move through their lifecycle under a
//! [`lifecycle::ShardManager`], and what happened along the way is appended
//! to the journal by a [`journal::JournalRecorder`].

pub mod clock;
pub mod config;
pub mod identity;
pub mod journal;
pub mod lifecycle;
pub mod model;
pub mod policy;
pub mod report;
pub mod schema;
pub mod storage;
