//! # Roster Match
//!
//! Resolve free-text instructor names against a harvested roster of
//! instructor ratings.
//!
//! The roster is crawled from a paginated GraphQL listing and kept on disk as
//! a single JSON snapshot. Lookups load the snapshot, fuzzy-match each name
//! against every record, and return rating statistics for the names that
//! resolve.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ RosterSource │──▶│    crawl     │──▶│   snapshot   │
//! │  (GraphQL)   │   │  (paginate)  │   │    (JSON)    │
//! └──────────────┘   └──────────────┘   └──────┬───────┘
//!                                              │ ensure_available + load
//!                       ┌──────────────────────┤
//!                       ▼                      ▼
//!                 ┌──────────┐           ┌──────────┐
//!                 │   CLI    │           │   HTTP   │
//!                 │ (roster) │           │ (axum)   │
//!                 └────┬─────┘           └────┬─────┘
//!                      └─────────┬────────────┘
//!                                ▼
//!                         resolve_batch
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! roster crawl                            # fetch the roster
//! roster resolve "Jane Smith" "J. Doe"    # look names up
//! roster serve                            # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Roster record and match result types |
//! | [`similarity`] | Sequence-alignment similarity ratio |
//! | [`resolver`] | Threshold-gated best-match name resolution |
//! | [`source`] | Paginated remote source and page decoding |
//! | [`acquire`] | Crawl loop and on-demand snapshot population |
//! | [`snapshot`] | Snapshot load and full-replace write |
//! | [`lookup`] | CLI resolve / sample commands |
//! | [`server`] | HTTP server |

pub mod acquire;
pub mod config;
pub mod lookup;
pub mod models;
pub mod resolver;
pub mod server;
pub mod similarity;
pub mod snapshot;
pub mod source;
