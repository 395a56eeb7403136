//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own session state, provider plumbing, and the listing
//! aggregation so route handlers stay focused on protocol translation and
//! cookie handling. The identity and storage backends sit behind traits;
//! everything above them is testable with in-memory fakes.

pub mod identity;
pub mod listing;
pub mod session;
pub mod storage;
