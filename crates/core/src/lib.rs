//! Core domain types for the pagechain list index.
//!
//! This crate defines the data model shared by the store and the server:
//! - List and page identifiers
//! - Validated articles
//! - Lists, pages, and page views
//! - Configuration

pub mod article;
pub mod config;
pub mod error;
pub mod ids;
pub mod page;

pub use article::{Article, NewArticle};
pub use error::{Error, Result};
pub use ids::{ListId, PageId};
pub use page::{List, ListHead, PageRef, PageView};

/// Default number of articles a page holds before the chain is extended.
pub const DEFAULT_PAGE_CAPACITY: u32 = 5;

/// Upper bound on configurable page capacity.
pub const MAX_PAGE_CAPACITY: u32 = 10_000;
