//! Repository traits for index operations.

pub mod articles;
pub mod chain;
pub mod lists;
pub mod pages;

pub use articles::ArticleRepo;
pub use chain::{ChainRepo, ChainTx};
pub use lists::ListRepo;
pub use pages::PageRepo;
