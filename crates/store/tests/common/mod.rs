//! Common test utilities and fixtures.

pub mod counting;
pub mod fixtures;
pub mod store;

#[allow(unused_imports)]
pub use counting::*;
#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use store::*;
