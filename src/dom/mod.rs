//! Browser rendering for modals.

mod adapter;
pub(crate) mod utils;

pub use adapter::DomAdapter;
