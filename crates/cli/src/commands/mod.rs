pub mod migrate;
pub mod snippet;
pub mod store;
