pub mod executor;
pub mod registry;
