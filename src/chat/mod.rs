pub mod cache;
pub mod engine;
pub mod events;
pub mod identity;
pub mod merge;
pub mod message;
pub mod render;
