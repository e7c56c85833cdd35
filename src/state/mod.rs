//! State module for tracking feed progress
//!
//! - `ItemState`: lifecycle of a single feed within one run

mod item_state;

pub use item_state::ItemState;
