//! Handle pool module
//!
//! Generational handles and the fixed-capacity slot pool behind them.

mod handle_pool;

pub use handle_pool::{Handle, HandlePool};
