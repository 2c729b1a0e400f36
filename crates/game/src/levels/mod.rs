//! Concrete levels.

mod button_drop;

pub use button_drop::{ButtonDropConfig, ButtonDropLevel};
