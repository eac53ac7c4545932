pub mod indicator;

pub use indicator::{reconcile, IndicatorWidget, INACTIVE_VARIANT};
