//! Continuous force-directed bubble layout.
//!
//! [`motion::MotionEngine`] owns a live simulation of sized circles that
//! avoid overlap, cluster by category, stay inside the canvas and can be
//! regrouped by a record field. [`records`] holds the input model.

pub mod motion;
pub mod records;
pub mod util;
