//! Yardage
//!
//! Yardage splits a length of fabric across the sizes of a garment, either to maximise
//! profit, to waste as little material as possible, or by fixed percentage shares.

pub mod allocation;
pub mod config;
pub mod logging;
pub mod percentages;
pub mod prelude;
pub mod profiles;
pub mod report;
