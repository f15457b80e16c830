//! Cleanuva Sales Hub: fleet sizing, ROI projection and quotations for
//! robotic solar panel cleaning.

pub mod domain;
pub mod infra;
pub mod util;
