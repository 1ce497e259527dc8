//! Run status snapshots and their console report.

pub mod status;
