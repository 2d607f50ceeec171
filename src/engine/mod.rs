//! Pure interview rules. Nothing in here touches storage or the network.

pub mod category;
pub mod difficulty;
pub mod metrics;
pub mod report;
pub mod score_math;
pub mod termination;
