//! Journal engines and the robots that use them.

pub mod agents;
pub mod audit;
pub mod cycles;
pub mod journal;
pub mod quota;
