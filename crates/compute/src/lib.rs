pub mod analysis;

pub use analysis::aggregate::*;
pub use analysis::statistics::Statistics;
pub use analysis::temporal::TimeResolution;
