pub mod latest;
pub mod metrics;
pub mod viewport;

pub use latest::*;
pub use metrics::*;
pub use viewport::*;
