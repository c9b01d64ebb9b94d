pub mod record;
pub mod rewards;
pub mod selection;
pub mod spatial;

pub use record::*;
pub use rewards::*;
pub use selection::*;
pub use spatial::*;
