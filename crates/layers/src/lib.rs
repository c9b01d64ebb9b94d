pub mod canvas;
pub mod config;
pub mod content;
pub mod expansion;
pub mod factory;
pub mod layer;
pub mod overlay;
pub mod reconcile;
pub mod registry;
pub mod route_line;
pub mod station_layer;
pub mod symbology;

pub use canvas::*;
pub use config::*;
pub use content::*;
pub use expansion::*;
pub use factory::*;
pub use layer::*;
pub use overlay::*;
pub use reconcile::*;
pub use registry::*;
pub use route_line::*;
pub use station_layer::*;
pub use symbology::*;
