pub mod config;
pub mod input;
pub mod replay;

pub use config::{AppConfig, ConfigError};
pub use input::{InputError, load_json, load_rewards, load_stations};
pub use replay::{ScriptStep, StepReport, run_script};
