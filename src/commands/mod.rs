mod config;
mod copy;
mod install;

pub use config::{detect_package_manager, get_config, init, set_config};
pub use copy::copy;
pub use install::install;
