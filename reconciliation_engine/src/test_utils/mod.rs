pub mod fixtures;
pub mod prepare_env;
