mod load;
mod types;

pub use load::{get_staterail_data_dir, load_default, load_from_path, load_states};
pub use types::{
    AppConfig, LoggingConfig, StateConfig, StatesConfig, TemplatesConfig, TransitionsConfig,
    ViewConfig, ViewsConfig,
};
