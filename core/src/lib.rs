pub mod api;
pub mod config;
pub mod context;
pub mod error;
pub mod state;
pub mod transition;
pub mod view;
