pub mod factory;
pub mod route;
pub mod services;
pub mod template;
