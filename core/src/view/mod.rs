//! # View store
//!
//! Named slots whose template, controller and locals are managed centrally.
//! A transition updates several slots at once through a transaction so that
//! renderers never observe a half-applied state.

pub mod events;
pub mod slot;
pub mod store;
pub mod template;
pub mod transaction;

pub use events::{RefreshPayload, ViewEvent};
pub use slot::{ViewArgs, ViewSlot};
pub use store::ViewStore;
pub use template::{InlineTemplateResolver, TemplateFuture, TemplateResolver, TemplateSource};
pub use transaction::ViewTransaction;
