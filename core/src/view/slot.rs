//! Slot records and the arguments used to write them.

use std::fmt;

use serde_json::Value;

use super::template::{TemplateFuture, TemplateSource};

/// Arguments of a slot write. Used both by direct store calls and by the view
/// bindings declared on a state.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewArgs {
    pub template: TemplateSource,
    pub controller: Option<String>,
    pub locals: Option<Value>,
    /// Repeated writes with the same tag collapse into a refresh.
    pub sticky: Option<String>,
}

impl ViewArgs {
    pub fn new(template: TemplateSource) -> Self {
        Self {
            template,
            controller: None,
            locals: None,
            sticky: None,
        }
    }

    pub fn controller(mut self, controller: impl Into<String>) -> Self {
        self.controller = Some(controller.into());
        self
    }

    pub fn locals(mut self, locals: Value) -> Self {
        self.locals = Some(locals);
        self
    }

    pub fn sticky(mut self, tag: impl Into<String>) -> Self {
        self.sticky = Some(tag.into());
        self
    }
}

impl From<TemplateSource> for ViewArgs {
    fn from(template: TemplateSource) -> Self {
        Self::new(template)
    }
}

/// A committed slot.
#[derive(Clone)]
pub struct ViewSlot {
    pub name: String,
    /// The source the template was resolved from.
    pub source: TemplateSource,
    pub template: TemplateFuture,
    pub controller: Option<String>,
    pub locals: Option<Value>,
    pub sticky: Option<String>,
    /// Starts at 0 and moves by one on every write that is not a sticky refresh.
    pub version: u64,
}

impl ViewSlot {
    pub(crate) fn create(name: &str, args: ViewArgs, template: TemplateFuture) -> Self {
        Self {
            name: name.to_string(),
            source: args.template,
            template,
            controller: args.controller,
            locals: args.locals,
            sticky: args.sticky,
            version: 0,
        }
    }

    pub(crate) fn replace(&mut self, args: ViewArgs, template: TemplateFuture) {
        self.source = args.template;
        self.template = template;
        self.controller = args.controller;
        self.locals = args.locals;
        self.sticky = args.sticky;
        self.version += 1;
    }

    /// True when a write tagged `sticky` would be absorbed into a refresh.
    pub fn is_sticky_match(&self, sticky: Option<&str>) -> bool {
        matches!((sticky, self.sticky.as_deref()), (Some(new), Some(old)) if new == old)
    }
}

impl fmt::Debug for ViewSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewSlot")
            .field("name", &self.name)
            .field("source", &self.source)
            .field("controller", &self.controller)
            .field("locals", &self.locals)
            .field("sticky", &self.sticky)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}
