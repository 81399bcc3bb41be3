//! Human and JSON renderings of trees, routes and notifications.

use std::fmt::Write;

use serde_json::{json, Value};
use staterail_core::api::{
    StateTree, TransitionEvent, TransitionKind, TransitionOutcome, ViewEvent,
};

fn kind_label(kind: TransitionKind) -> &'static str {
    match kind {
        TransitionKind::Start => "start",
        TransitionKind::Between => "between",
        TransitionKind::Success => "success",
        TransitionKind::Error => "error",
        TransitionKind::After => "after",
    }
}

/// One line per state, indented by depth.
pub fn format_tree(tree: &StateTree) -> String {
    let mut out = String::new();
    for (depth, id) in tree.walk() {
        let node = tree.node(id);
        let _ = write!(out, "{}{}", "  ".repeat(depth), node.name());
        if let Some(route) = node.route() {
            let _ = write!(out, "  {route}");
        }
        if !node.views().is_empty() {
            let slots: Vec<&str> = node.views().iter().map(|(slot, _)| slot.as_str()).collect();
            let _ = write!(out, "  [{}]", slots.join(", "));
        }
        out.push('\n');
    }
    out
}

pub fn format_routes(tree: &StateTree) -> String {
    let width = tree
        .routes()
        .iter()
        .map(|r| r.pattern.len())
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for binding in tree.routes() {
        let _ = write!(out, "{:<width$}  -> {}", binding.pattern, binding.meta.state);
        if !binding.meta.reload_on_search {
            out.push_str("  (search changes do not reload)");
        }
        out.push('\n');
    }
    out
}

pub fn format_transition(event: &TransitionEvent) -> String {
    let mut line = format!(
        "[#{}] {:<8} {} -> {}",
        event.attempt,
        kind_label(event.kind),
        event.from,
        event.to
    );
    if let Some(err) = &event.error {
        let _ = write!(line, " ({err})");
    }
    line
}

pub fn format_view(event: &ViewEvent) -> String {
    match event {
        ViewEvent::Updated { name } => format!("      view {name} updated"),
        ViewEvent::Refreshed { name, payload } => match &payload.sticky {
            Some(tag) => format!("      view {name} refreshed (sticky {tag})"),
            None => format!("      view {name} refreshed"),
        },
    }
}

pub fn format_outcome(outcome: &TransitionOutcome) -> String {
    match outcome {
        TransitionOutcome::Completed { state } => format!("=> {state}"),
        TransitionOutcome::Cancelled => "=> cancelled".to_string(),
        TransitionOutcome::Failed(err) => format!("=> failed: {err}"),
        TransitionOutcome::Superseded => "=> superseded".to_string(),
    }
}

pub fn transition_json(event: &TransitionEvent) -> Value {
    json!({
        "type": "transition",
        "kind": kind_label(event.kind),
        "attempt": event.attempt,
        "from": event.from,
        "to": event.to,
        "params": event.params,
        "error": event.error.as_ref().map(|e| e.to_string()),
        "ts": event.timestamp.to_rfc3339(),
    })
}

pub fn view_json(event: &ViewEvent) -> Value {
    match event {
        ViewEvent::Updated { name } => json!({ "type": "view", "kind": "updated", "slot": name }),
        ViewEvent::Refreshed { name, payload } => json!({
            "type": "view",
            "kind": "refreshed",
            "slot": name,
            "sticky": payload.sticky,
            "locals": payload.resolved_locals,
        }),
    }
}
