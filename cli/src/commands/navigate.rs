use staterail_core::api::{AppContext, TransitionEvent, TransitionOutcome, TransitionParams, ViewEvent};
use staterail_plugins::route::RouteTable;
use tokio::sync::broadcast;

use super::cli::GotoArgs;
use crate::error::CliError;
use crate::render;

/// Prints notifications produced by each navigation step.
struct Session<'a> {
    ctx: &'a AppContext,
    transitions: broadcast::Receiver<TransitionEvent>,
    views: broadcast::Receiver<ViewEvent>,
    json: bool,
    incomplete: usize,
}

impl<'a> Session<'a> {
    fn new(ctx: &'a AppContext, json: bool) -> Self {
        Self {
            ctx,
            transitions: ctx.coordinator().subscribe(),
            views: ctx.views().subscribe(),
            json,
            incomplete: 0,
        }
    }

    fn report(&mut self, outcome: Option<&TransitionOutcome>) {
        while let Ok(event) = self.transitions.try_recv() {
            if self.json {
                println!("{}", render::transition_json(&event));
            } else {
                println!("{}", render::format_transition(&event));
            }
        }
        while let Ok(event) = self.views.try_recv() {
            if self.json {
                println!("{}", render::view_json(&event));
            } else {
                println!("{}", render::format_view(&event));
            }
        }

        match outcome {
            Some(outcome) => {
                if !outcome.is_completed() {
                    self.incomplete += 1;
                }
                if !self.json {
                    println!("{}", render::format_outcome(outcome));
                }
            }
            None => {
                if !self.json {
                    println!("=> {} (search parameters updated)", self.ctx.coordinator().current());
                }
            }
        }
    }

    fn exit_code(&self) -> i32 {
        if self.incomplete == 0 {
            0
        } else {
            1
        }
    }
}

pub async fn navigate_paths(
    ctx: &AppContext,
    table: &RouteTable,
    paths: &[String],
    json: bool,
) -> Result<i32, CliError> {
    let coordinator = ctx.coordinator();
    let mut session = Session::new(ctx, json);

    for path in paths {
        let matched = table.match_path(path);
        if matched.is_none() {
            tracing::info!(path = %path, "no route matches, navigating to root");
        }
        let outcome = coordinator.on_route_change(matched).await?;
        session.report(outcome.as_ref());
    }

    Ok(session.exit_code())
}

pub async fn goto_states(ctx: &AppContext, args: &GotoArgs, json: bool) -> Result<i32, CliError> {
    let params = parse_params(&args.params)?;
    let coordinator = ctx.coordinator();
    let mut session = Session::new(ctx, json);

    for state in &args.states {
        let outcome = coordinator.goto_with_params(state, params.clone()).await?;
        session.report(Some(&outcome));
    }
    if args.reload {
        let outcome = coordinator.reload().await?;
        session.report(Some(&outcome));
    }

    Ok(session.exit_code())
}

/// Parses `KEY=VALUE` pairs into path parameters.
pub fn parse_params(raw: &[String]) -> Result<TransitionParams, CliError> {
    let mut params = TransitionParams::new();
    for pair in raw {
        let Some((key, value)) = pair.split_once('=') else {
            return Err(CliError::Command(format!(
                "invalid --param '{pair}', expected KEY=VALUE"
            )));
        };
        if key.trim().is_empty() {
            return Err(CliError::Command(format!("empty key in --param '{pair}'")));
        }
        params = params.path_param(key.trim(), value);
    }
    Ok(params)
}
