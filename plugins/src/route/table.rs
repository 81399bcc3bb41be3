use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::{PoisonError, RwLock};

use lazy_static::lazy_static;
use regex::Regex;
use staterail_core::api::{RouteBinding, RouteMatch, RouteMeta, RouteRegistry};
use url::form_urlencoded;

lazy_static! {
    // `:name`, `{name}` or `{conv(arg):name}`
    static ref PARAM_RE: Regex =
        Regex::new(r":(\w+)|\{(?:(\w+)(?:\((.*?)\))?:)?(\w+)\}").unwrap();
}

struct CompiledRoute {
    binding: RouteBinding,
    regex: Regex,
    params: Vec<String>,
}

/// Regex-backed route matcher fed by the state tree's registrations.
///
/// Routes are tried in registration order; the first full match wins. A
/// trailing `/` on the path is ignored. Parameters match one segment, except
/// `{int:name}` (digits) and `{regex(expr):name}` (the given expression).
#[derive(Default)]
pub struct RouteTable {
    routes: RwLock<Vec<CompiledRoute>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bindings(&self) -> Vec<RouteBinding> {
        self.routes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|r| r.binding.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.routes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Matches `url` (path plus optional `?query`). `None` when no route matches.
    pub fn match_path(&self, url: &str) -> Option<RouteMatch> {
        let (path, query) = match url.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (url, None),
        };
        let path = match path.strip_suffix('/') {
            Some(trimmed) if !trimmed.is_empty() => trimmed,
            _ => path,
        };

        let routes = self.routes.read().unwrap_or_else(PoisonError::into_inner);
        routes.iter().find_map(|route| {
            let caps = route.regex.captures(path)?;
            let path_params = route
                .params
                .iter()
                .enumerate()
                .filter_map(|(i, name)| {
                    caps.name(&format!("p{i}"))
                        .map(|m| (name.clone(), decode_segment(m.as_str())))
                })
                .collect();
            Some(RouteMatch {
                state: Some(route.binding.meta.state.clone()),
                path_params,
                search_params: query.map(parse_query).unwrap_or_default(),
            })
        })
    }
}

impl RouteRegistry for RouteTable {
    fn register(&self, pattern: &str, meta: RouteMeta) {
        let (regex, params) = match compile(pattern) {
            Ok(compiled) => compiled,
            Err(err) => {
                tracing::warn!(pattern = %pattern, error = %err, "route pattern rejected");
                return;
            }
        };
        tracing::debug!(pattern = %pattern, state = %meta.state, "route registered");

        let mut routes = self.routes.write().unwrap_or_else(PoisonError::into_inner);
        routes.retain(|r| r.binding.meta.state != meta.state);
        routes.push(CompiledRoute {
            binding: RouteBinding {
                pattern: pattern.to_string(),
                meta,
            },
            regex,
            params,
        });
    }

    fn unregister(&self, state: &str) {
        let mut routes = self.routes.write().unwrap_or_else(PoisonError::into_inner);
        routes.retain(|r| r.binding.meta.state != state);
        tracing::debug!(state = %state, "route unregistered");
    }
}

fn compile(pattern: &str) -> Result<(Regex, Vec<String>), regex::Error> {
    let mut source = String::from("^");
    let mut params = Vec::new();
    let mut last = 0;

    for caps in PARAM_RE.captures_iter(pattern) {
        let Some(whole) = caps.get(0) else { continue };
        let Some(name) = caps.get(1).or_else(|| caps.get(4)) else {
            continue;
        };
        let segment = match (caps.get(2).map(|m| m.as_str()), caps.get(3)) {
            (Some("regex"), Some(arg)) => arg.as_str(),
            (Some("int"), _) => r"-?\d+",
            _ => "[^/]+",
        };
        source.push_str(&regex::escape(&pattern[last..whole.start()]));
        let _ = write!(source, "(?P<p{}>{})", params.len(), segment);
        params.push(name.as_str().to_string());
        last = whole.end();
    }
    source.push_str(&regex::escape(&pattern[last..]));
    source.push('$');

    Ok((Regex::new(&source)?, params))
}

/// `application/x-www-form-urlencoded` pairs; `+` decodes to a space.
fn parse_query(query: &str) -> BTreeMap<String, String> {
    form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Percent-decodes one path segment. Unlike the query, `+` stays literal.
fn decode_segment(raw: &str) -> String {
    let escaped = raw
        .replace('+', "%2B")
        .replace('&', "%26")
        .replace('=', "%3D");
    form_urlencoded::parse(escaped.as_bytes())
        .next()
        .map(|(segment, _)| segment.into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use pretty_assertions::assert_eq;
    use staterail_core::api::{StateDefinition, StateTree};

    fn meta(state: &str) -> RouteMeta {
        RouteMeta {
            state: state.to_string(),
            reload_on_search: true,
        }
    }

    fn table() -> RouteTable {
        let table = RouteTable::new();
        table.register("/blog", meta("blog"));
        table.register("/blog/post/{post}", meta("blog.post"));
        table.register("/blog/:category/{int(\\d+):page}", meta("blog.category"));
        table
    }

    #[test]
    fn test_matches_literal_and_params() {
        let table = table();
        assert_eq!(table.match_path("/blog").unwrap().state.as_deref(), Some("blog"));
        assert_eq!(table.match_path("/blog/").unwrap().state.as_deref(), Some("blog"));

        let m = table.match_path("/blog/post/42?tab=comments&raw").unwrap();
        assert_eq!(m.state.as_deref(), Some("blog.post"));
        assert_eq!(m.path_params["post"], "42");
        assert_eq!(m.search_params["tab"], "comments");
        assert_eq!(m.search_params["raw"], "");
    }

    #[test]
    fn test_converter_params_keep_their_name() {
        let m = table().match_path("/blog/rust/3").unwrap();
        assert_eq!(m.state.as_deref(), Some("blog.category"));
        assert_eq!(m.path_params["category"], "rust");
        assert_eq!(m.path_params["page"], "3");
    }

    #[test]
    fn test_regex_converter_constrains_segment() {
        let table = RouteTable::new();
        table.register("/archive/{regex(\\d{4}):year}", meta("archive"));
        table.register("/archive/:slug", meta("archive.tag"));

        let m = table.match_path("/archive/2024").unwrap();
        assert_eq!(m.state.as_deref(), Some("archive"));
        assert_eq!(m.path_params["year"], "2024");
        assert_eq!(
            table.match_path("/archive/rust").unwrap().state.as_deref(),
            Some("archive.tag")
        );
    }

    #[test]
    fn test_unknown_path_does_not_match() {
        let table = table();
        assert!(table.match_path("/about").is_none());
        assert!(table.match_path("/blog/post/1/extra").is_none());
    }

    #[test]
    fn test_reregistration_replaces_state_route() {
        let table = table();
        table.register("/journal", meta("blog"));
        assert_eq!(table.len(), 3);
        assert!(table.match_path("/blog").is_none());
        assert_eq!(table.match_path("/journal").unwrap().state.as_deref(), Some("blog"));
    }

    #[test]
    fn test_params_are_percent_decoded() {
        let m = table()
            .match_path("/blog/post/caf%C3%A9+bar?q=a%20b&tag=c+d&x=%26")
            .unwrap();
        assert_eq!(m.path_params["post"], "café+bar");
        assert_eq!(m.search_params["q"], "a b");
        assert_eq!(m.search_params["tag"], "c d");
        assert_eq!(m.search_params["x"], "&");
    }

    #[test]
    fn test_discarded_subtree_no_longer_matches() {
        let table = Arc::new(RouteTable::new());
        let mut tree = StateTree::with_route_registry(table.clone());
        tree.register("blog", StateDefinition::new().route("/blog"))
            .unwrap();
        tree.register("blog.post", StateDefinition::new().route("/:post"))
            .unwrap();
        assert!(table.match_path("/blog/7").is_some());

        tree.register("blog", StateDefinition::new().no_children())
            .unwrap();
        assert!(table.match_path("/blog/7").is_none());
        assert_eq!(table.match_path("/blog").unwrap().state.as_deref(), Some("blog"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_literal_characters_are_escaped() {
        let table = RouteTable::new();
        table.register("/files/a.b", meta("files"));
        assert!(table.match_path("/files/a.b").is_some());
        assert!(table.match_path("/files/axb").is_none());
    }
}
