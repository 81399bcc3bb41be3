use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use super::types::{AppConfig, StateConfig, StatesConfig, ViewConfig};
use crate::state::{RouteRegistry, StateDefinition, StateTree};
use crate::view::{TemplateSource, ViewArgs};

/// Get the default staterail data directory: ~/.staterail
pub fn get_staterail_data_dir() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().context("Cannot determine home directory")?;
    Ok(home.join(".staterail"))
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: ~/.staterail/config.toml
    let home_config = get_staterail_data_dir()?.join("config.toml");

    // Priority 2: ./staterail.toml (current directory)
    let local_config = Path::new("staterail.toml");

    let mut cfg = if home_config.exists() {
        load_from_path(&home_config)?
    } else if local_config.exists() {
        load_from_path(local_config)?
    } else {
        AppConfig::default()
    };

    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

pub fn load_from_path(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let cfg = toml::from_str::<AppConfig>(&s)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    Ok(cfg)
}

fn apply_env_overrides(cfg: &mut AppConfig) {
    if let Ok(v) = std::env::var("STATERAIL_LOG_LEVEL") {
        if !v.trim().is_empty() {
            cfg.logging.level = v;
        }
    }
    if let Ok(v) = std::env::var("STATERAIL_TEMPLATE_DIR") {
        if !v.trim().is_empty() {
            cfg.templates.base_dir = v;
        }
    }
}

pub fn load_states(path: &Path) -> anyhow::Result<StatesConfig> {
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read states {}", path.display()))?;
    let states = toml::from_str::<StatesConfig>(&s)
        .with_context(|| format!("failed to parse states {}", path.display()))?;
    Ok(states)
}

impl StatesConfig {
    /// Registers every state (sorted by key) into a fresh tree.
    pub fn build_tree(
        &self,
        registry: Option<Arc<dyn RouteRegistry>>,
    ) -> anyhow::Result<StateTree> {
        let mut tree = match registry {
            Some(registry) => StateTree::with_route_registry(registry),
            None => StateTree::new(),
        };
        for (name, state) in &self.states {
            let definition = state.to_definition(name)?;
            tree.register(name, definition)
                .with_context(|| format!("failed to register state '{name}'"))?;
        }
        Ok(tree)
    }
}

impl StateConfig {
    /// `name` is the dotted name of this state, used in error messages.
    pub fn to_definition(&self, name: &str) -> anyhow::Result<StateDefinition> {
        if self.no_children && !self.children.is_empty() {
            anyhow::bail!("state '{name}' sets no_children but also declares children");
        }

        let mut def = StateDefinition::new();
        def.route = self.route.clone();
        def.reload_on_search = self.reload_on_search;
        for (slot, view) in &self.views {
            def = def.view(slot.as_str(), view.to_args(name, slot)?);
        }
        if self.no_children {
            def = def.no_children();
        }
        for (child_name, child) in &self.children {
            let child_def = child.to_definition(&format!("{name}.{child_name}"))?;
            def = def.child(child_name.as_str(), child_def);
        }
        Ok(def)
    }
}

impl ViewConfig {
    pub fn to_args(&self, state: &str, slot: &str) -> anyhow::Result<ViewArgs> {
        let template = match (&self.inline, &self.template) {
            (Some(html), None) => TemplateSource::inline(html.as_str()),
            (None, Some(url)) => TemplateSource::url(url.as_str()),
            (Some(_), Some(_)) => {
                anyhow::bail!("view '{slot}' of state '{state}' sets both template and inline")
            }
            (None, None) => {
                anyhow::bail!("view '{slot}' of state '{state}' needs a template or inline html")
            }
        };
        Ok(ViewArgs {
            template,
            controller: self.controller.clone(),
            locals: self.locals.clone(),
            sticky: self.sticky.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const STATES: &str = r#"
[states.blog]
route = "/blog"

[states.blog.views.main]
inline = "<blog/>"
controller = "BlogCtrl"

[states.blog.children.post]
route = "/:post"
reload_on_search = false

[states.blog.children.post.views.main]
template = "post.html"
sticky = "post"

[states.about]
route = "/about"
no_children = true
"#;

    #[test]
    fn test_defaults_from_empty_file() {
        let cfg: AppConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.transitions.max_redirects, 16);
        assert!(!cfg.transitions.clear_unbound_views);
        assert_eq!(cfg.views.event_capacity, 256);
        assert_eq!(cfg.templates.base_dir, ".");
        assert_eq!(cfg.templates.cache_capacity, 64);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[transitions]\nmax_redirects = 3\nclear_unbound_views = true\n\n[templates]\nbase_dir = \"/srv/views\""
        )
        .unwrap();

        let cfg = load_from_path(file.path()).unwrap();
        assert_eq!(cfg.transitions.max_redirects, 3);
        assert!(cfg.transitions.clear_unbound_views);
        assert_eq!(cfg.templates.base_dir, "/srv/views");
        assert_eq!(cfg.templates.cache_capacity, 64);
    }

    #[test]
    fn test_load_from_missing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_from_path(&dir.path().join("absent.toml")).is_err());
    }

    #[test]
    fn test_build_tree_from_states_file() {
        let states: StatesConfig = toml::from_str(STATES).unwrap();
        let tree = states.build_tree(None).unwrap();

        let post = tree.resolve("blog.post").unwrap();
        assert_eq!(post.route(), Some("/blog/:post"));
        assert_eq!(post.param_names(), ["post".to_string()]);
        assert!(!post.reload_on_search());

        let (slot, args) = &post.views()[0];
        assert_eq!(slot, "main");
        assert_eq!(args.template, TemplateSource::url("post.html"));
        assert_eq!(args.sticky.as_deref(), Some("post"));

        let blog = tree.resolve("blog").unwrap();
        assert_eq!(blog.views()[0].1.controller.as_deref(), Some("BlogCtrl"));
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_build_tree_reports_invalid_names() {
        let states: StatesConfig = toml::from_str("[states.\"9lives\"]\nroute = \"/x\"").unwrap();
        let err = states.build_tree(None).unwrap_err();
        assert!(format!("{err:#}").contains("9lives"));
    }

    #[test]
    fn test_no_children_with_children_is_rejected() {
        let states: StatesConfig = toml::from_str(
            "[states.blog]\nno_children = true\n\n[states.blog.children.post]\nroute = \"/:post\"",
        )
        .unwrap();
        let err = states.build_tree(None).unwrap_err();
        assert!(format!("{err:#}").contains("'blog'"));
    }

    #[test]
    fn test_view_without_template_is_rejected() {
        let states: StatesConfig = toml::from_str(
            "[states.blog.children.post.views.main]\ncontroller = \"PostCtrl\"",
        )
        .unwrap();
        let err = states.build_tree(None).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("'blog.post'"), "{msg}");
        assert!(msg.contains("'main'"), "{msg}");
    }
}
