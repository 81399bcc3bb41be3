use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "staterail", version, about = "Inspect state trees and simulate navigations")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// App config file. Defaults to ~/.staterail/config.toml, then ./staterail.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// State definition file.
    #[arg(long, default_value = "states.toml", global = true)]
    pub states: PathBuf,

    /// Overrides `templates.base_dir`.
    #[arg(long, global = true)]
    pub template_dir: Option<String>,

    /// Emit notifications as JSON lines.
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the state tree.
    Tree,
    /// Print registered routes in match order.
    Routes,
    /// Navigate by URL path, e.g. `/blog/7?tab=comments`.
    Navigate(NavigateArgs),
    /// Navigate by state name, e.g. `blog.post`.
    Goto(GotoArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct NavigateArgs {
    /// Paths visited in order.
    #[arg(required = true)]
    pub paths: Vec<String>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct GotoArgs {
    /// States visited in order.
    #[arg(required = true)]
    pub states: Vec<String>,

    /// Path parameters applied to every navigation (KEY=VALUE).
    /// Can be specified multiple times.
    #[arg(long = "param", action = clap::ArgAction::Append)]
    pub params: Vec<String>,

    /// Re-enter the final state once more after the last navigation.
    #[arg(long)]
    pub reload: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_goto() {
        let args = Args::parse_from([
            "staterail",
            "--states",
            "blog.toml",
            "goto",
            "blog",
            "blog.post",
            "--param",
            "post=7",
            "--reload",
        ]);
        assert_eq!(args.states, PathBuf::from("blog.toml"));
        match args.command {
            Commands::Goto(goto) => {
                assert_eq!(goto.states, vec!["blog", "blog.post"]);
                assert_eq!(goto.params, vec!["post=7"]);
                assert!(goto.reload);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_navigate_requires_paths() {
        assert!(Args::try_parse_from(["staterail", "navigate"]).is_err());
    }
}
