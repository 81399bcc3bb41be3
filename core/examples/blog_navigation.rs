//! 博客导航示例
//!
//! 演示如何注册嵌套状态、监听视图与转换事件，并在状态之间导航

use std::sync::Arc;

use anyhow::Result;
use staterail_core::api::{
    EventFilter, InlineTemplateResolver, StateDefinition, StateTree, TemplateSource,
    TransitionCoordinator, TransitionKind, TransitionParams, ViewArgs, ViewEvent, ViewStore,
};

fn view(html: &str) -> ViewArgs {
    ViewArgs::new(TemplateSource::inline(html))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    // 1. 注册状态
    let mut tree = StateTree::new();
    tree.register(
        "blog",
        StateDefinition::new()
            .route("/blog")
            .view("main", view("<blog-list/>"))
            .view("sidebar", view("<categories/>")),
    )?;
    tree.register(
        "blog.post",
        StateDefinition::new()
            .route("/:post")
            .view("main", view("<blog-post/>").sticky("post"))
            .on_enter(|event, _| println!("  ↳ entering post {:?}", event.params.path)),
    )?;
    tree.register(
        "about",
        StateDefinition::new()
            .route("/about")
            .view("main", view("<about/>")),
    )?;

    for binding in tree.routes() {
        println!("route {:<20} -> {}", binding.pattern, binding.meta.state);
    }

    // 2. 创建视图存储与协调器
    let views = ViewStore::new(Arc::new(InlineTemplateResolver));
    let coordinator = TransitionCoordinator::new(Arc::new(tree), views.clone());

    // 3. 视图事件监听（后台任务）
    let mut view_rx = views.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = view_rx.recv().await {
            match event {
                ViewEvent::Updated { name } => println!("  ✓ slot '{}' updated", name),
                ViewEvent::Refreshed { name, payload } => {
                    println!("  ⟳ slot '{}' refreshed (sticky={:?})", name, payload.sticky)
                }
            }
        }
    });

    // 4. 禁止直接进入 about：重定向到博客
    coordinator.on(
        EventFilter::kind(TransitionKind::Start).under("about"),
        |_, control| control.redirect("blog", TransitionParams::new()),
    );

    // 5. 导航
    for (target, post) in [("blog", None), ("blog.post", Some("1")), ("blog.post", Some("2")), ("about", None)] {
        let mut params = TransitionParams::new();
        if let Some(post) = post {
            params = params.path_param("post", post);
        }
        let outcome = coordinator.goto_with_params(target, params).await?;
        println!("→ goto {} : {:?} (current={})", target, outcome, coordinator.current());
        tokio::task::yield_now().await;
    }

    Ok(())
}
