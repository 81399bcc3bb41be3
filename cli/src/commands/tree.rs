use staterail_core::api::AppContext;

use crate::render;

pub fn print_tree(ctx: &AppContext) -> i32 {
    print!("{}", render::format_tree(ctx.tree()));
    0
}

pub fn print_routes(ctx: &AppContext) -> i32 {
    if ctx.tree().routes().is_empty() {
        println!("(no routes)");
    } else {
        print!("{}", render::format_routes(ctx.tree()));
    }
    0
}
