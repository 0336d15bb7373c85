//! `vista routes`.

use anyhow::Result;
use serde::Serialize;

use super::RoutesArgs;
use crate::context::Context;

#[derive(Serialize)]
struct RouteRow {
    page_id: String,
    route: String,
    hooks: Vec<&'static str>,
}

pub async fn run(_args: RoutesArgs, ctx: &Context) -> Result<()> {
    let rows: Vec<RouteRow> = ctx
        .renderer
        .resolver()
        .entries()
        .iter()
        .map(|entry| {
            let page = entry.page();
            let hooks = [
                ("guard", page.guard_hook().is_some()),
                ("data", page.data_hook().is_some()),
                ("render", page.render_hook().is_some()),
                ("prerender", page.prerender_hook().is_some()),
            ]
            .into_iter()
            .filter_map(|(name, present)| present.then_some(name))
            .collect();
            RouteRow {
                page_id: page.id().to_string(),
                route: entry.pattern().as_str().to_string(),
                hooks,
            }
        })
        .collect();

    if ctx.output.is_json() {
        ctx.output.json(&rows);
        return Ok(());
    }

    ctx.output.heading("Routes (match order)");
    let widths = [24, 12, 30];
    ctx.output.columns(&["ROUTE", "PAGE", "HOOKS"], &widths);
    for row in &rows {
        let hooks = row.hooks.join(",");
        ctx.output
            .columns(&[row.route.as_str(), row.page_id.as_str(), hooks.as_str()], &widths);
    }
    Ok(())
}
