//! Route table command handlers.

use anyhow::{Result, bail};
use entrydesk_core::routes::{self, ROUTES, RouteTarget};

pub fn list() {
    for (path, target) in ROUTES {
        match target {
            RouteTarget::View(view) => println!("{path:<18} {view}"),
            RouteTarget::Redirect(to) => println!("{path:<18} -> {to}"),
        }
    }
}

pub fn resolve(path: &str) -> Result<()> {
    let Some((canonical, view)) = routes::canonicalize(path) else {
        bail!("No route matches {path}");
    };
    if canonical == path {
        println!("{view}");
    } else {
        println!("{view} (via {canonical})");
    }
    Ok(())
}
