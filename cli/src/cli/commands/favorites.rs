//! Favorites and recent-search command handlers.

use crate::cli::commands::devices::{print_device_table, resolve_device};
use crate::cli::Context;
use crate::error::Result;

/// Handles `fav <device>`: toggle a favorite.
pub fn handle_fav(ctx: &mut Context, reference: &str) -> Result<()> {
    let device = resolve_device(&ctx.directory, reference)?.clone();

    if ctx.directory.toggle_favorite(&device) {
        println!("Added '{}' to favorites.", device.host_name);
    } else {
        println!("Removed '{}' from favorites.", device.host_name);
    }
    Ok(())
}

/// Handles `favorites [--clear]`.
///
/// Favorites are snapshots taken when they were added; use `users` to see
/// current logon users.
pub fn handle_favorites(ctx: &mut Context, clear: bool) {
    if clear {
        ctx.directory.clear_favorites();
        println!("Favorites cleared.");
        return;
    }

    let favorites = ctx.directory.favorites();
    if favorites.is_empty() {
        println!("No favorites yet.");
        println!("\nAdd one with: fav <device>");
        return;
    }

    print_device_table(&ctx.directory, favorites);
}

/// Handles `recent [--clear]`.
pub fn handle_recent(ctx: &mut Context, clear: bool) {
    if clear {
        ctx.directory.clear_recent_searches();
        println!("Recent searches cleared.");
        return;
    }

    let recent = ctx.directory.recent_searches();
    if recent.is_empty() {
        println!("No recent searches.");
        return;
    }

    for (i, term) in recent.iter().enumerate() {
        println!("  {}. {term}", i + 1);
    }
}
