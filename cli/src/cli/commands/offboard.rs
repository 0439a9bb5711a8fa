//! Offboard command handlers.

use std::io::{self, Write};

use crate::cli::commands::devices::{handle_refresh, resolve_device};
use crate::cli::Context;
use crate::directory::offboard_devices;
use crate::error::Result;

/// Handles `mdeoff offboard <device>...`.
pub async fn handle_offboard_command(ctx: &mut Context, references: &[String], yes: bool) -> Result<()> {
    ctx.sign_in().await?;
    handle_refresh(ctx).await?;
    handle_offboard(ctx, references, yes).await
}

/// Handles `offboard <device>...`.
///
/// Every reference must resolve to a loaded device before anything is sent.
/// All requests then go out together and one summary is printed when the
/// last has finished.
pub async fn handle_offboard(ctx: &mut Context, references: &[String], yes: bool) -> Result<()> {
    let token = ctx.session.require_token()?;

    let mut targets = Vec::with_capacity(references.len());
    for reference in references {
        let device = resolve_device(&ctx.directory, reference)?;
        if !targets.iter().any(|(id, _): &(String, String)| *id == device.id) {
            targets.push((device.id.clone(), device.host_name.clone()));
        }
    }

    println!("About to offboard {} device(s):", targets.len());
    for (id, name) in &targets {
        println!("  {name} ({id})");
    }
    println!();
    println!("Requests will be recorded as initiated by '{}'.", ctx.directory.local_user());
    println!();

    if !yes {
        print!("Offboarding cannot be undone from this tool. Continue? [y/N] ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let ids: Vec<String> = targets.iter().map(|(id, _)| id.clone()).collect();
    let summary = offboard_devices(&ctx.directory, &ids, token).await;

    for (id, message) in &summary.failed {
        let name = targets
            .iter()
            .find(|(t, _)| t == id)
            .map_or(id.as_str(), |(_, n)| n.as_str());
        println!("  {name} - failed: {message}");
    }
    for id in &summary.succeeded {
        let name = targets
            .iter()
            .find(|(t, _)| t == id)
            .map_or(id.as_str(), |(_, n)| n.as_str());
        println!("  {name} - offboard requested");
    }

    println!();
    println!("{summary}");
    if !summary.all_succeeded() && summary.failed.len() == summary.total() {
        println!("No device was offboarded.");
    }

    Ok(())
}
