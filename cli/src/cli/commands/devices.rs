//! Device listing and logon-user command handlers.
//!
//! - [`handle_devices`] - One-shot listing (`mdeoff devices`)
//! - [`handle_device_users`] - One-shot user lookup (`mdeoff users`)
//! - [`handle_refresh`], [`handle_list`], [`handle_search`], [`handle_users`],
//!   [`handle_load_users`], [`handle_export`] - Console commands

use std::path::Path;

use crate::cli::Context;
use crate::directory::{export_devices_csv, Device, DeviceDirectory, UserLoadState};
use crate::error::{ConsoleError, Result};

/// Finds a loaded device by exact id, then by host name.
pub fn resolve_device<'a>(directory: &'a DeviceDirectory, reference: &str) -> Result<&'a Device> {
    directory
        .device(reference)
        .or_else(|| directory.search_device(reference))
        .ok_or_else(|| ConsoleError::DeviceNotFound(reference.to_string()))
}

/// Handles `mdeoff devices`.
pub async fn handle_devices(ctx: &mut Context, csv: Option<&Path>, with_users: bool) -> Result<()> {
    ctx.sign_in().await?;
    handle_refresh(ctx).await?;

    if with_users {
        let ids: Vec<String> = ctx.directory.devices().iter().map(|d| d.id.clone()).collect();
        let token = ctx.session.require_token()?;
        println!("Loading logon users for {} device(s)...", ids.len());

        let results = ctx.directory.load_users_for_devices(&ids, token).await;
        let failed = results
            .iter()
            .filter(|(_, state)| matches!(state, UserLoadState::Failed(_)))
            .count();
        if failed > 0 {
            println!("Logon users could not be loaded for {failed} device(s).");
        }
        println!();
    }

    print_device_table(&ctx.directory, ctx.directory.devices());

    if let Some(path) = csv {
        handle_export(ctx, path)?;
    }

    Ok(())
}

/// Handles `mdeoff users <device>`.
pub async fn handle_device_users(ctx: &mut Context, reference: &str) -> Result<()> {
    ctx.sign_in().await?;
    handle_refresh(ctx).await?;
    handle_users(ctx, reference).await
}

/// Handles `refresh`: reload every page of the device list.
///
/// Devices gathered before a failing page stay loaded.
pub async fn handle_refresh(ctx: &mut Context) -> Result<()> {
    let token = ctx.session.require_token()?;
    println!("Fetching devices...");

    match ctx.directory.fetch_all_devices(token).await {
        Ok(count) => {
            println!("Loaded {count} device(s).");
            println!();
            Ok(())
        }
        Err(e) => {
            let kept = ctx.directory.devices().len();
            if kept > 0 {
                println!("Listing stopped early; {kept} device(s) loaded before the error were kept.");
            }
            Err(e)
        }
    }
}

/// Handles `list`.
pub fn handle_list(ctx: &Context, limit: Option<usize>) {
    let devices = ctx.directory.devices();
    if devices.is_empty() {
        println!("No devices loaded.");
        println!("\nFetch them with: refresh");
        return;
    }

    let shown = limit.unwrap_or(devices.len()).min(devices.len());
    print_device_table(&ctx.directory, &devices[..shown]);

    if shown < devices.len() {
        println!("  ... and {} more", devices.len() - shown);
    }
}

/// Handles `search <name>`.
///
/// Records the term, then loads the match's users through the guarded path
/// and waits for that load before printing.
pub async fn handle_search(ctx: &mut Context, name: &str) -> Result<()> {
    let token = ctx.session.require_token()?;
    ctx.directory.add_recent_search(name);

    let Some(device_id) = ctx.directory.search_device(name).map(|d| d.id.clone()) else {
        println!("No device named '{name}'.");
        return Ok(());
    };

    ctx.directory.load_users_for_device(&device_id, token).await;

    if let Some(device) = ctx.directory.device(&device_id) {
        print_device_detail(&ctx.directory, device);
    }
    Ok(())
}

/// Handles `users <device>`: always fetches fresh users.
pub async fn handle_users(ctx: &mut Context, reference: &str) -> Result<()> {
    let token = ctx.session.require_token()?;
    let device_id = resolve_device(&ctx.directory, reference)?.id.clone();

    let device = ctx
        .directory
        .fetch_device_with_users(&device_id, token)
        .await?;
    print_device_detail(&ctx.directory, &device);
    Ok(())
}

/// Handles `load-users <device>...`.
pub async fn handle_load_users(ctx: &mut Context, references: &[String]) -> Result<()> {
    let token = ctx.session.require_token()?;

    let mut ids = Vec::with_capacity(references.len());
    for reference in references {
        match resolve_device(&ctx.directory, reference) {
            Ok(device) => ids.push(device.id.clone()),
            Err(e) => println!("  {reference} - {e}"),
        }
    }

    let results = ctx.directory.load_users_for_devices(&ids, token).await;

    for id in &ids {
        let name = ctx
            .directory
            .device(id)
            .map_or(id.as_str(), |d| d.host_name.as_str());
        match results.iter().find(|(done, _)| done == id).map(|(_, s)| s) {
            Some(UserLoadState::Loaded) => {
                let count = ctx.directory.device(id).map_or(0, |d| d.logon_users.len());
                println!("  {name} - {count} user(s)");
            }
            Some(UserLoadState::Failed(message)) => println!("  {name} - failed: {message}"),
            Some(_) => println!("  {name} - no longer listed"),
            None => println!("  {name} - already {}", describe_state(&ctx.directory.user_load_state(id))),
        }
    }

    Ok(())
}

/// Handles `export <path>`.
pub fn handle_export(ctx: &Context, path: &Path) -> Result<()> {
    let devices = ctx.directory.devices();
    if devices.is_empty() {
        println!("No devices loaded. Run 'refresh' first.");
        return Ok(());
    }

    export_devices_csv(devices, path)?;
    println!("Exported {} device(s) to {}.", devices.len(), path.display());
    Ok(())
}

fn describe_state(state: &UserLoadState) -> &'static str {
    match state {
        UserLoadState::NotRequested => "not requested",
        UserLoadState::Loading => "loading",
        UserLoadState::Loaded => "loaded",
        UserLoadState::Failed(_) => "failed",
    }
}

/// Prints one line per device. Favorites are marked with `*`.
pub fn print_device_table(directory: &DeviceDirectory, devices: &[Device]) {
    println!(
        "  {:<1} {:<32} {:<10} {:<14} {:<22} ID",
        "", "NAME", "HEALTH", "PLATFORM", "LAST SEEN"
    );
    for device in devices {
        let mark = if directory.is_favorite(&device.id) { "*" } else { "" };
        println!(
            "  {:<1} {:<32} {:<10} {:<14} {:<22} {}",
            mark,
            device.host_name,
            device.health_status,
            device.os_platform,
            device.last_seen,
            device.id
        );
    }
    println!();
}

/// Prints a device and whatever is known about its logon users.
pub fn print_device_detail(directory: &DeviceDirectory, device: &Device) {
    println!("  {}", device.host_name);
    println!("    ID:        {}", device.id);
    println!("    Health:    {}", device.health_status);
    println!("    Platform:  {}", device.os_platform);
    println!("    Last seen: {}", device.last_seen);
    if let Some(aad) = &device.aad_device_id {
        println!("    AAD ID:    {aad}");
    }
    if directory.is_favorite(&device.id) {
        println!("    Favorite:  yes");
    }
    println!();

    if !device.users_loaded {
        match directory.user_load_state(&device.id) {
            UserLoadState::Failed(message) => println!("    Logon users could not be loaded: {message}"),
            state => println!("    Logon users: {}", describe_state(&state)),
        }
        println!();
        return;
    }

    if device.logon_users.is_empty() {
        println!("    No logon users.");
        println!();
        return;
    }

    println!("    Logon users:");
    for user in &device.logon_users {
        let mut flags = Vec::new();
        if user.is_domain_admin {
            flags.push("domain admin");
        }
        if user.is_only_network_user {
            flags.push("network only");
        }

        println!("      {}", user.display_name());
        println!("        Last seen:   {}", user.last_seen);
        println!("        First seen:  {}", user.first_seen);
        if !user.logon_types.is_empty() {
            println!("        Logon types: {}", user.logon_types);
        }
        if !flags.is_empty() {
            println!("        Flags:       {}", flags.join(", "));
        }
    }
    println!();
}
