//! Sign-in command handlers.

use crate::cli::Context;
use crate::error::Result;

/// Handle `login`: run the interactive sign-in.
pub async fn handle_login(ctx: &mut Context) -> Result<()> {
    println!("Signing in to tenant '{}'...", ctx.config.auth.tenant_id);
    println!();

    ctx.sign_in().await?;

    println!("Signed in.");
    Ok(())
}

/// Handle `logout`: discard the access token.
///
/// The loaded device list stays visible until the next sign-in or refresh.
pub fn handle_logout(ctx: &mut Context) {
    if ctx.session.is_authenticated() {
        ctx.session.sign_out();
        println!("Signed out.");
    } else {
        println!("Not currently signed in.");
    }
}

/// Handle `status`: show sign-in state and what is loaded.
pub fn handle_status(ctx: &Context) {
    println!("Session:   {}", ctx.session.state());
    if let Some(at) = ctx.session.authenticated_at() {
        println!("  Since:   {}", format_time_ago(at));
    }
    if let Some(error) = ctx.session.error() {
        println!("  Last sign-in error: {error}");
    }
    println!("  Tenant:  {}", ctx.config.auth.tenant_id);
    println!("  API:     {}", ctx.config.api.base_url);
    println!();

    let directory = &ctx.directory;
    let with_users = directory
        .devices()
        .iter()
        .filter(|d| d.users_loaded)
        .count();
    println!("Devices:   {} loaded", directory.devices().len());
    println!("  With logon users: {with_users}");
    if let Some(error) = directory.last_error() {
        println!("  Last listing error: {error}");
    }
    println!("Favorites: {}", directory.favorites().len());
    println!("Recent searches: {}", directory.recent_searches().len());
}

/// Format a timestamp as relative time.
fn format_time_ago(timestamp: chrono::DateTime<chrono::Utc>) -> String {
    let duration = chrono::Utc::now().signed_duration_since(timestamp);

    if duration.num_hours() > 0 {
        format!("{} hour(s) ago", duration.num_hours())
    } else if duration.num_minutes() > 0 {
        format!("{} minute(s) ago", duration.num_minutes())
    } else {
        "just now".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_ago_buckets() {
        let now = chrono::Utc::now();
        assert_eq!(format_time_ago(now), "just now");
        assert_eq!(
            format_time_ago(now - chrono::Duration::minutes(5)),
            "5 minute(s) ago"
        );
        assert_eq!(
            format_time_ago(now - chrono::Duration::hours(2)),
            "2 hour(s) ago"
        );
    }
}
