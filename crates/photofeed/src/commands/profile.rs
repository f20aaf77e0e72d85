//! Profile subcommand handler.

use photofeed_core::UserProfile;

use crate::cli::GlobalOpts;
use crate::commands::util::spinner;
use crate::config;
use crate::error::CliError;
use crate::output;

fn detail(p: &UserProfile, color: bool) -> String {
    let mut lines = vec![
        format!("Name:    {}", p.display_name),
        format!("Handle:  {}", output::muted(&p.handle, color)),
    ];
    if let Some(ref bio) = p.bio {
        lines.push(format!("Bio:     {bio}"));
    }
    if let Some(ref avatar) = p.avatar_url {
        lines.push(format!("Avatar:  {avatar}"));
    }
    lines.join("\n")
}

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(global.color);
    let (session, _dispatcher) = config::connect(global)?;

    let pb = spinner(global, "Loading profile...");
    let result = session.refresh_profile().await;
    pb.finish_and_clear();
    let profile = result?;

    let out = output::render_single(
        global.output,
        &profile,
        |p| detail(p, color),
        |p| p.username.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
