//! Feed subcommand handlers.

use std::sync::Arc;

use tabled::Tabled;

use photofeed_api::ApiClient;
use photofeed_core::{ChangeEvent, Dispatcher, LoadOutcome, Photo, Session, Topic};

use crate::cli::{FeedArgs, FeedCommand, GlobalOpts, LikeArgs};
use crate::commands::util::{spinner, truncate};
use crate::config;
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct PhotoRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Created")]
    created: String,
    #[tabled(rename = "♥")]
    liked: String,
    #[tabled(rename = "Description")]
    description: String,
}

fn photo_row(p: &Photo, color: bool) -> PhotoRow {
    PhotoRow {
        id: p.id.clone(),
        size: format!("{}×{}", p.width, p.height),
        created: p
            .created_at
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        liked: output::liked_marker(p.is_liked, color),
        description: output::muted(&truncate(p.description.as_deref().unwrap_or(""), 48), color),
    }
}

fn detail(p: &Photo) -> String {
    let mut lines = vec![
        format!("ID:          {}", p.id),
        format!("Size:        {}×{}", p.width, p.height),
        format!("Liked:       {}", if p.is_liked { "yes" } else { "no" }),
        format!("Regular:     {}", p.regular_url),
        format!("Full:        {}", p.large_url),
    ];
    if let Some(ref desc) = p.description {
        lines.insert(2, format!("Description: {desc}"));
    }
    lines.join("\n")
}

// ── Page loading ────────────────────────────────────────────────────

/// Load up to `pages` pages, stopping early at an empty page or once
/// `stop` matches. Returns the number of pages loaded.
async fn load_pages(
    session: &Session<ApiClient>,
    dispatcher: &mut Dispatcher,
    pages: u32,
    stop: impl Fn(&Session<ApiClient>) -> bool,
) -> Result<u32, CliError> {
    let mut loaded = 0;
    while loaded < pages && !stop(session) {
        match session.feed().load_next_page().await? {
            LoadOutcome::Appended { added, .. } => {
                loaded += 1;
                dispatcher.dispatch_pending();
                if added == 0 {
                    break;
                }
            }
            LoadOutcome::AlreadyInFlight { .. } | LoadOutcome::Discarded => break,
        }
    }
    Ok(loaded)
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: FeedArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(global.color);
    let (session, mut dispatcher) = config::connect(global)?;

    match args.command {
        FeedCommand::List { pages } => {
            let pb = spinner(global, "Loading photos...");
            let progress = Arc::new({
                let pb = pb.clone();
                move |event: &ChangeEvent| {
                    if let ChangeEvent::Feed(photos) = event {
                        pb.set_message(format!("Loaded {} photos...", photos.len()));
                    }
                }
            });
            let _subscription = session.bus().subscribe(Topic::Feed, &progress);

            let result = load_pages(&session, &mut dispatcher, pages, |_| false).await;
            pb.finish_and_clear();
            result?;

            let photos = session.feed().photos();
            let out = output::render_list(
                global.output,
                &photos,
                |p| photo_row(p, color),
                |p| p.id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        FeedCommand::Like(like) => toggle(&session, &mut dispatcher, like, true, global).await,
        FeedCommand::Unlike(like) => toggle(&session, &mut dispatcher, like, false, global).await,
    }
}

async fn toggle(
    session: &Session<ApiClient>,
    dispatcher: &mut Dispatcher,
    args: LikeArgs,
    desired: bool,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if !session.is_signed_in()? {
        return Err(CliError::Unauthorized);
    }

    let pb = spinner(global, "Finding photo...");
    let found = load_pages(session, dispatcher, args.pages, |s| {
        s.feed().photo(&args.id).is_some()
    })
    .await;
    pb.set_message(if desired { "Liking..." } else { "Removing like..." });
    let result = match found {
        Ok(_) => session.feed().toggle_like(&args.id, desired).await.map_err(CliError::from),
        Err(e) => Err(e),
    };
    pb.finish_and_clear();
    result?;
    dispatcher.dispatch_pending();

    let photo = session
        .feed()
        .photo(&args.id)
        .ok_or_else(|| CliError::PhotoNotFound {
            id: args.id.clone(),
        })?;
    let out = output::render_single(global.output, &photo, detail, |p| p.id.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}
