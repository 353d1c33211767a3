use std::env::var;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use squad_board::board::url::Location;
use squad_board::cmds::{App, RootMod};
use squad_board::entities::{PostDraft, PostId};
use squad_board::handlers::{Handler, Listing};
use squad_board::notifications::{NoPush, PushChannel, SocketIoChannel, TerminalBell};
use squad_board::prefs::FileStore;
use squad_board::presenters::impls::{ConsolePresenter, NoClipboard};
use squad_board::{http, in_memory, Frontend};
use tracing_subscriber::EnvFilter;

const DEFAULT_ORIGIN: &str = "http://localhost:4000";
const DEFAULT_STATE: &str = ".squad_board.json";

async fn async_main(app: App) -> Result<()> {
    let AppValues { api, socket, state } = get_values(&app);

    let location = Location::parse(&app.url).with_context(|| format!("invalid --url `{}`", app.url))?;
    let store = FileStore::open(&state)
        .with_context(|| format!("cannot open state file `{}`", state.display()))?;

    let channel: Arc<dyn PushChannel> = match app.offline {
        true => Arc::new(NoPush),
        false => Arc::new(SocketIoChannel::new(&socket)?),
    };

    let frontend = Frontend {
        store: Box::new(store),
        location,
        presenter: Box::new(ConsolePresenter),
        clipboard: Box::new(NoClipboard),
        channel,
        alert: Arc::new(TerminalBell),
    };

    let handler = match app.offline {
        true => in_memory(vec![], vec![], frontend),
        false => http(&api, frontend),
    };

    handler.bootstrap().await;
    let result = run(&handler, app.cmd).await;
    handler.shutdown().await;

    result
}

async fn run(h: &Handler, cmd: RootMod) -> Result<()> {
    match cmd {
        RootMod::List(c) => {
            for intent in c.intents() {
                h.dispatch(intent).await;
            }

            print_listing(&h.listing().await);
            println!("{}", h.address().await);

            if let Some(id) = h.take_anchor().await {
                println!("linked post: {}", id);
            }
        },
        RootMod::Login(c) => {
            h.login(&c.credential).await?;
        },
        RootMod::Logout => h.logout().await,
        RootMod::Post(c) => {
            let post = h.create_post(c.into_draft()).await?;
            println!("{}", post.id);
        },
        RootMod::Edit(c) => {
            let id = PostId(c.id);
            let current = h
                .post(&id)
                .await
                .ok_or_else(|| anyhow!("cannot find post `{}`.", id))?;

            h.open_edit(&id).await?;
            h.edit_post(&id, c.changes.apply(PostDraft::from_post(&current))).await?;
        },
        RootMod::Delete(c) => {
            let id = PostId(c.id);
            h.request_delete(&id).await?;

            if !c.yes {
                h.cancel_delete().await;
                bail!("pass --yes to delete `{}`.", id);
            }

            h.confirm_delete().await?;
        },
        RootMod::Like(c) => {
            let post = h.toggle_like(&PostId(c.id)).await?;
            println!("{} likes", post.like_count());
        },
        RootMod::Fav(c) => {
            let id = PostId(c.id);
            match h.toggle_favorite(&id).await {
                true => println!("saved {}", id),
                false => println!("unsaved {}", id),
            }
        },
        RootMod::Link(c) => {
            h.copy_link(&PostId(c.id)).await;
        },
        RootMod::Message(c) => {
            h.open_message(&PostId(c.id)).await?;
            let sent = h.send_message(&c.text.join(" ")).await;
            h.close_message().await;
            sent?;
        },
        RootMod::Profile(c) => {
            let user = h.current_user().await.ok_or_else(|| anyhow!("login required."))?;
            h.open_profile().await?;
            h.save_profile(c.apply(user.profile)).await?;
        },
        RootMod::Theme(c) => match c.theme {
            Some(t) => h.set_theme(&t).await,
            None => println!("{}", h.theme().await),
        },
        RootMod::Listen => {
            let user = h
                .listening_as()
                .await
                .ok_or_else(|| anyhow!("login required."))?;

            println!("listening for notifications to {}, ^C to stop", user);
            tokio::signal::ctrl_c().await?;
        },
    }

    Ok(())
}

fn print_listing(listing: &Listing) {
    if listing.cards.is_empty() {
        return println!("no posts.");
    }

    for c in &listing.cards {
        let p = &c.post;
        println!(
            "{}{}[{}] {} ({} likes{}) by {} {}",
            if c.saved { "* " } else { "" },
            if c.is_new { "NEW " } else { "" },
            p.id,
            p.title,
            p.like_count(),
            if c.liked { ", liked" } else { "" },
            p.author.name,
            c.ago,
        );

        let fields = [&p.game, &p.level, &p.lang, &p.platform, &p.time]
            .iter()
            .filter(|f| !f.is_empty())
            .map(|f| f.as_str())
            .collect::<Vec<_>>();
        if !fields.is_empty() {
            println!("    {}", fields.join(" / "));
        }

        if !p.tags.is_empty() {
            println!("    #{}", p.tags.iter().cloned().collect::<Vec<_>>().join(" #"));
        }
    }

    println!("{} of {} (page {})", listing.cards.len(), listing.total, listing.page);
    if let Some(label) = listing.load_more_label() {
        println!("{}", label);
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let app = App::parse();

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name_fn(|| {
            let num = NUM.fetch_add(1, Ordering::Relaxed);
            format!("squad_board-worker-{}", num)
        })
        .build()
    {
        Ok(r) => r,
        Err(e) => return tracing::error!("cannot build runtime: {}", e),
    };

    if let Err(e) = rt.block_on(async_main(app)) {
        tracing::error!("{:#}", e);
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

static NUM: AtomicU32 = AtomicU32::new(0);

struct AppValues {
    api: String,
    socket: String,
    state: PathBuf,
}

fn get_values(app: &App) -> AppValues {
    let api = crate::try_get_value!(app.api.clone(); "SQUAD_BOARD_API_URL", "BUILD_WITH_SQUAD_BOARD_API_URL")
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_ORIGIN.to_string())
        .trim_end_matches('/')
        .to_string();

    let socket = crate::try_get_value!(app.socket.clone(); "SQUAD_BOARD_SOCKET_URL", "BUILD_WITH_SQUAD_BOARD_SOCKET_URL")
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| api.clone());

    let state: PathBuf = crate::try_get_value!(app.state.as_ref().map(|p| p.display().to_string()); "SQUAD_BOARD_STATE", "BUILD_WITH_SQUAD_BOARD_STATE")
        .unwrap_or_else(|| DEFAULT_STATE.to_string())
        .into();

    AppValues { api, socket, state }
}

/// flag, then environment, then the value baked in at build time.
#[macro_export]
macro_rules! try_get_value {
    ($a:expr; $n:literal, $bn:literal) => {{
        match $a {
            Some(t) => Some(t),
            None => match var($n) {
                Ok(t) => Some(t),
                Err(e) => {
                    tracing::debug!("cannot get `{}`: {}, trying built-in value", $n, e);

                    match option_env!($bn) {
                        Some(t) => Some(t.to_string()),
                        None => None,
                    }
                },
            },
        }
    }};
}
