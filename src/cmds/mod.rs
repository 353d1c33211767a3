use std::path::PathBuf;

use crate::board::SortMode;

pub mod parser;

use parser::parse_nonzero_num;

/// a terminal client for the squad board.
#[derive(Debug, Clone, ::clap::Parser)]
#[clap(author, version)]
pub struct App {
    /// server origin; the REST api lives under `{origin}/api`.
    #[clap(long, global = true)]
    pub api: Option<String>,

    /// push server origin, defaults to the api origin.
    #[clap(long, global = true)]
    pub socket: Option<String>,

    /// file holding theme, favorites and the stored session.
    #[clap(long, global = true)]
    pub state: Option<PathBuf>,

    /// page address; its query string is the board's filter state.
    #[clap(long, global = true, default_value = "http://localhost/")]
    pub url: String,

    /// use an in-process board instead of the server.
    #[clap(long, global = true)]
    pub offline: bool,

    #[clap(subcommand)]
    pub cmd: RootMod,
}

#[derive(Debug, Clone, ::clap::Subcommand)]
pub enum RootMod {
    /// show the visible posts.
    #[clap(short_flag = 'l')]
    List(ListCmd),

    /// log in with an identity-provider credential.
    Login(LoginCmd),

    /// forget the stored session.
    Logout,

    /// publish a post as the logged-in user.
    #[clap(short_flag = 'c')]
    Post(DraftArgs),

    /// edit a post you wrote (or any post, as an admin).
    #[clap(short_flag = 'e')]
    Edit(EditCmd),

    /// delete a post.
    #[clap(short_flag = 'd')]
    Delete(DeleteCmd),

    /// like or unlike a post.
    Like(PostIdArg),

    /// save or unsave a post locally.
    Fav(PostIdArg),

    /// print the share link of a post.
    Link(PostIdArg),

    /// write to the author of a post.
    #[clap(short_flag = 'm')]
    Message(MessageCmd),

    /// update your profile.
    Profile(ProfileCmd),

    /// show or set the theme.
    Theme(ThemeCmd),

    /// wait for notifications until interrupted.
    Listen,
}

#[derive(Debug, Clone, ::clap::Args)]
pub struct ListCmd {
    /// free-text search over title, description and game.
    #[clap(short, long)]
    pub q: Option<String>,

    /// toggle a tag filter; repeatable.
    #[clap(short, long)]
    pub tag: Vec<String>,

    #[clap(long)]
    pub game: Option<String>,

    #[clap(long)]
    pub level: Option<String>,

    #[clap(long)]
    pub lang: Option<String>,

    #[clap(long)]
    pub platform: Option<String>,

    #[clap(long)]
    pub time: Option<String>,

    /// score, date or title.
    #[clap(short, long)]
    pub sort: Option<SortMode>,

    /// only saved posts.
    #[clap(long)]
    pub saved: bool,

    /// u32 (1 =< n)
    #[clap(short, long, default_value = "1", parse(try_from_str = parse_nonzero_num))]
    pub page: u32,
}

#[derive(Debug, Clone, ::clap::Args)]
pub struct LoginCmd {
    #[clap(name = "CREDENTIAL")]
    pub credential: String,
}

#[derive(Debug, Clone, ::clap::Args)]
pub struct PostIdArg {
    #[clap(name = "POST_ID")]
    pub id: String,
}

#[derive(Debug, Clone, ::clap::Args)]
pub struct DraftArgs {
    #[clap(short, long)]
    pub title: String,

    #[clap(short, long, default_value = "")]
    pub game: String,

    #[clap(long, default_value = "")]
    pub level: String,

    #[clap(long, default_value = "")]
    pub lang: String,

    #[clap(long, default_value = "")]
    pub platform: String,

    #[clap(long, default_value = "")]
    pub time: String,

    /// comma separated.
    #[clap(long, default_value = "")]
    pub tags: String,

    #[clap(long, default_value = "")]
    pub desc: String,
}

#[derive(Debug, Clone, Default, ::clap::Args)]
pub struct DraftChanges {
    #[clap(short, long)]
    pub title: Option<String>,

    #[clap(short, long)]
    pub game: Option<String>,

    #[clap(long)]
    pub level: Option<String>,

    #[clap(long)]
    pub lang: Option<String>,

    #[clap(long)]
    pub platform: Option<String>,

    #[clap(long)]
    pub time: Option<String>,

    /// comma separated; replaces all tags.
    #[clap(long)]
    pub tags: Option<String>,

    #[clap(long)]
    pub desc: Option<String>,
}

#[derive(Debug, Clone, ::clap::Args)]
pub struct EditCmd {
    #[clap(name = "POST_ID")]
    pub id: String,

    #[clap(flatten)]
    pub changes: DraftChanges,
}

#[derive(Debug, Clone, ::clap::Args)]
pub struct DeleteCmd {
    #[clap(name = "POST_ID")]
    pub id: String,

    /// confirm the deletion.
    #[clap(short, long)]
    pub yes: bool,
}

#[derive(Debug, Clone, ::clap::Args)]
pub struct MessageCmd {
    #[clap(name = "POST_ID")]
    pub id: String,

    #[clap(name = "TEXT", required = true)]
    pub text: Vec<String>,
}

#[derive(Debug, Clone, ::clap::Args)]
pub struct ProfileCmd {
    /// empty clears it.
    #[clap(long)]
    pub avatar: Option<String>,

    /// empty clears it.
    #[clap(long)]
    pub bio: Option<String>,
}

#[derive(Debug, Clone, ::clap::Args)]
pub struct ThemeCmd {
    #[clap(name = "THEME")]
    pub theme: Option<String>,
}
