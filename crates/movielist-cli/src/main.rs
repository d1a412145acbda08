use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use commands::{clear, config, list, login, mutate, search};
use movielist_api::SearchKind;
use movielist_models::{ListId, RecordOption, SortType, ViewMode};

mod commands;
mod logging;
mod output;
mod render;
mod session;

#[derive(Parser)]
#[command(name = "movielist")]
#[command(about = "movielist - Keep track of the movies you watched and want to watch")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListArg {
    Watched,
    #[value(name = "to-watch")]
    ToWatch,
}

impl From<ListArg> for ListId {
    fn from(list: ListArg) -> Self {
        match list {
            ListArg::Watched => ListId::Watched,
            ListArg::ToWatch => ListId::ToWatch,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SearchKindArg {
    Movie,
    Person,
}

impl From<SearchKindArg> for SearchKind {
    fn from(kind: SearchKindArg) -> Self {
        match kind {
            SearchKindArg::Movie => SearchKind::Movie,
            SearchKindArg::Person => SearchKind::Person,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Position {
    Top,
    Bottom,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in to the backend
    #[command(long_about = "Obtain an access and refresh token for your account. Tokens are stored in the credentials file and refreshed automatically when they expire.")]
    Login {
        /// Username (if not provided, will prompt)
        #[arg(long)]
        username: Option<String>,
    },
    /// Show a list
    #[command(long_about = "Show one page of your watched or to-watch list, or of another user's public list with --user. Sort, search and filter options are remembered for the next run; the page is not.")]
    List {
        /// Which list to show
        #[arg(value_enum, default_value = "watched")]
        list: ListArg,

        /// Show another user's public list
        #[arg(long)]
        user: Option<String>,

        /// Page to show (out-of-range pages are clamped)
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Sort order: addition-date, release-date, rating or custom
        #[arg(long)]
        sort: Option<SortType>,

        /// Display mode: full, minimal, gallery or compact
        #[arg(long)]
        mode: Option<ViewMode>,

        /// Search title, original title, director and actors
        #[arg(long)]
        query: Option<String>,

        /// Drop the saved search query
        #[arg(long, action = ArgAction::SetTrue, conflicts_with = "query")]
        clear_query: bool,

        /// Only rewatch candidates (watched list)
        #[arg(long)]
        to_rewatch: Option<bool>,

        /// Hide unreleased movies (to-watch list)
        #[arg(long)]
        hide_unreleased: Option<bool>,

        /// Only movies released in the last 6 months (to-watch list)
        #[arg(long)]
        recent_releases: Option<bool>,
    },
    /// Rate a watched movie (0-5, 0 removes the rating)
    Rate {
        record_id: i64,
        rating: u8,
    },
    /// Toggle or set a watch option of a record
    #[command(name = "option")]
    #[command(long_about = "Toggle a watch option: original, extended, theatre, hd, full-hd, ultra-hd or ignore-rewatch. With --value the option is only changed when it differs.")]
    SetOption {
        record_id: i64,
        option: RecordOption,

        #[arg(long)]
        value: Option<bool>,
    },
    /// Set the comment of a record (empty text removes it)
    Comment {
        record_id: i64,
        text: String,
    },
    /// Remove a record
    Remove {
        record_id: i64,
    },
    /// Add a movie to a list
    #[command(long_about = "Add a movie to a list by its id. Pass --record to move an existing record (e.g. from to-watch to watched).")]
    Add {
        movie_id: i64,

        #[arg(long, value_enum, default_value = "to-watch")]
        list: ListArg,

        /// Existing record of this movie to move
        #[arg(long)]
        record: Option<i64>,
    },
    /// Add a movie by its external movie database id
    AddExternal {
        movie_id: i64,

        #[arg(long, value_enum, default_value = "to-watch")]
        list: ListArg,
    },
    /// Move a record to the top or bottom of the custom order
    Move {
        record_id: i64,

        #[arg(value_enum)]
        position: Position,
    },
    /// Search the movie database
    Search {
        query: String,

        #[arg(long = "type", value_enum, default_value = "movie")]
        kind: SearchKindArg,

        #[arg(long)]
        page: Option<u32>,

        #[arg(long)]
        year: Option<i32>,

        #[arg(long, action = ArgAction::SetTrue)]
        exact: bool,

        /// Add the n-th result (1-based) to a list
        #[arg(long, value_name = "N", requires = "list")]
        add: Option<usize>,

        #[arg(long, value_enum)]
        list: Option<ListArg>,
    },
    /// Show or create the configuration
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
    /// Clear stored credentials or preferences
    #[command(long_about = "Clear stored data. Use --credentials to log out, --preferences to reset list view preferences, or --all for both.")]
    Clear {
        #[arg(long, action = ArgAction::SetTrue)]
        all: bool,

        #[arg(long, action = ArgAction::SetTrue)]
        credentials: bool,

        #[arg(long, action = ArgAction::SetTrue)]
        preferences: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the current configuration
    Show,
    /// Write a configuration file with defaults
    Init {
        /// Backend API base URL
        #[arg(long)]
        base_url: Option<String>,

        /// Overwrite an existing file without asking
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let paths = session::path_manager()?;
    let logging_config = session::load_config(&paths)
        .map(|config| config.logging)
        .unwrap_or_default();
    logging::init_logging(cli.verbose, cli.quiet, &logging_config).map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Login { username } => login::run_login(username, &output).await,
        Commands::List {
            list,
            user,
            page,
            sort,
            mode,
            query,
            clear_query,
            to_rewatch,
            hide_unreleased,
            recent_releases,
        } => {
            let args = list::ListArgs {
                list: list.into(),
                user,
                page,
                sort,
                mode,
                query: if clear_query { Some(String::new()) } else { query },
                to_rewatch,
                hide_unreleased,
                recent_releases,
            };
            list::run_list(args, &output).await
        }
        Commands::Rate { record_id, rating } => mutate::run_rate(record_id, rating, &output).await,
        Commands::SetOption { record_id, option, value } => mutate::run_option(record_id, option, value, &output).await,
        Commands::Comment { record_id, text } => mutate::run_comment(record_id, text, &output).await,
        Commands::Remove { record_id } => mutate::run_remove(record_id, &output).await,
        Commands::Add { movie_id, list, record } => mutate::run_add(movie_id, list.into(), record, &output).await,
        Commands::AddExternal { movie_id, list } => mutate::run_add_external(movie_id, list.into(), &output).await,
        Commands::Move { record_id, position } => mutate::run_move(record_id, position, &output).await,
        Commands::Search {
            query,
            kind,
            page,
            year,
            exact,
            add,
            list,
        } => {
            let args = search::SearchArgs {
                query,
                kind: kind.into(),
                page,
                year,
                exact,
                add: add.zip(list.map(ListId::from)),
            };
            search::run_search(args, &output).await
        }
        Commands::Config { cmd } => config::run_config(cmd, &output).await,
        Commands::Clear { all, credentials, preferences } => clear::run_clear(all, credentials, preferences, &output).await,
    }
}
