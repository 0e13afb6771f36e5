use std::fs;
use std::io::{self, BufRead};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use marquee_api::{MovieSession, StatsView};
use marquee_core::{MovieRecord, SelectionStore};
use marquee_search::{
    MovieSearch, OmdbClient, OmdbConfig, StaticCatalog, DEFAULT_OMDB_BASE_URL,
    DEFAULT_TIMEOUT_SECS,
};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

const CLI_CONTRACT_VERSION: &str = "cli.v1";

const SESSION_HELP: [&str; 8] = [
    "search <title>   look up a movie and hold it as the candidate",
    "add              add the candidate to the selection",
    "remove <index>   remove the selected movie at a zero-based index",
    "list             show the selected movies",
    "stats            show box-office and critic statistics",
    "show             show the whole session state",
    "help             show this list",
    "quit             end the session",
];

#[derive(Debug, Parser)]
#[command(name = "marquee")]
#[command(about = "Pick movies and track their box-office statistics")]
struct Cli {
    #[command(flatten)]
    source: SourceArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct SourceArgs {
    /// Answer searches from a JSON array of OMDb movies instead of the network
    #[arg(long, env = "MARQUEE_CATALOG")]
    catalog: Option<PathBuf>,

    #[arg(long, env = "OMDB_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, env = "OMDB_BASE_URL", default_value = DEFAULT_OMDB_BASE_URL)]
    omdb_url: String,

    #[arg(long, env = "MARQUEE_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Read session commands from stdin, one per line
    Session,
    /// Look up a single title
    Search(SearchArgs),
    /// Offer a file of movie records to a fresh selection and report the aggregate
    Stats(StatsArgs),
}

#[derive(Debug, Args)]
struct SearchArgs {
    #[arg(required = true, num_args = 1..)]
    title: Vec<String>,
}

#[derive(Debug, Args)]
struct StatsArgs {
    #[arg(long)]
    movies: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SessionCommand {
    Search(String),
    Add,
    Remove(i64),
    List,
    Stats,
    Show,
    Help,
    Quit,
}

fn parse_session_command(line: &str) -> Result<SessionCommand, String> {
    let (verb, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(verb, rest)| (verb, rest.trim()));

    match verb.to_ascii_lowercase().as_str() {
        "search" => Ok(SessionCommand::Search(rest.to_string())),
        "add" => Ok(SessionCommand::Add),
        "remove" | "rm" => rest
            .parse::<i64>()
            .map(SessionCommand::Remove)
            .map_err(|_| format!("remove expects an integer index, got {rest:?}")),
        "list" | "ls" => Ok(SessionCommand::List),
        "stats" => Ok(SessionCommand::Stats),
        "show" => Ok(SessionCommand::Show),
        "help" | "?" => Ok(SessionCommand::Help),
        "quit" | "exit" => Ok(SessionCommand::Quit),
        other => Err(format!("unknown command {other:?}, try `help`")),
    }
}

fn build_search(source: &SourceArgs) -> Result<Box<dyn MovieSearch>> {
    if let Some(path) = &source.catalog {
        let catalog = StaticCatalog::from_path(path)
            .with_context(|| format!("failed to load catalog {}", path.display()))?;
        return Ok(Box::new(catalog));
    }

    let api_key = source.api_key.clone().ok_or_else(|| {
        anyhow!("no movie source configured: pass --catalog FILE or --api-key KEY (or set OMDB_API_KEY)")
    })?;
    Ok(Box::new(OmdbClient::new(OmdbConfig {
        base_url: source.omdb_url.clone(),
        api_key,
        timeout_secs: source.timeout_secs,
    })))
}

fn run_session_command<S: MovieSearch>(
    session: &mut MovieSession<S>,
    command: SessionCommand,
) -> Value {
    match command {
        SessionCommand::Search(query) => match session.search(&query) {
            Ok(record) => json!({ "command": "search", "found": true, "candidate": record }),
            Err(err) => json!({
                "command": "search",
                "found": false,
                "error": err.to_string(),
                "notice": session.notice()
            }),
        },
        SessionCommand::Add => match session.add_pending() {
            Ok(outcome) => json!({ "command": "add", "outcome": outcome }),
            Err(err) => json!({ "command": "add", "error": err.to_string() }),
        },
        SessionCommand::Remove(index) => match session.remove(index) {
            Ok(removed) => json!({
                "command": "remove",
                "removed": removed,
                "selected": session.selected()
            }),
            Err(err) => json!({ "command": "remove", "error": err.to_string() }),
        },
        SessionCommand::List => json!({ "command": "list", "selected": session.selected() }),
        SessionCommand::Stats => json!({ "command": "stats", "stats": session.stats() }),
        SessionCommand::Show => json!({ "command": "show", "session": session.view() }),
        SessionCommand::Help => json!({ "command": "help", "commands": SESSION_HELP }),
        SessionCommand::Quit => json!({ "command": "quit", "selected": session.selected() }),
    }
}

fn run_session(search: Box<dyn MovieSearch>) -> Result<()> {
    let mut session = MovieSession::new(search);
    tracing::info!(session_id = %session.session_id(), "session started");

    for line in io::stdin().lock().lines() {
        let line = line.context("failed to read session command from stdin")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (output, quit) = match parse_session_command(line) {
            Ok(command) => {
                let quit = command == SessionCommand::Quit;
                (run_session_command(&mut session, command), quit)
            }
            Err(message) => (json!({ "error": message }), false),
        };
        emit_json(output)?;
        if quit {
            break;
        }
    }

    tracing::info!(
        session_id = %session.session_id(),
        selected = session.store().len(),
        "session ended"
    );
    Ok(())
}

fn run_search(search: &dyn MovieSearch, args: &SearchArgs) -> Result<()> {
    let title = args.title.join(" ");
    let record = search.search(&title)?;
    emit_json(json!({ "query": title, "record": record }))
}

fn run_stats(args: &StatsArgs) -> Result<()> {
    let body = fs::read_to_string(&args.movies)
        .with_context(|| format!("failed to read movies file {}", args.movies.display()))?;
    let movies: Vec<MovieRecord> = serde_json::from_str(&body)
        .with_context(|| format!("{} is not a JSON array of movies", args.movies.display()))?;

    let mut store = SelectionStore::new();
    let mut admitted = Vec::new();
    let mut rejected = Vec::new();
    for movie in movies {
        let id = movie.id.clone();
        match store.try_add(movie) {
            Ok(()) => admitted.push(id),
            Err(reason) => rejected.push(json!({
                "id": id,
                "reason": reason,
                "message": reason.message()
            })),
        }
    }

    emit_json(json!({
        "admitted": admitted,
        "rejected": rejected,
        "aggregate": StatsView::from_store(&store)
    }))
}

fn with_contract_version(value: Value) -> Value {
    match value {
        Value::Object(mut object) => {
            object.insert(
                "contract_version".to_string(),
                Value::String(CLI_CONTRACT_VERSION.to_string()),
            );
            Value::Object(object)
        }
        other => json!({
            "contract_version": CLI_CONTRACT_VERSION,
            "payload": other
        }),
    }
}

fn emit_json(value: Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&with_contract_version(value))?);
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match &cli.command {
        Command::Session => run_session(build_search(&cli.source)?),
        Command::Search(args) => run_search(build_search(&cli.source)?.as_ref(), args),
        Command::Stats(args) => run_stats(args),
    }
}
