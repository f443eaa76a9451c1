use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value, json};
use snippetbox::App;
use snippetbox::auth::{AuthError, Credentials, Registration};
use snippetbox::config::{ClientConfig, ConfigError, normalize_base_url};
use snippetbox::net::ApiError;
use snippetbox::router::NavigationError;
use snippetbox::snippets::{Page, QueryParams, SnippetId};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Navigation(#[from] NavigationError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("invalid --param `{0}`; expected key=value")]
    InvalidParam(String),
}

#[derive(Parser, Debug)]
#[command(name = "snippetbox", about = "Code snippet API client")]
struct Cli {
    /// Server origin; `/api` is appended.
    #[arg(long, env = "SNIPPETS_API_BASE_URL")]
    base_url: Option<String>,

    /// Directory holding the cookie and local-storage files.
    #[arg(long, env = "SNIPPETS_STATE_DIR")]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "SNIPPETS_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long, env = "SNIPPETS_PASSWORD", hide_env_values = true)]
        password: String,
        /// Extra JSON object merged into the payload.
        #[arg(long)]
        extra: Option<String>,
    },
    Logout,
    Profile,
    Refresh,
    /// Print session state without touching the network.
    Status,
    Snippets(SnippetsCommand),
    /// Run the navigation guard for a path and print where it lands.
    Visit {
        path: String,
    },
}

#[derive(Args, Debug)]
struct SnippetsCommand {
    #[command(subcommand)]
    command: SnippetsSubcommand,
}

#[derive(Args, Debug)]
struct PageArgs {
    #[arg(long)]
    page: Option<u32>,
    /// Extra query parameter, repeatable.
    #[arg(long = "param", value_name = "KEY=VALUE")]
    params: Vec<String>,
}

#[derive(Subcommand, Debug)]
enum SnippetsSubcommand {
    List(PageArgs),
    Search {
        term: Option<String>,
        #[command(flatten)]
        page: PageArgs,
    },
    Get {
        id: String,
    },
    Create {
        #[arg(long)]
        data: String,
    },
    Update {
        id: String,
        #[arg(long)]
        data: String,
    },
    Delete {
        id: String,
    },
    Analytics {
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = cli.base_url.as_deref() {
        config.base_url = normalize_base_url(base_url)?;
    }
    if let Some(dir) = cli.state_dir {
        config.state_dir = dir;
    }

    let app = App::from_config(config)?;
    tracing::debug!(api_root = %app.config.api_root(), "client ready");

    match cli.command {
        Command::Login { username, password } => {
            let profile = app
                .auth
                .login(&Credentials::new(username, password))
                .await?;
            print_json(&profile)
        }
        Command::Register { username, email, password, extra } => {
            let extra = match extra {
                Some(raw) => parse_object(&raw)?,
                None => Map::new(),
            };
            let response = app
                .auth
                .register(&Registration { username, email, password, extra })
                .await?;
            print_json(&response.body)
        }
        Command::Logout => {
            app.auth.logout();
            print_json(&json!({ "authenticated": false }))
        }
        Command::Profile => {
            let profile = app.auth.fetch_profile().await?;
            print_json(&profile.unwrap_or(Value::Null))
        }
        Command::Refresh => {
            app.auth.refresh_token().await?;
            print_json(&json!({ "authenticated": app.auth.is_authenticated() }))
        }
        Command::Status => print_json(&json!({
            "authenticated": app.auth.is_authenticated(),
            "profile": app.auth.cached_profile(),
            "api_root": app.config.api_root(),
        })),
        Command::Snippets(cmd) => run_snippets(&app, cmd).await,
        Command::Visit { path } => {
            let landed = app.visit(&path)?;
            print_json(&json!({ "requested": path, "landed": landed.path() }))
        }
    }
}

async fn run_snippets(app: &App, cmd: SnippetsCommand) -> Result<(), CliError> {
    match cmd.command {
        SnippetsSubcommand::List(page) => {
            let result = app.snippets.list(&query_params(None, &page)?).await?;
            print_page(app, &result)
        }
        SnippetsSubcommand::Search { term, page } => {
            let result = app
                .snippets
                .search(&query_params(term, &page)?)
                .await?;
            print_page(app, &result)
        }
        SnippetsSubcommand::Get { id } => {
            let snippet = app.snippets.get(&SnippetId::from(id.as_str())).await?;
            print_json(&serde_json::to_value(snippet)?)
        }
        SnippetsSubcommand::Create { data } => {
            let snippet = app
                .snippets
                .create(&Value::Object(parse_object(&data)?))
                .await?;
            print_json(&serde_json::to_value(snippet)?)
        }
        SnippetsSubcommand::Update { id, data } => {
            let snippet = app
                .snippets
                .update(&SnippetId::from(id.as_str()), &Value::Object(parse_object(&data)?))
                .await?;
            print_json(&serde_json::to_value(snippet)?)
        }
        SnippetsSubcommand::Delete { id } => {
            app.snippets.delete(&SnippetId::from(id.as_str())).await?;
            print_json(&json!({ "deleted": id }))
        }
        SnippetsSubcommand::Analytics { id } => {
            let response = app
                .snippets
                .analytics(&SnippetId::from(id.as_str()))
                .await?;
            print_json(&response.body)
        }
    }
}

fn query_params(term: Option<String>, args: &PageArgs) -> Result<QueryParams, CliError> {
    let mut params = QueryParams::new();
    for raw in &args.params {
        let (key, value) = raw
            .split_once('=')
            .ok_or_else(|| CliError::InvalidParam(raw.clone()))?;
        params = params.with(key, value);
    }
    if let Some(term) = term {
        params = params.search(term);
    }
    if let Some(page) = args.page {
        params = params.page(page);
    }
    Ok(params)
}

fn parse_object(raw: &str) -> Result<Map<String, Value>, CliError> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(map) => Ok(map),
        other => Err(CliError::InvalidJson(serde::de::Error::custom(format!(
            "expected a JSON object, got {other}"
        )))),
    }
}

fn print_page(app: &App, page: &Page) -> Result<(), CliError> {
    let state = app.snippets.snapshot();
    print_json(&json!({
        "count": page.count,
        "total_pages": state.total_pages,
        "current_page": state.current_page,
        "results": page.results,
    }))
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
