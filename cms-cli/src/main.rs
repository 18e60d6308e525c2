mod paths;
mod prompt;
mod settings;
mod shell;

use std::fs::File;
use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use cms_lib::DataAuth;
use cms_lib::DataClient;
use cms_lib::api::MemoryBackend;
use cms_lib::model::EntityKind;
use cms_lib::table::DEFAULT_PAGE_SIZE;
use cms_lib::table::FieldRenderer;
use simplelog::Config;
use simplelog::LevelFilter;
use simplelog::WriteLogger;

use crate::prompt::TerminalPrompt;
use crate::settings::Pref;
use crate::settings::SettingsProvider;
use crate::settings::TABLE_SCOPE;
use crate::shell::Shell;
use crate::shell::ShellError;
use crate::shell::Source;

/// Content admin shell over a managed GraphQL data API
#[derive(Parser, Debug)]
#[command(name = "cms-admin", version, about, long_about = None)]
struct Args {
    /// GraphQL endpoint of the data API
    #[arg(long, env = "CMS_DATA_URL")]
    url: Option<String>,

    /// API key, sent as x-api-key
    #[arg(long, env = "CMS_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Bearer token, sent as Authorization (instead of an API key)
    #[arg(long, env = "CMS_AUTH_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Read endpoint and API key from an amplify_outputs.json file
    #[arg(long, value_name = "FILE")]
    outputs: Option<PathBuf>,

    /// Work against an in-process store instead of a backend
    #[arg(long)]
    memory: bool,

    /// Table to open (e.g. tags, Post, post-categories)
    #[arg(long)]
    entity: Option<EntityKind>,

    /// Rows per page
    #[arg(long)]
    page_size: Option<usize>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Forget the remembered table and page size
    #[arg(long)]
    reset: bool,

    /// Log level written to the log file
    #[arg(long, default_value = "debug", value_parser = parse_level)]
    log_level: LevelFilter,
}

fn parse_level(s: &str) -> Result<LevelFilter, String> {
    s.parse()
        .map_err(|_| format!("'{}' is not one of off, error, warn, info, debug, trace", s))
}

fn init_logging(level: LevelFilter) {
    paths::rotate_logs();

    let Some(path) = paths::log_file() else { return };
    if let Some(dir) = path.parent() {
        let _ = std::fs::create_dir_all(dir);
    }

    match File::create(&path) {
        Ok(file) => {
            if WriteLogger::init(level, Config::default(), file).is_err() {
                eprintln!("Logger already initialized");
            }
        }
        Err(e) => eprintln!("Cannot create log file {}: {}", path.display(), e),
    }
}

fn source(args: &Args) -> Result<Source, ShellError> {
    if args.memory {
        return Ok(Source::Memory(MemoryBackend::new()));
    }

    let client = if let Some(outputs) = &args.outputs {
        DataClient::from_outputs(outputs)?
    } else {
        let url = args.url.clone().ok_or_else(|| {
            ShellError::Table(cms_lib::error::Error::InvalidState(
                "no data source: pass --url with --api-key or --token, --outputs, or --memory".into(),
            ))
        })?;
        let auth = match (&args.api_key, &args.token) {
            (_, Some(token)) => DataAuth::Token(token.clone()),
            (Some(key), None) => DataAuth::ApiKey(key.clone()),
            (None, None) => {
                return Err(ShellError::Table(cms_lib::error::Error::InvalidState(
                    "--url needs --api-key or --token".into(),
                )));
            }
        };

        let mut builder = DataClient::builder().url(url).auth(auth);
        if let Some(secs) = args.timeout {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        builder.build()?
    };

    Ok(Source::Remote(client))
}

async fn run(args: Args) -> Result<(), ShellError> {
    let source = source(&args)?;
    let settings = SettingsProvider::open_default().await;

    if args.reset {
        let removed = settings.reset(TABLE_SCOPE).await?;
        log::info!("Cleared {} remembered preferences", removed);
    }

    let remembered_entity = settings
        .get::<String>(Pref::LastEntity)
        .await
        .unwrap_or_else(|e| {
            log::warn!("Ignoring stored entity: {}", e);
            None
        })
        .and_then(|name| name.parse::<EntityKind>().ok());
    let entity = args
        .entity
        .or(remembered_entity)
        .unwrap_or(EntityKind::Post);

    let page_size = match args.page_size {
        Some(size) => {
            settings.set(Pref::PageSize, &size).await?;
            size
        }
        None => settings
            .get::<usize>(Pref::PageSize)
            .await
            .ok()
            .flatten()
            .unwrap_or(DEFAULT_PAGE_SIZE),
    };
    settings.set(Pref::LastEntity, &entity.model_name().to_string()).await?;

    log::info!("Opening {} against {} ({} per page)", entity, source.describe(), page_size);

    let mut shell = Shell::open(
        source,
        Arc::new(TerminalPrompt),
        settings,
        FieldRenderer::default(),
        entity,
        page_size,
        std::io::stdout(),
    )
    .await?;

    shell.run(read_stdin_line).await
}

/// Reads one line of stdin on the blocking pool.
///
/// Stdin is locked per line so the confirmation prompt can read the next one.
async fn read_stdin_line() -> std::io::Result<Option<String>> {
    tokio::task::spawn_blocking(|| -> std::io::Result<Option<String>> {
        let mut line = String::new();
        match std::io::stdin().lock().read_line(&mut line)? {
            0 => Ok(None),
            _ => Ok(Some(line)),
        }
    })
    .await
    .map_err(std::io::Error::other)?
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.log_level);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
