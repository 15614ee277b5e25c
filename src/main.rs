use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use webex_bot::application::errors::BotError;
use webex_bot::application::messaging::{BotSettings, MessageDispatcher};
use webex_bot::domain::traits::MessagingApi;
use webex_bot::infrastructure::adapters::{ConsoleAdapter, WebexClient};
use webex_bot::infrastructure::config::Config;

#[derive(Parser)]
#[command(name = "webex-bot")]
#[command(about = "Command-dispatch engine for Webex bots", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Bot token (overrides config)
    #[arg(short, long)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive console session against the dispatcher
    Run {
        /// Email the console user speaks as
        #[arg(long, default_value = "dev@example.com")]
        user: String,
        /// Behave as a one-on-one space instead of a group room
        #[arg(long)]
        direct: bool,
    },
    /// Send a message to a room through the Webex API
    Send {
        #[arg(long)]
        room: String,
        text: String,
    },
    /// Show the identity the token belongs to
    Whoami,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let (config, load_error) = load_config(&cli.config, cli.token.clone());
    let settings = config.to_settings();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(settings.log_level.to_lowercase())
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Some(e) = load_error {
        tracing::warn!("Failed to load config: {}, using defaults", e);
    }

    let result = match cli.command {
        Commands::Version => {
            println!("webex-bot v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::InitConfig => init_config(),
        command => run_async(command, config, settings),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Load the config file if present, then apply environment and CLI overrides
fn load_config(path: &str, token_override: Option<String>) -> (Config, Option<BotError>) {
    let (mut config, error) = if std::path::Path::new(path).exists() {
        match Config::load(path) {
            Ok(config) => (config, None),
            Err(e) => (Config::default(), Some(e.into())),
        }
    } else {
        (Config::default(), None)
    };

    config.apply_env();
    if let Some(token) = token_override {
        config.bot.token = Some(token);
    }
    (config, error)
}

fn run_async(command: Commands, config: Config, settings: BotSettings) -> Result<(), BotError> {
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| BotError::Internal(format!("Failed to start runtime: {}", e)))?;

    rt.block_on(async move {
        match command {
            Commands::Run { user, direct } => run_console(&config, settings, user, direct).await,
            Commands::Send { room, text } => send(&config, settings, &room, &text).await,
            Commands::Whoami => whoami(&config, &settings).await,
            Commands::Version | Commands::InitConfig => Ok(()),
        }
    })
}

fn webex_client(config: &Config, settings: &BotSettings) -> Result<WebexClient, BotError> {
    WebexClient::from_settings(settings)
        .base_url(&config.api.base_url)
        .timeout(config.request_timeout())
        .build()
}

async fn run_console(config: &Config, settings: BotSettings, user: String, direct: bool) -> Result<(), BotError> {
    tracing::info!("Starting console bot (dev mode): {}", config.bot.name);

    let mut console = ConsoleAdapter::new(user.clone()).with_bot_name(&config.bot.name);
    if direct {
        console = console.one_on_one();
    }
    // Console users are members of every approved room
    for room in &config.approval.rooms {
        console = console.with_member(room.clone(), user.clone());
    }
    let console = Arc::new(console);

    let dispatcher = MessageDispatcher::start(settings, console.clone()).await?;
    println!(
        "Talking to {} in {}. Type 'help' for commands, 'card <keyword>' to submit a card, Ctrl-D to quit.",
        dispatcher.bot_name(),
        console.room_id()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| BotError::Internal(format!("Failed to read stdin: {}", e)))?
    {
        if let Err(e) = console.dispatch_line(&dispatcher, &line).await {
            tracing::error!("Failed to process message: {}", e);
        }
    }

    tracing::info!("Console session closed");
    Ok(())
}

async fn send(config: &Config, settings: BotSettings, room: &str, text: &str) -> Result<(), BotError> {
    let client: Arc<dyn MessagingApi> = Arc::new(webex_client(config, &settings)?);
    let dispatcher = MessageDispatcher::start(settings, client).await?;
    let id = dispatcher.send_message(text, room).await?;
    println!("Sent message {}", id);
    Ok(())
}

async fn whoami(config: &Config, settings: &BotSettings) -> Result<(), BotError> {
    let me = webex_client(config, settings)?.me().await?;
    println!("{} ({})", me, me.primary_email().unwrap_or("no email"));
    println!("id: {}", me.id);
    if let Some(kind) = &me.person_type {
        println!("type: {}", kind);
    }
    Ok(())
}

fn init_config() -> Result<(), BotError> {
    let config = Config::default();
    let yaml = serde_yaml::to_string(&config)
        .map_err(|e| BotError::Internal(format!("Failed to render config: {}", e)))?;
    println!("{}", yaml);
    println!("\nSave this to config.yaml and adjust as needed.");
    Ok(())
}
