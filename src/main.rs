use clap::{Parser, Subcommand};
use std::sync::Arc;

mod application;
mod domain;
mod infrastructure;

use application::cogs;
use application::errors::CommandError;
use application::messaging::MessageParser;
use application::services::CommandService;
use domain::traits::Bot;
use infrastructure::adapters::console::ConsoleAdapter;
use infrastructure::adapters::telegram::TelegramAdapter;
use infrastructure::config::Config;
use infrastructure::database::Database;
use infrastructure::storage::SqliteStore;

#[derive(Parser)]
#[command(name = "levelbot")]
#[command(about = "A chat bot tracking per-user xp, karma and mutes", long_about = None)]
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
    /// Start the bot
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => {
            run_bot(cli.config, cli.token);
        }
        Commands::Version => {
            println!("levelbot v{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::InitConfig => {
            init_config(&cli.config);
        }
    }
}

fn init_config(path: &str) {
    let config = Config::default();
    match serde_yaml::to_string(&config) {
        Ok(yaml) => {
            if let Err(e) = std::fs::write(path, yaml) {
                tracing::error!("Failed to write config to {}: {}", path, e);
            } else {
                println!("Wrote default config to {}", path);
            }
        }
        Err(e) => tracing::error!("Failed to serialize default config: {}", e),
    }
}

fn run_bot(config_path: String, token_override: Option<String>) {
    // Load config
    let config = if std::path::Path::new(&config_path).exists() {
        Config::load(&config_path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config: {}, using defaults", e);
            Config::load_env()
        })
    } else {
        Config::load_env()
    };

    tracing::info!("Starting {}", config.bot.name);

    // Open the store and build the gateway. The gateway is the only owner of
    // the store handle; everything downstream gets this Arc.
    let store = match SqliteStore::open(&config.database.path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::error!("Failed to open document store: {}", e);
            return;
        }
    };
    let db = Arc::new(Database::from_config(store, &config.database));
    tracing::info!("Document store opened at {:?}", config.database.path);

    // Register commands
    let mut commands = CommandService::new(&config.bot.prefix);
    commands.register_defaults();
    cogs::register_all(&mut commands, Arc::clone(&db));

    let parser = MessageParser::new(&config.bot.prefix);

    // Select adapter
    let rt = tokio::runtime::Runtime::new().expect("failed to start tokio runtime");

    if let Some(token) = token_override.or_else(|| {
        config
            .adapters
            .telegram
            .as_ref()
            .filter(|t| t.enabled)
            .and_then(|t| t.token.clone())
    }) {
        rt.block_on(async {
            tokio::spawn(sweep_expired_mutes(Arc::clone(&db)));

            let mut bot = TelegramAdapter::new(token);
            run_telegram_bot(&mut bot, &parser, &commands).await;
        });
    } else {
        // Run console bot (dev mode)
        rt.block_on(async {
            tokio::spawn(sweep_expired_mutes(Arc::clone(&db)));

            let bot = ConsoleAdapter::new();
            run_console_bot(&bot, &parser, &commands).await;
        });
    }
}

/// Poll the mutes collection and drop records past their expiration.
///
/// The gateway only stores mutes; deciding when one has lapsed happens here,
/// in the process's event loop.
async fn sweep_expired_mutes(db: Arc<Database>) {
    let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));

    loop {
        interval.tick().await;

        let mutes = match db.get_all_mutes() {
            Ok(mutes) => mutes,
            Err(e) => {
                tracing::warn!("Mute sweep skipped: {}", e);
                continue;
            }
        };

        let now = chrono::Utc::now();
        for mute in mutes.iter().filter(|m| m.expires_at <= now) {
            match db.delete_mute(mute.uid) {
                Ok(()) => tracing::info!("Mute for user {} expired", mute.uid),
                Err(e) => tracing::warn!("Failed to drop expired mute {}: {}", mute.uid, e),
            }
        }
    }
}

/// Route one parsed message through the command service.
fn respond(commands: &CommandService, msg: domain::entities::Message) -> Option<String> {
    match commands.handle(&msg) {
        Ok(Some(response)) => Some(response),
        // Plain text is not this bot's business
        Ok(None) => None,
        Err(CommandError::NotFound(_)) => None,
        Err(e) => Some(format!("Error: {}", e)),
    }
}

async fn run_telegram_bot(bot: &mut TelegramAdapter, parser: &MessageParser, commands: &CommandService) {
    if let Err(e) = bot.fetch_bot_info().await {
        tracing::error!("Failed to fetch bot info: {}", e);
        return;
    }
    tracing::info!("Bot started: @{}", bot.bot_info().username);

    let mut offset: i64 = 0;
    let timeout_seconds = 30;

    tracing::info!("Starting message loop...");

    loop {
        match bot.get_updates(offset, timeout_seconds).await {
            Ok(updates) => {
                for update in &updates {
                    let Some(msg) = &update.message else { continue };
                    let Some(text) = msg.text.clone() else { continue };
                    if text.is_empty() {
                        continue;
                    }

                    let sender = msg.from.as_ref().map(|u| u.to_domain());
                    if sender.as_ref().is_some_and(|u| u.is_bot) {
                        continue;
                    }

                    let chat_id = msg.chat.id.to_string();
                    let parsed = parser.parse(&chat_id, text, sender);

                    if let Some(response) = respond(commands, parsed) {
                        if let Err(e) = bot.send_message(&chat_id, &response).await {
                            tracing::error!("Failed to send message: {}", e);
                        }
                    }
                }

                offset = TelegramAdapter::next_offset(&updates, offset);
            }
            Err(e) => {
                tracing::error!("Failed to get updates: {}", e);
                tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;
            }
        }
    }
}

async fn run_console_bot(bot: &ConsoleAdapter, parser: &MessageParser, commands: &CommandService) {
    use domain::entities::User;

    tracing::info!("Console mode - type commands, 'quit' to exit");

    loop {
        let Some(line) = bot.read_line("> ").await else {
            break;
        };
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }

        let sender = User::new(1).with_username("console");
        let parsed = parser.parse("console", line, Some(sender));

        if let Some(response) = respond(commands, parsed) {
            if let Err(e) = bot.send_message("console", &response).await {
                tracing::error!("Failed to send message: {}", e);
            }
        }
    }
}
