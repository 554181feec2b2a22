//! Scout CLI - chat with a web-search agent from the terminal.

use anyhow::Context;
use clap::Parser;
use scout::agent::Agent;
use scout::config::Settings;
use scout_cli::{ChatBot, ChatBotConfig};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Scout CLI - web-search chat agent
#[derive(Parser, Debug)]
#[command(name = "scout")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Chat model (overrides SCOUT_MODEL)
    #[arg(short, long)]
    model: Option<String>,

    /// Token budget before older turns are summarized (overrides SCOUT_MAX_TOKENS)
    #[arg(long)]
    max_tokens: Option<usize>,

    /// Number of recent messages never summarized (overrides SCOUT_KEEP_RECENT)
    #[arg(long)]
    keep_recent: Option<usize>,

    /// Maximum tool rounds per question (overrides SCOUT_MAX_ROUNDS)
    #[arg(long)]
    max_rounds: Option<usize>,

    /// System prompt for the agent
    #[arg(short, long)]
    system: Option<String>,

    /// Ask a single question, print the answer and exit
    #[arg(long)]
    message: Option<String>,

    /// Show token usage after each response
    #[arg(long)]
    usage: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn apply(&self, settings: &mut Settings) {
        if let Some(model) = &self.model {
            settings.model.clone_from(model);
        }
        if let Some(max_tokens) = self.max_tokens {
            settings.max_tokens = max_tokens;
        }
        if let Some(keep_recent) = self.keep_recent {
            settings.keep_recent = keep_recent;
        }
        if let Some(max_rounds) = self.max_rounds {
            settings.max_rounds = max_rounds;
        }
        if let Some(system) = &self.system {
            settings.system_prompt.clone_from(system);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "scout=debug,scout_cli=debug"
    } else {
        "scout=warn,scout_cli=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut settings = Settings::from_env().context("failed to load settings")?;
    args.apply(&mut settings);
    if settings.brave_api_key.is_none() {
        info!("BRAVE_API_KEY not set; web search will return no results");
    }

    let agent = Agent::from_settings(&settings).context("failed to build agent")?;
    let mut chatbot = ChatBot::new(
        agent,
        ChatBotConfig {
            show_usage: args.usage,
        },
    );

    if let Some(message) = &args.message {
        let reply = chatbot.chat(message).await?;
        println!("{}", reply.unwrap_or_default());
        return Ok(());
    }

    chatbot.run().await?;
    Ok(())
}
