use std::sync::Arc;

use clap::Parser;
use scribe_core::{AuditLogger, HttpAssistant, ScribeConfig, TableClient};
use tokio::io::BufReader;
use tracing_subscriber::{fmt, EnvFilter};

use scribe_chat::{repl, ChatOrchestrator};

#[derive(Parser, Debug)]
#[command(author, version, about = "Chat with an assistant; every exchange is audit-logged", long_about = None)]
struct Args {
    #[arg(short, long, default_value = "scribe.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience, production uses real env vars)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Load config
    let config = match ScribeConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Init logging; RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.service.log_level));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let assistant = match HttpAssistant::new(config.assistant.clone()) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Failed to create assistant client: {}", e);
            std::process::exit(1);
        }
    };

    let table = match TableClient::new(&config.audit) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Failed to create audit table client: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!(url = table.records_url(), "Audit logging enabled");

    let audit = AuditLogger::new(Arc::new(table), config.assistant.system_prompt.clone());
    let mut orchestrator = ChatOrchestrator::new(Arc::new(assistant), audit);

    repl::run(
        &mut orchestrator,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await?;

    Ok(())
}
