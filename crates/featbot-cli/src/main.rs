use std::sync::Arc;

use eyre::Result;
use tracing_subscriber::EnvFilter;

use featbot_bedrock::chat::BedrockChat;
use featbot_bedrock::knowledge_base::KnowledgeBaseClient;
use featbot_bedrock::service::ChatService;
use featbot_chat::memory::ConversationMemory;
use featbot_chat::orchestrator::Orchestrator;
use featbot_cli::session::{ChatSession, SessionOptions};
use featbot_cli::{aws, config};
use featbot_storage::history::HistoryStore;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let config = config::load_or_default()?;
    let sdk_config = aws::build_aws_config(&config.region, &config.credentials).await;

    let chat: Arc<dyn ChatService> = Arc::new(BedrockChat::new(&sdk_config, config.chat.clone()));
    let history = HistoryStore::new(&config.history.path, &config.history.session_id);

    let mut orchestrator = Orchestrator::new(chat.clone(), history);
    if let Some(kb) = &config.knowledge_base {
        orchestrator =
            orchestrator.with_retrieval(Arc::new(KnowledgeBaseClient::new(&sdk_config, kb.clone())));
    }

    let memory = ConversationMemory::with_token_limit(chat, config.memory.max_token_limit);

    let options = SessionOptions {
        use_knowledge_base: config.use_knowledge_base,
        recent_turns: config.history.recent_turns,
        prime_memory: config.memory.prime_from_history,
        config_info: config::config_info(&config),
    };
    let mut session = ChatSession::start(orchestrator, memory, options).await;

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    session.run(stdin, &mut std::io::stdout()).await
}

/// Logs go to stderr so they don't interleave with the transcript.
/// `RUST_LOG` sets the filter (default `warn`); `FEATBOT_LOG_JSON=1`
/// switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let json = std::env::var("FEATBOT_LOG_JSON").is_ok_and(|v| v == "1");

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
