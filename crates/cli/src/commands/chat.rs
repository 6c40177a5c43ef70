//! `edupilot chat`: Interactive or single-message chat mode.
//!
//! The session owns the turn list and resends all of it with every request,
//! exactly as the dashboard widget does.

use edupilot_assistant::{ChatPipeline, ChatRequest, ContextInput};
use edupilot_config::AppConfig;
use edupilot_core::error::ChatError;
use edupilot_core::message::ConversationTurn;
use edupilot_store::StoreClient;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Client-side conversation state for one chat session.
pub struct ChatSession {
    pipeline: Arc<ChatPipeline>,
    context: Option<ContextInput>,
    turns: Vec<ConversationTurn>,
}

impl ChatSession {
    pub fn new(pipeline: Arc<ChatPipeline>, context: Option<ContextInput>) -> Self {
        Self {
            pipeline,
            context,
            turns: Vec::new(),
        }
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn reset(&mut self) {
        self.turns.clear();
    }

    /// Send `text` with the full history. The exchange is only recorded once
    /// the model has answered.
    pub async fn send(&mut self, text: &str) -> Result<String, ChatError> {
        let mut messages = self.turns.clone();
        messages.push(ConversationTurn::user(text));

        let request = ChatRequest {
            messages,
            context: self.context.clone(),
        };
        let reply = self.pipeline.run(request).await.into_result()?;

        self.turns.push(ConversationTurn::user(text));
        self.turns.push(ConversationTurn::assistant(reply.clone()));
        Ok(reply)
    }
}

pub async fn run(
    message: Option<String>,
    context_file: Option<PathBuf>,
    user_id: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    GEMINI_API_KEY=...     (recommended)");
        eprintln!("    EDUPILOT_API_KEY=...   (generic)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let router = edupilot_providers::router::build_from_config(&config);
    let provider = router.default().ok_or("No default provider configured")?;
    let pipeline = Arc::new(ChatPipeline::from_config(provider, &config));

    let inline = match &context_file {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
            tracing::debug!(path = %path.display(), "Loaded context file");
            Some(serde_json::from_str::<serde_json::Value>(&content)?)
        }
        None => None,
    };
    let store = (config.store.backend != "none").then(|| StoreClient::new(config.store.clone()));
    let context =
        edupilot_assistant::resolve_context(store.as_ref(), inline, user_id.as_deref()).await;

    let mut session = ChatSession::new(pipeline.clone(), context.clone());

    if let Some(msg) = message {
        eprint!("  Thinking...");
        let result = session.send(&msg).await;
        eprint!("\r              \r");
        match result {
            Ok(reply) => println!("{reply}"),
            Err(e) => {
                println!("Error: {e}");
                return Err(e.into());
            }
        }
        return Ok(());
    }

    let context_label = match &context {
        Some(ContextInput::Raw(raw)) => {
            let snapshot = edupilot_assistant::ContextSnapshot::build(raw);
            format!("{} ({})", snapshot.name, snapshot.role)
        }
        Some(ContextInput::Unavailable) => "record unavailable, using placeholders".to_string(),
        None => "none".to_string(),
    };

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║        EduPilot Assistant, Interactive        ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Provider:  {}", pipeline.gateway().provider_name());
    println!("  Model:     {}", pipeline.gateway().model());
    println!("  Context:   {context_label}");
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type '/reset' to clear the history, 'exit' to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print!("  You > ");
    std::io::stdout().flush()?;

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        match input {
            "" => {}
            "exit" | "quit" => break,
            "/reset" => {
                let cleared = session.turns().len();
                session.reset();
                println!("  (cleared {cleared} turns)");
                println!();
            }
            text => {
                eprint!("  ...");
                let result = session.send(text).await;
                eprint!("\r     \r");
                println!();
                let reply = result.unwrap_or_else(|e| format!("Error: {e}"));
                for line in reply.lines() {
                    println!("  Assistant > {line}");
                }
                println!();
            }
        }

        print!("  You > ");
        std::io::stdout().flush()?;
    }

    println!();
    println!("  Goodbye!");
    println!();

    Ok(())
}
