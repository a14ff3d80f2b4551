//! The interactive chat loop.
//!
//! Reads one line at a time, runs it to completion, and only then reads the
//! next, so the orchestrator never sees overlapping requests against the
//! same memory or history.

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

use featbot_chat::connectivity::test_connections;
use featbot_chat::memory::ConversationMemory;
use featbot_chat::orchestrator::Orchestrator;
use featbot_core::models::display::{expand_turns, DisplayMessage};

use crate::commands::{self, Command};
use crate::config::ConfigInfo;
use crate::render;

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub use_knowledge_base: bool,
    pub recent_turns: usize,
    pub prime_memory: bool,
    pub config_info: ConfigInfo,
}

enum Flow {
    Continue,
    Quit,
}

pub struct ChatSession {
    orchestrator: Orchestrator,
    memory: ConversationMemory,
    use_knowledge_base: bool,
    config_info: ConfigInfo,
    transcript: Vec<DisplayMessage>,
    loaded_recent: bool,
}

impl ChatSession {
    /// Load the most recent turns into the transcript (and, if enabled,
    /// into the memory).
    pub async fn start(
        orchestrator: Orchestrator,
        mut memory: ConversationMemory,
        options: SessionOptions,
    ) -> Self {
        let recent = orchestrator.history().load(Some(options.recent_turns));
        if options.prime_memory && !recent.is_empty() {
            memory.prime(&recent).await;
            debug!(turns = recent.len(), "memory primed from history");
        }

        Self {
            orchestrator,
            memory,
            use_knowledge_base: options.use_knowledge_base,
            config_info: options.config_info,
            transcript: expand_turns(&recent),
            loaded_recent: !recent.is_empty(),
        }
    }

    pub fn transcript(&self) -> &[DisplayMessage] {
        &self.transcript
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    pub fn use_knowledge_base(&self) -> bool {
        self.use_knowledge_base
    }

    /// Run until `/quit` or end of input.
    pub async fn run<R, W>(&mut self, input: R, out: &mut W) -> eyre::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        writeln!(out, "Hi, this is Feat Bot. Type /help for commands.")?;
        if self.loaded_recent {
            writeln!(out, "Recent Conversations")?;
            render::transcript(out, &self.transcript)?;
        }

        let mut lines = input.lines();
        loop {
            write!(out, "> ")?;
            out.flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let Some(command) = commands::parse(&line) else {
                continue;
            };
            if let Flow::Quit = self.handle(command, out).await? {
                break;
            }
        }

        writeln!(out)?;
        Ok(())
    }

    async fn handle<W: Write>(&mut self, command: Command, out: &mut W) -> eyre::Result<Flow> {
        match command {
            Command::Ask(text) => self.ask(&text, out).await?,
            Command::KnowledgeBase(setting) => {
                self.use_knowledge_base = setting.unwrap_or(!self.use_knowledge_base);
                let state = if self.use_knowledge_base { "on" } else { "off" };
                writeln!(out, "Use knowledge base: {state}")?;
            }
            Command::TestConnections => {
                writeln!(out, "Testing connections to Bedrock and Knowledge Base...")?;
                let report = test_connections(
                    self.orchestrator.chat().as_ref(),
                    self.orchestrator.retrieval().map(|r| r.as_ref()),
                )
                .await;
                render::connection_report(out, &report)?;
            }
            Command::Clear => {
                let history = self.orchestrator.history();
                match history.clear(history.session_id()) {
                    Ok(()) => {
                        self.transcript.clear();
                        self.memory.clear();
                        writeln!(out, "Chat history cleared!")?;
                    }
                    Err(e) => writeln!(out, "Error: {e}")?,
                }
            }
            Command::LoadMore => {
                let history = self.orchestrator.history();
                if !history.exists() {
                    writeln!(out, "No history file found.")?;
                } else {
                    match history.try_load(None) {
                        Ok(records) => {
                            self.transcript = expand_turns(&records);
                            render::transcript(out, &self.transcript)?;
                            writeln!(out, "Full history loaded!")?;
                        }
                        Err(e) => {
                            warn!(error = %e, "failed to load full history");
                            writeln!(out, "Failed to load history file.")?;
                        }
                    }
                }
            }
            Command::ShowConfig => {
                writeln!(out, "{}", serde_json::to_string_pretty(&self.config_info)?)?;
            }
            Command::Help => writeln!(out, "{}", commands::HELP)?,
            Command::Quit => return Ok(Flow::Quit),
            Command::Unknown(line) => {
                writeln!(out, "Unknown command: {line}. Type /help for commands.")?;
            }
        }
        Ok(Flow::Continue)
    }

    /// Send a message. Chat failures are printed and the loop carries on.
    async fn ask<W: Write>(&mut self, text: &str, out: &mut W) -> eyre::Result<()> {
        writeln!(out, "Thinking...")?;

        match self
            .orchestrator
            .respond(text, self.use_knowledge_base, &mut self.memory)
            .await
        {
            Ok(result) => {
                if let Some(kb_answer) = &result.kb_answer {
                    debug!(kb_answer = %kb_answer, "knowledge base answer");
                }
                let reply = DisplayMessage::assistant(result.response, result.sources);
                render::message(out, &reply)?;
                self.transcript.push(DisplayMessage::user(text));
                self.transcript.push(reply);
            }
            Err(e) => writeln!(out, "Error: {e}")?,
        }
        Ok(())
    }
}
