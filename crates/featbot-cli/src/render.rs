//! Plain-text rendering of the chat transcript.

use std::io::{self, Write};

use featbot_chat::connectivity::ConnectionReport;
use featbot_core::models::display::{DisplayMessage, DisplayRole};
use featbot_core::models::turn::SourceDescriptor;

pub fn message(out: &mut impl Write, msg: &DisplayMessage) -> io::Result<()> {
    let tag = match msg.role {
        DisplayRole::User => "you",
        DisplayRole::Assistant => "bot",
    };
    writeln!(out, "[{tag}] {}", msg.text)?;
    if let Some(sources) = msg.sources.as_deref() {
        self::sources(out, sources)?;
    }
    Ok(())
}

pub fn transcript(out: &mut impl Write, messages: &[DisplayMessage]) -> io::Result<()> {
    for msg in messages {
        message(out, msg)?;
    }
    Ok(())
}

/// Numbered source list; prints nothing for an empty list.
pub fn sources(out: &mut impl Write, sources: &[SourceDescriptor]) -> io::Result<()> {
    if sources.is_empty() {
        return Ok(());
    }
    writeln!(out, "  Sources:")?;
    for (i, source) in sources.iter().enumerate() {
        let json = serde_json::to_string(source).map_err(io::Error::other)?;
        writeln!(out, "    Source {}: {json}", i + 1)?;
    }
    Ok(())
}

pub fn connection_report(out: &mut impl Write, report: &ConnectionReport) -> io::Result<()> {
    for (name, result) in [
        ("Chat", &report.chat),
        ("Knowledge base", &report.knowledge_base),
    ] {
        match result {
            Ok(reply) => writeln!(out, "{name} connection successful: {reply}")?,
            Err(e) => writeln!(out, "{name} connection failed: {e}")?,
        }
    }
    writeln!(out, "Connection test complete!")
}
