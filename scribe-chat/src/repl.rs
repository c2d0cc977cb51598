//! Interactive shell: `exit` quits, `new` starts a fresh conversation,
//! anything else is sent as a prompt.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::orchestrator::ChatOrchestrator;

pub const PROMPT: &str =
    "Enter your question (or type 'exit' to quit, 'new' to start a new conversation): ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Exit,
    NewConversation,
    Prompt(String),
}

/// Classify one input line (without its line terminator).
///
/// Sentinels match case-insensitively and exactly; everything else,
/// including blank input, is forwarded verbatim.
pub fn parse_command(line: &str) -> Command {
    if line.eq_ignore_ascii_case("exit") {
        Command::Exit
    } else if line.eq_ignore_ascii_case("new") {
        Command::NewConversation
    } else {
        Command::Prompt(line.to_string())
    }
}

/// Run the read-eval-print loop until `exit` or end of input.
pub async fn run<R, W>(
    orchestrator: &mut ChatOrchestrator,
    reader: R,
    mut writer: W,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();

    loop {
        writer.write_all(PROMPT.as_bytes()).await?;
        writer.flush().await?;

        let Some(line) = lines.next_line().await? else {
            tracing::debug!("Input closed, leaving chat loop");
            break;
        };

        match parse_command(&line) {
            Command::Exit => break,
            Command::NewConversation => {
                orchestrator.start_new_conversation();
                writer.write_all(b"New conversation started.\n").await?;
            }
            Command::Prompt(prompt) => match orchestrator.chat(&prompt).await {
                Ok(response) => {
                    writer.write_all(response.as_bytes()).await?;
                    writer.write_all(b"\n").await?;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Assistant request failed");
                    writer.write_all(format!("Error: {}\n", e).as_bytes()).await?;
                }
            },
        }
    }

    writer.flush().await
}
