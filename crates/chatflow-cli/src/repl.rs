//! Sequential read-line chat loop hosting the streaming client.
//!
//! One turn runs at a time: the loop does not read new input while a
//! response is streaming, which serializes turns by construction.

use std::io::Write;

use anyhow::Result;
use futures::StreamExt;
use tokio::io::{AsyncBufReadExt, BufReader};

use chatflow_core::{ChatError, Conversation, StreamingChatClient, visible_prefix};

const GREETING: &str = "Hello, I'm your AI assistant! Ask me anything.";

pub async fn run(client: StreamingChatClient) -> Result<()> {
    let mut conversation = Conversation::with_greeting(GREETING);
    println!("assistant> {GREETING}");
    println!("(type /quit to exit)");

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        print!("you> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim() == "/quit" {
            break;
        }

        run_turn(&client, &mut conversation, &line).await?;
    }

    Ok(())
}

async fn run_turn(
    client: &StreamingChatClient,
    conversation: &mut Conversation,
    input: &str,
) -> Result<()> {
    // History snapshot excludes the turn being started.
    let history = conversation.history().to_vec();
    let Some(user_text) = conversation.begin_turn(input) else {
        return Ok(());
    };

    print!("assistant> ");
    std::io::stdout().flush()?;

    let mut stream = client.submit_turn(&history, &user_text);
    let mut printed = String::new();
    let mut failed = false;

    while let Some(item) = stream.next().await {
        match item {
            Ok(snapshot) => {
                print_progress(&snapshot, &mut printed)?;
                conversation.apply_update(snapshot);
            }
            Err(e @ ChatError::RequestFailed { .. }) => {
                // Nothing streamed yet; the placeholder is discarded.
                println!("(no response)");
                eprintln!("error: {e}");
                failed = true;
                break;
            }
            Err(e) => {
                // Whatever already streamed in stays visible.
                println!();
                eprintln!("error: {e}");
                failed = true;
                break;
            }
        }
    }

    if failed {
        conversation.fail_turn();
    } else {
        println!();
        conversation.complete_turn();
    }
    Ok(())
}

/// Print the not-yet-shown part of the latest snapshot.
///
/// Snapshots replace the whole response, but a terminal can only append, so
/// the unclosed-think tail is held back; what remains grows monotonically
/// and prints as a suffix. If a snapshot ever fails to extend what was shown
/// the response is reprinted on a fresh line.
fn print_progress(snapshot: &str, printed: &mut String) -> Result<()> {
    let shown = visible_prefix(snapshot);
    if let Some(suffix) = shown.strip_prefix(printed.as_str()) {
        if !suffix.is_empty() {
            print!("{suffix}");
            std::io::stdout().flush()?;
        }
    } else {
        print!("\nassistant> {shown}");
        std::io::stdout().flush()?;
    }
    *printed = shown.to_string();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_tracks_growing_snapshots() {
        let mut printed = String::new();
        print_progress("Hel", &mut printed).unwrap();
        assert_eq!(printed, "Hel");
        print_progress("Hello", &mut printed).unwrap();
        assert_eq!(printed, "Hello");
    }

    #[test]
    fn unclosed_think_tail_is_held_back() {
        let mut printed = String::new();
        print_progress("before<think>reasoning", &mut printed).unwrap();
        assert_eq!(printed, "before");
        // Close arrives: the span vanishes and visible text keeps growing.
        print_progress("beforeafter", &mut printed).unwrap();
        assert_eq!(printed, "beforeafter");
    }

    #[test]
    fn fully_hidden_snapshot_prints_nothing() {
        let mut printed = String::new();
        print_progress("<think>only reasoning", &mut printed).unwrap();
        assert_eq!(printed, "");
    }
}
