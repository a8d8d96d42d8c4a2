//! Interactive REPL.

use crate::commands::format_response;
use byond_topic_client::{Client, OutboundMessage, ResponseKind, ServerAddress};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};
use std::time::Duration;

const HELP_TEXT: &str = r#"
Every line that is not a built-in is sent to the server as a topic.

Built-ins:
  help                 Show this help
  expect <kind>        Expected reply kind: any, float, string, none
  timeout <ms>         Read until the server is silent for <ms> (0 = default)
  quit, exit           Exit the REPL
"#;

/// Per-session REPL settings.
struct ReplState {
    server: ServerAddress,
    expected: ResponseKind,
    timeout: Duration,
    json: bool,
}

enum Outcome {
    Output(String),
    Quit,
}

pub async fn run(
    client: Client,
    server: ServerAddress,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", "byond-topic".bold().cyan());
    println!("Sending topics to {}", server);

    let config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .build();
    let mut rl: Editor<(), DefaultHistory> = Editor::with_config(config)?;

    let history_path = std::env::var("HOME")
        .map(|h| std::path::PathBuf::from(h).join(".byond_topic_history"))
        .unwrap_or_else(|_| ".byond_topic_history".into());
    let _ = rl.load_history(&history_path);

    println!("Type 'help' for available commands.\n");

    let mut state = ReplState {
        server,
        expected: ResponseKind::Any,
        timeout: Duration::ZERO,
        json,
    };

    loop {
        let prompt = format!("{} ", "topic>".cyan());
        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                match execute_repl_line(&client, &mut state, line).await {
                    Ok(Outcome::Output(output)) => println!("{}\n", output),
                    Ok(Outcome::Quit) => break,
                    Err(e) => println!("{}: {}\n", "Error".red(), e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("^D");
                break;
            }
            Err(err) => {
                println!("{}: {:?}", "Error".red(), err);
                break;
            }
        }
    }

    let _ = rl.save_history(&history_path);
    Ok(())
}

async fn execute_repl_line(
    client: &Client,
    state: &mut ReplState,
    line: &str,
) -> Result<Outcome, Box<dyn std::error::Error>> {
    let mut parts = line.split_whitespace();
    let cmd = parts.next().unwrap_or_default().to_lowercase();
    let arg = parts.next();

    match (cmd.as_str(), arg) {
        ("help", _) => Ok(Outcome::Output(HELP_TEXT.to_string())),

        ("quit" | "exit", _) => Ok(Outcome::Quit),

        ("expect", None) => Ok(Outcome::Output(
            "Usage: expect <any|float|string|none>".to_string(),
        )),

        ("timeout", None) => Ok(Outcome::Output("Usage: timeout <ms>".to_string())),

        ("expect", Some(kind)) => {
            state.expected = kind.parse()?;
            Ok(Outcome::Output(format!(
                "Expecting {}",
                state.expected.to_string().yellow()
            )))
        }

        ("timeout", Some(ms)) => {
            state.timeout = Duration::from_millis(ms.parse()?);
            if state.timeout.is_zero() {
                Ok(Outcome::Output("Using configured read strategy".to_string()))
            } else {
                Ok(Outcome::Output(format!(
                    "Reading until silent for {} ms",
                    ms.cyan()
                )))
            }
        }

        _ => {
            let message =
                OutboundMessage::new(state.server.clone(), line).with_expected(state.expected);
            tracing::debug!("REPL topic {:?}", message.as_topic());
            let response = client
                .send_message_with_timeout(&message, state.timeout)
                .await?;
            Ok(Outcome::Output(format_response(&response, state.json)))
        }
    }
}
