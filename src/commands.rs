//! Command execution.

use crate::Commands;
use byond_topic_client::{Client, OutboundMessage, ServerAddress, WireResponse};
use byond_topic_protocol::{Decoder, Encoder};
use colored::Colorize;
use serde_json::json;

/// Executes a command and returns the formatted output.
pub async fn execute(
    client: &Client,
    cmd: Commands,
    json: bool,
) -> Result<String, Box<dyn std::error::Error>> {
    match cmd {
        Commands::Repl => unreachable!(),

        Commands::Send { topic, expect } => {
            let server = require_server(client)?;
            let message = OutboundMessage::new(server, topic).with_expected(expect);
            let response = client.send_message(&message).await?;
            Ok(format_response(&response, json))
        }

        Commands::Command { topic } => {
            let server = require_server(client)?;
            client
                .send_command(OutboundMessage::new(server.clone(), topic.clone()))
                .await?;
            if json {
                Ok(json!({ "sent": topic, "server": server.to_string() }).to_string())
            } else {
                Ok(format!("{} {} to {}", "Sent".green(), topic.cyan(), server))
            }
        }

        Commands::Encode { topic } => Ok(encode_frame(&topic, json)),

        Commands::Decode { hex } => decode_frame(&hex, json),
    }
}

fn require_server(client: &Client) -> Result<ServerAddress, Box<dyn std::error::Error>> {
    client
        .config()
        .server
        .clone()
        .ok_or_else(|| "no server given, use --server host:port or BYOND_TOPIC_SERVER".into())
}

/// Formats the request frame for a topic.
pub fn encode_frame(topic: &str, json: bool) -> String {
    let frame = Encoder::frame(topic);
    let bytes = frame.encode();

    if json {
        return json!({
            "topic": topic,
            "frame": hex::encode(&bytes),
            "size_byte": frame.size_byte(),
            "size_wraps": frame.size_wraps(),
        })
        .to_string();
    }

    let mut output = hex::encode(&bytes);
    if frame.size_wraps() {
        output.push_str(&format!(
            "\n{}: topic too long, size byte wrapped to {}",
            "Warning".yellow(),
            frame.size_byte()
        ));
    }
    output
}

/// Decodes a reply frame given as hex. Whitespace is ignored.
pub fn decode_frame(input: &str, json: bool) -> Result<String, Box<dyn std::error::Error>> {
    let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = hex::decode(compact)?;
    let response = Decoder::decode(&bytes)?;
    Ok(format_response(&response, json))
}

/// Formats a reply for display.
pub fn format_response(response: &WireResponse, json: bool) -> String {
    if json {
        return serde_json::to_string(response).unwrap_or_else(|_| response.to_string());
    }

    match response {
        WireResponse::None => "(no reply)".dimmed().to_string(),
        WireResponse::Float(value) => format!("{} {}", "FLOAT".yellow(), value.to_string().cyan()),
        WireResponse::String(text) => format!("{} {}", "STRING".yellow(), text),
    }
}
