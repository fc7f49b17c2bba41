mod client;

use anyhow::Result;
use clap::{Parser, Subcommand};
use client::{InboxClient, MessageInfo};
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

#[derive(Parser)]
#[command(name = "inbox-admin")]
#[command(about = "Admin CLI for contact-inbox")]
struct Cli {
    /// Base URL of the contact-inbox server
    #[arg(long, env = "INBOX_URL", default_value = "http://localhost:5000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print stored messages, newest first
    List {
        /// Print the raw JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Delete a message by id
    Delete { id: String },
    /// Submit a message through the public form endpoint
    Send {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        message: String,
    },
    /// Check that the admin secret is accepted
    Login,
}

/// Read the admin secret from the environment.
fn admin_secret() -> Result<Zeroizing<String>> {
    std::env::var("INBOX_ADMIN_SECRET")
        .map(Zeroizing::new)
        .map_err(|_| anyhow::anyhow!("INBOX_ADMIN_SECRET is not set"))
}

fn print_message(message: &MessageInfo) {
    println!("{}  {}", message.created_at, message.id);
    println!("  From: {} <{}>", message.name, message.email);
    for line in message.message.lines() {
        println!("  {}", line);
    }
    println!();
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client = InboxClient::new(&cli.url)?;

    match cli.command {
        Commands::Send {
            name,
            email,
            message,
        } => {
            let id = client.send_message(&name, &email, &message).await?;
            println!("Sent message {}", id);
        }
        Commands::Login => {
            client
                .with_session(&admin_secret()?, async { Ok(()) })
                .await?;
            println!("Admin secret accepted by {}", cli.url);
        }
        Commands::List { json } => {
            let messages = client
                .with_session(&admin_secret()?, client.list_messages())
                .await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&messages)?);
            } else if messages.is_empty() {
                println!("No messages");
            } else {
                messages.iter().for_each(print_message);
            }
        }
        Commands::Delete { id } => {
            client
                .with_session(&admin_secret()?, client.delete_message(&id))
                .await?;
            println!("Deleted message {}", id);
        }
    }

    Ok(())
}
