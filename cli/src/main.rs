//! Thin command-line client for the exchange's wire protocol: builds a
//! framed XML request from subcommand flags, sends it over a single
//! TCP connection, and prints whatever comes back.

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

#[derive(Parser)]
#[command(name = "exchange-cli")]
#[command(about = "Command line client for the exchange's XML/TCP protocol")]
struct Cli {
    #[arg(short, long, default_value = "127.0.0.1:12345")]
    server: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Creates an account with a starting balance.
    CreateAccount {
        #[arg(long)]
        id: String,
        #[arg(long)]
        balance: Decimal,
    },
    /// Credits a position in a symbol to an existing account.
    CreateSymbol {
        #[arg(long)]
        sym: String,
        #[arg(long)]
        account: String,
        #[arg(long)]
        amount: Decimal,
    },
    /// Places a limit order. Positive amount is a buy, negative a sell.
    Order {
        #[arg(long)]
        account: String,
        #[arg(long)]
        sym: String,
        #[arg(long)]
        amount: Decimal,
        #[arg(long)]
        limit: Decimal,
    },
    /// Queries the composite status of an order.
    Query {
        #[arg(long)]
        account: String,
        #[arg(long)]
        id: u64,
    },
    /// Cancels an open order.
    Cancel {
        #[arg(long)]
        account: String,
        #[arg(long)]
        id: u64,
    },
    /// Sends an arbitrary XML payload as-is, for exercising requests
    /// the other subcommands don't model directly.
    Raw {
        #[arg(long)]
        xml: String,
    },
}

fn build_xml(command: &Commands) -> String {
    match command {
        Commands::CreateAccount { id, balance } => {
            format!(r#"<create><account id="{id}" balance="{balance}"/></create>"#)
        }
        Commands::CreateSymbol { sym, account, amount } => {
            format!(r#"<create><symbol sym="{sym}"><account id="{account}">{amount}</account></symbol></create>"#)
        }
        Commands::Order { account, sym, amount, limit } => {
            format!(
                r#"<transactions id="{account}"><order sym="{sym}" amount="{amount}" limit="{limit}"/></transactions>"#
            )
        }
        Commands::Query { account, id } => {
            format!(r#"<transactions id="{account}"><query id="{id}"/></transactions>"#)
        }
        Commands::Cancel { account, id } => {
            format!(r#"<transactions id="{account}"><cancel id="{id}"/></transactions>"#)
        }
        Commands::Raw { xml } => xml.clone(),
    }
}

/// Sends one length-prefixed frame and collects the reply, draining
/// the socket until it goes quiet for a short interval (the wire
/// protocol carries no length prefix on replies).
async fn send_request(server: &str, xml: &str) -> anyhow::Result<String> {
    let mut stream = TcpStream::connect(server).await?;
    let frame = format!("{}\n{}", xml.len(), xml);
    stream.write_all(frame.as_bytes()).await?;
    stream.flush().await?;

    let mut reply = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        match tokio::time::timeout(Duration::from_millis(500), stream.read(&mut chunk)).await {
            Ok(Ok(0)) => break,
            Ok(Ok(n)) => reply.extend_from_slice(&chunk[..n]),
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => break,
        }
    }
    Ok(String::from_utf8(reply)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let xml = build_xml(&cli.command);
    let reply = send_request(&cli.server, &xml).await?;
    println!("{}", reply);
    Ok(())
}
