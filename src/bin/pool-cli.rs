use chrono::Utc;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "pool-cli")]
#[command(about = "Client CLI for the processing pool", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit data and wait for the result
    Process {
        data: String,
        #[arg(long)]
        request_id: Option<String>,
    },
    /// Submit a transaction without waiting
    Transaction {
        from: String,
        to: String,
        amount: f64,
    },
    /// Query the status of a request
    Status { request_id: String },
    /// Check service health
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Process { data, request_id } => {
            let res = client
                .post(format!("{}/api/processing/process", cli.url))
                .json(&json!({ "request_id": request_id, "data": data }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Transaction { from, to, amount } => {
            let res = client
                .post(format!("{}/api/processing/transaction", cli.url))
                .json(&json!({
                    "transaction_id": Uuid::new_v4(),
                    "account_from": from,
                    "account_to": to,
                    "amount": amount,
                    "timestamp": Utc::now(),
                }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Status { request_id } => {
            let res = client
                .get(format!("{}/api/processing/status/{}", cli.url, request_id))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Health => {
            let res = client.get(format!("{}/health", cli.url)).send().await?;
            println!("{}", res.status());
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: service returned status {}", status);
    }
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) if !text.is_empty() => println!("{}", text),
        Err(_) => {}
    }
    Ok(())
}
