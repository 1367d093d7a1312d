use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Management CLI for the RPC gateway", long_about = None)]
struct Cli {
    /// Gateway base URL.
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Admin API key, required by status and procedures.
    #[arg(short, long, default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gateway system status
    Status,
    /// List registered procedures and their routes
    Procedures {
        /// Dump the full JSON listing, schemas included
        #[arg(long)]
        full: bool,
    },
    /// Send a request through the public surface and print the reply
    Call {
        /// HTTP method, e.g. GET or POST
        method: String,
        /// Request path, query string included, e.g. /users?limit=5
        path: String,
        /// JSON request body
        #[arg(short, long)]
        data: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Status => {
            let status = admin_fetch(&client, &cli.url, &cli.key, "/admin/status").await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Commands::Procedures { full } => {
            let listing = admin_fetch(&client, &cli.url, &cli.key, "/admin/procedures").await?;
            if full {
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else {
                print_procedure_table(listing.as_array().map_or(&[], Vec::as_slice));
            }
        }
        Commands::Call { method, path, data } => {
            call_gateway(&client, &cli.url, &method, &path, data.as_deref()).await?;
        }
    }

    Ok(())
}

/// GET an admin endpoint with the bearer key and parse the JSON reply.
async fn admin_fetch(
    client: &reqwest::Client,
    base: &str,
    key: &str,
    path: &str,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {key}"))?,
    );
    let res = client
        .get(format!("{base}{path}"))
        .headers(headers)
        .send()
        .await?;
    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        return Err(format!("admin API returned {status}: {body}").into());
    }
    Ok(res.json().await?)
}

/// Render the procedure listing as an aligned table, descriptions last.
fn print_procedure_table(entries: &[Value]) {
    if entries.is_empty() {
        println!("no procedures registered");
        return;
    }
    let field = |entry: &Value, key: &str| -> String {
        entry
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or("-")
            .to_string()
    };
    let rows: Vec<[String; 5]> = entries
        .iter()
        .map(|entry| {
            [
                field(entry, "name"),
                field(entry, "kind"),
                field(entry, "method"),
                field(entry, "path"),
                field(entry, "description"),
            ]
        })
        .collect();
    let mut widths = ["NAME".len(), "KIND".len(), "METHOD".len(), "PATH".len()];
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.len());
        }
    }
    println!(
        "{:<w0$}  {:<w1$}  {:<w2$}  {:<w3$}  DESCRIPTION",
        "NAME",
        "KIND",
        "METHOD",
        "PATH",
        w0 = widths[0],
        w1 = widths[1],
        w2 = widths[2],
        w3 = widths[3],
    );
    for row in &rows {
        println!(
            "{:<w0$}  {:<w1$}  {:<w2$}  {:<w3$}  {}",
            row[0],
            row[1],
            row[2],
            row[3],
            row[4],
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2],
            w3 = widths[3],
        );
    }
}

/// Fire one request at the public surface and print status plus body.
async fn call_gateway(
    client: &reqwest::Client,
    base: &str,
    method: &str,
    path: &str,
    data: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let method = reqwest::Method::from_bytes(method.to_ascii_uppercase().as_bytes())?;
    let mut request = client.request(method, format!("{base}{path}"));
    if let Some(data) = data {
        // Parse up front so a typo fails here, not as a gateway 400.
        let body: Value = serde_json::from_str(data)?;
        request = request.json(&body);
    }
    let res = request.send().await?;
    println!("{}", res.status());
    let text = res.text().await?;
    if text.is_empty() {
        return Ok(());
    }
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{text}"),
    }
    Ok(())
}
