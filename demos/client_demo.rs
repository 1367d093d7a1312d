use gateway_sdk::client::GatewayClient;
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = GatewayClient::new("http://localhost:8080");

    // 1. Check the gateway is up
    println!("Checking gateway status...");
    match client.query("/system/status", &[]).await {
        Ok(value) => println!("Status: {}", value),
        Err(e) => eprintln!("Error fetching status: {}", e),
    }

    // 2. Call a mutation with a JSON body
    println!("Echoing a message...");
    let reply = client
        .mutate("/system/echo", &json!({ "message": "hello", "repeat": 3 }))
        .await?;
    println!("Reply: {}", reply);

    // 3. Trip input validation to show the error envelope
    println!("Sending an invalid echo request...");
    match client.mutate("/system/echo", &json!({ "repeat": 1 })).await {
        Ok(value) => println!("Unexpected success: {}", value),
        Err(e) => eprintln!("Gateway rejected it as expected: {}", e),
    }

    Ok(())
}
