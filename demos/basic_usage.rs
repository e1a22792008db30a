//! Basic usage example for the keyvalue client
//!
//! Run with: cargo run --example basic_usage
//!
//! Set KEYVALUE_BASE_URL to point at another compatible service, and
//! KEYVALUE_TOKEN together with KEYVALUE_KEY to reuse an existing slot.

use keyvalue_client::{Client, KeyValue};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct User {
    name: String,
    age: u32,
    occupation: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let client = Client::from_env()?;
    info!("Using service at {}", client.base_url());

    // Reuse a slot if we were given its credentials, otherwise ask for a new one
    let mut kv: KeyValue = match (std::env::var("KEYVALUE_TOKEN"), std::env::var("KEYVALUE_KEY")) {
        (Ok(token), Ok(key)) => {
            info!("Reusing slot for key '{}'", key);
            client.key_value(&token, &key)
        }
        _ => {
            info!("Creating a new slot...");
            let kv = client.create("keyvalue-client-demo")?;
            info!("Created! token={} key={}", kv.token(), kv.key());
            kv
        }
    };

    // Store and validate a plain value
    info!("Storing a value...");
    kv.set_and_validate("Hello, keyvalue!")?;
    info!("Retrieved: {}", kv.get()?);

    // Store an object as JSON and check it comes back equal
    let user = User {
        name: "Alice".to_string(),
        age: 30,
        occupation: "Developer".to_string(),
    };
    info!("Storing JSON data...");
    kv.set_object_and_validate_eq(&user)?;
    let read: User = kv.get_object()?;
    info!("Stored user: {:?}", read);

    // The credentials are all that is needed to come back later
    info!("Credentials: {}", serde_json::to_string(&kv.credentials())?);

    Ok(())
}
