// SPDX-License-Identifier: MIT OR Apache-2.0

//! Example showing how a provider resolves its settings and looks up the
//! credentials of a source.
//!
//! Usage:
//!   SOURCES_HOST=localhost SOURCES_PORT=3000 cargo run --example sources_lookup -- <source_id> <account>

use inventory_providers_common::{Identity, Options, SourcesApiClient, SourcesApiConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let source_id = args.next().unwrap_or_else(|| "1".to_string());
    let account = args.next().unwrap_or_else(|| "11001".to_string());

    println!("=== Options ===");
    let options = Options::init_shared()?;
    println!("  Resolved from:  {:?}", options.source);
    println!("  Kafka:          {}:{}", options.kafka_host, options.kafka_port);
    println!("  Metrics port:   {}", options.metrics_port);
    println!(
        "  Status topic:   {}",
        options.kafka_topic("platform.sources.status")
    );

    println!("\n=== Source {} ===", source_id);
    let config = SourcesApiConfig::from_env();
    println!("  Sources API:    {}", config.base_url);
    println!("  Using PSK:      {}", config.psk.is_some());

    let client = SourcesApiClient::new(config, Some(&Identity::for_account(&account)))?;

    match client.fetch_default_endpoint(&source_id).await? {
        Some(endpoint) => {
            println!(
                "✓ Default endpoint {} ({}://{})",
                endpoint.id,
                endpoint.scheme.as_deref().unwrap_or("?"),
                endpoint.host.as_deref().unwrap_or("?")
            );

            match client
                .fetch_authentication(&source_id, Some(&endpoint), None)
                .await?
            {
                Some(auth) => println!(
                    "✓ Authentication {} for user {:?} (password present: {})",
                    auth.id,
                    auth.username,
                    auth.password.is_some()
                ),
                None => println!("✗ No authentication found"),
            }
        }
        None => println!("✗ No default endpoint found"),
    }

    match client.fetch_application(&source_id).await? {
        Some(app) => println!("✓ Application {} is {:?}", app.id, app.availability_status),
        None => println!("✗ No application found"),
    }

    Ok(())
}
