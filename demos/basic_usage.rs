//! Basic example browsing a SciELO Manager instance.
//!
//! This example shows how to:
//! - Create a client and list the discovered endpoints
//! - Fetch a single journal and deserialize it into a typed struct
//! - Iterate over a filtered collection
//! - Expand the relations of a document
//!
//! Run with: `cargo run --example basic_usage -- <username> <api_key>`

use scieloapi::{Client, Error, QueryParams};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Journal {
    title: String,
    #[serde(default)]
    issns: Vec<String>,
    resource_uri: String,
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("scieloapi=info,basic_usage=info")
        .init();

    let mut args = std::env::args().skip(1);
    let (username, api_key) = match (args.next(), args.next()) {
        (Some(username), Some(api_key)) => (username, api_key),
        _ => {
            eprintln!("usage: basic_usage <username> <api_key>");
            std::process::exit(2);
        }
    };

    let client = Client::builder().credentials(username, api_key).build()?;

    println!("=== Endpoints ({}) ===", client.version());
    for name in client.endpoints() {
        println!("- {}", name);
    }
    println!();

    let journals = client
        .endpoint("journals")
        .ok_or_else(|| Error::Protocol("Server has no journals endpoint".to_string()))?;

    println!("=== Single Journal ===");
    let document = journals.get(70)?;
    let journal: Journal = serde_json::from_value(Value::Object(document.clone()))
        .map_err(|e| Error::SerializationFailed(e.to_string()))?;
    println!("{:#?}", journal);
    println!();

    println!("=== Journals of a Collection ===");
    let params = QueryParams::new().with("collection", "saude-publica");
    for journal in journals.filter(params).take(10) {
        let journal = journal?;
        println!("{}", journal.get("title").and_then(Value::as_str).unwrap_or("?"));
    }
    println!();

    println!("=== Relations ===");
    let expanded = client.fetch_relations(&document, &["collections"])?;
    println!("{:#}", expanded.get("collections").cloned().unwrap_or(Value::Null));

    Ok(())
}
