use bankin::{Bank, Client, ListOptions};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let requests = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&requests);
    let client = Client::from_env()
        .map_err(|e| format!("Set BANKIN_CLIENT_ID and BANKIN_CLIENT_SECRET: {e}"))?
        .with_observer(move |event| {
            if let bankin::TransportEvent::Sending { .. } = event {
                counter.fetch_add(1, Ordering::Relaxed);
            }
        });

    // Walk every bank page by page.
    let mut page = client.banks().list(&ListOptions::new().limit(100)).await?;
    let mut banks: Vec<Bank> = page.resources_as()?;
    while page.has_next() {
        page = page.next().await?;
        banks.extend(page.resources_as::<Bank>()?);
    }

    println!(
        "Fetched {} banks in {} requests:",
        banks.len(),
        requests.load(Ordering::Relaxed)
    );
    for bank in &banks {
        println!(
            "{} | {} | {}",
            bank.id,
            bank.name,
            bank.country_code.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}
