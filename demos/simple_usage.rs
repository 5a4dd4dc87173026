//! Fetch profile, donation history and supporters with the blocking client.
//!
//! ```sh
//! DONATELLO_TOKEN=... cargo run --example simple_usage
//! ```

use donatello::blocking::Donatello;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let token = std::env::var("DONATELLO_TOKEN")?;
    let client = Donatello::builder(token).build_blocking()?;

    let user = client.get_me()?;
    println!("client name: {}", user.nickname);
    println!("total donates: {}", user.donates.total_amount);

    let donates = client.get_donates(0, 20)?;
    println!("{} of {} donations on this page", donates.len(), donates.total);
    for donate in &donates {
        println!("  {donate}");
    }

    let clients = client.get_clients()?;
    for supporter in &clients {
        println!("  {supporter}");
    }

    Ok(())
}
