//! Listen for donations with the async client.
//!
//! ```sh
//! DONATELLO_TOKEN=... DONATELLO_WIDGET=... cargo run --example long_poll
//! ```

use donatello::Donatello;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let token = std::env::var("DONATELLO_TOKEN")?;
    let widget = std::env::var("DONATELLO_WIDGET")?;

    let client = Donatello::builder(token).widget_id(widget).build()?;

    client.on_ready(|user| async move {
        println!("client name: {}", user.nickname);
        println!("total donates: {}", user.donates.total_amount);
        Ok(())
    });

    client.on_donate(|donate| async move {
        println!("------- new donation -------");
        println!("nickname: {}", donate.name);
        println!("amount: {} {}", donate.amount, donate.currency);
        println!("message: {}", donate.message);
        Ok(())
    });

    client.on_error(|err| async move {
        eprintln!("polling error: {err}");
        Ok(())
    });

    // Runs until client.stop() is called from a listener or another task.
    client.run().await;
    Ok(())
}
