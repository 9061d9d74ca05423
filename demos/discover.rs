//! Share discovery example

use daap::scan;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    println!("Discovering DAAP shares...");

    let shares = scan(Duration::from_secs(5)).await?;

    if shares.is_empty() {
        println!("No shares found.");
    } else {
        println!("Found {} shares:", shares.len());
        for share in shares {
            let lock = if share.password_protected { " (password)" } else { "" };
            println!("  - {} at {}:{}{lock}", share.name, share.address, share.port);
        }
    }
    Ok(())
}
