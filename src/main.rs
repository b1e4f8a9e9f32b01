// Kiln - multi-target browser extension bundler

use kiln::cli::CliHandler;

#[tokio::main]
async fn main() {
    let handler = CliHandler::new();

    if let Err(e) = handler.run().await {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}
