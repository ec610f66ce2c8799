use clap::Parser;

use eventwatch::config::CliArgs;

#[tokio::main]
async fn main() {
    let cli = CliArgs::parse();
    if let Err(err) = eventwatch::run(cli).await {
        eprintln!("eventwatch failed: {}", err);
        std::process::exit(1);
    }
}
