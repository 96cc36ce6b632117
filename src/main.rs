use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = friendgate::cli::Cli::parse();
    if let Err(e) = friendgate::cmd::dispatch(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
