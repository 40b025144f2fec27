use anyhow::Result;
use clap::Parser;
use pagecache::cli;
use pagecache::core::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            // Convert to user-friendly error with context and suggestions
            user_friendly_error(e).display();
            std::process::exit(1);
        }
    }
}
