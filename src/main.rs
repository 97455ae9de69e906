//! scriv - commit edited documents into GitHub repositories.

use scrivener::cli;
use scrivener::ui::output;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run().await {
        output::error(format!("{:#}", e));
        std::process::exit(1);
    }
}
