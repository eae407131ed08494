//! Example demonstrating selection tracing instrumentation.
//!
//! Run with: cargo run -p bestshot-core --example select_tracing -- <dir> <url>...
//!
//! The first argument is a directory of placeholder images (may be missing),
//! the remaining arguments are candidate URLs in preference order.

use bestshot_core::{
    load_placeholders, FetchConfig, HttpImageFetcher, ImageSelector, SelectionConfig,
};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::new("bestshot_core=debug,info"))
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    let mut args = std::env::args().skip(1);
    let placeholder_dir = args.next().unwrap_or_else(|| "placeholders".to_string());
    let candidates: Vec<String> = args.collect();

    println!("=== Bestshot Selection Tracing Demo ===\n");

    let config = SelectionConfig::from_env();
    let fetch_config = FetchConfig::from_env();
    println!("Config: {:?}", config);
    println!("Fetch:  {:?}\n", fetch_config);

    let corpus = load_placeholders(&placeholder_dir);
    println!("Loaded {} placeholder fingerprints\n", corpus.len());

    let fetcher = match HttpImageFetcher::with_config(fetch_config) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Failed to create client: {}", e);
            return;
        }
    };
    let selector = match ImageSelector::with_config(fetcher, config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            return;
        }
    };

    println!("Evaluating {} candidates...\n", candidates.len());

    let result = selector.select_best_image(&candidates, &corpus).await;
    match result.into_selected() {
        Some(selected) => {
            let (width, height) = selected.image.dimensions();
            println!("\nSelected: {}", selected.url);
            println!("   Size: {}x{}", width, height);
        }
        None => println!("\nNo acceptable candidate"),
    }
}
