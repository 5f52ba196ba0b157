use anyhow::Result;
use std::process;
use tea_scraper::{init_tracing_once, ScrapeOptions, TeaScraper};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing_once();

    let opts = ScrapeOptions::from_env().with_progress_label("r/tea");
    let scraper = TeaScraper::from_options(opts);

    match scraper.run_live().await {
        Ok(Some(report)) => {
            println!(
                "Matched {} submission(s): {} inserted, {} already stored, {} forbidden, {} insert failure(s)",
                report.matched, report.inserted, report.duplicates, report.forbidden, report.insert_failures
            );
            Ok(())
        }
        // Connection failure was already logged; nothing ran.
        Ok(None) => Ok(()),
        Err(e) => {
            eprintln!("tea-scraper error: {:#}", e);
            process::exit(1);
        }
    }
}
