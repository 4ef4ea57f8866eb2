use anyhow::{Context, Result};
use sekaidl_etl::{Config, PipelineDriver, SurveyEntry};

/// Discover eligible songs and print what each detail page offers.
///
/// Nothing is downloaded and the output directory is left alone.
pub async fn list_songs(config: &Config, limit: Option<usize>, json: bool) -> Result<()> {
    let driver = PipelineDriver::from_config(config).context("Failed to set up HTTP client")?;
    let today = chrono::Local::now().date_naive();
    let entries = driver
        .survey(today, limit)
        .await
        .context("Failed to discover songs")?;

    if json {
        let out = serde_json::to_string_pretty(&entries).context("Failed to serialize songs")?;
        println!("{out}");
        return Ok(());
    }

    if entries.is_empty() {
        println!("No songs found.");
        return Ok(());
    }

    for (i, entry) in entries.iter().enumerate() {
        print_entry(i + 1, entry);
    }
    println!("\n{} songs listed", entries.len());

    Ok(())
}

fn print_entry(position: usize, entry: &SurveyEntry) {
    println!("\n{position}. {} (added {})", entry.link.url(), entry.link.date_added());

    if let Some(error) = &entry.error {
        println!("   ✗ {error}");
        return;
    }
    let Some(metadata) = &entry.metadata else {
        return;
    };

    println!("   Title: {}", metadata.title());
    println!(
        "   Cover: {}",
        metadata.cover_image_url().unwrap_or("<none>")
    );
    for (i, version) in metadata.versions().iter().enumerate() {
        let singers = if version.singers.is_empty() {
            String::from("<no singers>")
        } else {
            version.artist()
        };
        println!("   [{i}] {singers} -> {}", version.source);
    }
}
