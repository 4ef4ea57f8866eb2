use anyhow::{Context, Result};
use sekaidl_etl::{Config, PipelineDriver, PipelineEvent};
use tokio::sync::mpsc;

/// Run the full download pipeline and print a summary.
pub async fn run_pipeline(config: &Config) -> Result<()> {
    println!("\n🎵 sekaidl\n");
    println!("  Index: {}", config.index_url());
    println!("  Output directory: {}", config.output_dir.display());
    println!(
        "  Keeping songs added more than {} days ago",
        config.cutoff_days
    );
    println!();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let driver = PipelineDriver::from_config(config)
        .context("Failed to set up HTTP client")?
        .with_events(tx);

    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            print_event(&event);
        }
    });

    let result = driver.run().await;
    // Closing the channel lets the printer drain and finish.
    drop(driver);
    printer.await.context("Progress printer stopped unexpectedly")?;

    let report = result.context("Pipeline execution failed")?;

    println!("\n✓ Run complete!\n");
    println!("{report}");
    if report.has_failures() {
        println!("\nSome songs or versions were skipped; see the messages above.");
    }

    Ok(())
}

fn print_event(event: &PipelineEvent) {
    println!("{}", describe_event(event));
}

/// One stdout line per event; failures included.
fn describe_event(event: &PipelineEvent) -> String {
    match event {
        PipelineEvent::Discovered { count } => format!("🔍 Found {count} songs to process\n"),
        PipelineEvent::SongStarted { index, total, url } => {
            format!("Processing {index}/{total}: {url}")
        }
        PipelineEvent::SongFailed { url, error } => format!("  ✗ {url} FAILED: {error}"),
        PipelineEvent::VersionFailed {
            title,
            version_index,
            error,
        } => format!("  ✗ [{title} #{version_index}] FAILED: {error}"),
        PipelineEvent::SongCompleted {
            title,
            tagged,
            versions,
        } => format!("  ✓ {title}: {tagged}/{versions} versions saved"),
    }
}
