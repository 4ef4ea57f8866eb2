use anyhow::Result;
use sekaidl_etl::{config, Config};

/// Show the current effective configuration.
pub fn show_config(config: &Config) -> Result<()> {
    println!("Current Configuration");
    println!("=====================\n");

    let path = config::config_file_path();
    println!("Config file: {}", path.display());
    let exists = path.exists();
    println!("File exists: {}\n", if exists { "yes" } else { "no (using defaults)" });

    println!("Settings:");
    println!("  base_url: {}", config.base_url);
    println!("  index_path: {}", config.index_path);
    println!("  output_dir: {}", config.output_dir.display());
    println!("  cutoff_days: {}", config.cutoff_days);
    println!("  title_suffix: {:?}", config.title_suffix);
    println!("  album: {}", config.album);
    println!("  http.user_agent: {}", config.http.user_agent);
    println!("  http.accept_language: {}", config.http.accept_language);
    println!("  http.referer: {}", config.http.referer);
    println!("  http.timeout_secs: {}", config.http.timeout_secs);
    println!("  http.retries: {}", config.http.retries);
    println!("  transcoder.program: {}", config.transcoder.program.display());
    println!("  transcoder.sample_rate: {}", config.transcoder.sample_rate);
    println!("  logging.level: {}", config.logging.level);
    println!("  logging.coloured: {}", config.logging.coloured);

    println!("\nPriority: CLI args > ENV vars (SEKAIDL_*) > Config file > Defaults");

    Ok(())
}

/// Show the config file path.
pub fn show_path() -> Result<()> {
    println!("{}", config::config_file_path().display());
    Ok(())
}

/// Show example configuration.
pub fn show_example() -> Result<()> {
    print!("{}", config::example_config());
    Ok(())
}

/// Initialize config file with defaults.
pub fn init_config() -> Result<()> {
    let created = config::ensure_config_file()?;
    let config_path = config::config_file_path();

    if created {
        println!("✓ Created config file: {}", config_path.display());
        println!("\nEdit this file to configure sekaidl.");
    } else {
        println!("Config file already exists: {}", config_path.display());
    }

    Ok(())
}
