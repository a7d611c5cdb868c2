//! `frontsmith onboard`: first-time setup.

use std::path::Path;

use frontsmith_config::AppConfig;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config_file = super::config_file(config_path);

    println!("frontsmith: First-Time Setup");
    println!("============================\n");

    if let Some(dir) = config_file.parent()
        && !dir.as_os_str().is_empty()
        && !dir.exists()
    {
        std::fs::create_dir_all(dir)?;
        println!("✅ Created config directory: {}", dir.display());
    }

    if config_file.exists() {
        println!("⚠️  Config already exists at: {}", config_file.display());
        println!("   Edit it manually or delete it and re-run onboard.\n");
        return Ok(());
    }

    std::fs::write(&config_file, AppConfig::default_toml())?;
    println!("✅ Created config.toml at: {}", config_file.display());
    println!("\n📝 Next steps:");
    println!("   1. Set DASHSCOPE_API_KEY (or add api_key to {})", config_file.display());
    println!("   2. Run: frontsmith agent path/to/your/project");
    println!("   3. Describe what you want changed\n");

    Ok(())
}
