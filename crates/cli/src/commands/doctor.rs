//! `frontsmith doctor`: diagnose configuration and environment.

use std::path::Path;

use frontsmith_config::AppConfig;
use frontsmith_providers::{check_reachability, Reachability};
use frontsmith_tools::npm::find_executable;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 frontsmith Doctor: System Diagnostics");
    println!("=======================================\n");

    let mut issues = 0;

    let config_file = super::config_file(config_path);
    if !config_file.exists() {
        println!("  ⚠️  No config file, using defaults (run `frontsmith onboard`)");
        issues += 1;
    }

    let config = match super::load_config(config_path) {
        Ok(config) => {
            println!("  ✅ Configuration valid");
            config
        }
        Err(e) => {
            println!("  ❌ {e}");
            println!("\n  ⚠️  Fix the config file before continuing.");
            return Ok(());
        }
    };

    if config.has_api_key() {
        println!("  ✅ API key configured");
    } else {
        println!("  ❌ No API key: set DASHSCOPE_API_KEY or add api_key to config.toml");
        issues += 1;
    }

    println!(
        "  ℹ️  Provider {} with model {}",
        config.default_provider,
        frontsmith_providers::router::model_for(&config, &config.default_provider)
    );

    if config.has_api_key() {
        issues += check_provider(&config).await;
    }

    match find_executable(&config.runner.package_manager) {
        Some(path) => println!("  ✅ {} found at {}", config.runner.package_manager, path.display()),
        None => {
            println!("  ❌ {} not found on PATH", config.runner.package_manager);
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}

/// Contact the default provider. Returns the number of issues found.
async fn check_provider(config: &AppConfig) -> usize {
    let router = frontsmith_providers::build_from_config(config);
    let Some(provider) = router.default() else {
        println!("  ❌ Provider {} is not registered", config.default_provider);
        return 1;
    };
    let model = frontsmith_providers::model_for(config, &config.default_provider);

    match check_reachability(provider.as_ref(), &model).await {
        Reachability::Reachable { model_listed: Some(false) } => {
            println!("  ⚠️  {} is reachable but does not list model {model}", provider.name());
            1
        }
        Reachability::Reachable { .. } => {
            println!("  ✅ {} is reachable", provider.name());
            0
        }
        Reachability::Rejected => {
            println!("  ❌ {} rejected the request: check api_key and api_url", provider.name());
            1
        }
        Reachability::Unreachable(reason) => {
            println!("  ❌ {} is unreachable: {reason}", provider.name());
            1
        }
    }
}
