//! `chatrelay config` — Check or print configuration.

use chatrelay_config::AppConfig;

pub async fn run(defaults: bool) -> Result<(), Box<dyn std::error::Error>> {
    if defaults {
        print!("{}", AppConfig::default_toml());
        return Ok(());
    }

    println!("🔍 Validating configuration...");
    println!("   File: {}", AppConfig::config_path().display());

    match AppConfig::load() {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");
            for w in warnings(&config) {
                println!("   ⚠️  {w}");
            }
            println!();
            println!("   Assistant: {}", config.assistant.name);
            println!("   Gateway:   {}:{}", config.gateway.host, config.gateway.port);
            println!(
                "   Context:   {} entries, idle after {}s",
                config.context.max_entries, config.context.max_idle_secs
            );
            println!("   Timeout:   {}s per provider", config.providers.timeout_secs);
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

fn warnings(config: &AppConfig) -> Vec<&'static str> {
    let mut warnings = Vec::new();
    let p = &config.providers;
    if p.openai.credential().is_none() && p.gemini.credential().is_none() && p.huggingface.credential().is_none() {
        warnings.push("No provider API keys set, every reply will come from the local responder");
    }
    if config.gateway.host == "0.0.0.0" {
        warnings.push("Gateway bound to 0.0.0.0; the chat is reachable from other machines");
    }
    warnings
}
