//! `chatrelay providers` — Show the fallback chain.

use chatrelay_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let chain = chatrelay_providers::build_from_config(&config);

    println!("🤖 Provider fallback order");
    println!("==========================");
    for line in render(&chain.availability()) {
        println!("{line}");
    }
    println!("  {}. local responder (always available)", chain.len() + 1);
    println!();
    println!("  Per-provider timeout: {}s", config.providers.timeout_secs);
    println!("  Environment variables:");
    println!("    OPENAI_API_KEY, GEMINI_API_KEY, HUGGINGFACE_API_KEY");

    Ok(())
}

fn render(availability: &[(String, bool)]) -> Vec<String> {
    availability
        .iter()
        .enumerate()
        .map(|(i, (name, available))| {
            let status = if *available { "✅ ready" } else { "⛔ no API key" };
            format!("  {}. {name:<12} {status}", i + 1)
        })
        .collect()
}
