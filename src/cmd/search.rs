use anyhow::Result;

use reel::LinkResolver;

use super::type_label;
use crate::OutputFormat;

pub async fn cmd_search(
    resolver: &LinkResolver,
    provider: &str,
    query: &str,
    page: u32,
    format: OutputFormat,
) -> Result<()> {
    let results = resolver.search(provider, query, page).await?;

    if matches!(format, OutputFormat::Json) {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.results.is_empty() {
        println!("🔍 No results for \"{query}\"");
        return Ok(());
    }

    println!("🔍 {} results for \"{query}\" (page {}):\n", results.results.len(), results.page);
    for item in &results.results {
        let year = item.year.map(|y| format!(" ({y})")).unwrap_or_default();
        println!("   [{}] {}{year}", type_label(item.film_type), item.title);
        println!("        {}", item.id);
    }
    if results.has_next_page {
        println!("\n   More: --page {}", results.page + 1);
    }

    Ok(())
}
