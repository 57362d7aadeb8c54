use anyhow::Result;

use reel::LinkResolver;

use super::{film_type_for, type_label};
use crate::OutputFormat;

pub async fn cmd_info(
    resolver: &LinkResolver,
    provider: &str,
    film_id: &str,
    tv: bool,
    format: OutputFormat,
) -> Result<()> {
    let info = resolver
        .film_info(provider, film_id, film_type_for(film_id, tv))
        .await?;

    if matches!(format, OutputFormat::Json) {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    let film = &info.film;
    println!("🎬 {} [{}]", film.title, type_label(film.film_type));
    if let Some(year) = film.year {
        println!("   Year: {year}");
    }
    if !info.genres.is_empty() {
        println!("   Genres: {}", info.genres.join(", "));
    }
    if let Some(description) = &info.description {
        println!("\n{description}");
    }
    if !info.seasons.is_empty() {
        println!("\n📺 {} seasons:", info.seasons.len());
        for season in &info.seasons {
            println!("   {} (id {})", season.name, season.id);
        }
    }

    Ok(())
}
