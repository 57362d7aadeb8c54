use std::time::Instant;

use anyhow::{Context, Result};
use serde_json::json;

use reel::{CallbackSink, Episode, Film, LinkResolver, Stream, Subtitle};

use super::film_type_for;

/// Print streams as they arrive. Returns `false` if none were found.
pub async fn cmd_sources(
    resolver: &LinkResolver,
    provider: &str,
    film_id: &str,
    episode: Option<(u32, u32)>,
    json: bool,
) -> Result<bool> {
    let film = Film {
        id: film_id.to_string(),
        provider_id: provider.to_string(),
        title: film_id.to_string(),
        film_type: film_type_for(film_id, episode.is_some()),
        year: None,
        poster_url: None,
    };
    let episode = episode.map(|(season, number)| Episode::new(season, number));

    if !json {
        match &episode {
            Some(e) => println!("🔎 Resolving {film_id} {}", e.coordinates()),
            None => println!("🔎 Resolving {film_id}"),
        }
    }

    let sink = CallbackSink::new(
        move |stream: Stream| {
            if json {
                println!("{}", json!({ "stream": stream }));
            } else {
                println!("   ▶ {}", stream.name);
                println!("     {}", stream.url);
            }
        },
        move |subtitle: Subtitle| {
            if json {
                println!("{}", json!({ "subtitle": subtitle }));
            } else {
                println!("   💬 {}: {}", subtitle.language, subtitle.url);
            }
        },
    );

    let start = Instant::now();
    let resolution = resolver
        .resolve(&film, episode.as_ref(), &sink)
        .await
        .with_context(|| format!("could not resolve {film_id}"))?;
    let elapsed = start.elapsed();

    if resolution.is_unavailable() {
        eprintln!("❌ no working servers");
        return Ok(false);
    }

    if !json {
        let origin = if resolution.from_cache { "cache" } else { "servers" };
        println!(
            "\n📊 {} streams, {} subtitles from {origin} in {:.2}ms",
            resolution.streams,
            resolution.subtitles,
            elapsed.as_secs_f64() * 1000.0
        );
        if let Some(report) = resolution.report {
            println!(
                "   Servers: {} ok, {} failed, {} unsupported",
                report.succeeded,
                report.failed(),
                report.unsupported
            );
        }
    }

    Ok(true)
}
