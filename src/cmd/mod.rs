pub mod info;
pub mod search;
pub mod sources;

use reel::FilmType;

/// `tv/...` ids are shows unless the caller says otherwise.
pub fn film_type_for(film_id: &str, tv: bool) -> FilmType {
    if tv || film_id.trim_start_matches('/').starts_with("tv/") {
        FilmType::TvShow
    } else {
        FilmType::Movie
    }
}

pub fn type_label(film_type: FilmType) -> &'static str {
    match film_type {
        FilmType::Movie => "Movie",
        FilmType::TvShow => "TV",
    }
}
