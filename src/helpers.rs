use std::path::PathBuf;

use novastream_core::{Category, ContentItem};

/// Per-user data directory (catalog slot, config file, log file).
pub fn data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "NovaStream")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Strict parser for the command line; the library itself maps unknown labels to series.
pub fn parse_category(s: &str) -> Result<Category, String> {
    match s.trim().to_lowercase().as_str() {
        "film" | "films" | "movie" => Ok(Category::Film),
        "serie" | "series" | "show" => Ok(Category::Serie),
        other => Err(format!("unknown category '{}', expected film or serie", other)),
    }
}

/// One tab-separated line per item: id, title, year, genre and episode count for series.
pub fn item_line(item: &ContentItem) -> String {
    let info = item.info();
    let mut line = format!("{}\t{}\t{}\t{}", info.id, info.title, info.year, info.genre);
    if item.category() == Category::Serie {
        let n = item.episodes().len();
        line.push_str(&format!("\t{} {}", n, if n == 1 { "episode" } else { "episodes" }));
    }
    line
}

/// Hides all but the last four characters of a secret.
pub fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 4 {
        return "*".repeat(count);
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("{}{}", "*".repeat(count - 4), tail)
}
