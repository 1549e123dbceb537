use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Title given to the single episode synthesized for legacy series.
pub const LEGACY_EPISODE_TITLE: &str = "Épisode 1";

/// Placeholder used for duration, year and genre when nothing is known.
pub const UNKNOWN_FIELD: &str = "-";

fn unknown() -> String {
    UNKNOWN_FIELD.to_string()
}

// Saved and remote data is loosely typed: numbers may come as strings and the
// other way round, and any field may be null. A bad field reads as missing.
pub(crate) fn read_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

pub(crate) fn read_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(read_text(d)?.unwrap_or_default())
}

fn read_or_unknown<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(read_text(d)?.unwrap_or_else(unknown))
}

fn read_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn read_season<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    Ok(read_number(d)?.unwrap_or_default())
}

fn read_episodes<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Episode>, D::Error> {
    Ok(parse_episodes(&Value::deserialize(d)?))
}

/// The two content categories. Any label other than `film` is a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Film,
    Serie,
}

impl Category {
    pub fn from_label(label: &str) -> Self {
        if label == "film" { Category::Film } else { Category::Serie }
    }

    /// Value of the `type` column in the remote store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Film => "film",
            Category::Serie => "serie",
        }
    }
}

impl From<&str> for Category {
    fn from(label: &str) -> Self {
        Category::from_label(label)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    #[serde(default, deserialize_with = "read_season")]
    pub season: u32,
    #[serde(default, deserialize_with = "read_number", skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
    #[serde(default, deserialize_with = "read_string")]
    pub title: String,
    #[serde(default, deserialize_with = "read_string")]
    pub video_url: String,
}

impl Episode {
    /// The stand-in episode for a series that only ever had a top-level URL.
    pub fn legacy(video_url: &str) -> Self {
        Self {
            season: 1,
            episode: Some(1),
            title: LEGACY_EPISODE_TITLE.to_string(),
            video_url: video_url.to_string(),
        }
    }
}

/// Reads an episode list stored either as a JSON array or as that array
/// serialized into a string. Entries that are not objects are skipped, anything
/// else that is not a list reads as no episodes.
pub fn parse_episodes(value: &Value) -> Vec<Episode> {
    match value {
        Value::Array(items) => episodes_from(items),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Array(items)) => episodes_from(&items),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn episodes_from(items: &[Value]) -> Vec<Episode> {
    items.iter().filter_map(|item| Episode::deserialize(item).ok()).collect()
}

/// Episodes for a series whose stored list is empty: one legacy episode when a
/// URL is known, nothing otherwise.
pub fn synthesize_episodes(video_url: Option<&str>) -> Vec<Episode> {
    match video_url {
        Some(url) if !url.is_empty() => vec![Episode::legacy(url)],
        _ => Vec::new(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilmItem {
    #[serde(default, deserialize_with = "read_string")]
    pub id: String,
    #[serde(default, deserialize_with = "read_string")]
    pub title: String,
    #[serde(default, deserialize_with = "read_string")]
    pub description: String,
    #[serde(default, deserialize_with = "read_text", skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "read_text", skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default = "unknown", deserialize_with = "read_or_unknown")]
    pub duration: String,
    #[serde(default = "unknown", deserialize_with = "read_or_unknown")]
    pub year: String,
    #[serde(default = "unknown", deserialize_with = "read_or_unknown")]
    pub genre: String,
}

impl Default for FilmItem {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            description: String::new(),
            image: None,
            video_url: None,
            duration: unknown(),
            year: unknown(),
            genre: unknown(),
        }
    }
}

impl FilmItem {
    /// Overwrites every field the patch carries. Episodes do not apply to films.
    pub fn apply(&mut self, patch: &ItemPatch) {
        if let Some(title) = &patch.title { self.title = title.clone(); }
        if let Some(description) = &patch.description { self.description = description.clone(); }
        if let Some(image) = &patch.image { self.image = Some(image.clone()); }
        if let Some(video_url) = &patch.video_url { self.video_url = Some(video_url.clone()); }
        if let Some(duration) = &patch.duration { self.duration = duration.clone(); }
        if let Some(year) = &patch.year { self.year = year.clone(); }
        if let Some(genre) = &patch.genre { self.genre = genre.clone(); }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesItem {
    #[serde(flatten)]
    pub info: FilmItem,
    #[serde(default, deserialize_with = "read_episodes")]
    pub episodes: Vec<Episode>,
}

impl SeriesItem {
    /// Gives legacy entries (no episode list) their synthetic episode.
    pub fn normalized(mut self) -> Self {
        if self.episodes.is_empty() {
            self.episodes = synthesize_episodes(self.info.video_url.as_deref());
        }
        self
    }

    pub fn apply(&mut self, patch: &ItemPatch) {
        self.info.apply(patch);
        if let Some(episodes) = &patch.episodes { self.episodes = episodes.clone(); }
    }
}

/// One catalog entry of either category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ContentItem {
    Serie(SeriesItem),
    Film(FilmItem),
}

impl ContentItem {
    pub fn info(&self) -> &FilmItem {
        match self {
            ContentItem::Film(f) => f,
            ContentItem::Serie(s) => &s.info,
        }
    }

    pub fn id(&self) -> &str {
        &self.info().id
    }

    pub fn category(&self) -> Category {
        match self {
            ContentItem::Film(_) => Category::Film,
            ContentItem::Serie(_) => Category::Serie,
        }
    }

    pub fn episodes(&self) -> &[Episode] {
        match self {
            ContentItem::Film(_) => &[],
            ContentItem::Serie(s) => &s.episodes,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub films: Vec<FilmItem>,
    #[serde(default)]
    pub series: Vec<SeriesItem>,
}

impl Catalog {
    pub fn get(&self, category: Category, id: &str) -> Option<ContentItem> {
        match category {
            Category::Film => self.films.iter().find(|f| f.id == id).cloned().map(ContentItem::Film),
            Category::Serie => self.series.iter().find(|s| s.info.id == id).cloned().map(ContentItem::Serie),
        }
    }

    pub fn contains(&self, category: Category, id: &str) -> bool {
        match category {
            Category::Film => self.films.iter().any(|f| f.id == id),
            Category::Serie => self.series.iter().any(|s| s.info.id == id),
        }
    }

    /// Appends to the list matching the item's own category.
    pub fn push(&mut self, item: ContentItem) {
        match item {
            ContentItem::Film(f) => self.films.push(f),
            ContentItem::Serie(s) => self.series.push(s),
        }
    }

    /// Drops the entry with `id`; returns whether anything was removed.
    pub fn remove(&mut self, category: Category, id: &str) -> bool {
        match category {
            Category::Film => {
                let before = self.films.len();
                self.films.retain(|f| f.id != id);
                before != self.films.len()
            }
            Category::Serie => {
                let before = self.series.len();
                self.series.retain(|s| s.info.id != id);
                before != self.series.len()
            }
        }
    }

    /// Patches the entry with `id`; returns false if there is none.
    pub fn apply(&mut self, category: Category, id: &str, patch: &ItemPatch) -> bool {
        match category {
            Category::Film => match self.films.iter_mut().find(|f| f.id == id) {
                Some(film) => { film.apply(patch); true }
                None => false,
            },
            Category::Serie => match self.series.iter_mut().find(|s| s.info.id == id) {
                Some(serie) => { serie.apply(patch); true }
                None => false,
            },
        }
    }

    pub fn normalize_series(&mut self) {
        let series = std::mem::take(&mut self.series);
        self.series = series.into_iter().map(SeriesItem::normalized).collect();
    }
}

/// Caller input for a new catalog entry. Missing fields get the usual defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub episodes: Option<Vec<Episode>>,
}

/// Empty strings count as missing, the same as an absent field.
pub(crate) fn or_default(value: &Option<String>, default: &str) -> String {
    match value.as_deref() {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => default.to_string(),
    }
}

impl NewItem {
    pub fn titled(title: impl Into<String>) -> Self {
        Self { title: title.into(), ..Default::default() }
    }

    /// Episodes worth keeping: only series, and only a non-empty list.
    pub fn kept_episodes(&self, category: Category) -> Option<&Vec<Episode>> {
        match (category, &self.episodes) {
            (Category::Serie, Some(eps)) if !eps.is_empty() => Some(eps),
            _ => None,
        }
    }

    /// First episode's URL when episodes are kept, else the item's own URL, else "".
    pub fn effective_video_url(&self, category: Category) -> String {
        match self.kept_episodes(category).and_then(|eps| eps.first()) {
            Some(first) if !first.video_url.is_empty() => first.video_url.clone(),
            _ => self.video_url.clone().unwrap_or_default(),
        }
    }

    /// The entry as stored locally when no remote store is involved.
    pub fn into_item(self, category: Category, id: String) -> ContentItem {
        let info = FilmItem {
            id,
            title: self.title,
            description: self.description.unwrap_or_default(),
            image: self.image,
            video_url: self.video_url,
            duration: or_default(&self.duration, UNKNOWN_FIELD),
            year: or_default(&self.year, UNKNOWN_FIELD),
            genre: or_default(&self.genre, UNKNOWN_FIELD),
        };
        match category {
            Category::Film => ContentItem::Film(info),
            Category::Serie => ContentItem::Serie(SeriesItem { info, episodes: self.episodes.unwrap_or_default() }),
        }
    }
}

/// Partial update. `None` leaves the stored field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episodes: Option<Vec<Episode>>,
}

impl ItemPatch {
    pub fn is_empty(&self) -> bool {
        *self == ItemPatch::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_labels() {
        assert_eq!(Category::from_label("film"), Category::Film);
        assert_eq!(Category::from_label("serie"), Category::Serie);
        assert_eq!(Category::from_label("series"), Category::Serie);
        assert_eq!(Category::Serie.to_string(), "serie");
    }

    #[test]
    fn legacy_series_gets_one_episode() {
        let s: SeriesItem = serde_json::from_str(r#"{"id":"s1","title":"Old","videoUrl":"http://x/1.mp4"}"#).unwrap();
        let s = s.normalized();
        assert_eq!(s.episodes, vec![Episode {
            season: 1,
            episode: Some(1),
            title: "Épisode 1".into(),
            video_url: "http://x/1.mp4".into(),
        }]);
    }

    #[test]
    fn series_without_url_stays_empty() {
        let s: SeriesItem = serde_json::from_str(r#"{"id":"s1","title":"Old","videoUrl":""}"#).unwrap();
        assert!(s.normalized().episodes.is_empty());
    }

    #[test]
    fn persisted_shape_uses_camel_case() {
        let s = SeriesItem {
            info: FilmItem { id: "1".into(), video_url: Some("u".into()), ..Default::default() },
            episodes: vec![Episode::legacy("u")],
        };
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v["videoUrl"], "u");
        assert_eq!(v["episodes"][0]["videoUrl"], "u");
        assert_eq!(v["duration"], "-");
        assert!(v.get("video_url").is_none());
    }

    #[test]
    fn patch_keeps_untouched_fields() {
        let mut film = FilmItem { id: "f".into(), title: "Old".into(), year: "1999".into(), ..Default::default() };
        film.apply(&ItemPatch { title: Some("New".into()), description: Some(String::new()), ..Default::default() });
        assert_eq!(film.title, "New");
        assert_eq!(film.description, "");
        assert_eq!(film.year, "1999");
    }

    #[test]
    fn effective_url_prefers_first_episode() {
        let mut item = NewItem::titled("S");
        item.video_url = Some("top".into());
        item.episodes = Some(vec![Episode::legacy("ep1")]);
        assert_eq!(item.effective_video_url(Category::Serie), "ep1");
        assert_eq!(item.effective_video_url(Category::Film), "top");
    }

    #[test]
    fn loose_episode_fields_keep_the_entry() {
        let episodes = parse_episodes(&serde_json::json!([
            {"season": 1, "episode": 1, "title": "A", "videoUrl": "a"},
            {"season": null, "title": "B", "videoUrl": "b"},
            {"season": "2", "episode": "3", "title": 4, "videoUrl": "c"},
            "junk",
        ]));
        assert_eq!(episodes.len(), 3);
        assert_eq!(episodes[0].title, "A");
        assert_eq!(episodes[1], Episode { season: 0, episode: None, title: "B".into(), video_url: "b".into() });
        assert_eq!(episodes[2].season, 2);
        assert_eq!(episodes[2].episode, Some(3));
        assert_eq!(episodes[2].title, "4");
    }

    #[test]
    fn saved_series_with_one_bad_episode_still_decodes() {
        let catalog: Catalog = serde_json::from_str(r#"{
            "films": [{"id": 7, "description": "kept", "year": null}],
            "series": [{"id": "8", "episodes": [{"season": null, "title": "B", "videoUrl": "b"}]}]
        }"#).unwrap();
        assert_eq!(catalog.films[0].id, "7");
        assert_eq!(catalog.films[0].description, "kept");
        assert_eq!(catalog.films[0].year, "-");
        assert_eq!(catalog.series[0].episodes[0].video_url, "b");
    }

    #[test]
    fn catalog_remove_unknown_is_noop() {
        let mut c = Catalog::default();
        c.films.push(FilmItem { id: "a".into(), ..Default::default() });
        assert!(!c.remove(Category::Film, "zzz"));
        assert_eq!(c.films.len(), 1);
    }
}
