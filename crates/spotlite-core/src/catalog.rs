//! Song records and the two named lists built from one catalog fetch.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of a song as assigned by the catalog source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SongId(pub u64);

impl fmt::Display for SongId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One catalog entry.  Unknown source fields are ignored; missing strings
/// default to empty so a single sparse record doesn't sink the whole fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: SongId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub artist: String,
    /// Relative asset path, resolved against `catalog.asset_base`.
    #[serde(default)]
    pub cover: String,
    /// Playable media locator handed to the engine.
    #[serde(default)]
    pub url: String,
    /// Color value, with or without a leading `#`.
    #[serde(default)]
    pub accent: String,
}

impl Song {
    /// Absolute cover image URL for this song.
    pub fn cover_url(&self, asset_base: &str) -> String {
        format!("{}{}", asset_base, self.cover)
    }
}

/// The catalog: the full navigation universe plus the "Top Songs" list.
///
/// Both lists are filled atomically from the same fetch and are only ever
/// replaced wholesale, never edited in place.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    full_list: Vec<Song>,
    top_list: Vec<Song>,
}

impl Catalog {
    pub fn new(songs: Vec<Song>) -> Self {
        Self {
            top_list: songs.clone(),
            full_list: songs,
        }
    }

    pub fn full_list(&self) -> &[Song] {
        &self.full_list
    }

    pub fn top_list(&self) -> &[Song] {
        &self.top_list
    }

    pub fn len(&self) -> usize {
        self.full_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.full_list.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Song> {
        self.full_list.get(index)
    }

    /// Canonical position of `id` in the full list.
    pub fn position_of(&self, id: SongId) -> Option<usize> {
        self.full_list.iter().position(|s| s.id == id)
    }
}

/// Load state of the catalog, exposed so a UI can show "catalog unavailable"
/// instead of an unexplained empty list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CatalogStatus {
    #[default]
    Pending,
    Loaded { songs: usize },
    Unavailable { reason: String },
}

/// Envelope the CMS wraps its item list in.
#[derive(Debug, Deserialize)]
struct CmsEnvelope {
    #[serde(default)]
    data: Option<Vec<Song>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogDocument {
    Envelope(CmsEnvelope),
    Bare(Vec<Song>),
}

/// Parse a catalog document: either `{"data": [...]}` or a bare array.
pub fn parse_catalog_json(content: &str) -> anyhow::Result<Vec<Song>> {
    let doc: CatalogDocument = serde_json::from_str(content)?;
    Ok(match doc {
        CatalogDocument::Envelope(env) => env.data.unwrap_or_default(),
        CatalogDocument::Bare(songs) => songs,
    })
}

pub fn load_catalog_from_file(path: &std::path::Path) -> anyhow::Result<Vec<Song>> {
    let content = std::fs::read_to_string(path)?;
    parse_catalog_json(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cms_envelope_and_ignores_extra_fields() {
        let json = r##"{
            "data": [
                {"id": 1, "status": "published", "sort": null, "name": "Colors",
                 "artist": "William King", "accent": "#331E00",
                 "cover": "4f718272-6b0e-42ee-92d0-805b783cb471",
                 "top_track": true, "url": "https://example.com/colors.mp3"},
                {"id": 2, "name": "Saudade", "artist": "Gonçalo", "accent": "",
                 "cover": "bd7d5c0d", "url": "https://example.com/saudade.mp3"}
            ]
        }"##;
        let songs = parse_catalog_json(json).unwrap();
        assert_eq!(songs.len(), 2);
        assert_eq!(songs[0].id, SongId(1));
        assert_eq!(songs[0].accent, "#331E00");
        assert_eq!(songs[1].name, "Saudade");
    }

    #[test]
    fn parses_bare_array() {
        let songs = parse_catalog_json(r#"[{"id": 7, "name": "x"}]"#).unwrap();
        assert_eq!(songs[0].id, SongId(7));
        assert!(songs[0].url.is_empty());
    }

    #[test]
    fn missing_data_key_is_empty_catalog() {
        assert!(parse_catalog_json("{}").unwrap().is_empty());
        assert!(parse_catalog_json(r#"{"data": null}"#).unwrap().is_empty());
    }

    #[test]
    fn malformed_record_fails() {
        assert!(parse_catalog_json(r#"{"data": [{"name": "no id"}]}"#).is_err());
    }

    #[test]
    fn both_lists_share_order_and_identity() {
        let songs = parse_catalog_json(r#"[{"id": 3}, {"id": 1}, {"id": 2}]"#).unwrap();
        let catalog = Catalog::new(songs);
        assert_eq!(catalog.full_list(), catalog.top_list());
        assert_eq!(catalog.position_of(SongId(1)), Some(1));
        assert_eq!(catalog.position_of(SongId(9)), None);
    }

    #[test]
    fn cover_url_concatenates_base() {
        let song = Song {
            id: SongId(1),
            name: String::new(),
            artist: String::new(),
            cover: "abc".into(),
            url: String::new(),
            accent: String::new(),
        };
        assert_eq!(
            song.cover_url("https://cms.samespace.com/assets/"),
            "https://cms.samespace.com/assets/abc"
        );
    }
}
