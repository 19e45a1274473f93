//! Ambient background accent derived from the current song.

use serde::Serialize;

use crate::catalog::Song;

/// Second stop of every accent gradient.
pub const GRADIENT_END: &str = "#000000";

/// Two-stop left-to-right gradient, accent fading to black.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Gradient {
    pub from: String,
    pub to: String,
}

impl Gradient {
    /// CSS `background` value for the element the UI scopes it to.
    pub fn css(&self) -> String {
        format!("linear-gradient(to right, {}, {})", self.from, self.to)
    }
}

/// `None` when the song carries no accent; the UI keeps its previous value.
pub fn color_for(song: &Song) -> Option<Gradient> {
    let accent = song.accent.trim();
    if accent.is_empty() {
        return None;
    }
    Some(Gradient {
        from: normalize_accent(accent),
        to: GRADIENT_END.to_string(),
    })
}

pub fn normalize_accent(accent: &str) -> String {
    if accent.starts_with('#') {
        accent.to_string()
    } else {
        format!("#{}", accent)
    }
}
