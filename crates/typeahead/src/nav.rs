use std::str::FromStr;

/// Keys the suggestion panel reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    ArrowDown,
    ArrowUp,
    Home,
    End,
    PageDown,
    PageUp,
    Enter,
    Escape,
    Tab,
}

/// Rows skipped by PageUp/PageDown.
pub const PAGE_STEP: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown key: {0}")]
pub struct UnknownKey(pub String);

impl FromStr for Key {
    type Err = UnknownKey;

    /// DOM `KeyboardEvent.key` names plus short aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "ArrowDown" | "Down" => Key::ArrowDown,
            "ArrowUp" | "Up" => Key::ArrowUp,
            "Home" => Key::Home,
            "End" => Key::End,
            "PageDown" | "PgDn" => Key::PageDown,
            "PageUp" | "PgUp" => Key::PageUp,
            "Enter" => Key::Enter,
            "Escape" | "Esc" => Key::Escape,
            "Tab" => Key::Tab,
            other => return Err(UnknownKey(other.to_string())),
        })
    }
}

/// Cursor after a movement key over `n` results. Keys that do not move the
/// cursor return it unchanged; an empty list never has a cursor.
pub fn step(key: Key, hi: Option<usize>, n: usize) -> Option<usize> {
    if n == 0 {
        return None;
    }
    let last = n - 1;
    match key {
        Key::ArrowDown => Some(match hi {
            None => 0,
            Some(i) => (i.min(last) + 1) % n,
        }),
        Key::ArrowUp => Some(match hi {
            None => last,
            Some(i) => (i.min(last) + n - 1) % n,
        }),
        Key::Home => Some(0),
        Key::End => Some(last),
        Key::PageDown => Some((hi.unwrap_or(0) + PAGE_STEP).min(last)),
        Key::PageUp => Some(hi.unwrap_or(0).saturating_sub(PAGE_STEP).min(last)),
        Key::Enter | Key::Escape | Key::Tab => hi,
    }
}
