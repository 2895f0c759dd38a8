use crate::Error;
use indexmap::IndexSet;
use std::str::FromStr;

/// d3's `schemeCategory10`.
pub const CATEGORY10: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

/// d3's `schemeTableau10`.
pub const TABLEAU10: [&str; 10] = [
    "#4e79a7", "#f28e2c", "#e15759", "#76b7b2", "#59a14f", "#edc949", "#af7aa1", "#ff9da7",
    "#9c755f", "#bab0ab",
];

/// Neutral stroke used when links are not colored by their endpoints.
pub const NEUTRAL_LINK_COLOR: &str = "#aaa";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Palette {
    #[default]
    Category10,
    Tableau10,
}

impl Palette {
    pub fn colors(self) -> &'static [&'static str] {
        match self {
            Palette::Category10 => &CATEGORY10,
            Palette::Tableau10 => &TABLEAU10,
        }
    }
}

impl FromStr for Palette {
    type Err = Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "category10" => Ok(Self::Category10),
            "tableau10" => Ok(Self::Tableau10),
            _ => Err(Error::UnknownOption {
                key: "palette",
                value: s.to_string(),
            }),
        }
    }
}

/// Ordinal color scale: the first key seen takes the first palette slot, the second key the
/// second slot, wrapping around once the palette is exhausted.
///
/// One assigner belongs to exactly one diagram instance; a new render starts a new assigner.
#[derive(Debug, Clone)]
pub struct ColorAssigner {
    palette: &'static [&'static str],
    domain: IndexSet<String>,
}

impl Default for ColorAssigner {
    fn default() -> Self {
        Self::new(Palette::default())
    }
}

impl ColorAssigner {
    pub fn new(palette: Palette) -> Self {
        Self {
            palette: palette.colors(),
            domain: IndexSet::new(),
        }
    }

    pub fn color_of(&mut self, key: &str) -> &'static str {
        let idx = match self.domain.get_index_of(key) {
            Some(idx) => idx,
            None => self.domain.insert_full(key.to_string()).0,
        };
        self.palette[idx % self.palette.len()]
    }

    /// Keys in first-seen order.
    pub fn domain(&self) -> impl Iterator<Item = &str> {
        self.domain.iter().map(String::as_str)
    }
}
