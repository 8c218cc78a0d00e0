#[derive(Debug, Clone, PartialEq)]
pub struct TextFragment {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub size: f32,
}

impl TextFragment {
    /// Point used to place the fragment inside a grid cell: slightly past the
    /// first glyph's left edge, around the glyph's vertical middle.
    pub(crate) fn anchor(&self) -> (f32, f32) {
        (self.x + self.size * 0.25, self.y + self.size * 0.3)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// A ruling line; `position` is the y of a horizontal edge or the x of a
/// vertical one, `start..end` its extent along the other axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub orientation: Orientation,
    pub position: f32,
    pub start: f32,
    pub end: f32,
}

impl Edge {
    pub(crate) fn length(&self) -> f32 {
        self.end - self.start
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageLayout {
    pub page_number: u32,
    pub fragments: Vec<TextFragment>,
    pub edges: Vec<Edge>,
}

/// One detected table; `None` marks a cell covered by a merged neighbour.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawTable {
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub(crate) fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}
