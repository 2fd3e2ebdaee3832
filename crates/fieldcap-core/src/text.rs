//! Text fragments delivered by the external detector, one frame at a time.

use serde::{Deserialize, Serialize};

use crate::geometry::BoundingBox;

/// A single recognized text fragment with its box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextUnit {
    /// Recognized text content.
    #[serde(alias = "text")]
    pub value: String,

    /// Bounding box in frame pixels.
    #[serde(alias = "box")]
    pub bbox: BoundingBox,
}

impl TextUnit {
    pub fn new(value: impl Into<String>, bbox: BoundingBox) -> Self {
        Self {
            value: value.into(),
            bbox,
        }
    }
}

/// An ordered group of text units the detector considers one line/paragraph.
///
/// Component order is the detector's reading order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawTextBlock")]
pub struct TextBlock {
    pub components: Vec<TextUnit>,
    pub bbox: BoundingBox,
}

#[derive(Deserialize)]
struct RawTextBlock {
    #[serde(alias = "units", alias = "lines")]
    components: Vec<TextUnit>,
    #[serde(default, alias = "box")]
    bbox: Option<BoundingBox>,
}

impl From<RawTextBlock> for TextBlock {
    fn from(raw: RawTextBlock) -> Self {
        match raw.bbox {
            Some(bbox) => Self::with_bbox(raw.components, bbox),
            None => Self::new(raw.components),
        }
    }
}

impl TextBlock {
    /// Create a block whose box is the union of its components.
    pub fn new(components: Vec<TextUnit>) -> Self {
        let bbox = components
            .iter()
            .map(|unit| unit.bbox)
            .reduce(|acc, bbox| acc.union(&bbox))
            .unwrap_or_default();

        Self { components, bbox }
    }

    /// Create a block with an explicit box.
    pub fn with_bbox(components: Vec<TextUnit>, bbox: BoundingBox) -> Self {
        Self { components, bbox }
    }

    /// Get a component by index.
    pub fn unit(&self, index: usize) -> Option<&TextUnit> {
        self.components.get(index)
    }

    /// Block text, components joined with newlines.
    pub fn text(&self) -> String {
        self.components
            .iter()
            .map(|unit| unit.value.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Position of a unit inside a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitRef {
    pub block: usize,
    pub unit: usize,
}

impl UnitRef {
    pub fn new(block: usize, unit: usize) -> Self {
        Self { block, unit }
    }
}

/// One detection pass over the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub blocks: Vec<TextBlock>,
}

impl Frame {
    pub fn new(blocks: Vec<TextBlock>) -> Self {
        Self { blocks }
    }

    /// Check if the frame carries no text at all.
    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(|block| block.components.is_empty())
    }

    /// Total number of units across all blocks.
    pub fn unit_count(&self) -> usize {
        self.blocks.iter().map(|block| block.components.len()).sum()
    }

    /// Resolve a unit reference.
    pub fn unit(&self, unit_ref: UnitRef) -> Option<&TextUnit> {
        self.blocks
            .get(unit_ref.block)
            .and_then(|block| block.unit(unit_ref.unit))
    }

    /// Iterate every unit in block-then-unit order.
    pub fn units(&self) -> impl Iterator<Item = (UnitRef, &TextUnit)> {
        self.blocks.iter().enumerate().flat_map(|(b, block)| {
            block
                .components
                .iter()
                .enumerate()
                .map(move |(u, unit)| (UnitRef::new(b, u), unit))
        })
    }
}
