//! Spatial value search around a located keyword.

use std::cmp::Ordering;
use std::fmt;

use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::acceptor::{accept, validate};
use super::field::FieldSpec;
use super::patterns::{ADDRESS_LINE, NUMERIC_LINE};
use crate::geometry::DEFAULT_ROW_TOLERANCE;
use crate::text::{Frame, TextUnit, UnitRef};

/// Value search strategies, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Text following the keyword in the same unit, or the address lines
    /// above a postal code.
    Inline,
    /// Leftmost unit on the keyword's row, right of the keyword.
    RightOf,
    /// Nearest unit below the keyword in the same block.
    Below,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Inline => write!(f, "inline"),
            Strategy::RightOf => write!(f, "right"),
            Strategy::Below => write!(f, "below"),
        }
    }
}

/// Text after the first case-insensitive occurrence of `keyword`, trimmed.
pub fn text_after_keyword(text: &str, keyword: &str) -> Option<String> {
    let regex = RegexBuilder::new(&regex::escape(keyword))
        .case_insensitive(true)
        .build()
        .ok()?;
    regex
        .find(text)
        .map(|found| text[found.end()..].trim().to_string())
}

/// Runs the value search strategies for fields with a keyword hit.
#[derive(Debug, Clone)]
pub struct ValueResolver {
    row_tolerance: f32,
}

impl Default for ValueResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueResolver {
    pub fn new() -> Self {
        Self {
            row_tolerance: DEFAULT_ROW_TOLERANCE,
        }
    }

    /// Set the vertical tolerance used by the right-of strategy.
    pub fn with_row_tolerance(mut self, tolerance: f32) -> Self {
        self.row_tolerance = tolerance;
        self
    }

    pub fn row_tolerance(&self) -> f32 {
        self.row_tolerance
    }

    /// Try each strategy until one produces a valid candidate.
    ///
    /// Returns the strategy whose candidate validated. Whether the field's
    /// value actually changed is reported by its `selected` flag.
    pub fn resolve(&self, frame: &Frame, field: &mut FieldSpec) -> Option<Strategy> {
        if !field.frame.has_hit() {
            return None;
        }

        if self.find_inline(frame, field) {
            return Some(Strategy::Inline);
        }
        if self.find_right_of(frame, field) {
            return Some(Strategy::RightOf);
        }
        if self.find_below(frame, field) {
            return Some(Strategy::Below);
        }

        None
    }

    fn find_inline(&self, frame: &Frame, field: &mut FieldSpec) -> bool {
        let Some(block) = field.frame.keyword_block else {
            return false;
        };
        let Some(unit) = field.frame.index_in_keyword_block else {
            return self.find_address_lines(frame, block, field);
        };

        let at = UnitRef::new(block, unit);
        let Some(keyword) = frame.unit(at) else {
            return false;
        };

        let tails: Vec<String> = field
            .keywords
            .iter()
            .filter_map(|key| text_after_keyword(&keyword.value, key))
            .collect();

        let keyword_index = field.frame.keyword_index;
        for tail in tails {
            let Some(validated) = validate(field, &tail) else {
                continue;
            };
            field.frame.candidate_value = Some(at);
            if accept(field, validated, keyword_index) {
                debug!("{}: new value {:?} ({})", field.name, field.resolution.value, Strategy::Inline);
            }
            return true;
        }

        false
    }

    /// Join the address lines of the postal block up to the postal-code unit.
    ///
    /// Numeric-only units (a bare postcode) and units with unexpected symbols
    /// restart the address. Accumulation stops after the first unit whose top
    /// equals the postal unit's top.
    fn find_address_lines(&self, frame: &Frame, block: usize, field: &mut FieldSpec) -> bool {
        if !field.assembles_address() {
            return false;
        }
        let Some(postal) = field.frame.candidate_value.and_then(|at| frame.unit(at)) else {
            return false;
        };
        let Some(text_block) = frame.blocks.get(block) else {
            return false;
        };

        let mut lines: Vec<&str> = Vec::new();
        for unit in &text_block.components {
            if NUMERIC_LINE.is_match(&unit.value) {
                lines.clear();
            } else if ADDRESS_LINE.is_match(&unit.value) {
                lines.push(&unit.value);
            } else {
                lines.clear();
            }
            if unit.bbox.top == postal.bbox.top {
                break;
            }
        }
        let value = lines.join(", ");

        let Some(validated) = validate(field, &value) else {
            return false;
        };
        field.frame.candidate_value = Some(UnitRef::new(block, 0));
        if accept(field, validated, None) {
            debug!("{}: new value {:?} (address)", field.name, field.resolution.value);
        }
        true
    }

    fn find_right_of(&self, frame: &Frame, field: &mut FieldSpec) -> bool {
        let Some(keyword) = field.frame.keyword_unit().and_then(|at| frame.unit(at)) else {
            return false;
        };

        let candidate = frame
            .units()
            .filter(|(_, unit)| {
                unit.bbox.same_row(&keyword.bbox, self.row_tolerance)
                    && unit.bbox.starts_right_of(&keyword.bbox)
            })
            .min_by(|(_, a), (_, b)| {
                a.bbox
                    .left
                    .partial_cmp(&b.bbox.left)
                    .unwrap_or(Ordering::Equal)
            });

        match candidate {
            Some((at, unit)) => self.submit(field, at, unit, Strategy::RightOf),
            None => false,
        }
    }

    fn find_below(&self, frame: &Frame, field: &mut FieldSpec) -> bool {
        if !field.has_patterns() {
            return false;
        }
        let Some(keyword_at) = field.frame.keyword_unit() else {
            return false;
        };
        let Some(keyword) = frame.unit(keyword_at) else {
            return false;
        };
        let block = &frame.blocks[keyword_at.block];

        let candidate = block
            .components
            .iter()
            .enumerate()
            .filter(|(_, unit)| unit.bbox.is_below(&keyword.bbox))
            .min_by(|(_, a), (_, b)| {
                a.bbox
                    .top
                    .partial_cmp(&b.bbox.top)
                    .unwrap_or(Ordering::Equal)
            });

        match candidate {
            Some((unit, text)) => {
                self.submit(field, UnitRef::new(keyword_at.block, unit), text, Strategy::Below)
            }
            None => false,
        }
    }

    /// Validate a neighbouring unit and offer it to the acceptor.
    fn submit(&self, field: &mut FieldSpec, at: UnitRef, unit: &TextUnit, strategy: Strategy) -> bool {
        let Some(validated) = validate(field, &unit.value) else {
            return false;
        };

        field.frame.candidate_value = Some(at);
        let keyword_index = field.frame.keyword_index;
        // Without a keyword-string match the stored value has a different basis.
        if keyword_index.is_none() {
            field.resolution.value.clear();
        }
        if accept(field, validated, keyword_index) {
            debug!("{}: new value {:?} ({})", field.name, field.resolution.value, strategy);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::locator::KeywordLocator;
    use crate::geometry::BoundingBox;
    use crate::text::TextBlock;
    use pretty_assertions::assert_eq;

    fn unit(value: &str, left: f32, top: f32, width: f32) -> TextUnit {
        TextUnit::new(value, BoundingBox::from_xywh(left, top, width, 20.0))
    }

    fn run(frame: &Frame, field: &mut FieldSpec) -> Option<Strategy> {
        KeywordLocator::for_country("Australia").locate(frame, std::slice::from_mut(field));
        ValueResolver::new().resolve(frame, field)
    }

    #[test]
    fn test_text_after_keyword() {
        assert_eq!(text_after_keyword("Due Date: 12 Mar", "due date:"), Some("12 Mar".to_string()));
        assert_eq!(text_after_keyword("TOTAL $5.00", "total"), Some("$5.00".to_string()));
        assert_eq!(text_after_keyword("Total", "total"), Some(String::new()));
        assert_eq!(text_after_keyword("Amount", "total"), None);
        assert_eq!(text_after_keyword("Ref (a+b) 9", "(a+b)"), Some("9".to_string()));
    }

    #[test]
    fn test_inline_value() {
        let frame = Frame::new(vec![TextBlock::new(vec![unit("Due Date 12 Mar 2024", 0.0, 50.0, 200.0)])]);
        let mut field = FieldSpec::new("Due Date", true, ["due date"], [r"\d{1,2} [a-z]{3} \d{4}"]);

        assert_eq!(run(&frame, &mut field), Some(Strategy::Inline));
        assert_eq!(field.resolved_value(), Some("12 Mar 2024"));
        assert_eq!(field.resolution().keyword, "due date");
        assert_eq!(field.frame_match().candidate_value, Some(UnitRef::new(0, 0)));
    }

    #[test]
    fn test_inline_uses_hit_keyword_for_resolution() {
        let frame = Frame::new(vec![TextBlock::new(vec![unit("Pay by 1 Apr 2024", 0.0, 0.0, 200.0)])]);
        let mut field = FieldSpec::new(
            "Due Date",
            true,
            ["due date", "pay by"],
            [r"\d{1,2} [a-z]{3} \d{4}"],
        );

        assert_eq!(run(&frame, &mut field), Some(Strategy::Inline));
        assert_eq!(field.resolution().keyword, "pay by");
    }

    #[test]
    fn test_right_of_keyword() {
        let frame = Frame::new(vec![
            TextBlock::new(vec![unit("Total Due", 10.0, 100.0, 80.0), unit("$128.50", 300.0, 102.0, 60.0)]),
            TextBlock::new(vec![unit("$9.99", 150.0, 104.0, 50.0)]),
        ]);
        let mut field = FieldSpec::new("Total Due", true, ["total due"], [r"\$[0-9]+\.[0-9]{2}"]);

        assert_eq!(run(&frame, &mut field), Some(Strategy::RightOf));
        assert_eq!(field.resolved_value(), Some("$9.99"));
        assert_eq!(field.frame_match().candidate_value, Some(UnitRef::new(1, 0)));
    }

    #[test]
    fn test_right_of_row_tolerance() {
        let within = Frame::new(vec![TextBlock::new(vec![
            unit("Amount", 0.0, 100.0, 80.0),
            unit("42", 100.0, 108.0, 30.0),
        ])]);
        let mut field = FieldSpec::new("Amount", false, ["amount"], Vec::<String>::new());
        assert_eq!(run(&within, &mut field), Some(Strategy::RightOf));
        assert_eq!(field.resolved_value(), Some("42"));

        let outside = Frame::new(vec![TextBlock::new(vec![
            unit("Amount", 0.0, 100.0, 80.0),
            unit("42", 100.0, 115.0, 30.0),
        ])]);
        let mut field = FieldSpec::new("Amount", false, ["amount"], Vec::<String>::new());
        assert_eq!(run(&outside, &mut field), None);
        assert!(!field.is_resolved());

        let mut field = FieldSpec::new("Amount", false, ["amount"], Vec::<String>::new());
        KeywordLocator::new().locate(&outside, std::slice::from_mut(&mut field));
        let wide = ValueResolver::new().with_row_tolerance(15.0);
        assert_eq!(wide.resolve(&outside, &mut field), Some(Strategy::RightOf));
    }

    #[test]
    fn test_right_of_only_tries_leftmost() {
        let frame = Frame::new(vec![TextBlock::new(vec![
            unit("Total", 0.0, 0.0, 50.0),
            unit("AUD", 60.0, 0.0, 30.0),
            unit("$5.00", 100.0, 0.0, 40.0),
        ])]);
        let mut field = FieldSpec::new("Total", false, ["total"], [r"\$[0-9]+\.[0-9]{2}"]);

        assert_eq!(run(&frame, &mut field), None);
        assert!(!field.is_resolved());
    }

    #[test]
    fn test_below_keyword() {
        let frame = Frame::new(vec![TextBlock::new(vec![
            unit("Account Number", 0.0, 0.0, 120.0),
            unit("9876 5432", 0.0, 60.0, 90.0),
            unit("1234 5678", 0.0, 30.0, 90.0),
        ])]);
        let mut field = FieldSpec::new("Account", false, ["account number"], [r"\d{4} \d{4}"]);

        assert_eq!(run(&frame, &mut field), Some(Strategy::Below));
        assert_eq!(field.resolved_value(), Some("1234 5678"));
        assert_eq!(field.frame_match().candidate_value, Some(UnitRef::new(0, 2)));
    }

    #[test]
    fn test_below_requires_patterns() {
        let frame = Frame::new(vec![TextBlock::new(vec![
            unit("Customer", 0.0, 0.0, 80.0),
            unit("J Smith", 0.0, 30.0, 80.0),
        ])]);
        let mut field = FieldSpec::new("Customer", false, ["customer"], Vec::<String>::new());

        assert_eq!(run(&frame, &mut field), None);
        assert!(!field.is_resolved());
    }

    #[test]
    fn test_below_stays_in_keyword_block() {
        let frame = Frame::new(vec![
            TextBlock::new(vec![unit("Reference", 0.0, 0.0, 80.0)]),
            TextBlock::new(vec![unit("REF123", 0.0, 30.0, 80.0)]),
        ]);
        let mut field = FieldSpec::new("Reference", false, ["reference"], [r"REF\d+"]);

        assert_eq!(run(&frame, &mut field), None);
    }

    #[test]
    fn test_address_lines_from_postal_code() {
        let frame = Frame::new(vec![TextBlock::new(vec![
            unit("3000", 0.0, 0.0, 40.0),
            unit("J Smith", 0.0, 30.0, 100.0),
            unit("12 Main St", 0.0, 60.0, 100.0),
            unit("MELBOURNE VIC 3000", 0.0, 90.0, 160.0),
            unit("Ph 03 9999 0000", 0.0, 120.0, 140.0),
        ])]);
        let mut field = FieldSpec::new("Service Address", false, Vec::<String>::new(), Vec::<String>::new());

        assert_eq!(run(&frame, &mut field), Some(Strategy::Inline));
        assert_eq!(
            field.resolved_value(),
            Some("J Smith, 12 Main St, MELBOURNE VIC 3000")
        );
        assert_eq!(field.resolution().keyword, "");
        assert_eq!(field.frame_match().candidate_value, Some(UnitRef::new(0, 0)));
    }

    #[test]
    fn test_address_lines_reset_on_symbols() {
        let frame = Frame::new(vec![TextBlock::new(vec![
            unit("Unit #4", 0.0, 0.0, 100.0),
            unit("Smith St", 0.0, 30.0, 100.0),
            unit("SYDNEY NSW 2000", 0.0, 60.0, 160.0),
        ])]);
        let mut field = FieldSpec::new("Service Address", false, Vec::<String>::new(), Vec::<String>::new());

        run(&frame, &mut field);
        assert_eq!(field.resolved_value(), Some("Smith St, SYDNEY NSW 2000"));
    }

    #[test]
    fn test_address_lines_need_exact_name() {
        let frame = Frame::new(vec![TextBlock::new(vec![
            unit("12 Main St", 0.0, 0.0, 100.0),
            unit("MELBOURNE VIC 3000", 0.0, 30.0, 160.0),
        ])]);
        let mut field = FieldSpec::new("Old Service Address", false, Vec::<String>::new(), Vec::<String>::new());

        assert_eq!(run(&frame, &mut field), None);
        assert!(field.frame_match().has_hit());
        assert!(!field.is_resolved());
    }

    #[test]
    fn test_clear_without_keyword_index() {
        let frame = Frame::new(vec![TextBlock::new(vec![
            unit("Total", 0.0, 0.0, 50.0),
            unit("7", 60.0, 0.0, 10.0),
        ])]);
        let mut field = FieldSpec::new("Total", false, ["total"], Vec::<String>::new());
        field.resolution.value = "123456".to_string();
        field.frame.keyword_block = Some(0);
        field.frame.index_in_keyword_block = Some(0);

        assert_eq!(ValueResolver::new().resolve(&frame, &mut field), Some(Strategy::RightOf));
        assert_eq!(field.resolved_value(), Some("7"));
    }
}
