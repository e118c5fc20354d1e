//! Height heuristic for screenplay elements.
//!
//! A pure function of an element's type and text length, shared unchanged
//! by the parallel workers and the sequential fallback. The estimate does
//! not have to match the renderer to the pixel; it has to be identical on
//! every path so page boundaries are reproducible.

use crate::element::{Element, ElementKind};

/// Height of one rendered line, in layout units.
pub const LINE_HEIGHT: u32 = 12;

/// Characters per wrapped line.
pub const LINE_WIDTH: usize = 40;

/// Vertical spacing after each element.
pub const ELEMENT_SPACING: u32 = 12;

/// Default page height budget.
pub const DEFAULT_PAGE_HEIGHT: u32 = 648;

/// Vertical multiplier for an element type.
///
/// Scene headings and character names reserve extra space in the rendered
/// layout; everything else is single-height.
#[must_use]
pub fn type_multiplier(kind: ElementKind) -> u32 {
    match kind {
        ElementKind::SceneHeading | ElementKind::Character => 2,
        _ => 1,
    }
}

/// Estimated rendered height of one element.
#[must_use]
pub fn element_height(element: &Element) -> u32 {
    let chars = element.content.chars().count();
    let lines = chars.div_ceil(LINE_WIDTH) as u32;
    LINE_HEIGHT * lines * type_multiplier(element.kind) + ELEMENT_SPACING
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line_heights() {
        let action = Element::new(ElementKind::Action, "Rain falls.", 0);
        assert_eq!(element_height(&action), LINE_HEIGHT + ELEMENT_SPACING);

        // Scene headings reserve double height.
        let heading = Element::new(ElementKind::SceneHeading, "INT. HOUSE", 0);
        assert_eq!(element_height(&heading), LINE_HEIGHT * 2 + ELEMENT_SPACING);
    }

    #[test]
    fn test_wrapping_rounds_up() {
        // 41 chars wrap onto a second line.
        let action = Element::new(ElementKind::Action, "a".repeat(LINE_WIDTH + 1), 0);
        assert_eq!(element_height(&action), LINE_HEIGHT * 2 + ELEMENT_SPACING);

        // An exact multiple does not.
        let exact = Element::new(ElementKind::Action, "a".repeat(LINE_WIDTH * 2), 0);
        assert_eq!(element_height(&exact), LINE_HEIGHT * 2 + ELEMENT_SPACING);
    }

    #[test]
    fn test_character_name_is_double_height() {
        let character = Element::new(ElementKind::Character, "RATSO", 0);
        let parenthetical = Element::new(ElementKind::Parenthetical, "(beat)", 0);
        assert!(element_height(&character) > element_height(&parenthetical));
    }
}
