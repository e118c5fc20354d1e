//! Screenplay element and page model.

use serde::{Deserialize, Serialize};

/// Screenplay element types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    SceneHeading,
    Action,
    Character,
    Dialogue,
    Parenthetical,
    Transition,
    Shot,
}

/// One screenplay unit.
///
/// Elements are derived on demand from the live document by full
/// traversal; the pagination engine reads them and never mutates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Element type.
    pub kind: ElementKind,
    /// Text content.
    pub content: String,
    /// Paired dual-dialogue flag.
    #[serde(default)]
    pub dual: bool,
    /// Monotonic offset in the authoritative document. Used only to
    /// preserve ordering.
    pub position: u64,
}

impl Element {
    /// Create a new element.
    #[must_use]
    pub fn new(kind: ElementKind, content: impl Into<String>, position: u64) -> Self {
        Self {
            kind,
            content: content.into(),
            dual: false,
            position,
        }
    }

    /// Mark the element as dual dialogue.
    #[must_use]
    pub fn with_dual(mut self) -> Self {
        self.dual = true;
        self
    }
}

/// An ordered run of elements fitting one page.
///
/// Immutable once built. Always holds at least one element; an element
/// taller than the page budget still gets its own page rather than being
/// split or dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    elements: Vec<Element>,
}

impl Page {
    /// Build a page from its elements.
    #[must_use]
    pub fn new(elements: Vec<Element>) -> Self {
        Self { elements }
    }

    /// The elements on this page, in document order.
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Number of elements on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Check if the page holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// The outcome of one pagination run: pages indexed `0..N-1`, covering
/// every input element exactly once, in original order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationResult {
    pages: Vec<Page>,
}

impl PaginationResult {
    /// Build a result from ordered pages.
    #[must_use]
    pub fn new(pages: Vec<Page>) -> Self {
        Self { pages }
    }

    /// The pages, in document order.
    #[must_use]
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Number of pages.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Total element count across all pages.
    #[must_use]
    pub fn total_elements(&self) -> usize {
        self.pages.iter().map(Page::len).sum()
    }

    /// Iterate over every element in page order.
    pub fn iter_elements(&self) -> impl Iterator<Item = &Element> {
        self.pages.iter().flat_map(|p| p.elements().iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_construction() {
        let element = Element::new(ElementKind::Dialogue, "I'm walking here!", 42).with_dual();
        assert_eq!(element.kind, ElementKind::Dialogue);
        assert!(element.dual);
        assert_eq!(element.position, 42);
    }

    #[test]
    fn test_result_counts() {
        let result = PaginationResult::new(vec![
            Page::new(vec![Element::new(ElementKind::SceneHeading, "INT. HOUSE", 0)]),
            Page::new(vec![
                Element::new(ElementKind::Action, "Rain.", 1),
                Element::new(ElementKind::Transition, "CUT TO:", 2),
            ]),
        ]);

        assert_eq!(result.page_count(), 2);
        assert_eq!(result.total_elements(), 3);

        let positions: Vec<u64> = result.iter_elements().map(|e| e.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }
}
