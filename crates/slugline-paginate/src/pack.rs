//! Sequential page packing.
//!
//! The greedy bin-packer shared by the fallback path and every worker.
//! This is the reference semantics: the parallel path must reproduce it
//! exactly when run single-chunk.

use crate::element::{Element, Page};
use crate::layout::element_height;

/// Partition elements into pages bounded by `budget`.
///
/// Greedy rule: close the running page when the next element would
/// overflow it and the page already holds at least one element. An
/// element taller than the budget on an empty page is kept whole on its
/// own page; elements are never split or dropped.
#[must_use]
pub fn pack_elements(elements: &[Element], budget: u32) -> Vec<Page> {
    let mut pages = Vec::new();
    let mut current: Vec<Element> = Vec::new();
    let mut height: u32 = 0;

    for element in elements {
        let h = element_height(element);

        if !current.is_empty() && height + h > budget {
            pages.push(Page::new(std::mem::take(&mut current)));
            height = 0;
        }

        height += h;
        current.push(element.clone());
    }

    if !current.is_empty() {
        pages.push(Page::new(current));
    }

    pages
}
