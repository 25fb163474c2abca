//! Text range annotation
//!
//! Applies a class to a code-point range of an element's text, no matter how
//! the text is currently split across text nodes and wrappers added by other
//! layers. Text is only ever split and wrapped, never changed.

use crate::element::{Element, Node};
use crate::text::split_at_char;

/// Tag of the wrapper elements created by [`annotate_element`].
pub const WRAPPER_TAG: &str = "hl";

/// A class applied to `length` code points starting at `start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationRange {
    pub start: usize,
    pub length: usize,
    pub css_class: String,
}

impl AnnotationRange {
    #[must_use]
    pub fn new(start: usize, length: usize, css_class: &str) -> Self {
        Self {
            start,
            length,
            css_class: css_class.to_string(),
        }
    }
}

pub fn annotate_range(parent: &mut Element, range: &AnnotationRange) {
    annotate_element(parent, range.start, range.length, &range.css_class);
}

/// Wrap the code points `[offset, offset + length)` of `parent`'s text in
/// `class`. Parts of the range past the end of the text are ignored.
pub fn annotate_element(parent: &mut Element, offset: usize, length: usize, class: &str) {
    let mut offset = offset;
    let mut length = length;
    let mut index = 0;

    while length > 0 && index < parent.children.len() {
        let node_length = parent.children[index].text_len();
        if node_length <= offset {
            offset -= node_length;
            index += 1;
            continue;
        }

        let sub_length = length.min(node_length - offset);
        if let Node::Element(el) = &mut parent.children[index] {
            if is_wrapper(el) && offset == 0 && sub_length == node_length {
                el.add_class(class);
            } else {
                annotate_element(el, offset, sub_length, class);
            }
            index += 1;
        } else {
            index += annotate_text(parent, index, offset, sub_length, class);
        }

        length -= sub_length;
        offset = 0;
    }
}

fn is_wrapper(el: &Element) -> bool {
    el.tag == WRAPPER_TAG
}

/// Wrap part of the text node at `index`, splitting it as needed. Returns the
/// number of nodes now in its place.
fn annotate_text(
    parent: &mut Element,
    index: usize,
    offset: usize,
    length: usize,
    class: &str,
) -> usize {
    let Node::Text(text) = &parent.children[index] else {
        return 1;
    };
    let (before, rest) = split_at_char(text, offset);
    let (inside, after) = split_at_char(rest, length);

    let mut replacement = Vec::with_capacity(3);
    if !before.is_empty() {
        replacement.push(Node::Text(before.to_string()));
    }
    replacement.push(Node::Element(
        Element::new(WRAPPER_TAG).with_class(class).with_text(inside),
    ));
    if !after.is_empty() {
        replacement.push(Node::Text(after.to_string()));
    }

    let count = replacement.len();
    parent.children.splice(index..=index, replacement);
    count
}
