// Helper functions to build test documents with various layouts

#![allow(dead_code)]

use canvas_manipulator::{Document, Rect, StyleProps, Viewport};
use ulid::Ulid;

pub fn style(pairs: &[(&str, &str)]) -> StyleProps {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Parent, a sibling whose right edge sits at x=300 and the element to drag
pub struct SnapScene {
    pub document: Document,
    pub parent: Ulid,
    pub sibling: Ulid,
    pub element: Ulid,
}

/// Parent at the origin (1000x1000, relative), sibling S at (200, 0) 100x100,
/// element E at (100, 200) 50x50 with `width: auto`
pub fn create_snap_scene() -> SnapScene {
    let mut document = Document::with_root(
        Viewport::new(1280.0, 1000.0),
        Rect::new(0.0, 0.0, 1280.0, 1200.0),
    );
    let root = document.root().unwrap();

    let parent = document
        .add_component(
            root,
            Rect::new(0.0, 0.0, 1000.0, 1000.0),
            style(&[("position", "relative")]),
        )
        .unwrap();
    let sibling = document
        .add_component(
            parent,
            Rect::new(200.0, 0.0, 100.0, 100.0),
            style(&[("position", "absolute"), ("left", "200px"), ("top", "0px")]),
        )
        .unwrap();
    let element = document
        .add_component(
            parent,
            Rect::new(100.0, 200.0, 50.0, 50.0),
            style(&[("width", "auto")]),
        )
        .unwrap();

    SnapScene {
        document,
        parent,
        sibling,
        element,
    }
}

/// A 400x200 relative container holding one element at (100, 100) 200x50
pub fn create_resize_scene(element_style: StyleProps) -> (Document, Ulid) {
    let mut document = Document::with_root(
        Viewport::new(1000.0, 800.0),
        Rect::new(0.0, 0.0, 1000.0, 2000.0),
    );
    let root = document.root().unwrap();

    let container = document
        .add_component(
            root,
            Rect::new(0.0, 0.0, 400.0, 200.0),
            style(&[("position", "relative")]),
        )
        .unwrap();
    let element = document
        .add_component(container, Rect::new(100.0, 100.0, 200.0, 50.0), element_style)
        .unwrap();

    (document, element)
}

/// A row of `count` 50x50 boxes spaced 100px apart, no positioning
pub fn create_row(count: usize) -> (Document, Vec<Ulid>) {
    let mut document = Document::default();
    let root = document.root().unwrap();
    let ids = (0..count)
        .map(|i| {
            document
                .add_component(
                    root,
                    Rect::new(100.0 * i as f64, 0.0, 50.0, 50.0),
                    StyleProps::new(),
                )
                .unwrap()
        })
        .collect();
    (document, ids)
}
