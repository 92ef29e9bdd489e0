use crate::component::ComputedStyle;
use crate::event::EventKind;
use crate::geometry::{MeasuredRect, Point, Viewport};
use crate::style::{DragMode, StyleProps};
use ulid::Ulid;

/// Read access to the edited component tree
pub trait DocumentTree {
    /// True when the component exists and is attached to the tree
    fn contains(&self, id: Ulid) -> bool;

    fn parent(&self, id: Ulid) -> Option<Ulid>;

    /// Children in document order
    fn children(&self, id: Ulid) -> Vec<Ulid>;

    /// Editor-level free-positioning mode of a component, if any
    fn drag_mode(&self, id: Ulid) -> Option<DragMode>;

    /// Ancestors from the parent up to the root
    fn ancestors(&self, id: Ulid) -> Vec<Ulid> {
        let mut result = Vec::new();
        let mut current = self.parent(id);
        while let Some(parent) = current {
            result.push(parent);
            current = self.parent(parent);
        }
        result
    }
}

/// Scroll-compensated measurement of rendered elements
pub trait Geometry {
    /// Box of the rendered element in the canvas document frame.
    /// Detached or unrendered components measure as [`MeasuredRect::ZERO`].
    fn measure(&self, id: Ulid) -> MeasuredRect;

    fn computed_style(&self, id: Ulid) -> ComputedStyle;

    /// Nearest ancestor establishing a containing block for absolute children
    fn offset_parent(&self, id: Ulid) -> Option<Ulid>;

    fn viewport(&self) -> Viewport;

    /// Layout width of the canvas body
    fn body_width(&self) -> f64;

    /// Canvas zoom; pointer deltas are divided by it
    fn scale(&self) -> f64 {
        1.0
    }

    /// Map a viewport pointer position into canvas document coordinates
    fn pointer_to_canvas(&self, pointer: Point) -> Point;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AddStyleOptions {
    /// Skip the undo/history log for this write
    pub avoid_store: bool,
}

/// The StyleableModel side of a component
pub trait StyleTarget {
    fn get_style(&self, id: Ulid) -> StyleProps;

    /// Merge `props` into the component's style
    fn add_style(&mut self, id: Ulid, props: &StyleProps, opts: AddStyleOptions);
}

/// Notification channel the host listens on
pub trait EventSink {
    fn emit(&mut self, event: EventKind);
}

pub trait Host: DocumentTree + Geometry + StyleTarget + EventSink {}

impl<T: DocumentTree + Geometry + StyleTarget + EventSink> Host for T {}
