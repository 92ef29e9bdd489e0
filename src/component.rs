use crate::geometry::Rect;
use crate::style::{DragMode, StyleProps};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// A node in the edited document tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Component {
    /// Unique identifier (sortable, timestamp-based)
    pub id: Ulid,

    /// Optional human-readable name
    pub name: Option<String>,

    /// Owning component, `None` for the root and for detached components
    pub parent: Option<Ulid>,

    /// Child components in document order
    pub children: Vec<Ulid>,

    /// Style properties of the model
    pub style: StyleProps,

    /// Free-positioning mode enabled on this component
    pub drag_mode: Option<DragMode>,

    /// Render-derived element, recreated on every render and never persisted
    #[serde(skip)]
    pub rendered: Option<RenderedElement>,
}

impl Component {
    pub fn new(style: StyleProps) -> Self {
        Self::with_id(Ulid::new(), style)
    }

    /// Create a component with a specific ID (useful for testing)
    pub fn with_id(id: Ulid, style: StyleProps) -> Self {
        Self {
            id,
            name: None,
            parent: None,
            children: Vec::new(),
            style,
            drag_mode: None,
            rendered: None,
        }
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub fn set_parent(&mut self, parent_id: Option<Ulid>) {
        self.parent = parent_id;
    }

    pub fn add_child(&mut self, child_id: Ulid) {
        if !self.children.contains(&child_id) {
            self.children.push(child_id);
        }
    }

    pub fn remove_child(&mut self, child_id: Ulid) {
        self.children.retain(|c| *c != child_id);
    }

    /// Merge style properties, later values win. An empty value removes the property.
    pub fn merge_style(&mut self, props: &StyleProps) {
        for (key, value) in props {
            if value.is_empty() {
                self.style.remove(key);
            } else {
                self.style.insert(key.clone(), value.clone());
            }
        }
    }

    pub fn style_value(&self, key: &str) -> Option<&str> {
        self.style.get(key).map(String::as_str)
    }
}

/// What the renderer reports for a component's element
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedElement {
    /// Bounding box relative to the frame viewport (zoom applied)
    pub client_rect: Rect,
    pub computed: ComputedStyle,
}

/// Resolved style values of a rendered element
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComputedStyle {
    pub props: StyleProps,
}

impl ComputedStyle {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.props.get(key).map(String::as_str)
    }

    /// Computed `position`, `static` when unset
    pub fn position(&self) -> &str {
        self.get("position").unwrap_or("static")
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.props.insert(key.to_string(), value.into());
        self
    }
}
