use crate::component::{Component, ComputedStyle, RenderedElement};
use crate::event::{EditorEvent, EventKind};
use crate::geometry::{MeasuredRect, Point, Rect, Viewport};
use crate::host::{AddStyleOptions, DocumentTree, EventSink, Geometry, StyleTarget};
use crate::style::{parse_css_number, DragMode, StyleProps};
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ulid::Ulid;

/// Durable style change recorded for undo
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub component: Ulid,
    pub props: StyleProps,
}

/// Every style write seen by the document, partial ones included
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StyleWriteRecord {
    pub component: Ulid,
    pub props: StyleProps,
    pub avoid_store: bool,
}

/// In-memory edited document: component arena, rendered boxes, history.
///
/// Rendered boxes are stored the way a browser reports them, relative to
/// the frame viewport, so scrolling moves every client rect while
/// [`Geometry::measure`] keeps returning document coordinates.
#[derive(Debug, Clone)]
pub struct Document {
    /// All components indexed by ID
    components: HashMap<Ulid, Component>,

    /// In-flow boxes, document coordinates; used when a component is not absolutely positioned
    flow: HashMap<Ulid, Rect>,

    root: Option<Ulid>,

    viewport: Viewport,

    /// Frame scroll offset, zoomed pixels
    scroll: Point,

    zoom: f64,

    /// Undo log, durable writes only
    history: Vec<HistoryEntry>,

    writes: Vec<StyleWriteRecord>,

    /// Notifications received from the engine
    events: Vec<EditorEvent>,
}

impl Document {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            components: HashMap::new(),
            flow: HashMap::new(),
            root: None,
            viewport,
            scroll: Point::ZERO,
            zoom: 1.0,
            history: Vec::new(),
            writes: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Create a document whose root (the canvas body) covers `bounds`
    pub fn with_root(viewport: Viewport, bounds: Rect) -> Self {
        let mut document = Self::new(viewport);
        let mut root = Component::new(StyleProps::new());
        root.set_name(Some("body".to_string()));
        root.rendered = Some(RenderedElement {
            client_rect: bounds,
            computed: ComputedStyle::default(),
        });
        let root_id = root.id;
        document.components.insert(root_id, root);
        document.root = Some(root_id);
        document
    }

    // ========== Component CRUD Operations ==========

    /// Append a rendered component under `parent`.
    /// `bounds` are document coordinates in CSS pixels.
    pub fn add_component(&mut self, parent: Ulid, bounds: Rect, style: StyleProps) -> Result<Ulid> {
        if !self.components.contains_key(&parent) {
            return Err(anyhow!("Parent component not found: {}", parent));
        }

        let mut component = Component::new(style);
        component.set_parent(Some(parent));
        let id = component.id;
        let client_rect = self.to_client(bounds);
        let computed = Self::computed_from_style(&component.style);
        component.rendered = Some(RenderedElement {
            client_rect,
            computed,
        });
        self.components.insert(id, component);
        self.flow.insert(id, bounds);

        if let Some(parent) = self.components.get_mut(&parent) {
            parent.add_child(id);
        }
        Ok(id)
    }

    pub fn get_component(&self, id: Ulid) -> Option<&Component> {
        self.components.get(&id)
    }

    pub fn get_component_mut(&mut self, id: Ulid) -> Option<&mut Component> {
        self.components.get_mut(&id)
    }

    pub fn root(&self) -> Option<Ulid> {
        self.root
    }

    pub fn set_drag_mode(&mut self, id: Ulid, mode: Option<DragMode>) -> Result<()> {
        let component = self
            .components
            .get_mut(&id)
            .ok_or_else(|| anyhow!("Component not found: {}", id))?;
        component.drag_mode = mode;
        Ok(())
    }

    /// Override a computed style value reported by the renderer
    pub fn set_computed(&mut self, id: Ulid, key: &str, value: &str) -> Result<()> {
        let rendered = self
            .components
            .get_mut(&id)
            .and_then(|c| c.rendered.as_mut())
            .ok_or_else(|| anyhow!("Rendered component not found: {}", id))?;
        rendered
            .computed
            .props
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Unlink a component from its parent; it stays in the arena, unrendered
    pub fn detach(&mut self, id: Ulid) -> Result<()> {
        let component = self
            .components
            .get_mut(&id)
            .ok_or_else(|| anyhow!("Component not found: {}", id))?;
        let parent = component.parent.take();
        component.rendered = None;

        if let Some(parent) = parent.and_then(|p| self.components.get_mut(&p)) {
            parent.remove_child(id);
        }
        Ok(())
    }

    /// Remove a component and its subtree
    pub fn remove_component(&mut self, id: Ulid) -> Result<()> {
        self.detach(id)?;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            self.flow.remove(&current);
            if let Some(component) = self.components.remove(&current) {
                stack.extend(component.children);
            }
        }
        if self.root == Some(id) {
            self.root = None;
        }
        Ok(())
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    // ========== Frame ==========

    /// Scroll the frame; client rects shift, document coordinates do not
    pub fn scroll_to(&mut self, x: f64, y: f64) {
        let dx = x - self.scroll.x;
        let dy = y - self.scroll.y;
        self.scroll = Point::new(x, y);
        for component in self.components.values_mut() {
            if let Some(rendered) = component.rendered.as_mut() {
                rendered.client_rect = rendered.client_rect.translate(-dx, -dy);
            }
        }
    }

    pub fn scroll(&self) -> Point {
        self.scroll
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        let old = self.zoom;
        self.zoom = zoom;
        let scroll = self.scroll;
        for component in self.components.values_mut() {
            if let Some(rendered) = component.rendered.as_mut() {
                let r = rendered.client_rect;
                let doc = Rect::new(
                    (r.left + scroll.x) / old,
                    (r.top + scroll.y) / old,
                    r.width / old,
                    r.height / old,
                );
                rendered.client_rect = Rect::new(
                    doc.left * zoom - scroll.x,
                    doc.top * zoom - scroll.y,
                    doc.width * zoom,
                    doc.height * zoom,
                );
            }
        }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn to_client(&self, bounds: Rect) -> Rect {
        Rect::new(
            bounds.left * self.zoom - self.scroll.x,
            bounds.top * self.zoom - self.scroll.y,
            bounds.width * self.zoom,
            bounds.height * self.zoom,
        )
    }

    fn computed_from_style(style: &StyleProps) -> ComputedStyle {
        let mut computed = ComputedStyle::default();
        if let Some(position) = style.get("position") {
            computed = computed.with("position", position.clone());
        }
        computed
    }

    // ========== Rendering ==========

    /// Nearest ancestor whose model style positions its children
    fn positioning_ancestor(&self, id: Ulid) -> Option<Ulid> {
        self.ancestors(id).into_iter().find(|a| {
            self.components
                .get(a)
                .and_then(|c| c.style_value("position"))
                .is_some_and(|p| p == "relative" || p == "absolute")
        })
    }

    /// Re-render a component from its model style. Absolute components are
    /// placed from `left`/`top`/`width`/`height`, others return to their
    /// in-flow box. Transforms are not laid out.
    fn relayout(&mut self, id: Ulid) {
        let Some(component) = self.components.get(&id) else {
            return;
        };
        let position = component.style_value("position").unwrap_or("static").to_string();
        let px = |key: &str| {
            component
                .style_value(key)
                .filter(|v| v.trim_end().ends_with("px"))
                .and_then(parse_css_number)
        };
        let (left, top, width, height) = (px("left"), px("top"), px("width"), px("height"));

        let origin = self
            .positioning_ancestor(id)
            .map(|a| self.measure(a).raw)
            .unwrap_or(Rect::ZERO);
        let current = self.measure(id).raw;
        let flow = self.flow.get(&id).copied().unwrap_or(current);
        let zoom = self.zoom;
        let scroll = self.scroll;

        let Some(rendered) = self
            .components
            .get_mut(&id)
            .and_then(|c| c.rendered.as_mut())
        else {
            return;
        };
        rendered.computed.props.insert("position".to_string(), position.clone());
        for (key, value) in [("width", width), ("height", height)] {
            match value {
                Some(v) => rendered.computed.props.insert(key.to_string(), format!("{v}px")),
                None => rendered.computed.props.remove(key),
            };
        }

        let doc = if position != "absolute" {
            Rect::new(
                flow.left,
                flow.top,
                width.unwrap_or(flow.width),
                height.unwrap_or(flow.height),
            )
        } else {
            Rect::new(
                left.map_or(current.left, |l| origin.left + l),
                top.map_or(current.top, |t| origin.top + t),
                width.unwrap_or(current.width),
                height.unwrap_or(current.height),
            )
        };
        rendered.client_rect = Rect::new(
            doc.left * zoom - scroll.x,
            doc.top * zoom - scroll.y,
            doc.width * zoom,
            doc.height * zoom,
        );
    }

    // ========== Logs ==========

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn style_writes(&self) -> &[StyleWriteRecord] {
        &self.writes
    }

    pub fn events(&self) -> &[EditorEvent] {
        &self.events
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    pub fn clear_logs(&mut self) {
        self.events.clear();
        self.writes.clear();
        self.history.clear();
    }
}

impl DocumentTree for Document {
    fn contains(&self, id: Ulid) -> bool {
        let Some(component) = self.components.get(&id) else {
            return false;
        };
        Some(id) == self.root || component.parent.is_some()
    }

    fn parent(&self, id: Ulid) -> Option<Ulid> {
        self.components.get(&id).and_then(|c| c.parent)
    }

    fn children(&self, id: Ulid) -> Vec<Ulid> {
        self.components
            .get(&id)
            .map(|c| c.children.clone())
            .unwrap_or_default()
    }

    fn drag_mode(&self, id: Ulid) -> Option<DragMode> {
        self.components.get(&id).and_then(|c| c.drag_mode)
    }
}

impl Geometry for Document {
    fn measure(&self, id: Ulid) -> MeasuredRect {
        if !self.contains(id) {
            return MeasuredRect::ZERO;
        }
        let Some(rendered) = self.components.get(&id).and_then(|c| c.rendered.as_ref()) else {
            return MeasuredRect::ZERO;
        };
        let client = rendered.client_rect;
        let rect = client.translate(self.scroll.x, self.scroll.y);
        let raw = Rect::new(
            rect.left / self.zoom,
            rect.top / self.zoom,
            rect.width / self.zoom,
            rect.height / self.zoom,
        );
        MeasuredRect { rect, raw }
    }

    fn computed_style(&self, id: Ulid) -> ComputedStyle {
        let Some(rendered) = self.components.get(&id).and_then(|c| c.rendered.as_ref()) else {
            return ComputedStyle::default();
        };
        let raw = self.measure(id).raw;
        let mut computed = rendered.computed.clone();
        for (key, value) in [("width", raw.width), ("height", raw.height)] {
            computed
                .props
                .entry(key.to_string())
                .or_insert_with(|| format!("{value}px"));
        }
        computed
    }

    fn offset_parent(&self, id: Ulid) -> Option<Ulid> {
        self.ancestors(id)
            .into_iter()
            .find(|a| {
                self.components
                    .get(a)
                    .and_then(|c| c.rendered.as_ref())
                    .is_some_and(|r| r.computed.position() != "static")
            })
            .or(self.root)
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn body_width(&self) -> f64 {
        self.root
            .map(|root| self.measure(root).raw.width)
            .unwrap_or(self.viewport.width)
    }

    fn scale(&self) -> f64 {
        self.zoom
    }

    fn pointer_to_canvas(&self, pointer: Point) -> Point {
        Point::new(
            (pointer.x + self.scroll.x) / self.zoom,
            (pointer.y + self.scroll.y) / self.zoom,
        )
    }
}

impl StyleTarget for Document {
    fn get_style(&self, id: Ulid) -> StyleProps {
        self.components
            .get(&id)
            .map(|c| c.style.clone())
            .unwrap_or_default()
    }

    fn add_style(&mut self, id: Ulid, props: &StyleProps, opts: AddStyleOptions) {
        let Some(component) = self.components.get_mut(&id) else {
            tracing::warn!(component = %id, "style write for unknown component ignored");
            return;
        };
        component.merge_style(props);

        self.writes.push(StyleWriteRecord {
            component: id,
            props: props.clone(),
            avoid_store: opts.avoid_store,
        });
        if !opts.avoid_store {
            self.history.push(HistoryEntry {
                timestamp: Utc::now(),
                component: id,
                props: props.clone(),
            });
        }
        self.relayout(id);
    }
}

impl EventSink for Document {
    fn emit(&mut self, event: EventKind) {
        self.events.push(EditorEvent::new(event));
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::with_root(Viewport::default(), Rect::new(0.0, 0.0, 1280.0, 800.0))
    }
}
