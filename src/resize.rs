use crate::config::{ManipulatorConfig, ResizeConfig, UnitConfig};
use crate::drag::positioning_context;
use crate::error::{ManipulatorError, ManipulatorResult};
use crate::event::EventKind;
use crate::geometry::{Point, Rect};
use crate::host::Host;
use crate::style::{format_number, parse_css_number, unit_of, StyleProps, StyleSync};
use crate::units::{to_unit, ConvertOptions, UnitContext};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Resize grip, one per edge and corner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResizeHandle {
    TopLeft,
    Top,
    TopRight,
    Left,
    Right,
    BottomLeft,
    Bottom,
    BottomRight,
}

impl ResizeHandle {
    pub const ALL: [ResizeHandle; 8] = [
        ResizeHandle::TopLeft,
        ResizeHandle::Top,
        ResizeHandle::TopRight,
        ResizeHandle::Left,
        ResizeHandle::Right,
        ResizeHandle::BottomLeft,
        ResizeHandle::Bottom,
        ResizeHandle::BottomRight,
    ];

    /// Two-letter handle code: row (`t`/`c`/`b`) then column (`l`/`c`/`r`)
    pub fn code(self) -> &'static str {
        match self {
            ResizeHandle::TopLeft => "tl",
            ResizeHandle::Top => "tc",
            ResizeHandle::TopRight => "tr",
            ResizeHandle::Left => "cl",
            ResizeHandle::Right => "cr",
            ResizeHandle::BottomLeft => "bl",
            ResizeHandle::Bottom => "bc",
            ResizeHandle::BottomRight => "br",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|handle| handle.code() == code)
    }

    /// False for the top-centre and bottom-centre grips
    pub fn resizes_width(self) -> bool {
        !matches!(self, ResizeHandle::Top | ResizeHandle::Bottom)
    }

    /// False for the centre-left and centre-right grips
    pub fn resizes_height(self) -> bool {
        !matches!(self, ResizeHandle::Left | ResizeHandle::Right)
    }

    /// Grip on the left edge: dragging it moves the origin
    pub fn moves_left(self) -> bool {
        matches!(
            self,
            ResizeHandle::TopLeft | ResizeHandle::Left | ResizeHandle::BottomLeft
        )
    }

    pub fn moves_top(self) -> bool {
        matches!(
            self,
            ResizeHandle::TopLeft | ResizeHandle::Top | ResizeHandle::TopRight
        )
    }

    pub fn is_corner(self) -> bool {
        self.resizes_width() && self.resizes_height()
    }
}

/// A model dimension as found when the resize started
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDimension {
    /// Model value, or the computed one when the model value is not numeric
    pub value: String,
    pub property: String,
    pub number: f64,
    pub unit: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeOptions {
    pub target: Option<Ulid>,
    pub handle: ResizeHandle,
    /// Pointer position on the grip, viewport coordinates
    pub pointer: Point,
}

impl ResizeOptions {
    pub fn new(target: Ulid, handle: ResizeHandle, pointer: Point) -> Self {
        Self {
            target: Some(target),
            handle,
            pointer,
        }
    }
}

/// New rect for a pointer delta (canvas units) applied to `handle`.
///
/// Edge grips ignore the perpendicular delta. With `keep_ratio` a corner
/// grip scales both sides by the larger relative change.
pub fn calculate_resized_bounds(
    start: Rect,
    handle: ResizeHandle,
    delta: Point,
    keep_ratio: bool,
    config: &ResizeConfig,
) -> Rect {
    let min_dim = config.min_dim;
    let mut width = start.width;
    let mut height = start.height;

    match handle {
        ResizeHandle::TopLeft => {
            width = (start.width - delta.x).max(min_dim);
            height = (start.height - delta.y).max(min_dim);
        }
        ResizeHandle::TopRight => {
            width = (start.width + delta.x).max(min_dim);
            height = (start.height - delta.y).max(min_dim);
        }
        ResizeHandle::BottomLeft => {
            width = (start.width - delta.x).max(min_dim);
            height = (start.height + delta.y).max(min_dim);
        }
        ResizeHandle::BottomRight => {
            width = (start.width + delta.x).max(min_dim);
            height = (start.height + delta.y).max(min_dim);
        }
        ResizeHandle::Top => {
            height = (start.height - delta.y).max(min_dim);
        }
        ResizeHandle::Bottom => {
            height = (start.height + delta.y).max(min_dim);
        }
        ResizeHandle::Left => {
            width = (start.width - delta.x).max(min_dim);
        }
        ResizeHandle::Right => {
            width = (start.width + delta.x).max(min_dim);
        }
    }

    if keep_ratio && handle.is_corner() && start.width > 0.0 && start.height > 0.0 {
        let factor = (width / start.width).max(height / start.height);
        width = start.width * factor;
        height = start.height * factor;
    }

    if config.step > 0.0 {
        width = (width / config.step).round() * config.step;
        height = (height / config.step).round() * config.step;
    }

    let left = if handle.moves_left() {
        start.left + start.width - width
    } else {
        start.left
    };
    let top = if handle.moves_top() {
        start.top + start.height - height
    } else {
        start.top
    };
    Rect::new(left, top, width, height)
}

fn model_dimension(property: &str, model: &StyleProps, computed: Option<&str>, fallback: f64) -> ModelDimension {
    let mut value = model.get(property).cloned().unwrap_or_default();
    if parse_css_number(&value).is_none() {
        value = computed.unwrap_or_default().to_string();
    }
    ModelDimension {
        number: parse_css_number(&value).unwrap_or(fallback),
        unit: unit_of(&value),
        property: property.to_string(),
        value,
    }
}

/// One resize gesture
#[derive(Debug)]
pub struct ResizeSession {
    component: Ulid,
    handle: ResizeHandle,
    config: ResizeConfig,
    units: UnitConfig,
    start_pointer: Point,
    /// Unscaled rect at start
    start_rect: Rect,
    rect: Rect,
    delta: Point,
    model_width: ModelDimension,
    model_height: ModelDimension,
    auto_width: bool,
    auto_height: bool,
    unit_width: String,
    unit_height: String,
    /// `left`/`top` in px at start, when the target is freely positioned
    origin: Option<Point>,
    original: StyleProps,
    sync: StyleSync,
    moved: bool,
}

impl ResizeSession {
    #[tracing::instrument(skip(host, config))]
    pub fn start<H: Host + ?Sized>(
        host: &mut H,
        opts: ResizeOptions,
        config: &ManipulatorConfig,
    ) -> ManipulatorResult<Self> {
        let component = opts.target.ok_or(ManipulatorError::TargetRequired)?;
        if !host.contains(component) {
            return Err(ManipulatorError::TargetNotFound(component));
        }
        let resize = config.resize.clone();

        let start_rect = host.measure(component).raw;
        let model = host.get_style(component);
        let computed = host.computed_style(component);

        let model_width = model_dimension(
            &resize.key_width,
            &model,
            computed.get(&resize.key_width),
            start_rect.width,
        );
        let model_height = model_dimension(
            &resize.key_height,
            &model,
            computed.get(&resize.key_height),
            start_rect.height,
        );
        let is_auto = |key: &str| model.get(key).map(String::as_str) == Some("auto");
        let auto_width = resize.keep_auto_width && is_auto(&resize.key_width);
        let auto_height = resize.keep_auto_height && is_auto(&resize.key_height);

        let (unit_width, unit_height) = if resize.current_unit {
            (model_width.unit.clone(), model_height.unit.clone())
        } else {
            ("px".to_string(), "px".to_string())
        };

        let origin = if !resize.skip_position_update && host.drag_mode(component).is_some() {
            let context = positioning_context(&*host, component)
                .map(|ctx| host.measure(ctx).raw)
                .unwrap_or(Rect::ZERO);
            // Non-px offsets fall back to the measured box in the context frame
            let px = |key: &str, measured: f64| {
                model
                    .get(key)
                    .filter(|v| unit_of(v) == "px")
                    .and_then(|v| parse_css_number(v))
                    .unwrap_or(measured)
            };
            Some(Point::new(
                px("left", start_rect.left - context.left),
                px("top", start_rect.top - context.top),
            ))
        } else {
            None
        };

        let original = [
            resize.key_width.as_str(),
            resize.key_height.as_str(),
            "left",
            "top",
        ]
        .iter()
        .map(|key| (key.to_string(), model.get(*key).cloned().unwrap_or_default()))
        .collect();

        tracing::debug!(
            component = %component,
            handle = opts.handle.code(),
            ?start_rect,
            unit_width = %unit_width,
            unit_height = %unit_height,
            "resize started"
        );
        host.emit(EventKind::ResizeStart {
            component,
            handle: opts.handle,
            rect: start_rect,
            model_width: model_width.clone(),
            model_height: model_height.clone(),
        });

        Ok(Self {
            component,
            handle: opts.handle,
            config: resize,
            units: config.units.clone(),
            start_pointer: opts.pointer,
            start_rect,
            rect: start_rect,
            delta: Point::ZERO,
            model_width,
            model_height,
            auto_width,
            auto_height,
            unit_width,
            unit_height,
            origin,
            original,
            sync: StyleSync::new(),
            moved: false,
        })
    }

    /// Handle a pointer move; returns the new rect
    pub fn on_move<H: Host + ?Sized>(&mut self, host: &mut H, pointer: Point, shift: bool) -> Rect {
        let scale = host.scale();
        let scale = if scale > 0.0 { scale } else { 1.0 };
        let moved = pointer - self.start_pointer;
        self.delta = Point::new(moved.x / scale, moved.y / scale);

        let keep_ratio = shift && self.config.keep_ratio_on_shift;
        self.rect = calculate_resized_bounds(self.start_rect, self.handle, self.delta, keep_ratio, &self.config);
        if self.rect != self.start_rect {
            self.moved = true;
        }

        host.emit(EventKind::ResizeMove {
            component: self.component,
            rect: self.rect,
            delta: self.delta,
            pointer,
        });
        self.update_target(host, false);
        self.rect
    }

    /// Write the current rect to the model; `store` marks the durable write
    pub fn update_target<H: Host + ?Sized>(&mut self, host: &mut H, store: bool) -> StyleProps {
        let mut style = StyleProps::new();
        let ctx = UnitContext::for_element(&*host, self.component);

        if self.handle.resizes_width() {
            let body_width = host.body_width();
            let width = if body_width > 0.0 && self.rect.width > body_width {
                tracing::warn!(width = self.rect.width, body_width, "width clamped to body");
                body_width
            } else {
                self.rect.width
            };
            let value = if self.auto_width && width == self.start_rect.width {
                "auto".to_string()
            } else {
                to_unit(
                    width,
                    &self.unit_width,
                    &ctx,
                    &ConvertOptions::from_config(&self.units, false),
                )
            };
            style.insert(self.config.key_width.clone(), value);
        }

        if self.handle.resizes_height() {
            let height = self.rect.height;
            let value = if self.auto_height && height == self.start_rect.height {
                "auto".to_string()
            } else {
                to_unit(
                    height,
                    &self.unit_height,
                    &ctx,
                    &ConvertOptions::from_config(&self.units, true),
                )
            };
            style.insert(self.config.key_height.clone(), value);
        }

        if let Some(origin) = self.origin {
            let left = origin.x + (self.rect.left - self.start_rect.left);
            let top = origin.y + (self.rect.top - self.start_rect.top);
            style.insert("left".to_string(), format!("{}px", format_number(left)));
            style.insert("top".to_string(), format!("{}px", format_number(top)));
        }

        let partial = !store;
        host.emit(EventKind::ResizeUpdate {
            component: self.component,
            rect: self.rect,
            style: style.clone(),
            partial,
        });
        self.sync.commit(host, self.component, style.clone(), partial);
        style
    }

    /// Commit the current rect durably; returns whether the size changed
    #[tracing::instrument(skip(self, host), fields(component = %self.component))]
    pub fn on_end<H: Host + ?Sized>(&mut self, host: &mut H) -> bool {
        self.update_target(host, true);
        tracing::debug!(rect = ?self.rect, moved = self.moved, "resize ended");
        host.emit(EventKind::ResizeEnd {
            component: self.component,
            rect: self.rect,
            moved: self.moved,
            cancelled: false,
        });
        self.moved
    }

    /// Restore the dimensions found at start without touching history
    #[tracing::instrument(skip(self, host), fields(component = %self.component))]
    pub fn cancel<H: Host + ?Sized>(&mut self, host: &mut H) {
        let original = self.original.clone();
        self.sync.commit(host, self.component, original, true);
        self.rect = self.start_rect;
        host.emit(EventKind::ResizeEnd {
            component: self.component,
            rect: self.rect,
            moved: self.moved,
            cancelled: true,
        });
    }

    pub fn component(&self) -> Ulid {
        self.component
    }

    pub fn handle(&self) -> ResizeHandle {
        self.handle
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn start_rect(&self) -> Rect {
        self.start_rect
    }

    pub fn delta(&self) -> Point {
        self.delta
    }

    pub fn moved(&self) -> bool {
        self.moved
    }

    pub fn model_width(&self) -> &ModelDimension {
        &self.model_width
    }

    pub fn model_height(&self) -> &ModelDimension {
        &self.model_height
    }

    pub fn style_sync(&self) -> &StyleSync {
        &self.sync
    }
}
