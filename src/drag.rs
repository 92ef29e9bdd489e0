use crate::config::{DragConfig, ManipulatorConfig};
use crate::dragger::Dragger;
use crate::error::{ManipulatorError, ManipulatorResult};
use crate::event::EventKind;
use crate::geometry::{Axis, MeasuredRect, Point};
use crate::guides::{
    collect_static_guides, compute_guides, match_guides, refresh_static_guides, Guide, GuideKind,
    GuideMatch, RectArena,
};
use crate::host::{DocumentTree, Geometry, Host, StyleTarget};
use crate::style::{compute_style_write, format_number, read_position, DragMode, PositionUpdate, StyleProps, StyleSync};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Style keys a drag may touch, restored on cancel
const DRAG_KEYS: [&str; 6] = ["position", "left", "top", "width", "height", "transform"];

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DragOptions {
    pub target: Option<Ulid>,
    pub mode: DragMode,
    /// Place the target under the pointer first (a block dropped from a library)
    pub center: bool,
    /// Pointer position that started the gesture, viewport coordinates
    pub pointer: Point,
}

impl DragOptions {
    pub fn new(target: Ulid, pointer: Point) -> Self {
        Self {
            target: Some(target),
            pointer,
            ..Default::default()
        }
    }

    pub fn with_mode(mut self, mode: DragMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn centered(mut self) -> Self {
        self.center = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuideLine {
    pub kind: GuideKind,
    pub owner: Ulid,
    pub position: f64,
    /// Line thickness in px
    pub thickness: f64,
    pub active: bool,
}

impl GuideLine {
    fn from_guide(guide: &Guide) -> Self {
        Self {
            kind: guide.kind,
            owner: guide.owner,
            position: guide.position,
            thickness: if guide.active { 2.0 } else { 1.0 },
            active: guide.active,
        }
    }

    /// Vertical lines sit on X
    pub fn is_vertical(&self) -> bool {
        self.kind.axis() == Axis::X
    }
}

/// Spacing readout between the dragged element and its matched neighbour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuideInfo {
    pub pos_first: f64,
    pub pos_second: f64,
    pub size: f64,
    pub label: String,
}

impl From<&GuideMatch> for GuideInfo {
    fn from(matched: &GuideMatch) -> Self {
        Self {
            pos_first: matched.pos_first,
            pos_second: matched.pos_second,
            size: matched.size,
            label: matched.label(),
        }
    }
}

/// What the editor should draw on top of the canvas for this session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuideOverlay {
    pub lines: Vec<GuideLine>,
    pub info_x: Option<GuideInfo>,
    pub info_y: Option<GuideInfo>,
}

impl GuideOverlay {
    pub fn hide(&mut self) {
        self.lines.clear();
        self.hide_info();
    }

    pub fn hide_info(&mut self) {
        self.info_x = None;
        self.info_y = None;
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.info_x.is_none() && self.info_y.is_none()
    }

    pub fn info(&self, axis: Axis) -> Option<&GuideInfo> {
        match axis {
            Axis::X => self.info_x.as_ref(),
            Axis::Y => self.info_y.as_ref(),
        }
    }
}

/// Nearest ancestor whose model style positions its children
pub fn positioning_context<H: DocumentTree + StyleTarget + ?Sized>(host: &H, id: Ulid) -> Option<Ulid> {
    host.ancestors(id).into_iter().find(|ancestor| {
        matches!(
            host.get_style(*ancestor).get("position").map(String::as_str),
            Some("relative" | "absolute")
        )
    })
}

fn translate_measured(rect: MeasuredRect, delta: Point, scale: f64) -> MeasuredRect {
    MeasuredRect {
        rect: rect.rect.translate(delta.x * scale, delta.y * scale),
        raw: rect.raw.translate(delta.x, delta.y),
    }
}

/// One drag gesture
#[derive(Debug)]
pub struct DragSession {
    component: Ulid,
    mode: DragMode,
    config: DragConfig,
    tolerance: f64,
    dragger: Dragger,
    /// Rect after free positioning was established
    start_rect: MeasuredRect,
    start_position: Point,
    position: Point,
    /// Style before the gesture, for cancel
    original: StyleProps,
    targets: Vec<Guide>,
    statics: Vec<Guide>,
    arena: RectArena,
    matches: Vec<GuideMatch>,
    overlay: GuideOverlay,
    sync: StyleSync,
    moved: bool,
}

impl DragSession {
    #[tracing::instrument(skip(host, config), fields(target = ?opts.target))]
    pub fn start<H: Host + ?Sized>(
        host: &mut H,
        opts: DragOptions,
        config: &ManipulatorConfig,
    ) -> ManipulatorResult<Self> {
        let component = opts.target.ok_or(ManipulatorError::TargetRequired)?;
        if !host.contains(component) {
            return Err(ManipulatorError::TargetNotFound(component));
        }

        let original: StyleProps = {
            let style = host.get_style(component);
            DRAG_KEYS
                .iter()
                .map(|key| (key.to_string(), style.get(*key).cloned().unwrap_or_default()))
                .collect()
        };

        let mut dragger = Dragger::new(config.drag.snap_offset);
        dragger.start(opts.pointer);

        let mut session = Self {
            component,
            mode: opts.mode,
            config: config.drag.clone(),
            tolerance: config.guides.match_tolerance,
            dragger,
            start_rect: MeasuredRect::ZERO,
            start_position: Point::ZERO,
            position: Point::ZERO,
            original,
            targets: Vec::new(),
            statics: Vec::new(),
            arena: RectArena::new(),
            matches: Vec::new(),
            overlay: GuideOverlay::default(),
            sync: StyleSync::new(),
            moved: false,
        };

        host.emit(EventKind::DragStart {
            component,
            mode: opts.mode,
        });
        session.establish_position(host, &opts);

        // The target may have just moved; static guides depend on layout
        session.statics = collect_static_guides(&*host, component, &mut session.arena);
        session.start_rect = host.measure(component);
        session.targets = compute_guides(component, session.start_rect).to_vec();
        let (x, y) = read_position(session.mode, &host.get_style(component));
        session.start_position = Point::new(x, y);
        session.position = session.start_position;

        tracing::debug!(
            component = %component,
            mode = ?session.mode,
            statics = session.statics.len(),
            start = ?session.start_position,
            "drag started"
        );
        Ok(session)
    }

    /// Switch a not yet absolute target to `position: absolute`, keeping it
    /// where it is rendered (or under the pointer when centering)
    fn establish_position<H: Host + ?Sized>(&mut self, host: &mut H, opts: &DragOptions) {
        if self.mode == DragMode::Translate {
            return;
        }
        let style = host.get_style(self.component);
        if style.get("position").map(String::as_str) == Some("absolute") {
            return;
        }

        let offset = host.measure(self.component).raw;
        let context = positioning_context(&*host, self.component)
            .map(|ctx| host.measure(ctx).raw);

        let (mut left, mut top) = if opts.center {
            let pointer = host.pointer_to_canvas(opts.pointer);
            (pointer.x - offset.width / 2.0, pointer.y - offset.height / 2.0)
        } else {
            (offset.left, offset.top)
        };
        if let Some(context) = context {
            left -= context.left;
            top -= context.top;
        }

        let update = PositionUpdate {
            x: left,
            y: top,
            position: Some("absolute".to_string()),
            width: Some(format!("{}px", format_number(offset.width))),
            height: Some(format!("{}px", format_number(offset.height))),
        };
        let props = compute_style_write(DragMode::Absolute, &style, &update);
        tracing::debug!(component = %self.component, ?props, "absolute positioning established");
        self.sync.commit(host, self.component, props, true);
    }

    /// Handle a pointer move; returns the written position
    pub fn on_move<H: Host + ?Sized>(&mut self, host: &mut H, pointer: Point, shift: bool) -> Point {
        let scale = host.scale();
        let raw_delta = self.dragger.delta_for(pointer, shift, scale);

        let delta = if host.contains(self.component) {
            let in_flight = translate_measured(self.start_rect, raw_delta, scale);
            self.targets = compute_guides(self.component, in_flight).to_vec();
            let delta = self.dragger.snap(raw_delta, &mut self.targets, &self.statics, scale);

            let snapped = translate_measured(self.start_rect, delta, scale);
            for guide in self.targets.iter_mut() {
                guide.reposition(snapped);
            }
            let active: Vec<Guide> = self.targets.iter().filter(|g| g.active).cloned().collect();
            self.matches = match_guides(&active, &self.statics, self.tolerance);
            delta
        } else {
            tracing::warn!(component = %self.component, "drag target detached, guides skipped");
            self.targets.clear();
            self.matches.clear();
            raw_delta
        };

        if delta != Point::ZERO {
            self.moved = true;
        }
        self.position = self.start_position + delta;
        self.write(host, true);
        self.render_overlay();

        tracing::trace!(position = ?self.position, matches = self.matches.len(), "drag move");
        host.emit(EventKind::DragMove {
            component: self.component,
            position: self.position,
            matches: self.matches.clone(),
        });
        if self.config.guides_info {
            for matched in &self.matches {
                host.emit(EventKind::DragActive {
                    component: self.component,
                    matched: matched.clone(),
                });
            }
        }
        self.position
    }

    fn write<H: Host + ?Sized>(&mut self, host: &mut H, partial: bool) {
        let current = host.get_style(self.component);
        let props = compute_style_write(
            self.mode,
            &current,
            &PositionUpdate::at(self.position.x, self.position.y),
        );
        self.sync.commit(host, self.component, props, partial);
    }

    fn render_overlay(&mut self) {
        self.overlay.hide();
        if self.config.skip_guides_render {
            return;
        }

        self.overlay.lines = self
            .targets
            .iter()
            .filter(|guide| guide.active || self.config.debug)
            .map(GuideLine::from_guide)
            .collect();
        if self.config.debug {
            self.overlay
                .lines
                .extend(self.statics.iter().map(GuideLine::from_guide));
        }

        if self.config.guides_info {
            for matched in &self.matches {
                let info = Some(GuideInfo::from(matched));
                match matched.axis() {
                    Axis::X => self.overlay.info_x = info,
                    Axis::Y => self.overlay.info_y = info,
                }
            }
        }
    }

    /// Commit the final position durably; returns whether the target moved
    #[tracing::instrument(skip(self, host), fields(component = %self.component))]
    pub fn on_end<H: Host + ?Sized>(&mut self, host: &mut H) -> bool {
        self.write(host, false);
        self.finish(host, false);
        self.moved
    }

    /// Restore the style found at start without touching history
    #[tracing::instrument(skip(self, host), fields(component = %self.component))]
    pub fn cancel<H: Host + ?Sized>(&mut self, host: &mut H) {
        let original = self.original.clone();
        self.sync.commit(host, self.component, original, true);
        self.finish(host, true);
    }

    fn finish<H: Host + ?Sized>(&mut self, host: &mut H, cancelled: bool) {
        self.dragger.stop();
        self.overlay.hide();
        self.matches.clear();
        for guide in self.targets.iter_mut() {
            guide.active = false;
        }
        tracing::debug!(moved = self.moved, cancelled, "drag ended");
        host.emit(EventKind::DragEnd {
            component: self.component,
            moved: self.moved,
            cancelled,
        });
    }

    /// Re-measure static guides after the canvas scrolled or resized
    pub fn refresh_guides<H: DocumentTree + Geometry + ?Sized>(&mut self, host: &H) {
        refresh_static_guides(host, &mut self.statics, &mut self.arena);
    }

    pub fn component(&self) -> Ulid {
        self.component
    }

    pub fn mode(&self) -> DragMode {
        self.mode
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn moved(&self) -> bool {
        self.moved
    }

    pub fn matches(&self) -> &[GuideMatch] {
        &self.matches
    }

    pub fn overlay(&self) -> &GuideOverlay {
        &self.overlay
    }

    pub fn target_guides(&self) -> &[Guide] {
        &self.targets
    }

    pub fn static_guides(&self) -> &[Guide] {
        &self.statics
    }

    pub fn style_sync(&self) -> &StyleSync {
        &self.sync
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::geometry::{Rect, Viewport};
    use crate::guides::MatchEdge;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    fn style(pairs: &[(&str, &str)]) -> StyleProps {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// Parent at the origin, sibling ending at x=300, element at (100, 200)
    fn snap_document() -> (Document, Ulid, Ulid, Ulid) {
        let mut document = Document::with_root(Viewport::new(1280.0, 1000.0), Rect::new(0.0, 0.0, 1280.0, 1200.0));
        let root = document.root().unwrap();
        let parent = document
            .add_component(root, Rect::new(0.0, 0.0, 1000.0, 1000.0), style(&[("position", "relative")]))
            .unwrap();
        let sibling = document
            .add_component(
                parent,
                Rect::new(200.0, 0.0, 100.0, 100.0),
                style(&[("position", "absolute"), ("left", "200px"), ("top", "0px")]),
            )
            .unwrap();
        let element = document
            .add_component(parent, Rect::new(100.0, 200.0, 50.0, 50.0), style(&[("width", "auto")]))
            .unwrap();
        (document, parent, sibling, element)
    }

    #[test]
    fn test_start_requires_target() {
        let mut document = Document::default();
        let result = DragSession::start(&mut document, DragOptions::default(), &ManipulatorConfig::default());
        assert_matches!(result, Err(ManipulatorError::TargetRequired));

        let missing = Ulid::new();
        let result = DragSession::start(
            &mut document,
            DragOptions::new(missing, Point::ZERO),
            &ManipulatorConfig::default(),
        );
        assert_matches!(result, Err(ManipulatorError::TargetNotFound(id)) if id == missing);
    }

    #[test]
    fn test_start_establishes_absolute_position() {
        let (mut document, _, _, element) = snap_document();
        let session = DragSession::start(
            &mut document,
            DragOptions::new(element, Point::new(120.0, 220.0)),
            &ManipulatorConfig::default(),
        )
        .unwrap();

        let written = document.get_style(element);
        assert_eq!(written.get("position").map(String::as_str), Some("absolute"));
        assert_eq!(written.get("left").map(String::as_str), Some("100px"));
        assert_eq!(written.get("top").map(String::as_str), Some("200px"));
        assert_eq!(written.get("width").map(String::as_str), Some("50px"));
        assert_eq!(session.position(), Point::new(100.0, 200.0));
        // Sibling (6) and parent (6)
        assert_eq!(session.static_guides().len(), 12);
        assert_eq!(document.history().len(), 0);
    }

    #[test]
    fn test_translate_mode_keeps_layout() {
        let (mut document, _, _, element) = snap_document();
        let mut session = DragSession::start(
            &mut document,
            DragOptions::new(element, Point::ZERO).with_mode(DragMode::Translate),
            &ManipulatorConfig::default(),
        )
        .unwrap();
        session.on_move(&mut document, Point::new(15.0, 7.0), false);
        session.on_end(&mut document);

        let written = document.get_style(element);
        assert_eq!(written.get("position"), None);
        assert_eq!(
            written.get("transform").map(String::as_str),
            Some("translateX(15px) translateY(7px)")
        );
    }

    #[test]
    fn test_drag_snaps_to_sibling_edge() {
        let (mut document, _, sibling, element) = snap_document();
        let mut session = DragSession::start(
            &mut document,
            DragOptions::new(element, Point::new(120.0, 220.0)),
            &ManipulatorConfig::default(),
        )
        .unwrap();

        let position = session.on_move(&mut document, Point::new(318.0, 220.0), false);
        assert_eq!(position, Point::new(300.0, 200.0));

        let matches = session.matches();
        assert_eq!(matches.len(), 1);
        let matched = &matches[0];
        assert_eq!(matched.guide.kind, GuideKind::Left);
        assert_eq!(matched.matched.kind, GuideKind::Right);
        assert_eq!(matched.matched.owner, sibling);
        assert_eq!(matched.edge, MatchEdge::StaticFirst);
        assert_eq!(matched.pos_first, 300.0);
        assert_eq!(matched.size, 100.0);

        let info = session.overlay().info(Axis::X).unwrap();
        assert_eq!(info.label, "100px");
        assert_eq!(session.overlay().lines.len(), 1);
        assert_eq!(session.overlay().lines[0].thickness, 2.0);

        assert!(session.on_end(&mut document));
        assert!(session.overlay().is_empty());
        assert_eq!(document.get_style(element).get("left").map(String::as_str), Some("300px"));
    }

    #[test]
    fn test_skip_guides_render_still_matches() {
        let (mut document, _, _, element) = snap_document();
        let mut config = ManipulatorConfig::default();
        config.drag.skip_guides_render = true;
        let mut session = DragSession::start(&mut document, DragOptions::new(element, Point::ZERO), &config).unwrap();

        session.on_move(&mut document, Point::new(198.0, 0.0), false);
        assert_eq!(session.matches().len(), 1);
        assert!(session.overlay().is_empty());
    }

    #[test]
    fn test_debug_renders_every_line() {
        let (mut document, _, _, element) = snap_document();
        let mut config = ManipulatorConfig::default();
        config.drag.debug = true;
        let mut session = DragSession::start(&mut document, DragOptions::new(element, Point::ZERO), &config).unwrap();

        session.on_move(&mut document, Point::new(40.0, 0.0), false);
        assert_eq!(session.overlay().lines.len(), 6 + 12);
        assert!(session.overlay().lines.iter().all(|l| !l.active));
    }

    #[test]
    fn test_cancel_restores_style() {
        let (mut document, _, _, element) = snap_document();
        let mut session = DragSession::start(&mut document, DragOptions::new(element, Point::ZERO), &ManipulatorConfig::default())
            .unwrap();
        session.on_move(&mut document, Point::new(60.0, 60.0), false);
        session.cancel(&mut document);

        let restored = document.get_style(element);
        assert_eq!(restored, style(&[("width", "auto")]));
        assert_eq!(document.measure(element).raw, Rect::new(100.0, 200.0, 50.0, 50.0));
        assert!(document.history().is_empty());
        assert_matches!(
            document.events().last().map(|e| &e.event),
            Some(EventKind::DragEnd { cancelled: true, moved: true, .. })
        );
    }

    #[test]
    fn test_centered_drop_under_pointer() {
        let (mut document, _, _, element) = snap_document();
        DragSession::start(
            &mut document,
            DragOptions::new(element, Point::new(500.0, 400.0)).centered(),
            &ManipulatorConfig::default(),
        )
        .unwrap();

        let written = document.get_style(element);
        assert_eq!(written.get("left").map(String::as_str), Some("475px"));
        assert_eq!(written.get("top").map(String::as_str), Some("375px"));
    }

    #[test]
    fn test_centered_drop_inside_offset_container() {
        let mut document = Document::with_root(Viewport::new(1280.0, 1000.0), Rect::new(0.0, 0.0, 1280.0, 1200.0));
        let root = document.root().unwrap();
        let container = document
            .add_component(root, Rect::new(200.0, 100.0, 600.0, 600.0), style(&[("position", "relative")]))
            .unwrap();
        let element = document
            .add_component(container, Rect::new(250.0, 150.0, 40.0, 20.0), StyleProps::new())
            .unwrap();

        DragSession::start(
            &mut document,
            DragOptions::new(element, Point::new(500.0, 400.0)).centered(),
            &ManipulatorConfig::default(),
        )
        .unwrap();

        let written = document.get_style(element);
        assert_eq!(written.get("left").map(String::as_str), Some("280px"));
        assert_eq!(written.get("top").map(String::as_str), Some("290px"));
        let rendered = document.measure(element).raw;
        assert_eq!((rendered.left, rendered.top), (480.0, 390.0));
    }

    #[test]
    fn test_positioning_context() {
        let (document, parent, sibling, element) = snap_document();
        assert_eq!(positioning_context(&document, element), Some(parent));
        assert_eq!(positioning_context(&document, sibling), Some(parent));
        assert_eq!(positioning_context(&document, parent), None);
    }
}
