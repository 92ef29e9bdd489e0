use crate::geometry::{Axis, MeasuredRect, Rect};
use crate::host::{DocumentTree, Geometry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use ulid::Ulid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GuideKind {
    Top,
    Bottom,
    Left,
    Right,
    CenterX,
    CenterY,
}

impl GuideKind {
    pub const ALL: [GuideKind; 6] = [
        GuideKind::Top,
        GuideKind::Bottom,
        GuideKind::Left,
        GuideKind::Right,
        GuideKind::CenterX,
        GuideKind::CenterY,
    ];

    /// Axis the guide position is measured on. `Left` sits on X, drawn as
    /// a vertical line.
    pub fn axis(self) -> Axis {
        match self {
            GuideKind::Left | GuideKind::Right | GuideKind::CenterX => Axis::X,
            GuideKind::Top | GuideKind::Bottom | GuideKind::CenterY => Axis::Y,
        }
    }

    pub fn complementary(self) -> [GuideKind; 2] {
        match self {
            GuideKind::Left => [GuideKind::Right, GuideKind::CenterX],
            GuideKind::Right => [GuideKind::Left, GuideKind::CenterX],
            GuideKind::CenterX => [GuideKind::Left, GuideKind::Right],
            GuideKind::Top => [GuideKind::Bottom, GuideKind::CenterY],
            GuideKind::Bottom => [GuideKind::Top, GuideKind::CenterY],
            GuideKind::CenterY => [GuideKind::Top, GuideKind::Bottom],
        }
    }

    /// Same kind or a complementary one
    pub fn can_match(self, other: GuideKind) -> bool {
        self == other || self.complementary().contains(&other)
    }

    pub fn position_in(self, rect: &Rect) -> f64 {
        match self {
            GuideKind::Top => rect.top,
            GuideKind::Bottom => rect.bottom(),
            GuideKind::Left => rect.left,
            GuideKind::Right => rect.right(),
            GuideKind::CenterX => rect.center_x(),
            GuideKind::CenterY => rect.center_y(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guide {
    pub kind: GuideKind,
    pub position: f64,
    pub owner: Ulid,
    pub owner_rect: MeasuredRect,
    /// Locked by snapping on the current frame
    pub active: bool,
}

impl Guide {
    pub fn axis(&self) -> Axis {
        self.kind.axis()
    }

    /// Move the guide onto a new owner rect, keeping its active flag
    pub fn reposition(&mut self, owner_rect: MeasuredRect) {
        self.position = self.kind.position_in(&owner_rect.rect);
        self.owner_rect = owner_rect;
    }
}

/// The six guides of a measured element
pub fn compute_guides(owner: Ulid, rect: MeasuredRect) -> [Guide; 6] {
    GuideKind::ALL.map(|kind| Guide {
        kind,
        position: kind.position_in(&rect.rect),
        owner,
        owner_rect: rect,
        active: false,
    })
}

/// Per-frame measurements keyed by component id.
///
/// Guides keep only the owner id; rects live here and are rebuilt instead of
/// held across frames, so a component removed mid-session simply drops out.
#[derive(Debug, Default, Clone)]
pub struct RectArena {
    rects: HashMap<Ulid, MeasuredRect>,
}

impl RectArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Measure once per arena lifetime
    pub fn measure<H: Geometry + ?Sized>(&mut self, host: &H, id: Ulid) -> MeasuredRect {
        *self.rects.entry(id).or_insert_with(|| host.measure(id))
    }

    pub fn get(&self, id: Ulid) -> Option<MeasuredRect> {
        self.rects.get(&id).copied()
    }

    pub fn clear(&mut self) {
        self.rects.clear();
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }
}

/// Guides of every sibling of `dragged` followed by the parent's own guides
pub fn collect_static_guides<H: DocumentTree + Geometry + ?Sized>(
    host: &H,
    dragged: Ulid,
    arena: &mut RectArena,
) -> Vec<Guide> {
    let Some(parent) = host.parent(dragged) else {
        return Vec::new();
    };

    let mut result = Vec::new();
    for sibling in host.children(parent) {
        if sibling == dragged {
            continue;
        }
        let rect = arena.measure(host, sibling);
        result.extend(compute_guides(sibling, rect));
    }
    let parent_rect = arena.measure(host, parent);
    result.extend(compute_guides(parent, parent_rect));
    result
}

/// Re-measure static guides, dropping those whose owner left the tree
pub fn refresh_static_guides<H: DocumentTree + Geometry + ?Sized>(
    host: &H,
    guides: &mut Vec<Guide>,
    arena: &mut RectArena,
) {
    arena.clear();
    guides.retain(|guide| host.contains(guide.owner));
    for guide in guides.iter_mut() {
        let rect = arena.measure(host, guide.owner);
        guide.reposition(rect);
    }
    tracing::debug!(guides = guides.len(), "static guides refreshed");
}

/// Which side of the target the matched element sits on, along the axis
/// perpendicular to the guide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchEdge {
    /// Static element precedes the target; the readout spans static far edge to target near edge
    StaticFirst,
    /// Target precedes the static element
    TargetFirst,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuideMatch {
    /// Target guide
    pub guide: Guide,
    /// Static guide it coincides with
    pub matched: Guide,
    /// Guide coordinate on its own axis
    pub pos_first: f64,
    /// Start of the spacing readout on the perpendicular axis
    pub pos_second: f64,
    /// Distance between the two elements on the perpendicular axis
    pub size: f64,
    /// Same distance from the unscaled rects
    pub size_raw: f64,
    pub edge: MatchEdge,
}

impl GuideMatch {
    pub fn axis(&self) -> Axis {
        self.guide.axis()
    }

    /// Text of the spacing badge
    pub fn label(&self) -> String {
        format!("{}px", self.size_raw.round() as i64)
    }
}

fn extent(rect: &Rect, axis: Axis) -> (f64, f64) {
    match axis {
        Axis::X => (rect.left, rect.right()),
        Axis::Y => (rect.top, rect.bottom()),
    }
}

/// Resolve at most one static guide per target guide.
///
/// Only the first candidate after the stable gap sort is used; equally near
/// alternatives are ignored.
pub fn match_guides(targets: &[Guide], statics: &[Guide], tolerance: f64) -> Vec<GuideMatch> {
    targets
        .iter()
        .filter_map(|target| match_one(target, statics, tolerance))
        .collect()
}

fn match_one(target: &Guide, statics: &[Guide], tolerance: f64) -> Option<GuideMatch> {
    let perpendicular = target.axis().other();
    let (orig_1, orig_2) = extent(&target.owner_rect.rect, perpendicular);
    let (orig_1_raw, orig_2_raw) = extent(&target.owner_rect.raw, perpendicular);

    let mut candidates: Vec<(f64, &Guide)> = statics
        .iter()
        .filter(|stat| target.kind.can_match(stat.kind))
        .map(|stat| {
            let (stat_1, stat_2) = extent(&stat.owner_rect.rect, perpendicular);
            let gap = if stat_2 < orig_1 {
                orig_1 - stat_2
            } else {
                stat_1 - orig_2
            };
            (gap, stat)
        })
        .filter(|(gap, _)| *gap > 0.0)
        .collect();
    candidates.sort_by(|a, b| a.0.total_cmp(&b.0));

    let matched = candidates
        .into_iter()
        .map(|(_, stat)| stat)
        .find(|stat| (stat.position - target.position).abs() < tolerance)?;

    let (stat_1, stat_2) = extent(&matched.owner_rect.rect, perpendicular);
    let (stat_1_raw, stat_2_raw) = extent(&matched.owner_rect.raw, perpendicular);
    let static_first = stat_1 < orig_1;

    let (pos_second, size, size_raw, edge) = if static_first {
        (
            stat_2,
            orig_1 - stat_2,
            orig_1_raw - stat_2_raw,
            MatchEdge::StaticFirst,
        )
    } else {
        (
            orig_2,
            stat_1 - orig_2,
            stat_1_raw - orig_2_raw,
            MatchEdge::TargetFirst,
        )
    };

    Some(GuideMatch {
        guide: target.clone(),
        matched: matched.clone(),
        pos_first: target.position,
        pos_second,
        size,
        size_raw,
        edge,
    })
}

/// Trailing-edge debounce driven by caller-supplied instants
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    last_signal: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_signal: None,
        }
    }

    /// Record a signal; restarts the quiet period
    pub fn signal(&mut self, now: Instant) {
        self.last_signal = Some(now);
    }

    /// True once, when the quiet period after the last signal has elapsed
    pub fn check_timeout(&mut self, now: Instant) -> bool {
        match self.last_signal {
            Some(at) if now.saturating_duration_since(at) >= self.delay => {
                self.last_signal = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.last_signal.is_some()
    }

    pub fn reset(&mut self) {
        self.last_signal = None;
    }
}
