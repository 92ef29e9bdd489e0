use crate::geometry::{Axis, Point};
use crate::guides::{Guide, GuideKind};

/// Active snap on one axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuideLock {
    /// Target guide holding the lock
    pub target: GuideKind,
    /// Index into the static guide list
    pub static_index: usize,
    /// Delta on this axis that aligns both guides, canvas units
    pub value: f64,
}

#[derive(Debug, Clone)]
pub struct Dragger {
    snap_offset: f64,
    start_pointer: Point,
    delta: Point,
    locked_axis: Option<Axis>,
    lock_x: Option<GuideLock>,
    lock_y: Option<GuideLock>,
    moved: bool,
}

fn is_point_in(src: f64, trg: f64, offset: f64) -> bool {
    (src - trg).abs() <= offset
}

impl Dragger {
    pub fn new(snap_offset: f64) -> Self {
        Self {
            snap_offset,
            start_pointer: Point::ZERO,
            delta: Point::ZERO,
            locked_axis: None,
            lock_x: None,
            lock_y: None,
            moved: false,
        }
    }

    pub fn start(&mut self, pointer: Point) {
        self.start_pointer = pointer;
        self.delta = Point::ZERO;
        self.locked_axis = None;
        self.lock_x = None;
        self.lock_y = None;
        self.moved = false;
    }

    /// Raw delta of `pointer` from the start, in canvas units.
    ///
    /// With `shift` held the first frame picks the dominant axis and motion
    /// on the other one is dropped until shift is released.
    pub fn delta_for(&mut self, pointer: Point, shift: bool, scale: f64) -> Point {
        let scale = if scale > 0.0 { scale } else { 1.0 };
        let mut delta = pointer - self.start_pointer;

        if shift {
            if self.locked_axis.is_none() {
                self.locked_axis = Some(if delta.x.abs() >= delta.y.abs() {
                    Axis::X
                } else {
                    Axis::Y
                });
            }
        } else {
            self.locked_axis = None;
        }
        match self.locked_axis {
            Some(Axis::X) => delta.y = 0.0,
            Some(Axis::Y) => delta.x = 0.0,
            None => {}
        }

        Point::new(delta.x / scale, delta.y / scale)
    }

    /// Snap `delta` against static guides.
    ///
    /// `targets` must already sit on the rect translated by `delta`; their
    /// `active` flags are rewritten to mark the guide holding each lock.
    pub fn snap(&mut self, delta: Point, targets: &mut [Guide], statics: &[Guide], scale: f64) -> Point {
        let scale = if scale > 0.0 { scale } else { 1.0 };
        targets.iter_mut().for_each(|guide| guide.active = false);

        let x = self.snap_axis(Axis::X, delta.x, targets, statics, scale);
        let y = self.snap_axis(Axis::Y, delta.y, targets, statics, scale);
        let snapped = Point::new(x, y);

        if snapped != Point::ZERO {
            self.moved = true;
        }
        self.delta = snapped;
        snapped
    }

    fn snap_axis(&mut self, axis: Axis, raw: f64, targets: &mut [Guide], statics: &[Guide], scale: f64) -> f64 {
        let offset = self.snap_offset;
        let lock = match axis {
            Axis::X => &mut self.lock_x,
            Axis::Y => &mut self.lock_y,
        };

        if let Some(current) = *lock {
            if is_point_in(raw, current.value, offset) {
                mark_active(targets, current.target);
                return current.value;
            }
            tracing::trace!(?axis, value = current.value, "guide lock released");
            *lock = None;
        }

        // Nearest target/static pair on the axis; guide order breaks ties
        let found = targets
            .iter()
            .filter(|trg| trg.axis() == axis)
            .flat_map(move |trg| {
                statics
                    .iter()
                    .enumerate()
                    .filter(move |(_, stat)| stat.axis() == axis)
                    .map(move |(index, stat)| (trg, index, stat))
            })
            .filter(|(trg, _, stat)| is_point_in(trg.position, stat.position, offset * scale))
            .min_by(|a, b| {
                let da = (a.2.position - a.0.position).abs();
                let db = (b.2.position - b.0.position).abs();
                da.total_cmp(&db)
            })
            .map(|(trg, index, stat)| GuideLock {
                target: trg.kind,
                static_index: index,
                value: raw - (trg.position - stat.position) / scale,
            });

        match found {
            Some(new_lock) => {
                tracing::trace!(?axis, target = ?new_lock.target, value = new_lock.value, "guide lock acquired");
                *lock = Some(new_lock);
                mark_active(targets, new_lock.target);
                new_lock.value
            }
            None => raw,
        }
    }

    pub fn lock(&self, axis: Axis) -> Option<GuideLock> {
        match axis {
            Axis::X => self.lock_x,
            Axis::Y => self.lock_y,
        }
    }

    pub fn locked_axis(&self) -> Option<Axis> {
        self.locked_axis
    }

    pub fn delta(&self) -> Point {
        self.delta
    }

    /// True once any frame produced a non-zero delta
    pub fn moved(&self) -> bool {
        self.moved
    }

    pub fn stop(&mut self) {
        self.lock_x = None;
        self.lock_y = None;
        self.locked_axis = None;
    }
}

fn mark_active(targets: &mut [Guide], kind: GuideKind) {
    if let Some(guide) = targets.iter_mut().find(|g| g.kind == kind) {
        guide.active = true;
    }
}
