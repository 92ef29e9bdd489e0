use crate::geometry::{Point, Rect};
use crate::guides::GuideMatch;
use crate::resize::{ModelDimension, ResizeHandle};
use crate::style::{DragMode, StyleProps};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// A host notification with timestamp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorEvent {
    pub timestamp: DateTime<Utc>,
    pub event: EventKind,
}

impl EditorEvent {
    /// Create a new event with the current timestamp
    pub fn new(event: EventKind) -> Self {
        Self {
            timestamp: Utc::now(),
            event,
        }
    }

    /// Create a new event with a specific timestamp
    pub fn with_timestamp(timestamp: DateTime<Utc>, event: EventKind) -> Self {
        Self { timestamp, event }
    }
}

/// Notifications emitted during drag and resize gestures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventKind {
    DragStart {
        component: Ulid,
        mode: DragMode,
    },

    /// Emitted on every pointer move with the guides currently matched
    DragMove {
        component: Ulid,
        position: Point,
        matches: Vec<GuideMatch>,
    },

    /// One per matched guide on a move, when guide info is enabled
    DragActive {
        component: Ulid,
        matched: GuideMatch,
    },

    DragEnd {
        component: Ulid,
        moved: bool,
        cancelled: bool,
    },

    ResizeStart {
        component: Ulid,
        handle: ResizeHandle,
        rect: Rect,
        model_width: ModelDimension,
        model_height: ModelDimension,
    },

    ResizeMove {
        component: Ulid,
        rect: Rect,
        delta: Point,
        pointer: Point,
    },

    /// Proposed style right before it is committed
    ResizeUpdate {
        component: Ulid,
        rect: Rect,
        style: StyleProps,
        partial: bool,
    },

    ResizeEnd {
        component: Ulid,
        rect: Rect,
        moved: bool,
        cancelled: bool,
    },
}

impl EventKind {
    pub fn component(&self) -> Ulid {
        match self {
            EventKind::DragStart { component, .. }
            | EventKind::DragMove { component, .. }
            | EventKind::DragActive { component, .. }
            | EventKind::DragEnd { component, .. }
            | EventKind::ResizeStart { component, .. }
            | EventKind::ResizeMove { component, .. }
            | EventKind::ResizeUpdate { component, .. }
            | EventKind::ResizeEnd { component, .. } => *component,
        }
    }

    /// Stable event name, as hosts subscribe to them
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::DragStart { .. } => "drag:start",
            EventKind::DragMove { .. } => "drag:move",
            EventKind::DragActive { .. } => "drag:active",
            EventKind::DragEnd { .. } => "drag:end",
            EventKind::ResizeStart { .. } => "resize:start",
            EventKind::ResizeMove { .. } => "resize:move",
            EventKind::ResizeUpdate { .. } => "resize:update",
            EventKind::ResizeEnd { .. } => "resize:end",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, EventKind::DragEnd { .. } | EventKind::ResizeEnd { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_creation() {
        let event = EditorEvent::new(EventKind::DragStart {
            component: Ulid::new(),
            mode: DragMode::Absolute,
        });

        assert!(event.timestamp <= Utc::now());
        assert_eq!(event.event.name(), "drag:start");
        assert!(!event.event.is_terminal());
    }

    #[test]
    fn test_component_accessor() {
        let id = Ulid::new();
        let event = EventKind::ResizeEnd {
            component: id,
            rect: Rect::new(0.0, 0.0, 10.0, 10.0),
            moved: false,
            cancelled: false,
        };
        assert_eq!(event.component(), id);
        assert!(event.is_terminal());
    }

    #[test]
    fn test_event_serialization() {
        let event = EditorEvent::new(EventKind::DragEnd {
            component: Ulid::new(),
            moved: true,
            cancelled: false,
        });

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: EditorEvent = serde_json::from_str(&json).unwrap();

        match (&event.event, &deserialized.event) {
            (
                EventKind::DragEnd {
                    component: c1,
                    moved: m1,
                    ..
                },
                EventKind::DragEnd {
                    component: c2,
                    moved: m2,
                    ..
                },
            ) => {
                assert_eq!(c1, c2);
                assert_eq!(m1, m2);
            }
            _ => panic!("Event type mismatch"),
        }
    }
}
