// Canvas Manipulator - drag/resize geometry engine

pub mod component;
pub mod config;
pub mod controller;
pub mod document;
pub mod drag;
pub mod dragger;
pub mod error;
pub mod event;
pub mod geometry;
pub mod guides;
pub mod host;
pub mod resize;
pub mod style;
pub mod units;

// Re-export main types for convenience
pub use component::{Component, ComputedStyle, RenderedElement};
pub use config::{DragConfig, GuideConfig, ManipulatorConfig, ResizeConfig, UnitConfig};
pub use controller::{ActiveSession, GestureOutcome, Manipulator, PointerInput, SessionId};
pub use document::{Document, HistoryEntry, StyleWriteRecord};
pub use drag::{DragOptions, DragSession, GuideInfo, GuideLine, GuideOverlay};
pub use dragger::{Dragger, GuideLock};
pub use error::{ManipulatorError, ManipulatorResult};
pub use event::{EditorEvent, EventKind};
pub use geometry::{Axis, MeasuredRect, Point, Rect, Viewport};
pub use guides::{Guide, GuideKind, GuideMatch, MatchEdge};
pub use host::{AddStyleOptions, DocumentTree, EventSink, Geometry, Host, StyleTarget};
pub use resize::{ModelDimension, ResizeHandle, ResizeOptions, ResizeSession};
pub use style::{DragMode, PositionUpdate, StyleProps, StyleSync, StyleWrite};
pub use units::{to_px, to_unit, ConvertOptions, CssUnit, UnitContext};
