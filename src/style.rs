use crate::geometry::Axis;
use crate::host::{AddStyleOptions, StyleTarget};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use ulid::Ulid;

/// CSS property map of a styleable model
pub type StyleProps = BTreeMap<String, String>;

static NUMBER_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)(.*)$").expect("valid number regex")
});

/// Leading numeric value of a CSS value (`"12.5px"` -> 12.5, `"auto"` -> None)
pub fn parse_css_number(value: &str) -> Option<f64> {
    let caps = NUMBER_PREFIX.captures(value)?;
    caps.get(1)?.as_str().parse().ok()
}

/// Unit suffix of a CSS value (`"50%"` -> `"%"`, `"auto"` -> `""`)
pub fn unit_of(value: &str) -> String {
    NUMBER_PREFIX
        .captures(value)
        .and_then(|caps| caps.get(2))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

/// Shortest decimal form of a number (`50.0` -> `"50"`)
pub fn format_number(value: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        return "0".to_string();
    }
    format!("{value}")
}

/// Integer pixel value, fractional part truncated
pub fn format_px_trunc(value: f64) -> String {
    let value = if value.is_finite() { value.trunc() } else { 0.0 };
    format!("{}px", format_number(value))
}

fn translate_fn(axis: Axis) -> &'static str {
    match axis {
        Axis::X => "translateX(",
        Axis::Y => "translateY(",
    }
}

/// Numeric part of `translateX(..)`/`translateY(..)` inside a transform list
pub fn get_translate(transform: &str, axis: Axis) -> f64 {
    let name = translate_fn(axis);
    transform
        .split(' ')
        .map(str::trim)
        .filter_map(|item| item.strip_prefix(name))
        .filter_map(parse_css_number)
        .last()
        .unwrap_or(0.0)
}

/// Replace the translate function for `axis`, or append it, keeping the rest
pub fn set_translate(transform: &str, axis: Axis, value: &str) -> String {
    let name = translate_fn(axis);
    let replacement = format!("{name}{value})");
    let mut found = false;
    let mut items: Vec<String> = transform
        .split(' ')
        .filter(|item| !item.trim().is_empty())
        .map(|item| {
            if item.trim().starts_with(name) {
                found = true;
                replacement.clone()
            } else {
                item.to_string()
            }
        })
        .collect();
    if !found {
        items.push(replacement);
    }
    items.join(" ")
}

/// How a dragged component is positioned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DragMode {
    /// `position: absolute` with `left`/`top`
    #[default]
    Absolute,
    /// `transform: translateX() translateY()`, layout untouched
    Translate,
}

/// Position requested by a drag frame
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PositionUpdate {
    pub x: f64,
    pub y: f64,
    pub position: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
}

impl PositionUpdate {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Default::default()
        }
    }
}

/// Style properties to write for a drag position in the given mode
pub fn compute_style_write(mode: DragMode, current: &StyleProps, update: &PositionUpdate) -> StyleProps {
    let left = format_px_trunc(update.x);
    let top = format_px_trunc(update.y);
    let mut style = StyleProps::new();

    match mode {
        DragMode::Translate => {
            let transform = current.get("transform").map(String::as_str).unwrap_or("");
            let transform = set_translate(transform, Axis::X, &left);
            let transform = set_translate(&transform, Axis::Y, &top);
            style.insert("transform".to_string(), transform);
        }
        DragMode::Absolute => {
            style.insert("left".to_string(), left);
            style.insert("top".to_string(), top);
            let extra = [
                ("position", &update.position),
                ("width", &update.width),
                ("height", &update.height),
            ];
            for (key, value) in extra {
                if let Some(value) = value.as_ref().filter(|v| !v.is_empty()) {
                    style.insert(key.to_string(), value.clone());
                }
            }
        }
    }

    style
}

/// Current drag origin stored on the model for the given mode
pub fn read_position(mode: DragMode, style: &StyleProps) -> (f64, f64) {
    let get = |key: &str| style.get(key).map(String::as_str).unwrap_or("");
    match mode {
        DragMode::Translate => {
            let transform = get("transform");
            (get_translate(transform, Axis::X), get_translate(transform, Axis::Y))
        }
        DragMode::Absolute => (
            parse_css_number(get("left")).unwrap_or(0.0),
            parse_css_number(get("top")).unwrap_or(0.0),
        ),
    }
}

/// A style write as handed to the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleWrite {
    pub component: Ulid,
    pub props: StyleProps,
    /// Live-preview write, kept out of the history log
    pub partial: bool,
}

/// The only path through which the engine mutates styles
#[derive(Debug, Default)]
pub struct StyleSync {
    partial_writes: usize,
    durable_writes: usize,
}

impl StyleSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commit<H: StyleTarget + ?Sized>(
        &mut self,
        host: &mut H,
        component: Ulid,
        props: StyleProps,
        partial: bool,
    ) -> StyleWrite {
        host.add_style(
            component,
            &props,
            AddStyleOptions {
                avoid_store: partial,
            },
        );
        if partial {
            self.partial_writes += 1;
        } else {
            self.durable_writes += 1;
        }
        StyleWrite {
            component,
            props,
            partial,
        }
    }

    pub fn partial_writes(&self) -> usize {
        self.partial_writes
    }

    pub fn durable_writes(&self) -> usize {
        self.durable_writes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn props(pairs: &[(&str, &str)]) -> StyleProps {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_css_number() {
        assert_eq!(parse_css_number("12.5px"), Some(12.5));
        assert_eq!(parse_css_number("-3em"), Some(-3.0));
        assert_eq!(parse_css_number(".5"), Some(0.5));
        assert_eq!(parse_css_number("auto"), None);
        assert_eq!(parse_css_number(""), None);
    }

    #[test]
    fn test_unit_of() {
        assert_eq!(unit_of("50%"), "%");
        assert_eq!(unit_of("10.5vw"), "vw");
        assert_eq!(unit_of("100"), "");
        assert_eq!(unit_of("auto"), "");
    }

    #[test]
    fn test_format_helpers() {
        assert_eq!(format_number(50.0), "50");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(12.25), "12.25");
        assert_eq!(format_px_trunc(299.9), "299px");
        assert_eq!(format_px_trunc(-4.7), "-4px");
    }

    #[test]
    fn test_translate_roundtrip() {
        let transform = "rotate(10deg) translateX(12px)";
        assert_eq!(get_translate(transform, Axis::X), 12.0);
        assert_eq!(get_translate(transform, Axis::Y), 0.0);

        let updated = set_translate(transform, Axis::X, "30px");
        assert_eq!(updated, "rotate(10deg) translateX(30px)");

        let updated = set_translate(&updated, Axis::Y, "-5px");
        assert_eq!(updated, "rotate(10deg) translateX(30px) translateY(-5px)");
        assert_eq!(get_translate(&updated, Axis::Y), -5.0);
    }

    #[test]
    fn test_compute_style_write_absolute() {
        let update = PositionUpdate {
            x: 100.8,
            y: 20.0,
            position: Some("absolute".to_string()),
            width: Some("50px".to_string()),
            height: None,
        };
        let style = compute_style_write(DragMode::Absolute, &StyleProps::new(), &update);
        assert_eq!(
            style,
            props(&[
                ("left", "100px"),
                ("top", "20px"),
                ("position", "absolute"),
                ("width", "50px"),
            ])
        );
    }

    #[test]
    fn test_compute_style_write_translate() {
        let current = props(&[("transform", "scale(2)"), ("left", "10px")]);
        let update = PositionUpdate {
            position: Some("absolute".to_string()),
            ..PositionUpdate::at(7.0, 9.0)
        };
        let style = compute_style_write(DragMode::Translate, &current, &update);
        assert_eq!(
            style,
            props(&[("transform", "scale(2) translateX(7px) translateY(9px)")])
        );
    }

    #[test]
    fn test_read_position() {
        let style = props(&[("left", "15px"), ("top", "auto"), ("transform", "translateY(4px)")]);
        assert_eq!(read_position(DragMode::Absolute, &style), (15.0, 0.0));
        assert_eq!(read_position(DragMode::Translate, &style), (0.0, 4.0));
    }

    #[test]
    fn test_drag_mode_serde() {
        let mode: DragMode = serde_json::from_str("\"translate\"").unwrap();
        assert_eq!(mode, DragMode::Translate);
    }
}
