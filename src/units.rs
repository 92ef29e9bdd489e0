use crate::config::UnitConfig;
use crate::geometry::Viewport;
use crate::host::{DocumentTree, Geometry};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CssUnit {
    Px,
    Pt,
    Pc,
    In,
    Cm,
    Mm,
    Vw,
    Vh,
    Vmin,
    Vmax,
    Svw,
    Lvw,
    Dvw,
    Svh,
    Lvh,
    Dvh,
    Percent,
}

impl CssUnit {
    /// Recognised unit, `None` for anything the service does not convert
    pub fn parse(unit: &str) -> Option<Self> {
        let unit = match unit.trim() {
            "px" => CssUnit::Px,
            "pt" => CssUnit::Pt,
            "pc" => CssUnit::Pc,
            "in" => CssUnit::In,
            "cm" => CssUnit::Cm,
            "mm" => CssUnit::Mm,
            "vw" => CssUnit::Vw,
            "vh" => CssUnit::Vh,
            "vmin" => CssUnit::Vmin,
            "vmax" => CssUnit::Vmax,
            "svw" => CssUnit::Svw,
            "lvw" => CssUnit::Lvw,
            "dvw" => CssUnit::Dvw,
            "svh" => CssUnit::Svh,
            "lvh" => CssUnit::Lvh,
            "dvh" => CssUnit::Dvh,
            "%" => CssUnit::Percent,
            _ => return None,
        };
        Some(unit)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CssUnit::Px => "px",
            CssUnit::Pt => "pt",
            CssUnit::Pc => "pc",
            CssUnit::In => "in",
            CssUnit::Cm => "cm",
            CssUnit::Mm => "mm",
            CssUnit::Vw => "vw",
            CssUnit::Vh => "vh",
            CssUnit::Vmin => "vmin",
            CssUnit::Vmax => "vmax",
            CssUnit::Svw => "svw",
            CssUnit::Lvw => "lvw",
            CssUnit::Dvw => "dvw",
            CssUnit::Svh => "svh",
            CssUnit::Lvh => "lvh",
            CssUnit::Dvh => "dvh",
            CssUnit::Percent => "%",
        }
    }

    pub const ALL: [CssUnit; 17] = [
        CssUnit::Px,
        CssUnit::Pt,
        CssUnit::Pc,
        CssUnit::In,
        CssUnit::Cm,
        CssUnit::Mm,
        CssUnit::Vw,
        CssUnit::Vh,
        CssUnit::Vmin,
        CssUnit::Vmax,
        CssUnit::Svw,
        CssUnit::Lvw,
        CssUnit::Dvw,
        CssUnit::Svh,
        CssUnit::Lvh,
        CssUnit::Dvh,
        CssUnit::Percent,
    ];
}

/// Sizes the relative units resolve against
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitContext {
    pub viewport: Viewport,
    pub parent_width: f64,
    pub parent_height: f64,
}

impl UnitContext {
    pub fn new(viewport: Viewport, parent_width: f64, parent_height: f64) -> Self {
        Self {
            viewport,
            parent_width,
            parent_height,
        }
    }

    /// Resolve the context of a rendered element
    pub fn for_element<H: DocumentTree + Geometry + ?Sized>(host: &H, id: Ulid) -> Self {
        let computed = host.computed_style(id);
        let parent = if computed.position() == "absolute" {
            host.offset_parent(id)
        } else {
            host.parent(id)
        };
        let (parent_width, parent_height) = parent
            .map(|p| {
                let raw = host.measure(p).raw;
                (raw.width, raw.height)
            })
            .unwrap_or((0.0, 0.0));
        Self::new(host.viewport(), parent_width, parent_height)
    }

    // Zero sizes resolve as 1 so a collapsed reference never divides by zero.
    fn viewport_width(&self) -> f64 {
        non_zero(self.viewport.width)
    }

    fn viewport_height(&self) -> f64 {
        non_zero(self.viewport.height)
    }

    fn parent_size(&self, is_height: bool) -> f64 {
        non_zero(if is_height {
            self.parent_height
        } else {
            self.parent_width
        })
    }
}

fn non_zero(value: f64) -> f64 {
    if value == 0.0 || !value.is_finite() {
        1.0
    } else {
        value
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvertOptions {
    /// Resolve `%` against the parent height instead of its width
    pub is_height: bool,
    pub dpi: f64,
    pub round_decimals: usize,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            is_height: false,
            dpi: 96.0,
            round_decimals: 3,
        }
    }
}

impl ConvertOptions {
    pub fn from_config(config: &UnitConfig, is_height: bool) -> Self {
        Self {
            is_height,
            dpi: config.dpi,
            round_decimals: config.round_decimals,
        }
    }

    pub fn height(mut self) -> Self {
        self.is_height = true;
        self
    }
}

/// Convert a pixel length into `unit`
pub fn convert_px(value_px: f64, unit: CssUnit, ctx: &UnitContext, opts: &ConvertOptions) -> f64 {
    let dpi = opts.dpi;
    match unit {
        CssUnit::Px => value_px,
        CssUnit::Pt => value_px * (72.0 / dpi),
        CssUnit::Pc => value_px * (6.0 / dpi),
        CssUnit::In => value_px / dpi,
        CssUnit::Cm => value_px / (dpi / 2.54),
        CssUnit::Mm => value_px / (dpi / 25.4),
        CssUnit::Vw | CssUnit::Svw | CssUnit::Lvw | CssUnit::Dvw => {
            value_px / ctx.viewport_width() * 100.0
        }
        CssUnit::Vh | CssUnit::Svh | CssUnit::Lvh | CssUnit::Dvh => {
            value_px / ctx.viewport_height() * 100.0
        }
        CssUnit::Vmin => {
            value_px / ctx.viewport_width().min(ctx.viewport_height()) * 100.0
        }
        CssUnit::Vmax => {
            value_px / ctx.viewport_width().max(ctx.viewport_height()) * 100.0
        }
        CssUnit::Percent => value_px / ctx.parent_size(opts.is_height) * 100.0,
    }
}

/// Inverse of [`convert_px`]
pub fn to_px(value: f64, unit: CssUnit, ctx: &UnitContext, opts: &ConvertOptions) -> f64 {
    let dpi = opts.dpi;
    match unit {
        CssUnit::Px => value,
        CssUnit::Pt => value * dpi / 72.0,
        CssUnit::Pc => value * dpi / 6.0,
        CssUnit::In => value * dpi,
        CssUnit::Cm => value * (dpi / 2.54),
        CssUnit::Mm => value * (dpi / 25.4),
        CssUnit::Vw | CssUnit::Svw | CssUnit::Lvw | CssUnit::Dvw => {
            value * ctx.viewport_width() / 100.0
        }
        CssUnit::Vh | CssUnit::Svh | CssUnit::Lvh | CssUnit::Dvh => {
            value * ctx.viewport_height() / 100.0
        }
        CssUnit::Vmin => value * ctx.viewport_width().min(ctx.viewport_height()) / 100.0,
        CssUnit::Vmax => value * ctx.viewport_width().max(ctx.viewport_height()) / 100.0,
        CssUnit::Percent => value * ctx.parent_size(opts.is_height) / 100.0,
    }
}

/// Round to `decimals` places and drop trailing zeros (`36.000` -> `"36"`)
pub fn format_rounded(value: f64, decimals: usize) -> String {
    let fixed = format!("{value:.decimals$}");
    let parsed: f64 = fixed.parse().unwrap_or(0.0);
    if parsed == 0.0 || !parsed.is_finite() {
        return "0".to_string();
    }
    format!("{parsed}")
}

/// Pixel value as a CSS length in `unit`; unknown units fall back to `px`
pub fn to_unit(value_px: f64, unit: &str, ctx: &UnitContext, opts: &ConvertOptions) -> String {
    let unit = CssUnit::parse(unit).unwrap_or(CssUnit::Px);
    let value = convert_px(value_px, unit, ctx, opts);
    format!("{}{}", format_rounded(value, opts.round_decimals), unit.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ctx() -> UnitContext {
        UnitContext::new(Viewport::new(1000.0, 500.0), 400.0, 200.0)
    }

    fn opts() -> ConvertOptions {
        ConvertOptions::default()
    }

    #[test]
    fn test_absolute_units() {
        assert_eq!(to_unit(96.0, "in", &ctx(), &opts()), "1in");
        assert_eq!(to_unit(48.0, "pt", &ctx(), &opts()), "36pt");
        assert_eq!(to_unit(96.0, "pc", &ctx(), &opts()), "6pc");
        assert_eq!(to_unit(96.0, "cm", &ctx(), &opts()), "2.54cm");
        assert_eq!(to_unit(96.0, "mm", &ctx(), &opts()), "25.4mm");
    }

    #[test]
    fn test_custom_dpi() {
        let opts = ConvertOptions {
            dpi: 72.0,
            ..opts()
        };
        assert_eq!(to_unit(72.0, "pt", &ctx(), &opts), "72pt");
        assert_eq!(to_unit(144.0, "in", &ctx(), &opts), "2in");
    }

    #[test]
    fn test_viewport_units() {
        assert_eq!(to_unit(100.0, "vw", &ctx(), &opts()), "10vw");
        assert_eq!(to_unit(100.0, "dvw", &ctx(), &opts()), "10dvw");
        assert_eq!(to_unit(100.0, "vh", &ctx(), &opts()), "20vh");
        assert_eq!(to_unit(100.0, "svh", &ctx(), &opts()), "20svh");
        assert_eq!(to_unit(100.0, "vmin", &ctx(), &opts()), "20vmin");
        assert_eq!(to_unit(100.0, "vmax", &ctx(), &opts()), "10vmax");
    }

    #[test]
    fn test_percent_uses_axis() {
        assert_eq!(to_unit(100.0, "%", &ctx(), &opts()), "25%");
        assert_eq!(to_unit(100.0, "%", &ctx(), &opts().height()), "50%");
    }

    #[test]
    fn test_zero_reference_sizes_do_not_divide_by_zero() {
        let ctx = UnitContext::new(Viewport::new(0.0, 0.0), 0.0, 0.0);
        assert_eq!(to_unit(5.0, "%", &ctx, &opts()), "500%");
        assert_eq!(to_unit(5.0, "vw", &ctx, &opts()), "500vw");
    }

    #[test]
    fn test_unknown_units_fall_back_to_px() {
        assert_eq!(to_unit(12.3456, "em", &ctx(), &opts()), "12.346px");
        assert_eq!(to_unit(12.0, "", &ctx(), &opts()), "12px");
        assert_eq!(to_unit(12.0, "px", &ctx(), &opts()), "12px");
    }

    #[test]
    fn test_rounding() {
        assert_eq!(format_rounded(1.0 / 3.0, 3), "0.333");
        assert_eq!(format_rounded(2.4, 0), "2");
        assert_eq!(format_rounded(-0.0001, 3), "0");
        assert_eq!(to_unit(10.0, "pt", &ctx(), &opts()), "7.5pt");
        let two_places = ConvertOptions {
            round_decimals: 1,
            ..opts()
        };
        assert_eq!(to_unit(10.0, "cm", &ctx(), &two_places), "0.3cm");
    }

    #[test]
    fn test_parse_roundtrip() {
        for unit in CssUnit::ALL {
            assert_eq!(CssUnit::parse(unit.as_str()), Some(unit));
        }
        assert_eq!(CssUnit::parse("rem"), None);
    }

    proptest! {
        #[test]
        fn prop_to_unit_inverts_within_rounding(px in 0.0f64..5000.0, idx in 0usize..17) {
            let unit = CssUnit::ALL[idx];
            let rendered = to_unit(px, unit.as_str(), &ctx(), &opts());
            let number: f64 = rendered.trim_end_matches(unit.as_str()).parse().unwrap();
            let back = to_px(number, unit, &ctx(), &opts());
            // one unit of the last decimal place, expressed in px
            let tolerance = to_px(0.0005, unit, &ctx(), &opts()).abs() + 1e-9;
            prop_assert!((back - px).abs() <= tolerance, "{} -> {} -> {}", px, rendered, back);
        }
    }
}
