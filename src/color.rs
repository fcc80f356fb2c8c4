use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::dashboards::Dashboard;
use crate::data::model::Value;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: cell value → Color32
// ---------------------------------------------------------------------------

/// Maps the distinct values of a chosen column to colours.
///
/// Built from the whole source table, so a group keeps its colour while
/// the selection changes.
#[derive(Debug, Clone)]
pub struct ColorMap {
    pub column: String,
    mapping: BTreeMap<Value, Color32>,
    default_color: Color32,
}

impl ColorMap {
    /// Assign palette colours to `values` in iteration order.
    pub fn new<'a>(column: &str, values: impl IntoIterator<Item = &'a Value>) -> Self {
        let values: Vec<&Value> = values.into_iter().filter(|v| !v.is_null()).collect();
        let palette = generate_palette(values.len());
        let mapping = values
            .into_iter()
            .zip(palette)
            .map(|(v, c)| (v.clone(), c))
            .collect();

        ColorMap {
            column: column.to_string(),
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// A map with explicit colours, e.g. the hazard palette.
    pub fn fixed(column: &str, pairs: impl IntoIterator<Item = (Value, Color32)>) -> Self {
        ColorMap {
            column: column.to_string(),
            mapping: pairs.into_iter().collect(),
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a given value.
    pub fn color_for(&self, value: &Value) -> Color32 {
        self.mapping
            .get(value)
            .copied()
            .unwrap_or(self.default_color)
    }

    /// Return the legend entries (value label → colour) for the UI.
    pub fn legend_entries(&self) -> Vec<(String, Color32)> {
        self.mapping
            .iter()
            .map(|(v, c)| (v.to_string(), *c))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Static presentation config
// ---------------------------------------------------------------------------

/// Per-dashboard colours consumed by the renderer only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Theme {
    pub background: Color32,
    pub panel: Color32,
    pub text: Color32,
    pub grid: Color32,
    pub accent: Color32,
}

const SOFT_GRID: Color32 = Color32::from_rgba_premultiplied(26, 26, 26, 51);

pub const ASTEROID_THEME: Theme = Theme {
    background: Color32::from_rgb(0x0e, 0x11, 0x17),
    panel: Color32::from_rgb(0x0e, 0x11, 0x17),
    text: Color32::WHITE,
    grid: SOFT_GRID,
    accent: Color32::from_rgb(0x33, 0x66, 0x99),
};

pub const NEO_THEME: Theme = Theme {
    background: Color32::from_rgb(0x1e, 0x23, 0x30),
    panel: Color32::from_rgb(0x0e, 0x11, 0x17),
    text: Color32::from_rgb(0xfa, 0xfa, 0xfa),
    grid: SOFT_GRID,
    accent: Color32::from_rgb(0x33, 0x99, 0x66),
};

pub const MARGIN_THEME: Theme = Theme {
    background: Color32::from_rgb(0x40, 0x40, 0x40),
    panel: Color32::from_rgb(0x40, 0x40, 0x40),
    text: Color32::WHITE,
    grid: Color32::from_rgb(0x60, 0x60, 0x60),
    accent: Color32::WHITE,
};

/// Fixed colours for the NEO `hazardous` flag.
pub const HAZARDOUS_COLOR: Color32 = Color32::from_rgb(0xff, 0x6b, 0x6b);
pub const NON_HAZARDOUS_COLOR: Color32 = Color32::from_rgb(0x33, 0x99, 0x66);

pub fn theme(dashboard: Dashboard) -> &'static Theme {
    match dashboard {
        Dashboard::Asteroids => &ASTEROID_THEME,
        Dashboard::Neo => &NEO_THEME,
        Dashboard::Margin => &MARGIN_THEME,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size() {
        assert!(generate_palette(0).is_empty());
        let p = generate_palette(5);
        assert_eq!(p.len(), 5);
        assert_ne!(p[0], p[1]);
    }

    #[test]
    fn colours_follow_value_not_position() {
        let groups = [Value::from("Parts"), Value::from("Labor"), Value::Null];
        let map = ColorMap::new("TopGrp", &groups);
        assert_eq!(map.legend_entries().len(), 2);
        assert_ne!(map.color_for(&groups[0]), map.color_for(&groups[1]));
        assert_eq!(map.color_for(&Value::from("Freight")), Color32::GRAY);
    }

    #[test]
    fn fixed_map_uses_given_colours() {
        let map = ColorMap::fixed(
            "hazardous",
            [
                (Value::Bool(true), HAZARDOUS_COLOR),
                (Value::Bool(false), NON_HAZARDOUS_COLOR),
            ],
        );
        assert_eq!(map.color_for(&Value::Bool(true)), HAZARDOUS_COLOR);
    }
}
