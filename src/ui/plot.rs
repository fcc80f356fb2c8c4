use std::collections::BTreeMap;

use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoint, PlotPoints, Points};

use crate::color::{ColorMap, Theme, theme};
use crate::dashboards::{ChartKind, ChartSpec, Dashboard, DashboardView};
use crate::data::model::{Record, Table, Value, date_from_epoch_days};
use crate::state::AppState;

const CHART_HEIGHT: f32 = 320.0;
const POINT_RADIUS: f32 = 3.0;
const MAX_SIZED_RADIUS: f32 = 14.0;

// ---------------------------------------------------------------------------
// Central panel: metrics, charts, raw data
// ---------------------------------------------------------------------------

/// Render the active dashboard in the central panel.
pub fn dashboard(ui: &mut Ui, state: &AppState) {
    let (view, color_map) = match state.active {
        Dashboard::Asteroids => (&state.asteroids.view, &state.asteroids.color_map),
        Dashboard::Neo => (&state.neo.view, &state.neo.color_map),
        Dashboard::Margin => (&state.margin.view, &state.margin.color_map),
    };
    let theme = theme(state.active);
    ui.visuals_mut().override_text_color = Some(theme.text);

    let Some(view) = view else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading(format!(
                "No data for {}  (File → Open…)",
                state.source(state.active).display()
            ));
        });
        return;
    };

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading(RichText::new(state.active.title()).color(theme.accent));
            ui.add_space(4.0);
            metrics_row(ui, view);
            ui.separator();

            if view.table.is_empty() {
                ui.label("No records match the current selection.");
            }

            for pair in view.charts.chunks(2) {
                ui.columns(2, |cols: &mut [Ui]| {
                    for (col, spec) in cols.iter_mut().zip(pair) {
                        chart_frame(col, spec, &view.table, color_map.as_ref(), theme);
                    }
                });
                ui.add_space(8.0);
            }

            if let Some(detail) = &view.detail {
                egui::CollapsingHeader::new(RichText::new("Raw Data").strong())
                    .default_open(false)
                    .show(ui, |ui: &mut Ui| raw_table(ui, detail));
            }
        });
}

fn metrics_row(ui: &mut Ui, view: &DashboardView) {
    let tiles = view.metric_tiles();
    if tiles.is_empty() {
        return;
    }
    ui.columns(tiles.len(), |cols: &mut [Ui]| {
        for (col, (label, value)) in cols.iter_mut().zip(&tiles) {
            col.vertical(|ui: &mut Ui| {
                ui.label(RichText::new(*label).small());
                ui.heading(value);
            });
        }
    });
}

fn chart_frame(
    ui: &mut Ui,
    spec: &ChartSpec,
    table: &Table,
    colors: Option<&ColorMap>,
    theme: &Theme,
) {
    egui::Frame::group(ui.style())
        .fill(theme.panel)
        .stroke(egui::Stroke::new(1.0, theme.grid))
        .show(ui, |ui: &mut Ui| {
            ui.strong(&spec.title);
            chart(ui, spec, table, colors);
        });
}

// ---------------------------------------------------------------------------
// Charts
// ---------------------------------------------------------------------------

/// One colour group of a chart: legend name, colour and its rows.
struct Series<'a> {
    name: String,
    color: Color32,
    rows: Vec<&'a Record>,
}

fn split_by_color<'a>(
    spec: &ChartSpec,
    table: &'a Table,
    colors: Option<&ColorMap>,
) -> Vec<Series<'a>> {
    let mut groups: BTreeMap<Value, Vec<&'a Record>> = BTreeMap::new();
    for record in table.records() {
        groups
            .entry(record.get(&spec.color_by).clone())
            .or_default()
            .push(record);
    }
    groups
        .into_iter()
        .map(|(value, rows)| Series {
            name: value.to_string(),
            color: colors.map_or(Color32::LIGHT_BLUE, |c| c.color_for(&value)),
            rows,
        })
        .collect()
}

fn chart(ui: &mut Ui, spec: &ChartSpec, table: &Table, colors: Option<&ColorMap>) {
    let series = split_by_color(spec, table, colors);
    let date_axis = table
        .records()
        .iter()
        .any(|r| matches!(r.get(&spec.x), Value::Date(_)));

    let mut plot = Plot::new(&spec.title)
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label(spec.x_label.clone())
        .y_axis_label(spec.y_label.clone())
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true);
    if date_axis {
        plot = plot.x_axis_formatter(|mark, _range| format_date_mark(mark.value));
    }

    match spec.kind {
        ChartKind::Scatter | ChartKind::ScatterLines => {
            let size_scale = spec
                .size_by
                .as_deref()
                .and_then(|field| max_abs(table, field).map(|max| (field, max)));
            if let Some(field) = spec.hover_by.as_deref() {
                let labels = hover_labels(spec, table, field);
                plot = plot.label_formatter(move |series: &str, point: &PlotPoint| {
                    let coords = format!("x: {:.3}\ny: {:.3}", point.x, point.y);
                    match hover_label(&labels, [point.x, point.y]) {
                        Some(label) if !series.is_empty() => {
                            format!("{label}\n{series}\n{coords}")
                        }
                        _ => coords,
                    }
                });
            }
            plot.show(ui, |plot_ui| {
                for s in &series {
                    let points = xy_points(spec, &s.rows);
                    if spec.kind == ChartKind::ScatterLines {
                        plot_ui.line(
                            Line::new(PlotPoints::from(points.clone()))
                                .name(&s.name)
                                .color(s.color)
                                .width(1.5),
                        );
                    }
                    match size_scale {
                        Some((field, max)) => {
                            let plotted = s.rows.iter().filter(|r| xy(spec, r).is_some());
                            for (point, record) in points.iter().zip(plotted) {
                                let size = (record.number(field).unwrap_or(0.0).abs() / max) as f32;
                                let radius = POINT_RADIUS + size * (MAX_SIZED_RADIUS - POINT_RADIUS);
                                plot_ui.points(
                                    Points::new(vec![*point])
                                        .name(&s.name)
                                        .color(s.color)
                                        .radius(radius),
                                );
                            }
                        }
                        None => plot_ui.points(
                            Points::new(points)
                                .name(&s.name)
                                .color(s.color)
                                .radius(POINT_RADIUS),
                        ),
                    }
                }
            });
        }
        ChartKind::Histogram { bins } => {
            let all: Vec<f64> = series
                .iter()
                .flat_map(|s| s.rows.iter().filter_map(|r| r.number(&spec.x)))
                .collect();
            let Some((start, width)) = bin_layout(&all, bins) else {
                ui.label("No numeric values to plot.");
                return;
            };
            let mut stacked = vec![0.0; bins];
            let charts: Vec<BarChart> = series
                .iter()
                .map(|s| {
                    let values = s.rows.iter().filter_map(|r| r.number(&spec.x));
                    let counts = bin_counts(values, start, width, bins);
                    let bars = counts
                        .iter()
                        .enumerate()
                        .filter(|(_, n)| **n > 0.0)
                        .map(|(i, n)| {
                            Bar::new(start + (i as f64 + 0.5) * width, *n)
                                .width(width)
                                .base_offset(stacked[i])
                        })
                        .collect();
                    for (total, n) in stacked.iter_mut().zip(&counts) {
                        *total += n;
                    }
                    BarChart::new(bars).name(&s.name).color(s.color)
                })
                .collect();
            plot.show(ui, |plot_ui| {
                for c in charts {
                    plot_ui.bar_chart(c);
                }
            });
        }
        ChartKind::GroupedBar => {
            let xs: Vec<f64> = series
                .iter()
                .flat_map(|s| s.rows.iter().filter_map(|r| r.get(&spec.x).as_axis_f64()))
                .collect();
            let slot = min_spacing(&xs) * 0.8;
            let n = series.len().max(1) as f64;
            let bar_width = slot / n;
            let charts: Vec<BarChart> = series
                .iter()
                .enumerate()
                .map(|(gi, s)| {
                    let offset = -slot / 2.0 + (gi as f64 + 0.5) * bar_width;
                    let bars = xy_points(spec, &s.rows)
                        .into_iter()
                        .map(|[x, y]| Bar::new(x + offset, y).width(bar_width))
                        .collect();
                    BarChart::new(bars).name(&s.name).color(s.color)
                })
                .collect();
            plot.show(ui, |plot_ui| {
                for c in charts {
                    plot_ui.bar_chart(c);
                }
            });
        }
    }
}

fn xy(spec: &ChartSpec, record: &Record) -> Option<[f64; 2]> {
    let x = record.get(&spec.x).as_axis_f64()?;
    let y = record.get(spec.y.as_deref()?).as_axis_f64()?;
    Some([x, y])
}

/// Plot coordinates of the rows where both axes are defined.
fn xy_points(spec: &ChartSpec, rows: &[&Record]) -> Vec<[f64; 2]> {
    rows.iter().filter_map(|r| xy(spec, r)).collect()
}

/// `(position, label)` of every plotted row whose hover field is defined.
fn hover_labels(spec: &ChartSpec, table: &Table, field: &str) -> Vec<([f64; 2], String)> {
    table
        .records()
        .iter()
        .filter_map(|r| {
            let label = r.get(field);
            if label.is_null() {
                return None;
            }
            Some((xy(spec, r)?, label.to_string()))
        })
        .collect()
}

fn hover_label(labels: &[([f64; 2], String)], point: [f64; 2]) -> Option<&str> {
    labels
        .iter()
        .find(|(p, _)| *p == point)
        .map(|(_, label)| label.as_str())
}

fn max_abs(table: &Table, field: &str) -> Option<f64> {
    table
        .records()
        .iter()
        .filter_map(|r| r.number(field))
        .map(f64::abs)
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
        .filter(|m| *m > 0.0)
}

/// Start and width of `bins` equal bins covering `values`.
fn bin_layout(values: &[f64], bins: usize) -> Option<(f64, f64)> {
    if values.is_empty() || bins == 0 {
        return None;
    }
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if range.abs() < f64::EPSILON {
        return Some((min - 0.5, 1.0 / bins as f64));
    }
    Some((min, range / bins as f64))
}

fn bin_counts(values: impl Iterator<Item = f64>, start: f64, width: f64, bins: usize) -> Vec<f64> {
    let mut counts = vec![0.0; bins];
    for v in values {
        let i = ((v - start) / width).floor();
        if i >= 0.0 {
            // the maximum lands exactly on the upper edge
            counts[(i as usize).min(bins - 1)] += 1.0;
        }
    }
    counts
}

/// Smallest gap between distinct x positions, 1.0 when there is none.
fn min_spacing(xs: &[f64]) -> f64 {
    let mut sorted = xs.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted.dedup();
    sorted
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |a| a.min(d))))
        .unwrap_or(1.0)
}

fn format_date_mark(days: f64) -> String {
    date_from_epoch_days(days.round() as i64)
        .map(|d| d.format("%Y-%m").to_string())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Raw data grid
// ---------------------------------------------------------------------------

fn raw_table(ui: &mut Ui, table: &Table) {
    let columns = table.columns();
    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .max_scroll_height(300.0)
        .columns(Column::auto().at_least(60.0), columns.len())
        .header(20.0, |mut header| {
            for c in columns {
                header.col(|ui: &mut Ui| {
                    ui.strong(c.as_str());
                });
            }
        })
        .body(|body| {
            body.rows(18.0, table.len(), |mut row| {
                let record = &table.records()[row.index()];
                for c in columns {
                    row.col(|ui: &mut Ui| {
                        ui.label(record.get(c).to_string());
                    });
                }
            });
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bins_cover_the_maximum() {
        let values = [0.0, 1.0, 2.0, 10.0];
        let (start, width) = bin_layout(&values, 5).unwrap();
        assert_eq!(start, 0.0);
        assert_eq!(width, 2.0);
        let counts = bin_counts(values.iter().copied(), start, width, 5);
        assert_eq!(counts, vec![2.0, 1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn single_value_still_gets_a_bin() {
        let (start, width) = bin_layout(&[3.0, 3.0], 4).unwrap();
        let counts = bin_counts([3.0, 3.0].into_iter(), start, width, 4);
        assert_eq!(counts.iter().sum::<f64>(), 2.0);
        assert!(bin_layout(&[], 4).is_none());
    }

    #[test]
    fn spacing_ignores_duplicates() {
        assert_eq!(min_spacing(&[31.0, 0.0, 31.0, 59.0]), 28.0);
        assert_eq!(min_spacing(&[5.0]), 1.0);
    }

    #[test]
    fn hover_labels_follow_plotted_rows() {
        let spec = ChartSpec::scatter("Orbits", "axis", "ecc", "class").hover_by("name");
        let records = vec![
            [("name", Value::from("Eros")), ("axis", Value::Float(1.46)), ("ecc", Value::Float(0.22))]
                .into_iter()
                .collect(),
            [("name", Value::from("Icarus")), ("axis", Value::Float(1.08))]
                .into_iter()
                .collect(),
            [("axis", Value::Float(2.0)), ("ecc", Value::Float(0.5))]
                .into_iter()
                .collect(),
        ];
        let table = Table::new(vec!["name".into(), "axis".into(), "ecc".into()], records);
        let labels = hover_labels(&spec, &table, "name");
        assert_eq!(labels, vec![([1.46, 0.22], "Eros".to_string())]);
        assert_eq!(hover_label(&labels, [1.46, 0.22]), Some("Eros"));
        assert_eq!(hover_label(&labels, [2.0, 0.5]), None);
    }

    #[test]
    fn date_marks_show_month() {
        assert_eq!(format_date_mark(0.0), "1970-01");
    }
}
