use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::dashboards::neo::{self, TransformMode};
use crate::dashboards::{Dashboard, HazardFilter};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel for the active dashboard.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| match state.active {
            Dashboard::Asteroids => {
                ui.strong("Global Hazard Filter");
                if hazard_radio(ui, &mut state.asteroids.selection.hazard) {
                    state.refresh(Dashboard::Asteroids);
                }
                if let Some(cm) = &state.asteroids.color_map {
                    ui.add_space(8.0);
                    ui.strong(&cm.column);
                    for (label, color) in cm.legend_entries() {
                        ui.label(RichText::new(label).color(color));
                    }
                }
            }
            Dashboard::Neo => neo_filters(ui, state),
            Dashboard::Margin => margin_filters(ui, state),
        });
}

/// Radio buttons for a hazard filter. Returns whether the value changed.
fn hazard_radio(ui: &mut Ui, value: &mut HazardFilter) -> bool {
    let mut changed = false;
    for option in HazardFilter::ALL {
        changed |= ui.radio_value(value, option, option.label()).changed();
    }
    changed
}

fn neo_filters(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Hazard Status");
    let mut changed = hazard_radio(ui, &mut state.neo.selection.hazard);

    ui.add_space(8.0);
    ui.strong("Scale Options");
    let selection = &mut state.neo.selection;
    egui::ComboBox::from_id_salt("transform_scale")
        .selected_text(selection.transform.label())
        .show_ui(ui, |ui: &mut Ui| {
            for mode in TransformMode::ALL {
                changed |= ui
                    .selectable_value(&mut selection.transform, mode, mode.label())
                    .changed();
            }
        });

    if selection.transform == TransformMode::ScaleFactor {
        changed |= ui
            .add(
                egui::Slider::new(&mut selection.scale_factor, neo::SCALE_RANGE)
                    .step_by(1.0)
                    .text("Scale Factor"),
            )
            .changed();
    }

    if changed {
        state.refresh(Dashboard::Neo);
    }
}

fn margin_filters(ui: &mut Ui, state: &mut AppState) {
    ui.strong("TopGrp");
    if ui.small_button("All").clicked() {
        state.select_all_margin_groups();
    }

    // Clone so the state can be mutated inside the loop.
    let groups = state.margin_groups.clone();
    for group in &groups {
        let mut checked = state.margin.selection.groups.contains(group);
        let mut text = RichText::new(group.to_string());
        if let Some(cm) = &state.margin.color_map {
            text = text.color(cm.color_for(group));
        }
        if ui.checkbox(&mut checked, text).changed() {
            state.toggle_margin_group(group);
        }
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Reload").clicked() {
                let path = state.source(state.active).to_path_buf();
                state.set_source(state.active, path);
                ui.close_menu();
            }
        });

        ui.separator();

        for dashboard in Dashboard::ALL {
            ui.selectable_value(&mut state.active, dashboard, dashboard.title());
        }

        ui.separator();

        let view = match state.active {
            Dashboard::Asteroids => state.asteroids.view.as_ref(),
            Dashboard::Neo => state.neo.view.as_ref(),
            Dashboard::Margin => state.margin.view.as_ref(),
        };
        if let Some(view) = view {
            ui.label(format!("{} records shown", view.table.len()));
        }

        if let Some(msg) = state.active_error() {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

/// Pick a new source for the active dashboard.
pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title(format!("Open data for {}", state.active.title()))
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        log::info!("Opening {} for {}", path.display(), state.active.title());
        state.set_source(state.active, path);
    }
}
