use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::color::{ColorMap, HAZARDOUS_COLOR, NON_HAZARDOUS_COLOR};
use crate::config::Config;
use crate::dashboards::{asteroids, margin, neo, Dashboard, DashboardView};
use crate::data::cache::SourceCache;
use crate::data::error::PipelineError;
use crate::data::model::{Table, Value};

// ---------------------------------------------------------------------------
// Per-dashboard state
// ---------------------------------------------------------------------------

/// One dashboard's source, selection and latest pipeline output.
pub struct Panel<S> {
    pub source: PathBuf,
    /// Table the pipeline starts from (None until a load succeeds).
    pub table: Option<Arc<Table>>,
    pub selection: S,
    /// Output of the last refresh.
    pub view: Option<DashboardView>,
    pub color_map: Option<ColorMap>,
    /// Load or pipeline error shown in place of the charts.
    pub error: Option<String>,
}

impl<S: Default> Panel<S> {
    fn new(source: PathBuf) -> Self {
        Self {
            source,
            table: None,
            selection: S::default(),
            view: None,
            color_map: None,
            error: None,
        }
    }
}

impl<S> Panel<S> {
    /// Re-run `build` and store either the view or the error.
    fn refresh_with(
        &mut self,
        build: impl Fn(&Table, &S) -> Result<DashboardView, PipelineError>,
    ) {
        let Some(table) = &self.table else {
            self.view = None;
            return;
        };
        let table: &Table = table;
        match build(table, &self.selection) {
            Ok(view) => {
                log::debug!(
                    "{} → {} records, {} charts",
                    self.source.display(),
                    view.table.len(),
                    view.charts.len()
                );
                self.view = Some(view);
                self.error = None;
            }
            Err(e) => {
                log::error!("Pipeline failed for {}: {e}", self.source.display());
                self.view = None;
                self.error = Some(e.to_string());
            }
        }
    }

    fn fail(&mut self, e: PipelineError) {
        log::error!("Failed to load {}: {e}", self.source.display());
        self.table = None;
        self.view = None;
        self.color_map = None;
        self.error = Some(e.to_string());
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Which dashboard is on screen.
    pub active: Dashboard,
    pub asteroids: Panel<asteroids::Selection>,
    pub neo: Panel<neo::Selection>,
    pub margin: Panel<margin::Selection>,
    /// `TopGrp` values offered by the margin multi-select.
    pub margin_groups: Vec<Value>,
    cache: SourceCache,
}

impl AppState {
    /// Build the state and load every configured source.
    pub fn new(config: &Config) -> Self {
        let mut state = Self {
            active: config.start.into(),
            asteroids: Panel::new(config.source_for(Dashboard::Asteroids)),
            neo: Panel::new(config.source_for(Dashboard::Neo)),
            margin: Panel::new(config.source_for(Dashboard::Margin)),
            margin_groups: Vec::new(),
            cache: SourceCache::default(),
        };
        for dashboard in Dashboard::ALL {
            state.load(dashboard);
        }
        state
    }

    /// Error of the active dashboard, if any.
    pub fn active_error(&self) -> Option<&str> {
        match self.active {
            Dashboard::Asteroids => self.asteroids.error.as_deref(),
            Dashboard::Neo => self.neo.error.as_deref(),
            Dashboard::Margin => self.margin.error.as_deref(),
        }
    }

    pub fn source(&self, dashboard: Dashboard) -> &Path {
        match dashboard {
            Dashboard::Asteroids => &self.asteroids.source,
            Dashboard::Neo => &self.neo.source,
            Dashboard::Margin => &self.margin.source,
        }
    }

    /// Point a dashboard at a new file and load it.
    pub fn set_source(&mut self, dashboard: Dashboard, path: PathBuf) {
        self.cache.invalidate(&path);
        match dashboard {
            Dashboard::Asteroids => self.asteroids.source = path,
            Dashboard::Neo => self.neo.source = path,
            Dashboard::Margin => self.margin.source = path,
        }
        self.load(dashboard);
    }

    /// (Re)load a dashboard's source and rebuild its view.
    pub fn load(&mut self, dashboard: Dashboard) {
        let path = self.source(dashboard).to_path_buf();
        let loaded = self.cache.load(&path);
        match dashboard {
            Dashboard::Asteroids => match loaded {
                Ok(table) => {
                    let classes = table.unique_values(asteroids::CLASS_FIELD);
                    self.asteroids.color_map =
                        Some(ColorMap::new(asteroids::CLASS_FIELD, &classes));
                    self.asteroids.table = Some(table);
                }
                Err(e) => self.asteroids.fail(e),
            },
            Dashboard::Neo => match loaded {
                Ok(table) => {
                    self.neo.color_map = Some(ColorMap::fixed(
                        neo::HAZARD_FIELD,
                        [
                            (Value::Bool(false), NON_HAZARDOUS_COLOR),
                            (Value::Bool(true), HAZARDOUS_COLOR),
                        ],
                    ));
                    self.neo.table = Some(table);
                }
                Err(e) => self.neo.fail(e),
            },
            Dashboard::Margin => match loaded.and_then(|raw| margin::prepare(&raw)) {
                Ok(prepared) => {
                    self.margin_groups = margin::group_options(&prepared);
                    self.margin.selection = margin::default_selection(&prepared);
                    self.margin.color_map =
                        Some(ColorMap::new(margin::GROUP_FIELD, &self.margin_groups));
                    self.margin.table = Some(Arc::new(prepared));
                }
                Err(e) => {
                    self.margin_groups.clear();
                    self.margin.fail(e);
                }
            },
        }
        self.refresh(dashboard);
    }

    /// Re-run a dashboard's pipeline against its current selection.
    pub fn refresh(&mut self, dashboard: Dashboard) {
        match dashboard {
            Dashboard::Asteroids => self.asteroids.refresh_with(asteroids::build_view),
            Dashboard::Neo => self.neo.refresh_with(neo::build_view),
            Dashboard::Margin => self.margin.refresh_with(margin::build_view),
        }
    }

    /// Add or remove one `TopGrp` from the margin selection.
    pub fn toggle_margin_group(&mut self, group: &Value) {
        let groups = &mut self.margin.selection.groups;
        if !groups.remove(group) {
            groups.insert(group.clone());
        }
        self.refresh(Dashboard::Margin);
    }

    pub fn select_all_margin_groups(&mut self) {
        self.margin.selection.groups = self.margin_groups.iter().cloned().collect();
        self.refresh(Dashboard::Margin);
    }
}
