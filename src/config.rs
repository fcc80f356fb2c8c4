use std::path::PathBuf;

use clap::Parser;

use crate::dashboards::Dashboard;

/// Command-line configuration. Every flag can also come from the environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "rusty-dash", version, about = "Asteroid, NEO and margin dashboards")]
pub struct Config {
    /// Directory holding the default data files
    #[arg(long, env = "RUSTY_DASH_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Asteroid orbit CSV (defaults to <data-dir>/orbits.csv)
    #[arg(long, env = "RUSTY_DASH_ASTEROIDS")]
    pub asteroids: Option<PathBuf>,

    /// Near-Earth-object CSV (defaults to <data-dir>/neo_v2.csv)
    #[arg(long, env = "RUSTY_DASH_NEO")]
    pub neo: Option<PathBuf>,

    /// Sales margin CSV (defaults to <data-dir>/data.csv)
    #[arg(long, env = "RUSTY_DASH_MARGIN")]
    pub margin: Option<PathBuf>,

    /// Dashboard shown at start-up
    #[arg(long, value_enum, default_value_t = StartPage::Asteroids)]
    pub start: StartPage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StartPage {
    Asteroids,
    Neo,
    Margin,
}

impl From<StartPage> for Dashboard {
    fn from(page: StartPage) -> Self {
        match page {
            StartPage::Asteroids => Dashboard::Asteroids,
            StartPage::Neo => Dashboard::Neo,
            StartPage::Margin => Dashboard::Margin,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: PathBuf::from("data"),
            asteroids: None,
            neo: None,
            margin: None,
            start: StartPage::Asteroids,
        }
    }
}

impl Config {
    /// Resolved source path for a dashboard.
    pub fn source_for(&self, dashboard: Dashboard) -> PathBuf {
        let explicit = match dashboard {
            Dashboard::Asteroids => &self.asteroids,
            Dashboard::Neo => &self.neo,
            Dashboard::Margin => &self.margin,
        };
        explicit
            .clone()
            .unwrap_or_else(|| self.data_dir.join(dashboard.default_file()))
    }
}
