use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

// ---------------------------------------------------------------------------
// Row layouts
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct OrbitRow<'a> {
    #[serde(rename = "Object Name")]
    name: String,
    #[serde(rename = "Object Class Group")]
    class: &'a str,
    #[serde(rename = "Hazardous Group")]
    hazard: &'a str,
    #[serde(rename = "Orbit Axis (AU)")]
    axis: f64,
    #[serde(rename = "Orbit Eccentricity")]
    eccentricity: f64,
    #[serde(rename = "Orbit Inclination (deg)")]
    inclination: f64,
    #[serde(rename = "Perihelion Distance (AU)")]
    perihelion: f64,
    #[serde(rename = "Orbital Period (yr)")]
    period: f64,
    #[serde(rename = "Minimum Orbit Intersection Distance (AU)")]
    moid: f64,
    #[serde(rename = "Asteroid Magnitude")]
    magnitude: f64,
}

#[derive(Serialize)]
struct NeoRow {
    id: u64,
    name: String,
    est_diameter_min: f64,
    est_diameter_max: f64,
    relative_velocity: f64,
    miss_distance: f64,
    absolute_magnitude: f64,
    #[serde(serialize_with = "python_bool")]
    hazardous: bool,
}

fn python_bool<S: serde::Serializer>(v: &bool, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(if *v { "True" } else { "False" })
}

#[derive(Serialize)]
struct MarginRow<'a> {
    #[serde(rename = "Period")]
    period: String,
    #[serde(rename = "TopGrp")]
    group: &'a str,
    #[serde(rename = "Total Revenue")]
    revenue: String,
    #[serde(rename = "Total Cost")]
    cost: String,
}

/// `$12,345.67`
fn currency(v: f64) -> String {
    let cents = (v.abs() * 100.0).round() as u64;
    let digits = (cents / 100).to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if v < 0.0 { "-" } else { "" };
    format!("{sign}${grouped}.{:02}", cents % 100)
}

// ---------------------------------------------------------------------------
// Writers
// ---------------------------------------------------------------------------

fn write_orbits(path: &Path, rng: &mut SimpleRng) -> Result<usize> {
    let classes = ["AMO", "APO", "ATE", "IEO"];
    let mut writer = csv::Writer::from_path(path).context("creating orbits.csv")?;
    let n = 600;
    for i in 0..n {
        let class = rng.pick(&classes);
        let axis = match class {
            "ATE" | "IEO" => rng.uniform(0.5, 1.0),
            _ => rng.uniform(1.0, 3.5),
        };
        let eccentricity = rng.uniform(0.02, 0.9);
        let moid = rng.uniform(0.0, 0.4);
        let magnitude = rng.gauss(19.0, 2.5);
        let hazard = if moid <= 0.05 && magnitude <= 22.0 {
            "Hazardous"
        } else {
            "Non-Hazardous"
        };
        writer.serialize(OrbitRow {
            name: format!("{} {}", 1000 + i, rng.pick(&["Aten", "Apollo", "Amor", "Eros", "Icarus"])),
            class,
            hazard,
            axis,
            eccentricity,
            inclination: rng.uniform(0.0, 40.0),
            perihelion: axis * (1.0 - eccentricity),
            period: axis.powf(1.5),
            moid,
            magnitude,
        })?;
    }
    writer.flush()?;
    Ok(n)
}

fn write_neo(path: &Path, rng: &mut SimpleRng) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path).context("creating neo_v2.csv")?;
    let n = 1500;
    for i in 0..n {
        let magnitude = rng.uniform(14.0, 30.0);
        // diameter estimates from absolute magnitude for albedo 0.25 / 0.05
        let d_min = 1329.0 / 0.25f64.sqrt() * 10f64.powf(-magnitude / 5.0);
        let d_max = 1329.0 / 0.05f64.sqrt() * 10f64.powf(-magnitude / 5.0);
        let hazardous = d_min > 0.14 && rng.chance(0.4);
        writer.serialize(NeoRow {
            id: 2_000_000 + i,
            name: format!("({} {})", 2000 + i % 24, i),
            est_diameter_min: d_min,
            est_diameter_max: d_max,
            relative_velocity: rng.gauss(48_000.0, 25_000.0).abs(),
            miss_distance: rng.uniform(6_000.0, 74_800_000.0),
            absolute_magnitude: magnitude,
            hazardous,
        })?;
    }
    writer.flush()?;
    Ok(n as usize)
}

fn write_margins(path: &Path, rng: &mut SimpleRng) -> Result<usize> {
    let groups = ["Parts", "Labor", "Freight", "Service Contracts", "Rentals"];
    let mut writer = csv::Writer::from_path(path).context("creating data.csv")?;
    let mut n = 0;
    for month in 1..=24u32 {
        let year = 2023 + (month - 1) / 12;
        let period = format!("{year}-{:02}-01", (month - 1) % 12 + 1);
        for group in groups {
            let revenue = if rng.chance(0.03) {
                0.0
            } else {
                rng.uniform(5_000.0, 250_000.0)
            };
            let cost = revenue * rng.uniform(0.45, 0.95) + rng.uniform(0.0, 500.0);
            writer.serialize(MarginRow {
                period: period.clone(),
                group,
                revenue: currency(revenue),
                cost: currency(cost),
            })?;
            n += 1;
        }
    }
    writer.flush()?;
    Ok(n)
}

fn main() -> Result<()> {
    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data"));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = SimpleRng::new(42);

    let orbits = write_orbits(&out_dir.join("orbits.csv"), &mut rng)?;
    let neos = write_neo(&out_dir.join("neo_v2.csv"), &mut rng)?;
    let margins = write_margins(&out_dir.join("data.csv"), &mut rng)?;

    println!(
        "Wrote {orbits} asteroids, {neos} NEOs and {margins} margin rows to {}",
        out_dir.display()
    );
    Ok(())
}
