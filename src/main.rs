//! genstars: stellar velocity synthesis for a parametric Galactic
//! model (disk + bar + nuclear stellar disk)
//!
//! Precomputes the guiding-radius distributions of the Shu DF on a
//! (height, radius, age) grid, then draws velocities by inverse-CDF
//! sampling. Configured by a YAML input file.

use std::error::Error;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::Instant;

use colored::Colorize;
use rand::prelude::*;
use rand_xoshiro::Xoshiro256StarStar;

mod constants;
mod geometry;
mod input;
mod interp;
mod kinematics;
mod model;
mod pwqci;
mod shu;
mod special_functions;
mod tables;

use constants::*;
use geometry::ThreeVector;
use input::{Config, InputError, PrettyDuration};
use kinematics::{Kinematics, Population};
use model::{BarKinematics, DiskKinematics, GridSpec};
use shu::ShuGrid;
use tables::{NsdMoments, RotationCurve};

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().collect();
    let path = args.get(1).ok_or_else(InputError::file)?;

    let mut config = Config::from_file(Path::new(path))?;
    config.with_context("constants")?;

    let seed: u64 = config.read("control:seed").unwrap_or(DEFAULT_SEED);
    let jitter_seed: u64 = config.read("control:jitter_seed").unwrap_or(DEFAULT_JITTER_SEED);
    let max_rejections: usize = config.read("control:max_rejections").unwrap_or(DEFAULT_MAX_REJECTIONS);

    let disk = DiskKinematics::from_config(&config)?;
    let bar = BarKinematics::from_config(&config)?;
    let spec = GridSpec::from_config(&config, disk.num_bins())?;

    let rotation_path: String = config.read("tables:rotation_curve")?;
    let rotation = RotationCurve::from_file(Path::new(&rotation_path))?;
    println!(
        "{} rotation curve from \"{}\".",
        "Loaded".bold().bright_green(), rotation_path,
    );

    let nsd = match config.read::<String, _>("tables:nsd_moments") {
        Ok(nsd_path) => {
            let table = NsdMoments::from_file(Path::new(&nsd_path))?;
            println!(
                "{} nuclear-disk moments from \"{}\".",
                "Loaded".bold().bright_green(), nsd_path,
            );
            Some(table)
        },
        Err(_) => None,
    };

    println!(
        "{} guiding-radius distributions for {} cells...",
        "Building".bold().cyan(), spec.nz * spec.nr * spec.n_age,
    );
    let start = Instant::now();
    let mut jitter_rng = Xoshiro256StarStar::seed_from_u64(jitter_seed);
    let grid = ShuGrid::build(spec, &disk, &rotation, &mut jitter_rng);
    println!(
        "{} grid build after {}.",
        "Completed".bold().bright_green(), PrettyDuration::from(start.elapsed()),
    );

    if let Ok(dump_path) = config.read::<String, _>("output:grid_dump") {
        let file = File::create(&dump_path)
            .map_err(|_| InputError::conversion("output:grid_dump", &dump_path))?;
        grid.write_dump(&mut BufWriter::new(file))?;
        println!("{} grid dump to \"{}\".", "Wrote".bold().cyan(), dump_path);
    }

    let engine = Kinematics {grid, rotation, disk, bar, nsd, max_rejections};

    if let Ok(count) = config.read::<usize, _>("sample:count") {
        let position: Vec<f64> = config.read("sample:position")?;
        if position.len() != 3 {
            return Err(InputError::conversion("sample:position", "position").into());
        }
        let position = ThreeVector::new(position[0], position[1], position[2]);

        let name: String = config.read("sample:population")?;
        let population = match name.as_str() {
            "bar" => Population::Bar,
            "nsd" => Population::NuclearDisk,
            "disk" => {
                let bin: usize = config.read("sample:bin")?;
                if bin >= engine.disk.num_bins() {
                    return Err(InputError::conversion("sample:bin", "bin").into());
                }
                let age: f64 = config.read("sample:age")
                    .unwrap_or(engine.disk.median_ages[bin]);
                Population::Disk {bin, age}
            },
            _ => return Err(InputError::conversion("sample:population", &name).into()),
        };

        let mut rng = Xoshiro256StarStar::seed_from_u64(seed);
        for _ in 0..count {
            let v = engine.sample(position, population, &mut rng)?;
            println!("{:.6} {:.6} {:.6}", v[0], v[1], v[2]);
        }
    }

    Ok(())
}
