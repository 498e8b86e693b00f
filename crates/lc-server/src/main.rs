//! Headless server entry point. Converted from the teacher's
//! `Qcommon_Init` / `Qcommon_Frame` split in `common.rs`: no windowed
//! event loop (there is no renderer in this crate's scope), just load a
//! scenario, build a scheduler, and drive ticks until the process is
//! asked to stop.
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use lc_landscape::{Landscape, MaterialTable};
use lc_net::ControlQueue;
use lc_save::SaveArchive;
use lc_script::FuncMap;
use lc_sim::Section;
use lc_server::Scheduler;

/// Frame length in milliseconds (the simulation's fixed tick rate).
const FRAME_MSEC: u64 = 30;

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let scenario_path = std::env::args().nth(1).map(PathBuf::from);
    let archive = match &scenario_path {
        Some(path) => {
            let file = std::fs::File::open(path).with_context(|| format!("opening scenario {path:?}"))?;
            SaveArchive::read_from(file).with_context(|| format!("reading scenario {path:?}"))?
        }
        None => {
            tracing::info!("no scenario path given, starting an empty section");
            SaveArchive::default()
        }
    };

    let width = archive.core.landscape.width.max(1);
    let height = archive.core.landscape.height.max(1);

    let mut materials = MaterialTable::new();
    materials.add(lc_landscape::Material::new("Sky", 0, 0, 0));

    let section = Section::new(materials, width, height, 0);
    let landscape = Landscape::new(width, height, lc_math::Fixed::from_fraction(1, 10));
    let queue = ControlQueue::new(lc_net::DEFAULT_QUEUE_CAPACITY);
    let mut scheduler = Scheduler::new(section, landscape, FuncMap::new(), queue);

    tracing::info!(frame_msec = FRAME_MSEC, "server scheduler starting");
    loop {
        let report = scheduler.tick();
        tracing::debug!(
            frame = report.frame,
            objects = report.active_objects,
            particles = report.active_particles,
            messages = report.pending_messages,
            "tick complete"
        );
        std::thread::sleep(Duration::from_millis(FRAME_MSEC));
    }
}
