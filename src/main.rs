use anyhow::Result;
use clap::Parser;
use livewall::config::EngineConfig;
use livewall::core::constants::DISPLAY_ROW_BUDGET;
use livewall::engine::Engine;
use livewall::render::{Orientation, ScenePainter, Surface};
use livewall::sources::{ProcessSnapshot, StatsSnapshot};
use log::info;
use std::path::PathBuf;
use std::time::Duration;

/// livewall - drives the wallpaper engine against a plain-text surface
#[derive(Parser, Debug)]
#[command(name = "livewall")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Engine config file (JSON); built-in defaults are used when absent
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// How long to run before tearing the engine down, in seconds
    #[arg(short = 't', long = "duration", value_name = "SECS", default_value = "10")]
    duration: u64,

    /// Simulate a landscape surface instead of portrait
    #[arg(long = "landscape")]
    landscape: bool,

    /// Debug verbosity level (0=quiet, 1=info, 2=debug, 3=trace)
    #[arg(short = 'd', long = "debug", value_name = "LEVEL", default_value = "0")]
    debug: u8,
}

/// Frames are line buffers, printed when presented.
struct TextSurface;

impl Surface for TextSurface {
    type Canvas = Vec<String>;

    fn acquire(&mut self) -> Option<Vec<String>> {
        Some(Vec::new())
    }

    fn present(&mut self, canvas: Vec<String>) {
        if canvas.is_empty() {
            return;
        }
        println!("{}", canvas.join("\n"));
        println!("----------------------------------------");
    }
}

struct TextPainter;

impl TextPainter {
    fn format_uptime(uptime: Duration) -> String {
        let total = uptime.as_secs();
        let days = total / 86400;
        let hours = (total % 86400) / 3600;
        let minutes = (total % 3600) / 60;
        let seconds = total % 60;
        format!("{days:02}d {hours:02}:{minutes:02}:{seconds:02}")
    }
}

impl ScenePainter<Vec<String>> for TextPainter {
    fn draw_background(
        &mut self,
        canvas: &mut Vec<String>,
        offset_px: f32,
        orientation: Orientation,
    ) -> Result<()> {
        canvas.push(format!("[scene {orientation:?} @ offset {offset_px:+.0}px]"));
        Ok(())
    }

    fn draw_overlay_text(&mut self, canvas: &mut Vec<String>, stats: &StatsSnapshot) -> Result<()> {
        let usage = stats.usage_percent.round().min(100.0) as u32;
        canvas.push(format!(
            "LOAD {usage:03}%  UP {}",
            Self::format_uptime(stats.uptime)
        ));
        Ok(())
    }

    fn draw_status_readout(
        &mut self,
        canvas: &mut Vec<String>,
        stats: &StatsSnapshot,
    ) -> Result<()> {
        canvas.push(format!("PWR {:04}", stats.cpu_mhz.min(9999)));
        Ok(())
    }

    fn draw_diagnostic_list(
        &mut self,
        canvas: &mut Vec<String>,
        processes: &ProcessSnapshot,
    ) -> Result<()> {
        for row in processes.display_rows(DISPLAY_ROW_BUDGET) {
            canvas.push(format!("  {:<24} {:>7} {:>9}", row.name, row.pid, row.label));
        }
        Ok(())
    }

    fn draw_alternate_display(
        &mut self,
        canvas: &mut Vec<String>,
        stats: &StatsSnapshot,
        orbit_deg: u16,
    ) -> Result<()> {
        let rad = f64::from(orbit_deg).to_radians();
        canvas.push(format!(
            "  core {:03.0}%  orbit {orbit_deg:03}\u{00b0}  e\u{207b} ({:+.2}, {:+.2})",
            stats.usage_percent,
            rad.cos(),
            rad.sin()
        ));
        Ok(())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.debug {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = match &cli.config {
        Some(path) => EngineConfig::load_from_path(path)?,
        None => EngineConfig::default(),
    };
    let density_scale = config.density_scale;

    let mut engine = Engine::new(TextSurface, TextPainter, config);

    // the platform glue this binary stands in for: surface comes up,
    // becomes visible, the user pokes the mode button, surface goes away
    engine.on_surface_ready();
    if cli.landscape {
        engine.on_surface_changed(1920, 1080);
    } else {
        engine.on_surface_changed(1080, 1920);
    }
    engine.on_visibility_changed(true);

    let half = Duration::from_secs(cli.duration.div_ceil(2));
    std::thread::sleep(half);

    info!("toggling display mode");
    engine.on_touch_down(500.0 * density_scale, 150.0 * density_scale);
    engine.on_touch_up_or_cancel();
    std::thread::sleep(half);

    engine.on_visibility_changed(false);
    let last = engine.stats().load();
    info!(
        "last reading: {:.0}% cpu, up {}",
        last.usage_percent,
        TextPainter::format_uptime(last.uptime)
    );
    engine.on_surface_destroyed();
    info!("clean exit");
    Ok(())
}
