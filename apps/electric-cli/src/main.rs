use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use electric_kernel::{ElectricScene, SceneConfig};
use electric_render::{DebugTextRenderer, OrbitPath, Renderer};
use electric_tools::{FrameTimer, SceneInspector};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "electric-cli", about = "Headless tools for the electric cube scene")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene configuration (YAML). Built-in defaults when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and scene layout
    Info,
    /// Print instance placements of one ring at a given time
    Sample {
        /// Ring name
        #[arg(short, long, default_value = "central")]
        ring: String,
        /// Simulation time in seconds
        #[arg(short, long, default_value = "0")]
        time: f64,
        /// Only this instance
        #[arg(short, long)]
        index: Option<usize>,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Format a whole frame as text
    Frame {
        /// Simulation time in seconds
        #[arg(short, long, default_value = "0")]
        time: f64,
        /// Instances listed per ring
        #[arg(short = 'n', long, default_value = "3")]
        per_ring: usize,
    },
    /// Dump or validate a scene configuration
    Config {
        /// Print the effective configuration as YAML
        #[arg(long)]
        dump: bool,
        /// Load and validate this file
        #[arg(long)]
        check: Option<PathBuf>,
    },
    /// Time the per-frame tick
    Bench {
        /// Number of frames to simulate
        #[arg(short, long, default_value = "10000")]
        frames: u64,
        /// Raw frame delta in seconds
        #[arg(long, default_value = "0.016666")]
        delta: f64,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<SceneConfig> {
    match path {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("loading scene config {}", path.display())),
        None => Ok(SceneConfig::default()),
    }
}

/// Furthest `--time` the CLI will simulate to, in seconds (one day).
const MAX_SEEK_TIME: f64 = 86_400.0;

/// Tick `scene` forward until its clock reads `time`, never exceeding the
/// clock's per-frame clamp.
fn advance_to(scene: &mut ElectricScene, time: f64) -> anyhow::Result<()> {
    if !time.is_finite() || time < 0.0 {
        bail!("time must be a finite, non-negative number of seconds (got {time})");
    }
    if time > MAX_SEEK_TIME {
        bail!("time {time}s is beyond the {MAX_SEEK_TIME}s limit");
    }
    let remaining = time - scene.time();
    if remaining <= 0.0 {
        return Ok(());
    }
    let max_step = scene.clock().max_step();
    let frames = (remaining / max_step).ceil().max(1.0) as u64;
    let step = remaining / frames as f64;
    for _ in 0..frames {
        scene.tick(step);
    }
    Ok(())
}

/// Log filter used when `RUST_LOG` is unset.
fn default_filter(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "info" }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = default_filter(cli.verbose);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Info => {
            let config = load_config(cli.config.as_ref())?;
            let scene = ElectricScene::new(config)?;
            println!("electric-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("render: {}", electric_render::crate_info());
            println!("max step: {}s", scene.clock().max_step());
            println!(
                "core cube: size={} spin={:?}",
                scene.core_config().size,
                scene.core_config().spin
            );
            println!("{}", SceneInspector::summary(&scene));
        }
        Commands::Sample {
            ring,
            time,
            index,
            json,
        } => {
            let config = load_config(cli.config.as_ref())?;
            let mut scene = ElectricScene::new(config)?;
            advance_to(&mut scene, time)?;

            let infos = match index {
                Some(i) => SceneInspector::inspect_instance(&scene, &ring, i)
                    .map(|info| vec![info])
                    .with_context(|| format!("no instance {i} in ring `{ring}`"))?,
                None => SceneInspector::inspect_ring(&scene, &ring)
                    .with_context(|| format!("no ring named `{ring}`"))?,
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&infos)?);
            } else {
                for info in &infos {
                    println!("{info}");
                }
            }
        }
        Commands::Frame { time, per_ring } => {
            let config = load_config(cli.config.as_ref())?;
            let mut scene = ElectricScene::new(config)?;
            advance_to(&mut scene, time)?;
            let view = OrbitPath::default().view_at(scene.time());
            print!("{}", DebugTextRenderer::new(per_ring).render(&scene, &view));
        }
        Commands::Config { dump, check } => {
            if let Some(path) = &check {
                let config = SceneConfig::load(path)
                    .with_context(|| format!("{} is not a valid scene config", path.display()))?;
                println!(
                    "{}: OK ({} rings, {} instances)",
                    path.display(),
                    config.rings.len(),
                    config.total_instances()
                );
            }
            if dump || check.is_none() {
                let config = load_config(cli.config.as_ref())?;
                print!("{}", config.to_yaml()?);
            }
        }
        Commands::Bench { frames, delta } => {
            let config = load_config(cli.config.as_ref())?;
            let mut scene = ElectricScene::new(config)?;
            let mut timer = FrameTimer::new(frames.clamp(1, 100_000) as usize);

            let start = Instant::now();
            for _ in 0..frames {
                let frame_start = Instant::now();
                scene.tick(delta);
                timer.record(frame_start.elapsed());
            }
            let total = start.elapsed();

            println!(
                "{frames} frames, {} instances: total {:?}, avg {:?}, min {:?}, max {:?}",
                scene.instance_count(),
                total,
                timer.average(),
                timer.min(),
                timer.max()
            );
            let budget = Duration::from_secs_f64(1.0 / 60.0);
            println!(
                "frame budget used: {:.3}%",
                timer.average().as_secs_f64() / budget.as_secs_f64() * 100.0
            );
            println!("final {}", SceneInspector::summary(&scene));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_to_reaches_target_time() {
        let mut scene = ElectricScene::new(SceneConfig::default()).unwrap();
        advance_to(&mut scene, 2.5).unwrap();
        assert!((scene.time() - 2.5).abs() < 1e-9);
        assert_eq!(scene.clock().frames(), 50);
    }

    #[test]
    fn advance_to_rejects_bad_time() {
        let mut scene = ElectricScene::new(SceneConfig::default()).unwrap();
        assert!(advance_to(&mut scene, -1.0).is_err());
        assert!(advance_to(&mut scene, f64::NAN).is_err());
    }

    #[test]
    fn verbose_switches_filter_to_debug() {
        assert_eq!(default_filter(false), "info");
        assert_eq!(default_filter(true), "debug");
    }

    #[test]
    fn advance_to_rejects_time_past_limit() {
        let mut scene = ElectricScene::new(SceneConfig::default()).unwrap();
        assert!(advance_to(&mut scene, 1.0e9).is_err());
        assert!(advance_to(&mut scene, MAX_SEEK_TIME + 1.0).is_err());
        assert_eq!(scene.clock().frames(), 0);
    }

    #[test]
    fn advance_to_zero_is_noop() {
        let mut scene = ElectricScene::new(SceneConfig::default()).unwrap();
        advance_to(&mut scene, 0.0).unwrap();
        assert_eq!(scene.clock().frames(), 0);
    }

    #[test]
    fn cli_parses_sample() {
        let cli = Cli::try_parse_from([
            "electric-cli", "sample", "--ring", "upper", "--time", "1.5", "--json",
        ])
        .unwrap();
        match cli.command {
            Commands::Sample { ring, time, json, index } => {
                assert_eq!(ring, "upper");
                assert_eq!(time, 1.5);
                assert!(json);
                assert!(index.is_none());
            }
            _ => panic!("expected sample"),
        }
    }
}
