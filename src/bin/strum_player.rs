use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use air_guitar::config::Config;
use air_guitar::instrument::{AirGuitar, PartRoles, StrumSink};
use air_guitar::osc::OscStrumSink;
use air_guitar::pose::PoseReader;

#[derive(Parser, Debug)]
#[command(
    name = "strum_player",
    version = env!("GIT_VERSION"),
    about = "Turn pose keypoint frames (JSON Lines) into air-guitar strums"
)]
struct Cli {
    /// Keypoint frames, one JSON object per line ("-" reads stdin)
    #[arg(long, default_value = "-")]
    input: String,

    /// Config file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Print strums instead of sending OSC
    #[arg(long)]
    dry_run: bool,

    /// Pace playback to this many frames per second (recorded input)
    #[arg(long)]
    fps: Option<f64>,
}

/// 標準出力に書くだけのシンク
struct PrintSink;

impl StrumSink for PrintSink {
    fn on_strum(&mut self, pitch_offset: i32) -> Result<()> {
        println!("strum pitch={}", pitch_offset);
        Ok(())
    }
}

#[derive(Default)]
struct Stats {
    frames: u32,
    skipped: u32,
    malformed: u32,
    strums: u32,
    confidence_sum: f32,
}

impl Stats {
    fn log(&self, label: &str) {
        let avg_confidence = if self.frames > 0 {
            self.confidence_sum / self.frames as f32
        } else {
            0.0
        };
        info!(
            frames = self.frames,
            skipped = self.skipped,
            malformed = self.malformed,
            strums = self.strums,
            "{} (avg confidence {:.2})",
            label,
            avg_confidence
        );
    }
}

fn open_input(input: &str) -> Result<Box<dyn BufRead>> {
    if input == "-" {
        Ok(Box::new(io::stdin().lock()))
    } else {
        let file = File::open(input).with_context(|| format!("Failed to open {}", input))?;
        Ok(Box::new(BufReader::new(file)))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "air_guitar=info,strum_player=info".into()),
        )
        .init();

    let config = Config::load_or_default(&cli.config);

    println!("Strum Player {}", env!("GIT_VERSION"));
    println!("Input: {}", cli.input);
    println!(
        "Instrument: handedness={:?}, threshold={}, neck=({}, {}), bridge={}",
        config.instrument.handedness,
        config.instrument.confidence_threshold,
        config.instrument.neck_start,
        config.instrument.neck_end,
        config.instrument.bridge
    );
    let roles = PartRoles::for_handedness(config.instrument.handedness);
    println!(
        "Roles: fret={}, strum={}/{}",
        roles.fret_wrist.part_name(),
        roles.strum_wrist.part_name(),
        roles.strum_elbow.part_name()
    );
    println!(
        "Pitch: range={}, distance={:?}, clamp={}",
        config.pitch.range, config.pitch.distance, config.pitch.clamp
    );

    let mut sink: Box<dyn StrumSink> = if cli.dry_run {
        println!("Output: stdout (dry run)");
        Box::new(PrintSink)
    } else {
        let osc = OscStrumSink::from_config(&config.osc)?;
        println!("Output: OSC {} {}", osc.target_addr(), config.osc.address);
        Box::new(osc)
    };
    println!();

    let reader = PoseReader::new(open_input(&cli.input)?);
    let mut guitar = AirGuitar::from_config(&config);
    let frame_duration = cli.fps.filter(|fps| *fps > 0.0).map(|fps| Duration::from_secs_f64(1.0 / fps));

    let mut window = Stats::default();
    let mut total = Stats::default();
    let mut window_timer = Instant::now();

    for item in reader {
        let frame_start = Instant::now();

        let pose = match item {
            Ok(pose) => pose,
            Err(e) if e.downcast_ref::<io::Error>().is_some() => return Err(e),
            Err(e) => {
                warn!("{:#}", e);
                window.malformed += 1;
                total.malformed += 1;
                continue;
            }
        };

        let outcome = guitar.process_into(&pose, sink.as_mut())?;

        for stats in [&mut window, &mut total] {
            stats.frames += 1;
            stats.confidence_sum += pose.average_confidence();
            if outcome.is_skipped() {
                stats.skipped += 1;
            }
            if outcome.strum.is_some() {
                stats.strums += 1;
            }
        }

        // 1秒に1回
        if window_timer.elapsed() >= Duration::from_secs(1) {
            window.log("last second");
            window = Stats::default();
            window_timer = Instant::now();
        }

        if let Some(duration) = frame_duration {
            let elapsed = frame_start.elapsed();
            if elapsed < duration {
                std::thread::sleep(duration - elapsed);
            }
        }
    }

    total.log("done");
    Ok(())
}
