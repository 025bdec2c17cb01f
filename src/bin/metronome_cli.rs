use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use futures::StreamExt;
use pulse_metronome::audio::{render_beats, write_wav};
use pulse_metronome::engine::{
    simulate, DesktopStubBackend, MetronomeEvent, OfflineRun, PollJitter, SimulationOptions,
    TempoChange, TransportController,
};
use pulse_metronome::{init_logging, AppConfig, Tempo};

/// Longest WAV `render` will produce; the whole buffer is held in memory
const MAX_RENDER_SECS: f64 = 3600.0;

#[derive(Parser, Debug)]
#[command(
    name = "metronome_cli",
    about = "Lookahead metronome: live playback, schedule planning and offline rendering"
)]
struct Cli {
    /// JSON config file (defaults to assets/metronome_config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log verbosity (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct ScheduleArgs {
    /// Tempo in BPM; text that is not a valid tempo selects 120
    #[arg(long, default_value = "120")]
    bpm: String,
    /// Length of the run in seconds
    #[arg(long, default_value_t = 4.0)]
    duration: f64,
    /// Tempo change as AT_SECS:BPM, may be repeated
    #[arg(long = "tempo-change", value_parser = parse_tempo_change)]
    tempo_changes: Vec<TempoChange>,
    /// Maximum random delay added to each simulated poll
    #[arg(long, default_value_t = 0.0)]
    jitter_ms: f64,
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the metronome live and print events as JSON lines
    Play {
        #[arg(long, default_value = "120")]
        bpm: String,
        #[arg(long, default_value_t = 4.0)]
        duration: f64,
        /// Use the silent stub backend instead of the audio device
        #[arg(long)]
        stub: bool,
    },
    /// Print the beat schedule of a simulated run as JSON lines
    Plan(ScheduleArgs),
    /// Render a simulated run to a WAV file
    Render {
        #[command(flatten)]
        schedule: ScheduleArgs,
        #[arg(long)]
        output: PathBuf,
        #[arg(long, default_value_t = 48_000)]
        sample_rate: u32,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    let config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path),
        None => AppConfig::load(),
    };

    match cli.command {
        Commands::Play {
            bpm,
            duration,
            stub,
        } => run_play(config, &bpm, duration, stub),
        Commands::Plan(schedule) => run_plan(&config, &schedule),
        Commands::Render {
            schedule,
            output,
            sample_rate,
        } => run_render(&config, &schedule, output, sample_rate),
    }
}

fn parse_tempo_change(text: &str) -> Result<TempoChange, String> {
    let (at, bpm) = text
        .split_once(':')
        .ok_or_else(|| format!("expected AT_SECS:BPM, got {text:?}"))?;
    let at_secs = at
        .trim()
        .parse::<f64>()
        .map_err(|err| format!("invalid time {at:?}: {err}"))?;
    let bpm = bpm
        .trim()
        .parse::<f64>()
        .map_err(|err| format!("invalid tempo {bpm:?}: {err}"))?;
    Ok(TempoChange { at_secs, bpm })
}

fn run_play(config: AppConfig, bpm: &str, duration: f64, stub: bool) -> Result<ExitCode> {
    if !(duration.is_finite() && duration >= 0.0) {
        return Err(anyhow!("duration must be a non-negative number of seconds"));
    }

    let controller = if stub {
        TransportController::with_backend(config, Arc::new(DesktopStubBackend::new()))
    } else {
        TransportController::from_config(config)
    }
    .context("creating transport")?;
    controller.set_tempo_text(bpm);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("creating runtime")?;
    let mut events = Box::pin(controller.event_stream());

    controller.start().context("starting metronome")?;
    runtime.block_on(async {
        let deadline = tokio::time::sleep(Duration::from_secs_f64(duration));
        tokio::pin!(deadline);
        loop {
            tokio::select! {
                _ = &mut deadline => break,
                event = events.next() => match event {
                    Some(event) => print_event(&event)?,
                    None => break,
                },
            }
        }
        Ok::<_, anyhow::Error>(())
    })?;
    controller.stop().context("stopping metronome")?;

    // Stopped is already buffered once stop() returns
    runtime.block_on(async {
        while let Ok(Some(event)) =
            tokio::time::timeout(Duration::from_millis(10), events.next()).await
        {
            print_event(&event)?;
            if event == MetronomeEvent::Stopped {
                break;
            }
        }
        Ok::<_, anyhow::Error>(())
    })?;

    Ok(ExitCode::from(0))
}

fn print_event(event: &MetronomeEvent) -> Result<()> {
    println!("{}", serde_json::to_string(event)?);
    Ok(())
}

fn simulate_schedule(config: &AppConfig, schedule: &ScheduleArgs) -> Result<OfflineRun> {
    let options = SimulationOptions {
        tempo_bpm: Tempo::parse(&schedule.bpm).bpm(),
        duration_secs: schedule.duration,
        tempo_changes: schedule.tempo_changes.clone(),
        jitter: (schedule.jitter_ms > 0.0).then_some(PollJitter {
            max_ms: schedule.jitter_ms,
            seed: schedule.seed,
        }),
    };
    simulate(&config.scheduler, &options).context("simulating schedule")
}

fn run_plan(config: &AppConfig, schedule: &ScheduleArgs) -> Result<ExitCode> {
    let run = simulate_schedule(config, schedule)?;

    for beat in &run.beats {
        println!("{}", serde_json::to_string(beat)?);
    }
    eprintln!("{} beats over {} passes", run.beats.len(), run.passes);

    Ok(ExitCode::from(0))
}

fn run_render(
    config: &AppConfig,
    schedule: &ScheduleArgs,
    output: PathBuf,
    sample_rate: u32,
) -> Result<ExitCode> {
    if sample_rate == 0 {
        return Err(anyhow!("sample rate must be greater than 0"));
    }
    if !(schedule.duration.is_finite() && schedule.duration <= MAX_RENDER_SECS) {
        return Err(anyhow!(
            "render duration must be at most {MAX_RENDER_SECS} seconds (got {})",
            schedule.duration
        ));
    }

    let run = simulate_schedule(config, schedule)?;
    let samples = render_beats(&run.beats, sample_rate, schedule.duration, &config.click);
    write_wav(&output, &samples, sample_rate)?;

    eprintln!(
        "Rendered {} beats ({} samples) to {}",
        run.beats.len(),
        samples.len(),
        output.display()
    );
    Ok(ExitCode::from(0))
}
