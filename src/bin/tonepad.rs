use clap::{Args as ClapArgs, Parser, Subcommand};
use std::io::BufRead;

use tonepad::config::{EngineConfig, CONFIG};
use tonepad::controller::{PlaybackController, Source};
use tonepad::engine::Engine;

/// CLI for the interactive tone player
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive session against the live audio engine
    Play,
    /// Render a one-shot press to a WAV file instead of streaming
    Render(RenderArgs),
    /// Generate a default config file and exit
    GenerateConfig(ConfigArgs),
}

#[derive(ClapArgs)]
struct RenderArgs {
    /// Source to press: left, center, right or custom
    #[arg(long, default_value = "center")]
    source: Source,
    /// Pan used when the source is custom
    #[arg(long, default_value_t = 0.0)]
    pan: f32,
    /// Output WAV path
    #[arg(long, default_value = "tone.wav")]
    out: String,
    /// Sample rate of the rendered file
    #[arg(long, default_value_t = 44_100)]
    sample_rate: u32,
}

#[derive(ClapArgs)]
struct ConfigArgs {
    /// Output path for the generated configuration
    #[arg(long, default_value = "config.toml")]
    out: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Play => play_command()?,
        Commands::Render(args) => render_command(args)?,
        Commands::GenerateConfig(cfg) => {
            EngineConfig::generate_default(&cfg.out)?;
            println!("Generated default config at {}", cfg.out);
        }
    }
    Ok(())
}

fn play_command() -> Result<(), Box<dyn std::error::Error>> {
    let engine = Engine::get()?;

    let ctrlc_engine = engine.clone();
    ctrlc::set_handler(move || {
        ctrlc_engine.shutdown();
        std::process::exit(0);
    })?;

    println!("Commands: left | center | right | custom | vol <0..1> | pan <-1..1>");
    println!("          cont on|off | stop | status | quit");

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let mut words = line.split_whitespace();
        match (words.next(), words.next()) {
            (Some("left"), _) => engine.press(Source::Left),
            (Some("center"), _) => engine.press(Source::Center),
            (Some("right"), _) => engine.press(Source::Right),
            (Some("custom"), _) => engine.press(Source::Custom),
            (Some("vol"), Some(v)) => match v.parse::<f32>() {
                Ok(v) => engine.set_volume(v),
                Err(_) => println!("expected a number, got {v}"),
            },
            (Some("pan"), Some(p)) => match p.parse::<f32>() {
                Ok(p) => engine.set_pan(p),
                Err(_) => println!("expected a number, got {p}"),
            },
            (Some("cont"), Some("on")) => engine.set_continuous(true),
            (Some("cont"), Some("off")) => engine.set_continuous(false),
            (Some("stop"), _) => engine.stop(),
            (Some("status"), _) => {
                println!("{}", serde_json::to_string(&engine.snapshot())?);
                continue;
            }
            (Some("quit"), _) => break,
            (None, _) => continue,
            (Some(other), _) => {
                println!("unknown command: {other}");
                continue;
            }
        }
        // Commands apply on the next render callback; give it one block.
        std::thread::sleep(std::time::Duration::from_millis(30));
        println!("{}", serde_json::to_string(&engine.snapshot())?);
    }

    engine.shutdown();
    Ok(())
}

/// Offline render of one press: onset ramp, tone, auto-stop fade, short tail.
fn render_command(args: RenderArgs) -> Result<(), Box<dyn std::error::Error>> {
    use hound::{SampleFormat, WavSpec, WavWriter};

    let mut controller = PlaybackController::new(args.sample_rate as f32, CONFIG.clone());
    if args.source == Source::Custom {
        controller.set_pan(args.pan);
    }
    controller.press(args.source);

    let spec = WavSpec {
        channels: 2,
        sample_rate: args.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(&args.out, spec)?;

    // One-shot window plus a tail block proving the fade completed.
    let total_frames = ((CONFIG.one_shot_secs + 0.1) * args.sample_rate as f64) as usize;
    let mut remaining = total_frames;
    let mut buffer = vec![0.0f32; 512 * 2];
    while remaining > 0 {
        let frames = 512.min(remaining);
        buffer.resize(frames * 2, 0.0);
        controller.process_block(&mut buffer);
        for sample in &buffer[..frames * 2] {
            let s = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer.write_sample(s)?;
        }
        remaining -= frames;
    }

    writer.finalize()?;
    println!("Rendered {:?} press to {}", args.source, args.out);
    Ok(())
}
