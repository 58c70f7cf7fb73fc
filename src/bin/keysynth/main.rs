//! keysynth - terminal polyphonic synthesizer
//!
//! Run with: cargo run -- --unison 3 --mode poly

mod app;
mod input;
mod ui;

use std::{
    fs::File,
    path::{Path, PathBuf},
};

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{Result as EyreResult, WrapErr};
use keysynth::{KeyMode, SynthConfig};

#[derive(Parser, Debug)]
#[command(name = "keysynth")]
#[command(about = "Polyphonic wavetable synth driven by MIDI or the computer keyboard", long_about = None)]
struct Cli {
    /// Frequency of A4 in Hz
    #[arg(long, default_value = "440.0")]
    tuning: f32,

    /// Number of voices in the pool
    #[arg(short, long, default_value = "16")]
    voices: usize,

    /// Maximum simultaneous notes (defaults to the pool size)
    #[arg(short, long)]
    poly: Option<usize>,

    /// Voices stacked per note
    #[arg(short, long, default_value = "1")]
    unison: usize,

    /// Key mode
    #[arg(short, long, value_enum, default_value = "poly")]
    mode: ModeArg,

    /// Unison detune spread in cents
    #[arg(long, default_value = "12.0")]
    detune: f32,

    /// Connect to the first MIDI input whose name contains this text
    #[arg(long)]
    midi_port: Option<String>,

    /// Only listen to this MIDI channel (1-16); all channels when omitted
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=16))]
    midi_channel: Option<u8>,

    /// List MIDI input ports and exit
    #[arg(long)]
    list_midi: bool,

    /// Log file (the terminal belongs to the UI)
    #[arg(long, default_value = "keysynth.log")]
    log_file: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Poly,
    Mono,
    Legato,
}

impl From<ModeArg> for KeyMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Poly => KeyMode::Poly,
            ModeArg::Mono => KeyMode::Mono,
            ModeArg::Legato => KeyMode::Legato,
        }
    }
}

impl Cli {
    fn config(&self) -> SynthConfig {
        SynthConfig::default()
            .with_tuning(self.tuning)
            .with_pool_size(self.voices)
            .with_poly_count(self.poly.unwrap_or(self.voices))
            .with_unison(self.unison)
            .with_key_mode(self.mode.into())
            .with_detune(self.detune)
    }
}

fn init_logging(path: &Path) -> EyreResult<()> {
    let file = File::create(path)
        .wrap_err_with(|| format!("failed to create log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    if cli.list_midi {
        for (i, name) in input::list_midi_ports()?.iter().enumerate() {
            println!("{i}: {name}");
        }
        return Ok(());
    }

    init_logging(&cli.log_file)?;
    let config = cli.config();
    config.validate().wrap_err("invalid synth settings")?;

    let mut terminal = ratatui::init();
    let midi_channel = cli.midi_channel.map(|channel| channel - 1);
    let result = app::run(config, cli.midi_port.as_deref(), midi_channel, &mut terminal);
    ratatui::restore();
    result
}
