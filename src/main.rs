use std::error::Error;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{CommandFactory, Parser};
use env_logger::{Env, Target};

use chip8_tui::app::run_session;
use chip8_tui::config::{Config, DEFAULT_CLOCK_HZ, DEFAULT_TIMER_HZ};
use chip8_tui::dashboard::Dashboard;
use chip8_tui::frontend::ChannelFrontend;
use chip8_tui::input::{TermInput, CONTROLS};
use chip8_tui::scheduler::Machine;

const DEFAULT_KEY_RELEASE_MS: u64 = 100;

/// Run a CHIP-8 program in the terminal, with a view of the machine's insides.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// CHIP-8 program to load
    rom: Option<PathBuf>,

    /// Instructions per second
    #[arg(long, default_value_t = DEFAULT_CLOCK_HZ)]
    clock_hz: u32,

    /// Delay and sound timer rate
    #[arg(long, default_value_t = DEFAULT_TIMER_HZ)]
    timer_hz: u32,

    /// Release keys this long after the last key press; 0 keeps them down
    #[arg(long, default_value_t = DEFAULT_KEY_RELEASE_MS)]
    key_release_ms: u64,

    /// FX55 and FX65 leave I pointing past the last register
    #[arg(long)]
    quirk_index_increment: bool,

    /// Write logs here instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            clock_hz: self.clock_hz,
            timer_hz: self.timer_hz,
            key_auto_clear: match self.key_release_ms {
                0 => None,
                ms => Some(Duration::from_millis(ms)),
            },
            load_store_increments_index: self.quirk_index_increment,
            ..Config::default()
        }
    }
}

fn usage() -> Result<(), Box<dyn Error>> {
    Cli::command().print_help()?;
    println!();
    println!("Controls:");
    println!("  0-9 a-f  press a keypad key");
    for (c, _, text) in CONTROLS {
        println!("  {:<8} {}", c, text);
    }
    println!("  Esc      quit");
    Ok(())
}

fn init_logging(log_file: Option<&PathBuf>) -> Result<(), Box<dyn Error>> {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("warn"));
    if let Some(path) = log_file {
        builder.target(Target::Pipe(Box::new(File::create(path)?)));
    }
    builder.init();
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let rom_path = match &cli.rom {
        Some(p) => p,
        None => return usage(),
    };
    init_logging(cli.log_file.as_ref())?;

    let (frontend, updates) = ChannelFrontend::new(64);
    let mut machine = Machine::new(cli.config(), Arc::new(frontend));
    let mut rom = File::open(rom_path)?;
    machine.load_program(&mut rom)?;

    let title = rom_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let result = {
        let mut screen = Dashboard::new(&title)?;
        let mut input = TermInput::new();
        run_session(&mut machine, &updates, &mut input, &mut screen)
    };
    if let Err(e) = &result {
        log::error!("{}", e);
    }
    result?;
    Ok(())
}
