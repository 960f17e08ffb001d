/// glowslab Terminal Demo - Glowing translucent slab
/// 
/// Renders an opaque plane inside a stack of translucent layers whose depth
/// oscillates over a ten second cycle, with a smoothed FPS readout.
/// Controls:
///   - Q/ESC: Quit
///
/// Logs go to stderr; set RUST_LOG=debug and redirect stderr to a file to see them.

use clap::Parser;
use glowslab_core::config::DEFAULT_LAYER_COUNT;
use glowslab_terminal::TerminalApp;
use log::info;

#[derive(Parser, Debug)]
#[command(name = "glowslab-terminal", about = "Render the glowing slab scene in the terminal")]
struct Args {
    /// Number of translucent layers in the slab (at least 2)
    #[arg(short, long, default_value_t = DEFAULT_LAYER_COUNT)]
    layers: usize,

    /// Refresh rate driving the frame ticks
    #[arg(long, default_value_t = 30)]
    fps: u32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    info!("Building scene with {} layers at {} Hz", args.layers, args.fps);
    let mut app = TerminalApp::new(args.layers, args.fps)?;
    app.run()?;

    println!("Thank you for using the glowslab terminal renderer!");
    Ok(())
}
