//! Smath entry point
//!
//! Native driver: generates a puzzle and plays it through along its solution
//! path. Rendering and physics hosts drive `PuzzleState` the same way.
//!
//! Usage: `smath [seed] [easy|medium|hard]`

use glam::Vec2;

use smath::settings::{Difficulty, Settings};
use smath::sim::{GameEvent, GamePhase, PuzzleState, Viewport};

/// Default visible area (16:9 at orthographic size 5)
const VIEWPORT: Viewport = Viewport {
    width: 17.8,
    height: 10.0,
};

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed = args
        .next()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(12345);
    let difficulty = args
        .next()
        .and_then(|s| Difficulty::from_str(&s))
        .unwrap_or_default();

    log::info!("Smath (native) starting: seed {}, {}", seed, difficulty.as_str());

    if let Err(e) = run(seed, difficulty) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Web hosts drive the library directly
}

#[cfg(not(target_arch = "wasm32"))]
fn run(seed: u64, difficulty: Difficulty) -> Result<(), Box<dyn std::error::Error>> {
    let mut state = PuzzleState::new(seed, Settings::from_preset(difficulty), VIEWPORT)?;
    let target = state.play()?;

    println!("= {target}");
    for token in state.tokens() {
        println!(
            "  [{:>3}] {:>5}  at ({:>5.1}, {:>5.1})",
            token.id,
            token.label(),
            token.motion.pos.x,
            token.motion.pos.y
        );
    }

    let solution = state
        .cached_puzzle()
        .map(|p| p.solution().to_vec())
        .unwrap_or_default();
    let ids: Vec<u32> = solution
        .iter()
        .filter_map(|spec| state.tokens().iter().find(|t| t.spec() == *spec))
        .map(|t| t.id)
        .collect();

    let Some((&base, steps)) = ids.split_first() else {
        return Ok(());
    };
    for &step in steps {
        state.release(step, Vec2::X)?;
        state.collide(step, base)?;
        if let Some(token) = state.token(base) {
            println!("  -> {}", token.label());
        }
        if state.phase() == GamePhase::Solved {
            break;
        }
    }

    for event in state.drain_events() {
        if let GameEvent::Solved { target } = event {
            println!("Solved! {target}");
        }
    }
    Ok(())
}
