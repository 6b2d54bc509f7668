//! Ball Pit entry point
//!
//! Headless runner: loads a config, builds the room and drives the
//! simulation through the fixed-step clock at a steady frame rate.
//!
//! Usage: `ball-pit [config.json] [ball_count]`

#[cfg(target_arch = "wasm32")]
compile_error!("the ball-pit runner needs native worker threads; use the library on wasm32");

mod native {
    use std::error::Error;
    use std::time::Instant;

    use ball_pit::sim::build_room;
    use ball_pit::{InstanceBuffer, Simulation, SimulationConfig};

    /// Simulated time per run (seconds)
    const RUN_SECONDS: f32 = 10.0;
    /// Frame time fed to the clock (60 Hz display)
    const FRAME_DT: f32 = 1.0 / 60.0;

    fn load_config(args: &[String]) -> Result<SimulationConfig, Box<dyn Error>> {
        let mut config = match args.first() {
            Some(path) => SimulationConfig::load(path)?,
            None => {
                log::info!("No config given, using defaults");
                SimulationConfig::default()
            }
        };
        if let Some(arg) = args.get(1) {
            match arg.parse::<usize>() {
                Ok(count) if count > 0 => config = config.with_ball_count(count),
                _ => log::warn!(
                    "Ignoring ball count {arg:?}, using {}",
                    config.ball_count
                ),
            }
        }
        config.validate()?;
        Ok(config)
    }

    pub fn run(args: &[String]) -> Result<(), Box<dyn Error>> {
        let config = load_config(args)?;
        let colliders = build_room(&config.room);
        let mut sim = Simulation::new(config, colliders)?;
        let mut instances = InstanceBuffer::with_capacity(sim.balls().len());

        let frames = (RUN_SECONDS / FRAME_DT).round() as u32;
        let started = Instant::now();
        let mut wall_contacts = 0;
        let mut ball_contacts = 0;

        for frame in 1..=frames {
            let ticks = sim.advance(FRAME_DT);
            if ticks > 0 {
                let stats = sim.last_stats();
                wall_contacts += stats.wall_contacts;
                ball_contacts += stats.ball_contacts;
            }
            instances.update(sim.balls());

            if frame % 60 == 0 {
                let stats = sim.last_stats();
                log::info!(
                    "t={:.1}s tick {}: {} wall contacts, {} ball contacts, {} cells, KE {:.1}",
                    frame as f32 * FRAME_DT,
                    stats.tick,
                    stats.wall_contacts,
                    stats.ball_contacts,
                    stats.occupied_cells,
                    sim.balls().kinetic_energy()
                );
            }
        }

        let elapsed = started.elapsed().as_secs_f64();
        let ticks = sim.tick_count();
        log::info!(
            "Ran {} ticks for {} balls in {:.2}s ({:.1} ticks/s) on {} workers",
            ticks,
            sim.balls().len(),
            elapsed,
            ticks as f64 / elapsed.max(f64::EPSILON),
            sim.workers()
        );
        log::info!(
            "Sampled {} wall and {} ball contacts, {} render batches per frame",
            wall_contacts,
            ball_contacts,
            instances.batch_count()
        );
        Ok(())
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Ball Pit (native) starting...");

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = native::run(&args) {
        log::error!("{e}");
        eprintln!("ball-pit: {e}");
        std::process::exit(1);
    }
}
