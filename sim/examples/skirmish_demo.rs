//! Headless skirmish between two teams.
//!
//! Run with: cargo run --example skirmish_demo
//! Set `RUST_LOG=skirmish_sim=debug` for per-tick summaries.

use glam::Vec2;
use skirmish_sim::{SimConfig, SimWorld, Team, UnitStats};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();
    println!("=== Skirmish - Simulation Demo ===\n");

    let mut sim = match SimWorld::new_battlefield(SimConfig::default()) {
        Ok(sim) => sim,
        Err(e) => {
            eprintln!("failed to build simulation: {e}");
            return;
        }
    };

    // Team one starts at the bottom and heads up; team two the reverse.
    let squads = [
        (Team::One, Vec2::new(300.0, 800.0), UnitStats::melee(2.0, 2.0, 3.0)),
        (Team::One, Vec2::new(600.0, 820.0), UnitStats::ranged(2.0, 3.0, 2.0)),
        (Team::Two, Vec2::new(300.0, 100.0), UnitStats::ranged(3.0, 2.0, 2.0)),
        (Team::Two, Vec2::new(600.0, 80.0), UnitStats::melee(1.0, 3.0, 3.0)),
    ];
    for (team, pos, stats) in squads {
        if let Err(e) = sim.spawn_squad(team, pos, stats) {
            eprintln!("squad for team {} rejected: {e}", team.number());
        }
    }
    sim.spawn_block(Team::One, Vec2::new(450.0, 750.0), 64, 14.0, UnitStats::melee(4.0, 1.0, 2.0));
    sim.spawn_block(Team::Two, Vec2::new(450.0, 150.0), 64, 14.0, UnitStats::melee(4.0, 1.0, 2.0));

    print_summary(&sim);

    let playfield = sim.config().playfield;
    let mut score = [0usize; 2];

    // 20 seconds of frames at a ragged ~50 fps.
    for frame in 0..1000 {
        let frame_dt = if frame % 3 == 0 { 0.025 } else { 0.018 };
        sim.step(frame_dt);

        // Units that reach the far edge score for their team.
        let arrived = sim.remove_at_boundary(|u| match u.team {
            Team::One => u.position.y <= u.radius,
            Team::Two => u.position.y >= playfield.y - u.radius,
        });
        for unit in arrived {
            score[unit.team.slot()] += 1;
        }

        if (frame + 1) % 200 == 0 {
            println!(
                "--- Tick {} (t={:.1}s) score {}:{} ---",
                sim.current_tick(),
                sim.current_time(),
                score[0],
                score[1]
            );
            print_summary(&sim);
        }
    }

    println!("\n=== Final Score: team one {} / team two {} ===", score[0], score[1]);
}

fn print_summary(sim: &SimWorld) {
    let snapshot = sim.snapshot();
    for team in [Team::One, Team::Two] {
        let units: Vec<_> = snapshot.team_units(team).collect();
        let health: f32 = units.iter().map(|u| u.health).sum();
        println!(
            "  Team {}: {} units, total hp {:.0}",
            team.number(),
            units.len(),
            health
        );
    }
    println!(
        "  projectiles in flight: {}, last tick: {:?}",
        snapshot.projectiles.len(),
        snapshot.stats
    );
}
