//! Star Relay entry point
//!
//! The browser build is driven through `star_relay::web`. Natively this runs
//! both minigames headless with an autopilot marker and logs the outcome.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use star_relay::sim::{Marker, MoveInput, Session, Variant};
    use star_relay::{LogSink, Settings};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Star Relay (native) starting...");

    let settings = match std::env::args().nth(1) {
        Some(path) => match Settings::load_from(std::path::Path::new(&path)) {
            Ok(settings) => settings,
            Err(e) => {
                log::error!("Cannot use settings from {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => Settings::default(),
    };

    let seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    let mut session = Session::new(settings, seed);
    let mut sink = LogSink;
    let idle = MoveInput::default();

    // Single: stand in front of the boss and send the beam back out at 60°
    session.place_marker(Marker {
        pos: glam::Vec2::new(100.0, 0.0),
        aim_degrees: 150.0,
    });
    session.start(Variant::Single, &mut sink);
    run_to_idle(&mut session, Variant::Single, &idle, &mut sink);

    // Relay: take the assigned role's spot and aim at the next node
    session.start(Variant::Relay, &mut sink);
    if let Some(marker) = autopilot::relay_marker(&session) {
        session.place_marker(marker);
    }
    run_to_idle(&mut session, Variant::Relay, &idle, &mut sink);

    log::info!("Done after {}ms of game time", session.now_ms());
}

#[cfg(not(target_arch = "wasm32"))]
fn run_to_idle(
    session: &mut star_relay::sim::Session,
    variant: star_relay::sim::Variant,
    input: &star_relay::sim::MoveInput,
    sink: &mut star_relay::LogSink,
) {
    use star_relay::sim::{RunPhase, Variant};

    const FRAME_MS: u64 = 16;
    loop {
        session.update(FRAME_MS, input, sink);
        let phase = match variant {
            Variant::Single => session.single().state().phase,
            Variant::Relay => session.relay().state().phase,
        };
        if phase == RunPhase::Idle {
            break;
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod autopilot {
    use star_relay::sim::geometry::angle_degrees;
    use star_relay::sim::{Marker, Node, RELAY_SEQUENCE, Session};

    /// Marker pose at the controlled role's formation spot, aimed along the chain
    pub fn relay_marker(session: &Session) -> Option<Marker> {
        let formation = session.relay().formation()?;
        let controlled = formation.assignment.controlled;
        let pos = session
            .settings()
            .arena()
            .clamp(controlled.formation_position(formation.portal_pos));

        let next = RELAY_SEQUENCE
            .iter()
            .find(|hop| hop.from == Node::Role(controlled))
            .map(|hop| hop.to);
        let target = match next {
            Some(Node::Portal) => Some(formation.portal_pos),
            Some(Node::Role(role)) => formation.positions.get(&role).copied(),
            _ => None,
        };

        Some(Marker {
            pos,
            aim_degrees: target.map_or(0.0, |t| angle_degrees(pos, t)),
        })
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is star_relay::web::start, this is just to satisfy the compiler
}
