//! Headless race peer. Hosts a match (with optional bots) or joins one
//! over the LAN, running the fixed-rate simulation loop without any
//! presentation layer.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use mazerush_core::time::now_ms;
use mazerush_game::config::SimConfig;
use mazerush_game::{RaceSim, SimEvent};
use mazerush_net::session::{NetEvent, NetSession};
use mazerush_net::{NetConfig, discovery, wire};

struct Options {
    /// `--join=<ip>` joins that host, bare `--join=` browses the LAN;
    /// absent means host a match ourselves.
    join: Option<String>,
    name: String,
    bots: u32,
    bot_speed: f32,
}

fn flag(name: &str) -> Option<String> {
    let prefix = format!("--{name}=");
    std::env::args().find_map(|a| a.strip_prefix(&prefix).map(String::from))
}

impl Options {
    fn from_args() -> Self {
        Options {
            join: flag("join"),
            name: flag("name").unwrap_or_else(|| "Player".to_string()),
            bots: flag("bots").and_then(|v| v.parse().ok()).unwrap_or(0),
            bot_speed: flag("bot-speed").and_then(|v| v.parse().ok()).unwrap_or(0.45),
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let opts = Options::from_args();
    let sim_config = SimConfig::load();
    let net_config = NetConfig::default();
    let id = Uuid::new_v4().to_string();

    match &opts.join {
        None => host(&opts, &id, sim_config, &net_config).await,
        Some(raw) => {
            let addr = raw.parse::<IpAddr>().ok();
            join(&opts, &id, sim_config, &net_config, addr).await;
        },
    }
}

async fn host(opts: &Options, id: &str, sim_config: SimConfig, net_config: &NetConfig) {
    let seed = now_ms();
    let mut sim = RaceSim::new(seed, id, &opts.name, true, sim_config);
    sim.spawn_bots(opts.bots, opts.bot_speed);

    let (session, rx) = match NetSession::host(net_config, seed).await {
        Ok(pair) => pair,
        Err(e) => {
            tracing::error!(error = %e, "failed to start hosting");
            std::process::exit(1);
        },
    };
    tracing::info!(seed, bots = opts.bots, "match open");
    run_loop(sim, session, rx, true).await;
}

async fn join(
    opts: &Options,
    id: &str,
    sim_config: SimConfig,
    net_config: &NetConfig,
    addr: Option<IpAddr>,
) {
    // No explicit address: browse the LAN and take the first host heard.
    let (host_ip, seed) = match addr {
        Some(ip) => (ip, 0),
        None => match discovery::find_hosts(net_config).await {
            Ok(hosts) if !hosts.is_empty() => (hosts[0].addr, hosts[0].seed),
            Ok(_) => {
                tracing::error!("no race hosts found");
                std::process::exit(1);
            },
            Err(e) => {
                tracing::error!(error = %e, "discovery failed");
                std::process::exit(1);
            },
        },
    };

    let host_addr = SocketAddr::new(host_ip, net_config.state_port);
    let (session, rx) = match NetSession::connect(host_addr).await {
        Ok(pair) => pair,
        Err(e) => {
            tracing::error!(error = %e, "failed to join {host_addr}");
            std::process::exit(1);
        },
    };

    // A zero seed is a placeholder; the host pushes the real one after
    // our first snapshot registers.
    let sim = RaceSim::new(seed, id, &opts.name, false, sim_config);
    run_loop(sim, session, rx, false).await;
}

/// Pause between a finished match and the host rolling a rematch, long
/// enough for everyone to see the final standings.
const RESTART_DELAY_MS: u64 = 5000;

/// Host-side rematch bookkeeping: once the match ends, arm a deadline
/// and roll a fresh clock-derived seed when it elapses.
#[derive(Default)]
struct RestartTimer {
    at: u64,
}

impl RestartTimer {
    /// Returns the new seed once the rematch fires, with the local
    /// simulation already regenerated on it; the caller broadcasts it.
    fn poll(&mut self, sim: &mut RaceSim, now: u64) -> Option<u64> {
        if !sim.game_over {
            self.at = 0;
            return None;
        }
        if self.at == 0 {
            self.at = now + RESTART_DELAY_MS;
            return None;
        }
        if now < self.at {
            return None;
        }
        self.at = 0;
        sim.reset(now);
        Some(now)
    }
}

async fn run_loop(
    mut sim: RaceSim,
    session: NetSession,
    mut rx: UnboundedReceiver<NetEvent>,
    is_host: bool,
) {
    let mut ticker = tokio::time::interval(Duration::from_millis(16));
    let mut restart = RestartTimer::default();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                if is_host {
                    session.send_win(wire::MATCH_ABORTED).await;
                }
                session.stop();
                tracing::info!("shutting down");
                return;
            },
            _ = ticker.tick() => {
                while let Ok(event) = rx.try_recv() {
                    if !apply_net_event(&mut sim, event) {
                        session.stop();
                        return;
                    }
                }
                let now = now_ms();
                for event in sim.tick(now) {
                    match event {
                        SimEvent::CarChanged(car) => session.send_update(&car).await,
                        SimEvent::ItemPickedUp(id) => session.send_item_collected(id).await,
                        SimEvent::ItemRestored(id) => session.send_item_dropped(id).await,
                        SimEvent::Win(winner) => {
                            tracing::info!(%winner, "race over");
                            session.send_win(&winner).await;
                        },
                    }
                }
                if is_host && let Some(seed) = restart.poll(&mut sim, now) {
                    tracing::info!(seed, "starting rematch");
                    session.send_reset(seed).await;
                }
            },
        }
    }
}

/// Returns false when the host aborted the match and the loop should
/// shut down instead of ticking on.
fn apply_net_event(sim: &mut RaceSim, event: NetEvent) -> bool {
    match event {
        NetEvent::PlayerJoined(addr) => tracing::info!(%addr, "player joined"),
        NetEvent::CarUpdate(car) => sim.apply_remote_update(car),
        NetEvent::ItemCollected(id) => sim.disable_item(id),
        NetEvent::ItemDropped(id) => sim.enable_item(id),
        NetEvent::Win(winner) => {
            if winner == wire::MATCH_ABORTED {
                tracing::info!("host aborted the match");
                return false;
            }
            tracing::info!(%winner, "race over");
            sim.apply_win(&winner);
        },
        NetEvent::Seed(seed) => {
            if sim.world.seed != seed {
                tracing::info!(seed, "world seed received");
                sim.reset(seed);
            }
        },
        NetEvent::Reset(seed) => {
            tracing::info!(seed, "match reset");
            sim.reset(seed);
        },
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host_sim() -> RaceSim {
        RaceSim::new(1, "h1", "Host", true, SimConfig::default())
    }

    #[test]
    fn rematch_fires_after_the_delay() {
        let mut sim = host_sim();
        let mut restart = RestartTimer::default();

        assert_eq!(restart.poll(&mut sim, 1000), None, "running match, nothing to do");

        sim.apply_win("Bob");
        assert_eq!(restart.poll(&mut sim, 1000), None, "deadline armed, not fired");
        assert_eq!(restart.poll(&mut sim, 1000 + RESTART_DELAY_MS - 1), None);

        let fired_at = 1000 + RESTART_DELAY_MS;
        assert_eq!(restart.poll(&mut sim, fired_at), Some(fired_at));
        assert!(!sim.game_over);
        assert_eq!(sim.world.seed, fired_at, "world regenerated on the new seed");

        // The next match arms its own deadline from scratch.
        assert_eq!(restart.poll(&mut sim, fired_at + 16), None);
    }

    #[test]
    fn abort_sentinel_stops_instead_of_winning() {
        let mut sim = host_sim();
        assert!(!apply_net_event(
            &mut sim,
            NetEvent::Win(wire::MATCH_ABORTED.to_string())
        ));
        assert!(!sim.game_over, "an abort is not a win");

        assert!(apply_net_event(&mut sim, NetEvent::Win("Bob".to_string())));
        assert!(sim.game_over);
        assert_eq!(sim.winner.as_deref(), Some("Bob"));
    }
}
