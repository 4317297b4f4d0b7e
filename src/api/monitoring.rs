//! Metrics collection
//!
//! Lock-free counters for settled rounds and ledger health, exported in the
//! Prometheus text format at `/metrics`.

use crate::games::types::GameType;
use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Instant,
};

/// Per-game round counters
#[derive(Default)]
struct GameCounters {
    rounds: AtomicU64,
    wins: AtomicU64,
    staked: AtomicU64,
    paid: AtomicU64,
}

/// Prometheus-compatible metrics registry
#[derive(Clone)]
pub struct MetricsRegistry {
    inner: Arc<Inner>,
}

struct Inner {
    started: Instant,
    games: [GameCounters; 4],
    deposits_total: AtomicU64,
    chips_deposited_total: AtomicU64,
    registrations_total: AtomicU64,
    rejected_bets_total: AtomicU64,
    rollbacks_total: AtomicU64,
    http_requests_total: AtomicU64,
    http_errors_total: AtomicU64,
}

fn slot(game: GameType) -> usize {
    match game {
        GameType::Dice => 0,
        GameType::Roulette => 1,
        GameType::HorseRace => 2,
        GameType::Slots => 3,
    }
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                started: Instant::now(),
                games: Default::default(),
                deposits_total: AtomicU64::new(0),
                chips_deposited_total: AtomicU64::new(0),
                registrations_total: AtomicU64::new(0),
                rejected_bets_total: AtomicU64::new(0),
                rollbacks_total: AtomicU64::new(0),
                http_requests_total: AtomicU64::new(0),
                http_errors_total: AtomicU64::new(0),
            }),
        }
    }

    /// Record a settled round
    pub fn record_round(&self, game: GameType, stake: u64, won: bool, payout: u64) {
        let counters = &self.inner.games[slot(game)];
        counters.rounds.fetch_add(1, Ordering::Relaxed);
        counters.staked.fetch_add(stake, Ordering::Relaxed);
        if won {
            counters.wins.fetch_add(1, Ordering::Relaxed);
            counters.paid.fetch_add(payout, Ordering::Relaxed);
        }
    }

    /// Bet refused before settlement (bad credentials, funds or choice)
    pub fn record_rejected_bet(&self) {
        self.inner.rejected_bets_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Mutation undone after a persistence failure
    pub fn record_rollback(&self) {
        self.inner.rollbacks_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_deposit(&self, amount: u64) {
        self.inner.deposits_total.fetch_add(1, Ordering::Relaxed);
        self.inner.chips_deposited_total.fetch_add(amount, Ordering::Relaxed);
    }

    pub fn record_registration(&self) {
        self.inner.registrations_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_http_request(&self, success: bool) {
        self.inner.http_requests_total.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.inner.http_errors_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn rounds(&self, game: GameType) -> u64 {
        self.inner.games[slot(game)].rounds.load(Ordering::Relaxed)
    }

    pub fn wins(&self, game: GameType) -> u64 {
        self.inner.games[slot(game)].wins.load(Ordering::Relaxed)
    }

    pub fn rejected_bets(&self) -> u64 {
        self.inner.rejected_bets_total.load(Ordering::Relaxed)
    }

    pub fn rollbacks(&self) -> u64 {
        self.inner.rollbacks_total.load(Ordering::Relaxed)
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.inner.started.elapsed().as_secs()
    }

    /// Generate Prometheus metrics format
    pub fn to_prometheus_format(&self) -> String {
        let mut output = String::new();

        let per_game: [(&str, &str, fn(&GameCounters) -> u64); 4] = [
            ("cancinhub_rounds_total", "Settled rounds", |c| c.rounds.load(Ordering::Relaxed)),
            ("cancinhub_wins_total", "Rounds won by the player", |c| c.wins.load(Ordering::Relaxed)),
            ("cancinhub_chips_staked_total", "Chips wagered", |c| c.staked.load(Ordering::Relaxed)),
            ("cancinhub_chips_paid_total", "Chips credited on wins", |c| c.paid.load(Ordering::Relaxed)),
        ];

        for (name, help, read) in per_game {
            output.push_str(&format!("# HELP {} {}\n# TYPE {} counter\n", name, help, name));
            for game in GameType::ALL {
                output.push_str(&format!(
                    "{}{{game=\"{}\"}} {}\n",
                    name,
                    game.as_str(),
                    read(&self.inner.games[slot(game)])
                ));
            }
            output.push('\n');
        }

        let losses: u64 = self
            .inner
            .games
            .iter()
            .map(|c| c.rounds.load(Ordering::Relaxed).saturating_sub(c.wins.load(Ordering::Relaxed)))
            .sum();

        let scalars = [
            ("cancinhub_losses_total", "Rounds lost by the player", "counter", losses),
            ("cancinhub_rejected_bets_total", "Bets refused before settlement", "counter", self.rejected_bets()),
            ("cancinhub_rollbacks_total", "Mutations rolled back after a failed save", "counter", self.rollbacks()),
            ("cancinhub_deposits_total", "Bank top-ups", "counter", self.inner.deposits_total.load(Ordering::Relaxed)),
            ("cancinhub_chips_deposited_total", "Chips added through the bank", "counter", self.inner.chips_deposited_total.load(Ordering::Relaxed)),
            ("cancinhub_registrations_total", "Accounts created", "counter", self.inner.registrations_total.load(Ordering::Relaxed)),
            ("cancinhub_http_requests_total", "HTTP requests served", "counter", self.inner.http_requests_total.load(Ordering::Relaxed)),
            ("cancinhub_http_errors_total", "HTTP requests answered with an error status", "counter", self.inner.http_errors_total.load(Ordering::Relaxed)),
            ("cancinhub_uptime_seconds", "Seconds since startup", "gauge", self.uptime_seconds()),
        ];

        for (name, help, kind, value) in scalars {
            output.push_str(&format!(
                "# HELP {} {}\n# TYPE {} {}\n{} {}\n\n",
                name, help, name, kind, name, value
            ));
        }

        output
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_counters() {
        let metrics = MetricsRegistry::new();
        metrics.record_round(GameType::Dice, 10, true, 60);
        metrics.record_round(GameType::Dice, 10, false, 0);
        metrics.record_round(GameType::Slots, 5, false, 0);

        assert_eq!(metrics.rounds(GameType::Dice), 2);
        assert_eq!(metrics.wins(GameType::Dice), 1);
        assert_eq!(metrics.rounds(GameType::Slots), 1);
        assert_eq!(metrics.rounds(GameType::Roulette), 0);
    }

    #[test]
    fn test_prometheus_output() {
        let metrics = MetricsRegistry::new();
        metrics.record_round(GameType::HorseRace, 50, true, 150);
        metrics.record_round(GameType::Dice, 10, false, 0);
        metrics.record_rejected_bet();
        metrics.record_rollback();

        let text = metrics.to_prometheus_format();

        assert!(text.contains("# TYPE cancinhub_rounds_total counter"));
        assert!(text.contains("cancinhub_rounds_total{game=\"carreras\"} 1"));
        assert!(text.contains("cancinhub_chips_paid_total{game=\"carreras\"} 150"));
        assert!(text.contains("cancinhub_losses_total 1"));
        assert!(text.contains("cancinhub_rejected_bets_total 1"));
        assert!(text.contains("cancinhub_rollbacks_total 1"));
    }

    #[test]
    fn test_clones_share_counters() {
        let metrics = MetricsRegistry::new();
        let clone = metrics.clone();
        clone.record_rejected_bet();
        assert_eq!(metrics.rejected_bets(), 1);
    }
}
