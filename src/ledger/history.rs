use crate::ledger::types::{GameRound, HistoryLedger, User};

/// Prepend `round` to the owner's history, creating the entry on first use.
/// Earlier rounds are never touched.
pub fn record(history: &mut HistoryLedger, user: &User, round: GameRound) {
    let entry = history.entry(user.id.clone()).or_default();
    if entry.usuario.is_empty() {
        entry.usuario = user.nombre.clone();
    }
    entry.partidas.insert(0, round);
}

/// The `limit` most recent rounds; `limit <= 0` means all of them
pub fn recent(rounds: &[GameRound], limit: i64) -> &[GameRound] {
    if limit > 0 {
        &rounds[..rounds.len().min(limit as usize)]
    } else {
        rounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::types::RoundResult;

    fn round(stake: u64) -> GameRound {
        GameRound {
            user_id: "1".to_string(),
            game: "dados".to_string(),
            stake,
            details: String::new(),
            result: RoundResult::Lost,
            payout: 0,
            balance_before: 100,
            balance_after: 100 - stake,
            timestamp: Default::default(),
        }
    }

    #[test]
    fn test_record_prepends_newest_first() {
        let user = User::new("1".to_string(), "Zack".to_string(), "Zeta123".to_string(), 100);
        let mut history = HistoryLedger::new();

        record(&mut history, &user, round(10));
        record(&mut history, &user, round(20));

        let entry = &history["1"];
        assert_eq!(entry.usuario, "Zack");
        assert_eq!(entry.partidas.len(), 2);
        assert_eq!(entry.partidas[0].stake, 20);
        assert_eq!(entry.partidas[1].stake, 10);
    }

    #[test]
    fn test_recent_limits() {
        let rounds: Vec<_> = (1..=4).map(round).collect();
        assert_eq!(recent(&rounds, 2).len(), 2);
        assert_eq!(recent(&rounds, 10).len(), 4);
        assert_eq!(recent(&rounds, 0).len(), 4);
        assert_eq!(recent(&rounds, -3).len(), 4);
    }
}
