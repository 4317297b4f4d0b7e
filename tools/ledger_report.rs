use cancinhub::{
    ledger::{JsonFileStore, LedgerStore},
    stats::{aggregate, HistoryQuery},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let data_dir = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "./base_data".to_string());
    let only_user = std::env::args().nth(2);

    let store = JsonFileStore::new(&data_dir);
    println!(
        "Reading ledgers: {} and {}",
        store.users_path().display(),
        store.history_path().display()
    );
    let users = store.load_users().await?;
    let history = store.load_history().await?;

    let mut inconsistent = 0;
    for (id, user) in &users {
        if only_user.as_deref().is_some_and(|wanted| wanted != id) {
            continue;
        }

        let rounds = history.get(id).map(|h| h.partidas.as_slice()).unwrap_or(&[]);
        let stats = aggregate(rounds, &HistoryQuery::all());

        println!(
            "{:>6}  {:<20} fichas={:<8} partidas={:<5} ganadas={:<5} balance={:<8} favorito={} racha={}",
            id,
            user.nombre,
            user.fichas,
            user.stats.partidas_totales,
            stats.won,
            stats.balance,
            stats.favorite_game,
            stats.streak
        );

        if !user.stats.is_consistent() {
            inconsistent += 1;
            println!("        counters do not add up: {:?}", user.stats);
        }
    }

    let orphaned: Vec<_> = history.keys().filter(|id| !users.contains_key(*id)).collect();
    if !orphaned.is_empty() {
        println!("History without account: {:?}", orphaned);
    }

    println!(
        "{} users, {} histories, {} with inconsistent counters",
        users.len(),
        history.len(),
        inconsistent
    );

    Ok(())
}
