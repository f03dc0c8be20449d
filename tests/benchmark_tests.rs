//! Performance benchmarks for the hot paths of a play session

use server::config::ScorePolicy;
use server::game::{ClickOutcome, GameService};
use server::session::MemorySessionStore;
use server::store::{MemoryPuzzleStore, NewHighScore, PuzzleStore, Seed};
use shared::{Character, Position, SessionGameState};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn service() -> GameService {
    GameService::new(
        Arc::new(MemoryPuzzleStore::from_seed(Seed::default()).unwrap()),
        Arc::new(MemorySessionStore::new(Duration::from_secs(60))),
        ScorePolicy::RequireCompletion,
    )
}

/// Benchmarks the square tolerance hit test
#[test]
fn benchmark_hit_test() {
    let character = Character {
        id: 1,
        name: "Waldo".to_string(),
        x: 0.45,
        y: 0.6,
        image_id: 1,
        icon_url: None,
    };

    let iterations = 100_000;
    let start = Instant::now();

    let mut hits = 0;
    for i in 0..iterations {
        let offset = (i % 200) as f64 / 1000.0 - 0.1;
        if character.is_hit_by(&Position::new(0.45 + offset, 0.6 - offset)) {
            hits += 1;
        }
    }

    let duration = start.elapsed();
    println!(
        "Hit test: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert!(hits > 0 && hits < iterations);
    // Should complete in under 100ms for 100k iterations
    assert!(duration.as_millis() < 100);
}

/// Benchmarks the session record codec used by the session store
#[test]
fn benchmark_session_codec() {
    use bincode::{deserialize, serialize};

    let mut state = SessionGameState::started(1, 1_700_000_000_000);
    for id in 0..50 {
        state.mark_found(id);
    }

    let iterations = 10_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let bytes = serialize(&state).unwrap();
        let decoded: SessionGameState = deserialize(&bytes).unwrap();
        assert_eq!(decoded.found_count(), 50);
    }

    let duration = start.elapsed();
    println!(
        "Session codec: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // Should complete in under 2 seconds
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks click validation across many sessions
#[tokio::test]
async fn benchmark_click_validation() {
    let game = service();
    let sessions = 200;

    let mut tokens = Vec::with_capacity(sessions);
    for _ in 0..sessions {
        let (token, _) = game.ensure_session(None, 0).await.unwrap();
        game.start_puzzle(&token, 1, 0).await.unwrap();
        tokens.push(token);
    }

    let start = Instant::now();
    let mut completed = 0;
    for token in &tokens {
        game.validate_click(token, Position::new(0.1, 0.1), 1, 10)
            .await
            .unwrap();
        for (id, position) in [(1, (0.45, 0.6)), (2, (0.7, 0.2)), (3, (0.2, 0.8))] {
            let outcome = game
                .validate_click(token, Position::new(position.0, position.1), id, 1_000)
                .await
                .unwrap();
            if matches!(outcome, ClickOutcome::Completed { .. }) {
                completed += 1;
            }
        }
    }

    let duration = start.elapsed();
    println!(
        "Click validation: {} clicks in {:?} ({:.2} μs/click)",
        sessions * 4,
        duration,
        duration.as_micros() as f64 / (sessions * 4) as f64
    );

    assert_eq!(completed, sessions);
    // Should complete in under 2 seconds
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks leaderboard queries against a large score table
#[test]
fn benchmark_top_scores() {
    let store = MemoryPuzzleStore::from_seed(Seed::default()).unwrap();
    tokio_test::block_on(async {
        for i in 0..10_000u32 {
            store
                .insert_high_score(NewHighScore {
                    name: format!("player{}", i),
                    time: ((i * 7919) % 10_000) as f64 / 10.0,
                    image_id: i % 3 + 1,
                    created_at: i as u64,
                })
                .await
                .unwrap();
        }
    });

    let queries = 30;
    let start = Instant::now();
    for query in 0..queries {
        let top = tokio_test::block_on(store.top_scores(query % 3 + 1, 10)).unwrap();
        assert_eq!(top.len(), 10);
        assert!(top.windows(2).all(|pair| pair[0].time <= pair[1].time));
    }

    let duration = start.elapsed();
    println!(
        "Top scores: {} queries over 10000 rows in {:?}",
        queries, duration
    );

    // Should complete in under 5 seconds
    assert!(duration.as_millis() < 5000);
}

/// Benchmarks terminal command parsing
#[test]
fn benchmark_command_parsing() {
    use client::input::Command;

    let lines = ["click 0.46 0.61 1", "scores", "restart 2", "click 0.1 0.9 3"];
    let iterations = 10_000;
    let start = Instant::now();

    for i in 0..iterations {
        assert!(Command::parse(lines[i % lines.len()]).is_ok());
    }

    let duration = start.elapsed();
    println!("Command parsing: {} lines in {:?}", iterations, duration);

    // Should complete in under 500ms
    assert!(duration.as_millis() < 500);
}
