mod common;

use chrono::{Duration, Utc};
use uuid::Uuid;

use matchday::db::{fixture_repo, prediction_repo};
use matchday::models::{Pick, Scoreline, ThreeWayOdds};
use matchday::scoring::{score_prediction, Wager};
use matchday::services::settlement::settle_fixture;

use common::dec;

fn odds(home: &str, draw: &str, away: &str) -> ThreeWayOdds {
    ThreeWayOdds {
        home: dec(home),
        draw: dec(draw),
        away: dec(away),
    }
}

#[tokio::test]
async fn test_second_lock_loses_and_changes_nothing() {
    let pool = common::setup_test_db().await;
    let config = common::test_config();
    let now = common::unique_now();

    let fixture = common::seed_fixture(
        &pool, &config.season, Some(1), "Arsenal", "Chelsea", now + Duration::hours(6),
    )
    .await;

    let won = fixture_repo::lock_odds(&pool, fixture.id, &odds("2.0", "3.0", "4.0"), Some("bet365"), now)
        .await
        .unwrap();
    assert!(won);
    let first = common::get_fixture(&pool, fixture.id).await;

    let won = fixture_repo::lock_odds(
        &pool,
        fixture.id,
        &odds("1.5", "4.5", "6.0"),
        Some("skybet"),
        now + Duration::minutes(5),
    )
    .await
    .unwrap();
    assert!(!won);

    let after = common::get_fixture(&pool, fixture.id).await;
    assert_eq!(after.odds_home, Some(dec("2.0")));
    assert_eq!(after.odds_draw, Some(dec("3.0")));
    assert_eq!(after.odds_away, Some(dec("4.0")));
    assert_eq!(after.odds_bookmaker.as_deref(), Some("bet365"));
    assert_eq!(after.odds_locked_at, first.odds_locked_at);
}

#[tokio::test]
async fn test_second_settle_loses_and_changes_nothing() {
    let pool = common::setup_test_db().await;
    let config = common::test_config();
    let now = common::unique_now();

    let fixture = common::seed_fixture(
        &pool, &config.season, Some(1), "Everton", "Fulham", now,
    )
    .await;
    let pred = common::seed_prediction(
        &pool, Uuid::new_v4(), fixture.id, None, "H", Some("2.5"), Scoreline::new(2, 1),
    )
    .await;

    let wager = Wager {
        pick: Pick::Home,
        stake: 10,
        locked_odds: Some(dec("2.5")),
        forecast: Scoreline::new(2, 1),
    };
    let exact = score_prediction(&wager, Scoreline::new(2, 1), None);
    let wrong = score_prediction(&wager, Scoreline::new(0, 3), None);

    assert!(prediction_repo::settle_prediction(&pool, pred.id, &exact, Utc::now()).await.unwrap());
    let first = common::get_prediction(&pool, pred.id).await;
    assert_eq!(first.points_awarded, Some(15));
    assert_eq!(first.bonus_exact_score_points, Some(23));

    let won = prediction_repo::settle_prediction(&pool, pred.id, &wrong, Utc::now() + Duration::minutes(1))
        .await
        .unwrap();
    assert!(!won);

    let after = common::get_prediction(&pool, pred.id).await;
    assert_eq!(after.points_awarded, Some(15));
    assert_eq!(after.bonus_exact_score_points, Some(23));
    assert_eq!(after.settled_at, first.settled_at);
}

#[tokio::test]
async fn test_concurrent_settlement_settles_each_prediction_once() {
    let pool = common::setup_test_db().await;
    let config = common::test_config();
    let now = common::unique_now();

    let fixture = common::seed_fixture(
        &pool, &config.season, Some(1), "Leeds", "Wolves", now,
    )
    .await;
    let mut ids = Vec::new();
    for (pick, forecast) in [
        ("H", Scoreline::new(2, 0)),
        ("H", Scoreline::new(1, 0)),
        ("D", Scoreline::new(1, 1)),
        ("A", Scoreline::new(0, 2)),
        ("H", Scoreline::new(3, 1)),
    ] {
        let p = common::seed_prediction(
            &pool, Uuid::new_v4(), fixture.id, None, pick, Some("3.0"), forecast,
        )
        .await;
        ids.push(p.id);
    }

    let score = Scoreline::new(2, 0);
    let (a, b) = tokio::join!(
        settle_fixture(&pool, fixture.id, Some(score)),
        settle_fixture(&pool, fixture.id, Some(score)),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(a.predictions_settled + b.predictions_settled, ids.len());
    assert_eq!(a.failed + b.failed, 0);
    // Anything both runs read was settled by exactly one of them.
    assert_eq!(
        a.already_settled + b.already_settled,
        a.predictions_considered + b.predictions_considered - ids.len()
    );

    for id in ids {
        let p = common::get_prediction(&pool, id).await;
        assert!(p.settled_at.is_some());
    }
    // 10 x 3.0 - 10 = 20 for each right result, plus 30 on the exact score.
    let totals: Vec<(i32,)> = sqlx::query_as(
        "SELECT points_awarded + bonus_exact_score_points FROM predictions WHERE fixture_id = $1",
    )
    .bind(fixture.id)
    .fetch_all(&pool)
    .await
    .unwrap();
    let total: i32 = totals.iter().map(|t| t.0).sum();
    assert_eq!(total, 20 + 30 + 20 + 20);
}
