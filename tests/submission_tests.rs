mod common;

use chrono::Duration;
use uuid::Uuid;

use matchday::models::PredictionRequest;
use matchday::services::submission::{submit_prediction, SubmissionError};

use common::dec;

fn request(user_id: Uuid, fixture_id: Uuid, home: i32, away: i32) -> PredictionRequest {
    PredictionRequest {
        user_id,
        fixture_id,
        league_id: None,
        pick: None,
        pred_home_goals: home,
        pred_away_goals: away,
    }
}

#[tokio::test]
async fn test_submission_captures_odds() {
    let pool = common::setup_test_db().await;
    let config = common::test_config();
    let now = common::unique_now();

    let open = common::seed_fixture(
        &pool, &config.season, Some(1), "Arsenal", "Chelsea", now + Duration::days(2),
    )
    .await;
    common::set_current_odds(&pool, open.id, "2.4", "3.3", "2.9").await;

    let locked = common::seed_fixture(
        &pool, &config.season, Some(1), "Everton", "Fulham", now + Duration::hours(5),
    )
    .await;
    common::set_current_odds(&pool, locked.id, "2.2", "3.1", "3.6").await;
    common::set_locked_odds(&pool, locked.id, "2.0", "3.25", "3.8").await;

    let user = Uuid::new_v4();

    let p = submit_prediction(&pool, &request(user, open.id, 2, 0), config.stake, now)
        .await
        .unwrap();
    assert_eq!(p.pick, "H");
    assert_eq!(p.stake, config.stake);
    assert_eq!(p.locked_odds, Some(dec("2.4")));
    assert!(p.settled_at.is_none());

    let p = submit_prediction(&pool, &request(user, locked.id, 1, 1), config.stake, now)
        .await
        .unwrap();
    assert_eq!(p.pick, "D");
    assert_eq!(p.locked_odds, Some(dec("3.25")));
}

#[tokio::test]
async fn test_resubmission_replaces_forecast() {
    let pool = common::setup_test_db().await;
    let config = common::test_config();
    let now = common::unique_now();

    let fixture = common::seed_fixture(
        &pool, &config.season, Some(1), "Brentford", "Burnley", now + Duration::days(1),
    )
    .await;
    common::set_current_odds(&pool, fixture.id, "1.8", "3.5", "4.5").await;
    let user = Uuid::new_v4();

    let first = submit_prediction(&pool, &request(user, fixture.id, 2, 1), config.stake, now)
        .await
        .unwrap();

    let mut change = request(user, fixture.id, 0, 2);
    change.pick = Some("away".into());
    let second = submit_prediction(&pool, &change, config.stake, now + Duration::hours(1))
        .await
        .unwrap();

    assert_eq!(second.id, first.id);
    assert_eq!(second.pick, "A");
    assert_eq!((second.pred_home_goals, second.pred_away_goals), (0, 2));
    assert_eq!(second.locked_odds, Some(dec("4.5")));
}

#[tokio::test]
async fn test_invalid_submissions_rejected() {
    let pool = common::setup_test_db().await;
    let config = common::test_config();
    let now = common::unique_now();

    let fixture = common::seed_fixture(
        &pool, &config.season, Some(1), "Leeds", "Wolves", now + Duration::days(1),
    )
    .await;
    let user = Uuid::new_v4();

    let mut mismatched = request(user, fixture.id, 2, 0);
    mismatched.pick = Some("D".into());
    let err = submit_prediction(&pool, &mismatched, config.stake, now).await.unwrap_err();
    assert!(matches!(err, SubmissionError::Invalid(_)));

    let err = submit_prediction(&pool, &request(user, fixture.id, -1, 0), config.stake, now)
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::Invalid(_)));

    let err = submit_prediction(&pool, &request(user, Uuid::new_v4(), 1, 0), config.stake, now)
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::FixtureNotFound));
}

#[tokio::test]
async fn test_closed_at_kickoff() {
    let pool = common::setup_test_db().await;
    let config = common::test_config();
    let now = common::unique_now();

    let fixture = common::seed_fixture(
        &pool, &config.season, Some(1), "Arsenal", "Everton", now + Duration::hours(1),
    )
    .await;
    let user = Uuid::new_v4();

    let err = submit_prediction(&pool, &request(user, fixture.id, 1, 0), config.stake, fixture.kickoff_time)
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::KickoffPassed));
}

#[tokio::test]
async fn test_league_membership_required() {
    let pool = common::setup_test_db().await;
    let config = common::test_config();
    let now = common::unique_now();

    let member = Uuid::new_v4();
    let outsider = Uuid::new_v4();
    let league_id = common::seed_league(&pool, "Five-a-side", &[member]).await;

    let fixture = common::seed_fixture(
        &pool, &config.season, Some(1), "Chelsea", "Fulham", now + Duration::days(1),
    )
    .await;

    let mut scoped = request(outsider, fixture.id, 1, 0);
    scoped.league_id = Some(league_id);
    let err = submit_prediction(&pool, &scoped, config.stake, now).await.unwrap_err();
    assert!(matches!(err, SubmissionError::NotMember));

    // Global and league predictions are separate rows.
    let global = submit_prediction(&pool, &request(member, fixture.id, 1, 0), config.stake, now)
        .await
        .unwrap();
    let mut scoped = request(member, fixture.id, 0, 0);
    scoped.league_id = Some(league_id);
    let league = submit_prediction(&pool, &scoped, config.stake, now).await.unwrap();

    assert_ne!(global.id, league.id);
    assert_eq!(league.league_id, Some(league_id));
    assert_eq!(common::get_prediction(&pool, global.id).await.pick, "H");
}

#[tokio::test]
async fn test_settled_prediction_not_overwritten() {
    let pool = common::setup_test_db().await;
    let config = common::test_config();
    let now = common::unique_now();

    let fixture = common::seed_fixture(
        &pool, &config.season, Some(1), "Wolves", "Leeds", now + Duration::days(1),
    )
    .await;
    let user = Uuid::new_v4();

    let first = submit_prediction(&pool, &request(user, fixture.id, 1, 0), config.stake, now)
        .await
        .unwrap();
    sqlx::query(
        "UPDATE predictions SET points_awarded = 10, bonus_exact_score_points = 15, settled_at = NOW() WHERE id = $1",
    )
    .bind(first.id)
    .execute(&pool)
    .await
    .unwrap();

    let err = submit_prediction(&pool, &request(user, fixture.id, 0, 3), config.stake, now)
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::AlreadySettled));

    let stored = common::get_prediction(&pool, first.id).await;
    assert_eq!((stored.pred_home_goals, stored.pred_away_goals), (1, 0));
    assert_eq!(stored.points_awarded, Some(10));
}
