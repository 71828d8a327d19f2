use chrono::{Duration, TimeZone};
use shared::{clock::FixedClock, domain::FlowerStatus};

use super::*;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 8, 9, 0, 0).unwrap()
}

async fn setup() -> (ApiContext, Arc<FixedClock>) {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let clock = Arc::new(FixedClock::new(t0()));
    (
        ApiContext {
            storage,
            clock: clock.clone(),
            credential: AdminCredential::from_plaintext("secret").expect("credential"),
            sessions: SessionKeys::new(b"test-secret", Duration::days(31)),
        },
        clock,
    )
}

#[tokio::test]
async fn unknown_type_is_rejected_without_creating_a_record() {
    let (ctx, _clock) = setup().await;
    let err = add_flower(&ctx, "rose").await.expect_err("rose rejected");
    assert!(matches!(err.code, ErrorCode::InvalidType));
    assert_eq!(ctx.storage.count_flowers().await.expect("count"), 0);
}

#[tokio::test]
async fn type_names_must_match_the_catalogue_exactly() {
    let (ctx, _clock) = setup().await;
    for raw in [" peony ", "peony\n", "Peony", ""] {
        let err = add_flower(&ctx, raw).await.expect_err("not an exact name");
        assert_eq!(err.code, ErrorCode::InvalidType, "{raw:?}");
    }
    assert_eq!(ctx.storage.count_flowers().await.expect("count"), 0);
}

#[tokio::test]
async fn peony_expires_five_days_after_creation_and_is_swept() {
    let (ctx, clock) = setup().await;
    let peony = add_flower(&ctx, "peony").await.expect("peony");
    assert_eq!(peony.expires_at, t0() + Duration::days(5));

    clock.set(t0() + Duration::days(6));
    let garden = garden_view(&ctx).await.expect("garden");
    assert!(garden.untrimmed_flowers.is_empty());

    let stored = ctx
        .storage
        .flower(peony.id)
        .await
        .expect("load")
        .expect("row");
    assert_eq!(stored.status, FlowerStatus::Expired);
    assert_eq!(stored.expires_at, peony.expires_at);
}

#[tokio::test]
async fn sweep_finds_nothing_new_on_second_run() {
    let (ctx, _clock) = setup().await;
    let peony = add_flower(&ctx, "peony").await.expect("peony");
    add_flower(&ctx, "chrysanthemum").await.expect("mum");

    let now = t0() + Duration::days(6);
    assert_eq!(sweep(&ctx, now).await.expect("sweep"), vec![peony.id]);
    assert!(sweep(&ctx, now).await.expect("sweep").is_empty());
}

#[tokio::test]
async fn trimming_schedules_water_change_a_day_later() {
    let (ctx, clock) = setup().await;
    let tulip = add_flower(&ctx, "tulip").await.expect("tulip");
    trim_flower(&ctx, tulip.id, 1).await.expect("trim");

    clock.set(t0() + Duration::hours(23));
    let garden = garden_view(&ctx).await.expect("garden");
    let vase = &garden.vases[0];
    assert!(vase.has_flowers);
    assert_eq!(vase.next_water_change, Some(t0() + Duration::hours(24)));
    assert!(!vase.needs_water);
    assert_eq!(vase.water_change_in, "1h 0m");

    clock.set(t0() + Duration::hours(25));
    let garden = garden_view(&ctx).await.expect("garden");
    assert!(garden.vases[0].needs_water);

    change_water(&ctx, 1).await.expect("water");
    let garden = garden_view(&ctx).await.expect("garden");
    assert!(!garden.vases[0].needs_water);
    assert_eq!(
        garden.vases[0].next_water_change,
        Some(t0() + Duration::hours(49))
    );
}

#[tokio::test]
async fn earliest_water_change_in_vase_wins() {
    let (ctx, clock) = setup().await;
    let first = add_flower(&ctx, "lily").await.expect("lily");
    let second = add_flower(&ctx, "lily").await.expect("lily");
    trim_flower(&ctx, first.id, 2).await.expect("trim");
    clock.advance(Duration::hours(2));
    trim_flower(&ctx, second.id, 2).await.expect("trim");

    let garden = garden_view(&ctx).await.expect("garden");
    assert_eq!(garden.vases[1].flowers.len(), 2);
    assert_eq!(
        garden.vases[1].next_water_change,
        Some(t0() + Duration::hours(24))
    );
}

#[tokio::test]
async fn second_trim_fails_and_leaves_state_unchanged() {
    let (ctx, clock) = setup().await;
    let lily = add_flower(&ctx, "lily").await.expect("lily");
    trim_flower(&ctx, lily.id, 3).await.expect("trim");
    let before = ctx.storage.flower(lily.id).await.expect("load");

    clock.advance(Duration::hours(1));
    let err = trim_flower(&ctx, lily.id, 1).await.expect_err("second trim");
    assert!(matches!(err.code, ErrorCode::InvalidState));
    assert_eq!(ctx.storage.flower(lily.id).await.expect("load"), before);

    let err = trim_flower(&ctx, FlowerId(404), 1)
        .await
        .expect_err("missing flower");
    assert!(matches!(err.code, ErrorCode::InvalidState));
}

#[tokio::test]
async fn trim_rejects_vase_outside_shelf() {
    let (ctx, _clock) = setup().await;
    let lily = add_flower(&ctx, "lily").await.expect("lily");
    let err = trim_flower(&ctx, lily.id, 4).await.expect_err("bad vase");
    assert!(matches!(err.code, ErrorCode::Validation));

    let stored = ctx.storage.flower(lily.id).await.expect("load").expect("row");
    assert_eq!(stored.status, FlowerStatus::New);
    assert_eq!(stored.vase_id, None);
}

#[tokio::test]
async fn change_water_on_empty_vase_succeeds() {
    let (ctx, _clock) = setup().await;
    assert_eq!(change_water(&ctx, 2).await.expect("water"), 0);
    assert_eq!(change_water(&ctx, 17).await.expect("water"), 0);
}

#[tokio::test]
async fn admin_login_and_authorization() {
    let (ctx, clock) = setup().await;
    let err = admin_login(&ctx, "guess").expect_err("wrong password");
    assert!(matches!(err.code, ErrorCode::Unauthorized));

    let token = admin_login(&ctx, "secret").expect("login");
    let session = authorize_admin(&ctx, Some(&token)).expect("session");
    assert_eq!(session.expires_at, t0() + Duration::days(31));

    assert!(authorize_admin(&ctx, None).is_err());
    clock.advance(Duration::days(32));
    let err = authorize_admin(&ctx, Some(&token)).expect_err("expired session");
    assert!(matches!(err.code, ErrorCode::Unauthorized));
}

#[tokio::test]
async fn admin_overview_reports_counts_and_catalogue() {
    let (ctx, _clock) = setup().await;
    let tulip = add_flower(&ctx, "tulip").await.expect("tulip");
    add_flower(&ctx, "alstroemeria").await.expect("alstroemeria");
    trim_flower(&ctx, tulip.id, 1).await.expect("trim");

    let token = admin_login(&ctx, "secret").expect("login");
    let session = authorize_admin(&ctx, Some(&token)).expect("session");
    let overview = admin_overview(&ctx, &session, Some(tulip.id))
        .await
        .expect("overview");

    assert_eq!(
        overview.stats,
        AdminStats {
            total_flowers: 2,
            active_flowers: 2,
            flowers_in_vases: 1,
        }
    );
    assert_eq!(overview.flower_types.len(), FlowerType::ALL.len());
    assert_eq!(overview.flower_types[0].value, "peony");
    assert_eq!(overview.flower_types[0].lifespan_days, 5);
    assert_eq!(overview.added_flower_id, Some(tulip.id));
}
