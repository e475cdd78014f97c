//! End-to-end importer tests over an in-memory database

use std::io::Write;
use std::path::PathBuf;

use rollcall_common::db::memory_pool;
use rollcall_common::overrides::Overrides;
use rollcall_ingest::attendance;
use rollcall_ingest::reconcile::{run_import, ImportInputs};
use sqlx::Row;
use tempfile::TempDir;

const MEMBERS_CSV: &str = "\
mep_id,name,country,party,national_party,profile_url,photo_url
197400.0,Jane Doe,Sweden,Group of the European People's Party (Christian Democrats),Moderates,https://www.europarl.europa.eu/meps/en/197400,
111,John Roe,Kingdom of the Netherlands,Renew Europe Group,VVD,https://www.europarl.europa.eu/meps/en/111,
";

const ATTENDANCE_CSV: &str = "\
mep_id,votes_total_period,votes_cast,attendance_pct,partial_term
197400.0,1200,1140,95.0,False
111,not-a-number,,,True
";

const CATALOG_CSV: &str = "\
vote_id,vote_date,title,result,olp_stage,total_for,total_against,total_abstain,source_url
170123,2024-04-24,Nature restoration,Adopted,,329,275,24,https://example.org/v/170123
170124,2024-04-25,Budget discharge,Rejected,,120,400,10,
";

const NOTABLE_CSV: &str = "\
mep_id,vote_id,vote_date,title,result,olp_stage,total_for,total_against,total_abstain,source_url,vote_position
197400.0,170123,2024-04-24,Nature restoration,Adopted,,329,275,24,,for
197400.0,170124,2024-04-25,Budget discharge,Rejected,,120,400,10,,against
111,170123,2024-04-24,Nature restoration renamed later,Adopted,,329,275,24,,did not vote
";

struct Fixture {
    _dir: TempDir,
    inputs: ImportInputs,
}

fn write_fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let write = |name: &str, contents: &str| -> PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    };

    let inputs = ImportInputs {
        members: Some(write("meps.csv", MEMBERS_CSV)),
        attendance: Some(write("meps_attendance.csv", ATTENDANCE_CSV)),
        catalog: Some(write("votes_catalog.csv", CATALOG_CSV)),
        notable_csv: Some(write("mep_notable_votes.csv", NOTABLE_CSV)),
        bundles: vec![],
    };
    Fixture { _dir: dir, inputs }
}

#[tokio::test]
async fn test_import_creates_members_votes_ballots() {
    let pool = memory_pool().await.unwrap();
    let fixture = write_fixture();

    let report = run_import(&pool, &Overrides::default(), &fixture.inputs)
        .await
        .unwrap();

    assert_eq!(report.members.created, 2);
    assert_eq!(report.votes.created, 2);
    assert_eq!(report.ballots.created, 3);
    assert_eq!(report.unmatched_ballots, 0);
    assert_eq!(
        report.date_range,
        Some(("2024-04-24".to_string(), "2024-04-25".to_string()))
    );

    // Float-noise id normalized, attendance merged from the CSV
    let row = sqlx::query(
        "SELECT votes_total, votes_cast, attendance_pct FROM members WHERE ep_id = '197400'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(row.get::<i64, _>("votes_total"), 1200);
    assert_eq!(row.get::<i64, _>("votes_cast"), 1140);
    assert_eq!(row.get::<Option<i64>, _>("attendance_pct"), Some(95));

    // Coerced-to-zero attendance yields a null percentage
    let row = sqlx::query(
        "SELECT votes_total, attendance_pct, partial_term FROM members WHERE ep_id = '111'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(row.get::<i64, _>("votes_total"), 0);
    assert_eq!(row.get::<Option<i64>, _>("attendance_pct"), None);
    assert_eq!(row.get::<i64, _>("partial_term"), 1);
}

#[tokio::test]
async fn test_reimport_is_idempotent() {
    let pool = memory_pool().await.unwrap();
    let fixture = write_fixture();

    run_import(&pool, &Overrides::default(), &fixture.inputs)
        .await
        .unwrap();
    let second = run_import(&pool, &Overrides::default(), &fixture.inputs)
        .await
        .unwrap();

    assert_eq!(second.members.created, 0);
    assert_eq!(second.members.skipped, 2);
    assert_eq!(second.votes.created, 0);
    assert_eq!(second.votes.skipped, 2);
    assert_eq!(second.ballots.created, 0);
    assert_eq!(second.ballots.skipped, 3);

    let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM ballots")
        .fetch_one(&pool)
        .await
        .unwrap()
        .get("n");
    assert_eq!(count, 3);
}

#[tokio::test]
async fn test_duplicate_vote_id_keeps_first_title() {
    let pool = memory_pool().await.unwrap();
    let fixture = write_fixture();

    run_import(&pool, &Overrides::default(), &fixture.inputs)
        .await
        .unwrap();

    // Vote 170123 appears in the catalog and twice in the ballot file,
    // the third time with a drifted title; one row, first title retained.
    let rows = sqlx::query("SELECT title FROM votes WHERE ep_vote_id = '170123'")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get::<String, _>("title"), "Nature restoration");
}

#[tokio::test]
async fn test_overrides_applied_to_members() {
    let pool = memory_pool().await.unwrap();
    let fixture = write_fixture();

    let overrides = Overrides::parse(
        r#"
        [[member]]
        ep_id = "197400"
        special_role = "President"

        [[member]]
        ep_id = "111"
        sick_leave = true
        "#,
    )
    .unwrap();

    run_import(&pool, &overrides, &fixture.inputs).await.unwrap();

    let row = sqlx::query("SELECT special_role, sick_leave FROM members WHERE ep_id = '197400'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(row.get::<Option<String>, _>("special_role").as_deref(), Some("President"));
    assert_eq!(row.get::<i64, _>("sick_leave"), 0);

    let row = sqlx::query("SELECT sick_leave FROM members WHERE ep_id = '111'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(row.get::<i64, _>("sick_leave"), 1);
}

#[tokio::test]
async fn test_colliding_name_slugs_are_counted() {
    let pool = memory_pool().await.unwrap();
    let dir = tempfile::tempdir().unwrap();
    // "Anna Maria" and "Anna-Maria" flatten to the same slug
    let path = dir.path().join("meps.csv");
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(
        b"mep_id,name,country,party,national_party,profile_url,photo_url\n\
          500,Anna Maria,Sweden,Renew Europe Group,Centre,,\n\
          501,Anna-Maria,Sweden,Renew Europe Group,Centre,,\n",
    )
    .unwrap();

    let inputs = ImportInputs {
        members: Some(path),
        ..ImportInputs::default()
    };
    let report = run_import(&pool, &Overrides::default(), &inputs)
        .await
        .unwrap();

    assert_eq!(report.members.created, 2);
    assert_eq!(report.slug_collisions, 1);

    // Both rows land despite sharing a slug; ep_id stays the key
    let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM members WHERE slug = 'anna-maria'")
        .fetch_one(&pool)
        .await
        .unwrap()
        .get("n");
    assert_eq!(count, 2);
}

#[tokio::test]
async fn test_empty_inputs_are_fatal() {
    let pool = memory_pool().await.unwrap();
    let result = run_import(&pool, &Overrides::default(), &ImportInputs::default()).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_backfill_recomputes_window_attendance() {
    let pool = memory_pool().await.unwrap();
    let fixture = write_fixture();

    run_import(&pool, &Overrides::default(), &fixture.inputs)
        .await
        .unwrap();
    let report = attendance::backfill(&pool).await.unwrap();
    assert_eq!(report.members_updated, 2);

    // Jane: two ballots in window, both cast
    let row = sqlx::query(
        "SELECT votes_total, votes_cast, attendance_pct FROM members WHERE ep_id = '197400'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(row.get::<i64, _>("votes_total"), 2);
    assert_eq!(row.get::<i64, _>("votes_cast"), 2);
    assert_eq!(row.get::<Option<i64>, _>("attendance_pct"), Some(100));

    // John: one ballot, absent
    let row = sqlx::query(
        "SELECT votes_total, votes_cast, attendance_pct FROM members WHERE ep_id = '111'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(row.get::<i64, _>("votes_total"), 1);
    assert_eq!(row.get::<i64, _>("votes_cast"), 0);
    assert_eq!(row.get::<Option<i64>, _>("attendance_pct"), Some(0));
}
