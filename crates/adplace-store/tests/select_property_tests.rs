// Property tests: SQL selection agrees with the in-memory filter predicate

use adplace_core::{AdStatus, Advertisement, SelectAdsArgs};
use adplace_store::migrations::apply_migrations;
use adplace_store::repo::{insert_ad, select_ads_at};
use proptest::prelude::*;
use rusqlite::Connection;

const PLACEMENTS: [&str; 3] = ["homepage", "sidebar", "footer"];
const TITLES: [&str; 2] = ["Spring", "Summer"];

fn arb_ad() -> impl Strategy<Value = (usize, usize, bool, i64, Option<i64>)> {
    (
        0..PLACEMENTS.len(),
        0..TITLES.len(),
        any::<bool>(),
        0i64..1_000,
        proptest::option::of(0i64..1_000),
    )
}

fn arb_args() -> impl Strategy<Value = SelectAdsArgs> {
    (
        proptest::option::of(0..PLACEMENTS.len()),
        proptest::option::of(0..TITLES.len()),
        proptest::option::of(any::<bool>()),
        proptest::option::of(any::<bool>()),
    )
        .prop_map(|(placement, title, active, expired)| SelectAdsArgs {
            placement: placement.map(|i| PLACEMENTS[i].to_string()),
            title: title.map(|i| TITLES[i].to_string()),
            status: active.map(|a| if a { AdStatus::Active } else { AdStatus::Inactive }),
            expired,
            ..SelectAdsArgs::default()
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_sql_selection_matches_predicate(
        rows in proptest::collection::vec(arb_ad(), 0..12),
        args in arb_args(),
        now in 0i64..1_000,
    ) {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn).unwrap();

        let ads: Vec<Advertisement> = rows
            .into_iter()
            .enumerate()
            .map(|(i, (p, t, active, created_at, expires_at))| Advertisement {
                id: format!("ad-{}", i),
                title: TITLES[t].to_string(),
                image_url: "https://cdn.example.com/a.png".to_string(),
                placement: PLACEMENTS[p].to_string(),
                status: if active { AdStatus::Active } else { AdStatus::Inactive },
                created_at,
                expires_at,
            })
            .collect();
        for ad in &ads {
            insert_ad(&conn, ad).unwrap();
        }

        let mut from_sql: Vec<String> = select_ads_at(&conn, &args, now)
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();
        let mut expected: Vec<String> = ads
            .iter()
            .filter(|a| args.matches(a, now))
            .map(|a| a.id.clone())
            .collect();
        from_sql.sort();
        expected.sort();

        prop_assert_eq!(from_sql, expected);
    }

    #[test]
    fn prop_selection_is_newest_first(
        created in proptest::collection::vec(0i64..100, 1..10),
    ) {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn).unwrap();
        for (i, created_at) in created.iter().enumerate() {
            insert_ad(&conn, &Advertisement {
                id: format!("ad-{}", i),
                title: "t".to_string(),
                image_url: "https://cdn.example.com/a.png".to_string(),
                placement: "homepage".to_string(),
                status: AdStatus::Active,
                created_at: *created_at,
                expires_at: None,
            }).unwrap();
        }

        let found = select_ads_at(&conn, &SelectAdsArgs::all(), 0).unwrap();
        prop_assert_eq!(found.len(), created.len());
        for pair in found.windows(2) {
            prop_assert!(pair[0].created_at >= pair[1].created_at);
        }
    }
}
