//! Fallback equivalence: the same operation sequence produces the same
//! observable results whichever substrate the store landed on

use std::sync::Arc;

use resona::{Dimension, MusicNft, Repository, TieredStore};
use tempfile::TempDir;

use crate::common::{ambient_nft, fallback_store, primary_store};

/// Observable outcome of one fixed save/find/list/delete sequence
#[derive(Debug, PartialEq)]
struct Outcome {
    found_title: Option<String>,
    listed_before: Vec<String>,
    searched: Vec<String>,
    play_count: i64,
    listed_after_delete: Vec<String>,
    deleted_lookup_absent: bool,
    second_delete: bool,
}

fn run_sequence(store: Arc<TieredStore>) -> Outcome {
    let repo: Repository<MusicNft> = Repository::new(store);

    repo.save(ambient_nft("a", "Aurora")).unwrap();
    repo.save(ambient_nft("b", "Borealis")).unwrap();
    repo.save(ambient_nft("c", "Cascade")).unwrap();

    repo.record_play("a").unwrap();
    repo.record_play("a").unwrap();

    let dimension = Dimension::Category("ambient".to_string());
    let listed_before = repo
        .list_by_dimension(&dimension, 10, 0)
        .into_iter()
        .map(|nft| nft.id)
        .collect();

    let searched = repo
        .search("oreal", 10)
        .into_iter()
        .map(|nft| nft.title)
        .collect();

    repo.delete_by_id("b");

    Outcome {
        found_title: repo.find_by_id("a").map(|nft| nft.title),
        listed_before,
        searched,
        play_count: repo.play_count("a"),
        listed_after_delete: repo
            .list_by_dimension(&dimension, 10, 0)
            .into_iter()
            .map(|nft| nft.id)
            .collect(),
        deleted_lookup_absent: repo.find_by_id("b").is_none(),
        second_delete: repo.delete_by_id("b"),
    }
}

#[test]
fn fallback_matches_primary() {
    let fallback_dir = TempDir::new().unwrap();
    let primary_dir = TempDir::new().unwrap();

    let fallback = run_sequence(fallback_store(&fallback_dir));
    let primary = run_sequence(primary_store(&primary_dir));

    assert_eq!(fallback, primary);

    // Sanity on the shared outcome, not just equality
    assert_eq!(fallback.found_title.as_deref(), Some("Aurora"));
    assert_eq!(fallback.listed_before, vec!["a", "b", "c"]);
    assert_eq!(fallback.searched, vec!["Borealis"]);
    assert_eq!(fallback.play_count, 2);
    assert_eq!(fallback.listed_after_delete, vec!["a", "c"]);
    assert!(fallback.deleted_lookup_absent);
    assert!(!fallback.second_delete);
}
