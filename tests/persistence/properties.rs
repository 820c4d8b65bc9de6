//! Core store properties, run over the full stack in fallback mode

use resona::{Dimension, MusicNft, Playlist, Repository, User};
use std::sync::Arc;
use tempfile::TempDir;

use crate::common::{ambient_nft, fallback_store};

#[test]
fn round_trip_preserves_all_fields() {
    let dir = TempDir::new().unwrap();
    let repo: Repository<MusicNft> = Repository::new(fallback_store(&dir));

    let saved = repo.save(ambient_nft("", "Aurora")).unwrap();
    let found = repo.find_by_id(&saved.id).unwrap();
    assert_eq!(found, saved);
}

#[test]
fn index_consistency_through_save_and_delete() {
    let dir = TempDir::new().unwrap();
    let store = fallback_store(&dir);
    let repo: Repository<MusicNft> = Repository::new(Arc::clone(&store));

    let saved = repo.save(ambient_nft("", "Aurora")).unwrap();
    let id = saved.id.clone();

    // After save, the record is discoverable through every dimension it
    // qualifies for, including the global collection
    for dimension in [
        Dimension::Category("ambient".to_string()),
        Dimension::Tag("chill".to_string()),
        Dimension::Owner("0xcafe".to_string()),
    ] {
        let listed = repo.list_by_dimension(&dimension, 10, 0);
        assert!(
            listed.iter().any(|nft| nft.id == id),
            "absent from {dimension:?}"
        );
    }
    assert_eq!(repo.list_all(10, 0).len(), 1);

    // After delete, no dimension enumerates it and lookup is absent
    assert!(repo.delete_by_id(&id));
    assert!(repo.find_by_id(&id).is_none());
    for key in [
        "nfts",
        "nfts:category:ambient",
        "nfts:tag:chill",
        "nfts:owner:0xcafe",
        "nfts:visibility:public",
    ] {
        assert!(!store.smembers(key).contains(&id), "lingering in {key}");
    }
}

#[test]
fn delete_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let repo: Repository<MusicNft> = Repository::new(fallback_store(&dir));

    let saved = repo.save(ambient_nft("", "Aurora")).unwrap();
    assert!(repo.delete_by_id(&saved.id));
    // Both consecutive calls on the now-absent id succeed
    assert!(!repo.delete_by_id(&saved.id));
    assert!(!repo.delete_by_id(&saved.id));
}

#[test]
fn alias_resolution_matches_point_lookup() {
    let dir = TempDir::new().unwrap();
    let repo: Repository<User> = Repository::new(fallback_store(&dir));

    let mut user = User::new("0xAbC123", "mixgarden");
    user.email = "mix@garden.io".to_string();
    let saved = repo.save(user).unwrap();

    assert_eq!(
        repo.find_by_wallet("0xabc123").unwrap(),
        repo.find_by_id(&saved.id).unwrap()
    );
    assert_eq!(
        repo.find_by_username("mixgarden").unwrap(),
        repo.find_by_id(&saved.id).unwrap()
    );
    assert_eq!(
        repo.find_by_email("MIX@garden.io").unwrap(),
        repo.find_by_id(&saved.id).unwrap()
    );
}

#[test]
fn pagination_never_exceeds_limit() {
    let dir = TempDir::new().unwrap();
    let repo: Repository<MusicNft> = Repository::new(fallback_store(&dir));

    for i in 0..7 {
        repo.save(ambient_nft("", &format!("Track {i}"))).unwrap();
    }

    let dimension = Dimension::Category("ambient".to_string());
    let mut collected = Vec::new();
    let mut offset = 0;
    loop {
        let page = repo.list_by_dimension(&dimension, 3, offset);
        assert!(page.len() <= 3);
        if page.is_empty() {
            break;
        }
        collected.extend(page.into_iter().map(|nft| nft.id));
        offset += 3;
    }

    // Walking pages visits every record exactly once
    collected.sort();
    collected.dedup();
    assert_eq!(collected.len(), 7);
}

#[test]
fn category_scenario_with_mid_list_delete() {
    let dir = TempDir::new().unwrap();
    let store = fallback_store(&dir);
    let repo: Repository<MusicNft> = Repository::new(Arc::clone(&store));

    let a = repo.save(ambient_nft("a", "First")).unwrap();
    let b = repo.save(ambient_nft("b", "Second")).unwrap();
    let c = repo.save(ambient_nft("c", "Third")).unwrap();
    let all: Vec<&str> = vec![&a.id, &b.id, &c.id];

    let dimension = Dimension::Category("ambient".to_string());

    let first = repo.list_by_dimension(&dimension, 2, 0);
    assert_eq!(first.len(), 2);
    assert!(first.iter().all(|nft| all.contains(&nft.id.as_str())));

    let second = repo.list_by_dimension(&dimension, 2, 2);
    assert_eq!(second.len(), 1);
    let seen: Vec<&str> = first
        .iter()
        .chain(second.iter())
        .map(|nft| nft.id.as_str())
        .collect();
    assert_eq!(seen.len(), 3);
    assert!(all.iter().all(|id| seen.contains(id)));

    // Deleting B removes it from both the category set and the global
    // collection on the next listing
    assert!(repo.delete_by_id("b"));
    let remaining = repo.list_by_dimension(&dimension, 10, 0);
    assert_eq!(remaining.len(), 2);
    assert!(remaining.iter().all(|nft| nft.id != "b"));
    assert!(!store.smembers("nfts").contains(&"b".to_string()));
}

#[test]
fn playlist_lifecycle_spans_repositories() {
    let dir = TempDir::new().unwrap();
    let store = fallback_store(&dir);
    let users: Repository<User> = Repository::new(Arc::clone(&store));
    let playlists: Repository<Playlist> = Repository::new(Arc::clone(&store));

    let owner = users.save(User::new("0xabc", "mixgarden")).unwrap();
    let playlist = playlists
        .save(Playlist::new(owner.id.clone(), "Night Drive"))
        .unwrap();

    assert_eq!(users.playlist_ids(&owner.id), vec![playlist.id.clone()]);
    assert_eq!(playlists.for_user(&owner.id).len(), 1);

    assert!(playlists.delete_by_id(&playlist.id));
    assert!(users.playlist_ids(&owner.id).is_empty());
}
