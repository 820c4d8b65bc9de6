//! Shared fixtures for the persistence tests

use std::sync::Arc;

use resona::{MusicNft, StoreConfig, TieredStore, Visibility};
use resona_storage::testing::FakeRemote;
use tempfile::TempDir;

/// Store running on the local substrate
pub fn fallback_store(dir: &TempDir) -> Arc<TieredStore> {
    let store = TieredStore::connect(dir.path(), StoreConfig::default()).unwrap();
    assert_eq!(store.mode(), resona::Mode::Fallback);
    Arc::new(store)
}

/// Store running against an in-process fake of the remote substrate
pub fn primary_store(dir: &TempDir) -> Arc<TieredStore> {
    let server = FakeRemote::spawn();
    let config = StoreConfig {
        remote: Some(server.addr().to_string()),
        ..StoreConfig::default()
    };
    let store = TieredStore::connect(dir.path(), config).unwrap();
    assert_eq!(store.mode(), resona::Mode::Primary);
    Arc::new(store)
}

/// A fully-populated catalog record
pub fn ambient_nft(id: &str, title: &str) -> MusicNft {
    let mut nft = MusicNft::new(title, "0xCafe", "bafybeigdyr");
    nft.id = id.to_string();
    nft.description = format!("{title} — generative ambient session");
    nft.category = "ambient".to_string();
    nft.tags = vec!["chill".to_string()];
    nft.visibility = Visibility::Public;
    nft.price_wei = Some("120000000000000000".to_string());
    nft.duration_secs = 247;
    nft
}
