//! Playlist, progress and settings persistence.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use super::{KvStore, StorageConfig, StorageError, StorageKey};
use crate::models::{
    Playlist, PlaylistId, PlaylistProgress, PlaylistStatistics, Settings, SettingsUpdate, VideoId,
};

pub type PlaylistMap = BTreeMap<PlaylistId, Playlist>;
pub type ProgressMap = BTreeMap<PlaylistId, PlaylistProgress>;

/// One row of the tracked-playlists overview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardEntry {
    pub id: PlaylistId,
    pub name: String,
    pub url: String,
    pub statistics: PlaylistStatistics,

    /// Watched videos recorded in saved progress
    pub watched_count: usize,

    pub last_updated: Option<DateTime<Utc>>,
}

/// Typed access to the planner's key-value store.
pub struct PlannerStore {
    kv: KvStore,
    default_settings: Settings,
}

impl PlannerStore {
    pub fn new(kv: KvStore) -> Self {
        Self {
            kv,
            default_settings: Settings::default(),
        }
    }

    /// Settings reported until the user saves their own.
    pub fn with_default_settings(mut self, settings: Settings) -> Self {
        self.default_settings = settings;
        self
    }

    pub fn open(config: &StorageConfig) -> Self {
        Self::new(KvStore::new(config.store_path()))
    }

    pub fn kv(&self) -> &KvStore {
        &self.kv
    }

    /// Per-playlist entries of `key`, still encoded. Each entry is decoded on
    /// its own and writes go back through this map, so an entry that no
    /// longer parses is kept on disk instead of being dropped.
    fn raw_entries(&self, key: StorageKey) -> Result<Map<String, Value>, StorageError> {
        self.kv.get_or(key.as_str(), Map::new())
    }

    fn decode_entry<T: DeserializeOwned>(key: StorageKey, id: &str, value: Value) -> Option<T> {
        match serde_json::from_value(value) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable {} entry {}: {}", key.as_str(), id, e);
                None
            }
        }
    }

    fn entries<T: DeserializeOwned>(
        &self,
        key: StorageKey,
    ) -> Result<BTreeMap<PlaylistId, T>, StorageError> {
        Ok(self
            .raw_entries(key)?
            .into_iter()
            .filter_map(|(id, value)| {
                Self::decode_entry(key, &id, value).map(|entry| (PlaylistId::new(id), entry))
            })
            .collect())
    }

    fn entry<T: DeserializeOwned>(
        &self,
        key: StorageKey,
        id: &PlaylistId,
    ) -> Result<Option<T>, StorageError> {
        Ok(self
            .raw_entries(key)?
            .remove(id.as_str())
            .and_then(|value| Self::decode_entry(key, id.as_str(), value)))
    }

    fn put_entry<T: Serialize>(
        &self,
        key: StorageKey,
        id: &PlaylistId,
        entry: &T,
    ) -> Result<(), StorageError> {
        let mut raw = self.raw_entries(key)?;
        raw.insert(id.as_str().to_string(), serde_json::to_value(entry)?);
        self.kv.set(key.as_str(), &raw)
    }

    fn remove_entry(&self, key: StorageKey, id: &PlaylistId) -> Result<bool, StorageError> {
        let mut raw = self.raw_entries(key)?;
        if raw.remove(id.as_str()).is_none() {
            return Ok(false);
        }
        self.kv.set(key.as_str(), &raw)?;
        Ok(true)
    }

    /// Save a playlist, stamping `last_updated`. Returns the stored copy.
    pub fn save_playlist(&self, playlist: &Playlist) -> Result<Playlist, StorageError> {
        let mut stored = playlist.clone();
        stored.last_updated = Some(Utc::now());

        self.put_entry(StorageKey::Playlists, stored.id(), &stored)?;

        info!("Saved playlist {}", stored.id());
        Ok(stored)
    }

    pub fn get_playlist(&self, id: &PlaylistId) -> Result<Option<Playlist>, StorageError> {
        self.entry(StorageKey::Playlists, id)
    }

    /// Every readable cached playlist.
    pub fn all_playlists(&self) -> Result<PlaylistMap, StorageError> {
        self.entries(StorageKey::Playlists)
    }

    /// Forget a playlist and its progress. Returns false if it was unknown.
    pub fn remove_playlist(&self, id: &PlaylistId) -> Result<bool, StorageError> {
        let had_playlist = self.remove_entry(StorageKey::Playlists, id)?;
        let had_progress = self.remove_entry(StorageKey::Progress, id)?;

        Ok(had_playlist || had_progress)
    }

    /// Give a tracked playlist a display name. Returns false if it is unknown.
    pub fn set_custom_name(&self, id: &PlaylistId, name: &str) -> Result<bool, StorageError> {
        let Some(mut playlist) = self.get_playlist(id)? else {
            return Ok(false);
        };

        let name = name.trim();
        playlist.custom_name = if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        };
        self.save_playlist(&playlist)?;
        Ok(true)
    }

    /// Save progress for a playlist, stamping `last_updated`.
    pub fn save_progress(
        &self,
        id: &PlaylistId,
        progress: &PlaylistProgress,
    ) -> Result<(), StorageError> {
        let mut stored = progress.clone();
        stored.last_updated = Some(Utc::now());

        self.put_entry(StorageKey::Progress, id, &stored)
    }

    pub fn get_progress(&self, id: &PlaylistId) -> Result<Option<PlaylistProgress>, StorageError> {
        self.entry(StorageKey::Progress, id)
    }

    /// Record a watched video. Returns false if it was already recorded.
    pub fn mark_video_watched(
        &self,
        id: &PlaylistId,
        video_id: &VideoId,
    ) -> Result<bool, StorageError> {
        let mut progress = self.get_progress(id)?.unwrap_or_default();
        if !progress.insert(video_id.clone()) {
            return Ok(false);
        }

        self.save_progress(id, &progress)?;
        info!("Video {} marked as watched in {}", video_id, id);
        Ok(true)
    }

    pub fn is_video_watched(
        &self,
        id: &PlaylistId,
        video_id: &VideoId,
    ) -> Result<bool, StorageError> {
        Ok(self
            .get_progress(id)?
            .is_some_and(|progress| progress.contains(video_id)))
    }

    /// Stored settings, or the defaults when none were saved.
    pub fn settings(&self) -> Result<Settings, StorageError> {
        self.kv
            .get_or(StorageKey::Settings.as_str(), self.default_settings.clone())
    }

    /// Merge a partial update into the stored settings.
    pub fn update_settings(&self, update: &SettingsUpdate) -> Result<Settings, StorageError> {
        let settings = self.settings()?.merge(update);
        self.kv.set(StorageKey::Settings.as_str(), &settings)?;
        Ok(settings)
    }

    pub fn last_sync(&self) -> Result<Option<DateTime<Utc>>, StorageError> {
        self.kv.get(StorageKey::LastSync.as_str())
    }

    pub fn record_sync(&self, at: DateTime<Utc>) -> Result<(), StorageError> {
        self.kv.set(StorageKey::LastSync.as_str(), &at)
    }

    /// Drop cached playlists. Progress and settings are kept.
    pub fn clear_cache(&self) -> Result<(), StorageError> {
        self.kv.remove(&[StorageKey::Playlists.as_str()])?;
        info!("Cleared playlist cache");
        Ok(())
    }

    /// Drop everything, settings included.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.kv.clear()
    }

    /// Tracked playlists, most recently updated first.
    pub fn dashboard(&self) -> Result<Vec<DashboardEntry>, StorageError> {
        let progress: ProgressMap = self.entries(StorageKey::Progress)?;

        let mut entries: Vec<DashboardEntry> = self
            .all_playlists()?
            .into_values()
            .map(|playlist| DashboardEntry {
                watched_count: progress
                    .get(playlist.id())
                    .map_or(0, |p| p.watched_videos.len()),
                name: playlist.display_name().to_string(),
                id: playlist.metadata.id,
                url: playlist.metadata.url,
                statistics: playlist.statistics,
                last_updated: playlist.last_updated,
            })
            .collect();

        entries.sort_by(|a, b| {
            b.last_updated
                .cmp(&a.last_updated)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(entries)
    }
}
