use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::api::{ContentApi, NewRow, PatchRow};
use crate::error::{CatalogError, Result};
use crate::models::*;
use crate::storage::{read_catalog, write_catalog, LocalStore};

/// Key of the local slot holding the whole catalog.
pub const STORAGE_KEY: &str = "novaStream_content";

/// Ids minted without the remote store start with this prefix.
pub const LOCAL_ID_PREFIX: &str = "item_";

pub fn is_local_id(id: &str) -> bool {
    id.starts_with(LOCAL_ID_PREFIX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// Fetched from the remote store and merged with the local slot.
    Fresh,
    /// The remote store failed; the local slot (or the previous catalog) is served.
    Fallback,
    /// No remote store configured; the local slot is the only source.
    Stale,
}

/// Outcome of [`ContentRepository::load`]. Loading never fails outright.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub catalog: Catalog,
    pub status: LoadStatus,
    pub error: Option<CatalogError>,
}

/// Fills gaps in freshly fetched data from the local copy.
///
/// Every film and series gets the local description when its own is empty.
/// Series then take the local episode list if it is non-empty, and the local
/// description whenever that one is non-empty.
pub fn merge_local(remote: &mut Catalog, local: &Catalog) {
    for film in remote.films.iter_mut() {
        if let Some(saved) = local.films.iter().find(|l| l.id == film.id) {
            if !saved.description.is_empty() && film.description.is_empty() {
                film.description = saved.description.clone();
            }
        }
    }
    for serie in remote.series.iter_mut() {
        if let Some(saved) = local.series.iter().find(|l| l.info.id == serie.info.id) {
            if !saved.info.description.is_empty() && serie.info.description.is_empty() {
                serie.info.description = saved.info.description.clone();
            }
        }
    }
    for serie in remote.series.iter_mut() {
        if let Some(saved) = local.series.iter().find(|l| l.info.id == serie.info.id) {
            if !saved.episodes.is_empty() {
                serie.episodes = saved.episodes.clone();
            }
            if !saved.info.description.is_empty() {
                serie.info.description = saved.info.description.clone();
            }
        }
    }
}

/// Owns the catalog and keeps it in step with the remote store and the local slot.
///
/// Mutations take `&mut self`; share a repository between tasks behind a mutex.
pub struct ContentRepository {
    api: ContentApi,
    store: Box<dyn LocalStore>,
    catalog: Catalog,
}

impl ContentRepository {
    pub fn new(api: ContentApi, store: impl LocalStore + 'static) -> Self {
        Self { api, store: Box::new(store), catalog: Catalog::default() }
    }

    pub fn is_remote_configured(&self) -> bool {
        self.api.is_configured()
    }

    pub fn api(&self) -> &ContentApi {
        &self.api
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn get_item(&self, category: Category, id: &str) -> Option<ContentItem> {
        self.catalog.get(category, id)
    }

    /// Refreshes the catalog from the best available source.
    pub async fn load(&mut self) -> LoadReport {
        if !self.is_remote_configured() {
            let error = match read_catalog(self.store.as_ref(), STORAGE_KEY) {
                Ok(Some(mut saved)) => {
                    saved.normalize_series();
                    self.catalog = saved;
                    None
                }
                Ok(None) => None,
                Err(e) => {
                    debug!(error = %e, "local catalog unreadable, keeping current one");
                    Some(e)
                }
            };
            return self.report(LoadStatus::Stale, error);
        }

        match self.fetch_remote().await {
            Ok(catalog) => {
                info!(films = catalog.films.len(), series = catalog.series.len(), "catalog loaded from remote store");
                self.catalog = catalog;
                self.persist();
                self.report(LoadStatus::Fresh, None)
            }
            Err(e) => {
                warn!(error = %e, "remote store unavailable, falling back to local catalog");
                // Series are served as saved here, without legacy episode synthesis.
                match read_catalog(self.store.as_ref(), STORAGE_KEY) {
                    Ok(Some(saved)) => self.catalog = saved,
                    Ok(None) => {}
                    Err(local) => debug!(error = %local, "local catalog unreadable too"),
                }
                self.report(LoadStatus::Fallback, Some(e))
            }
        }
    }

    async fn fetch_remote(&self) -> Result<Catalog> {
        let (films, series) = tokio::join!(self.api.list(Category::Film), self.api.list(Category::Serie));
        let mut catalog = Catalog {
            films: films?.into_iter().map(|row| row.into_film()).collect(),
            series: series?.into_iter().map(|row| row.into_series()).collect(),
        };
        match read_catalog(self.store.as_ref(), STORAGE_KEY) {
            Ok(Some(saved)) => merge_local(&mut catalog, &saved),
            Ok(None) => {}
            Err(e) => debug!(error = %e, "skipping merge with unreadable local catalog"),
        }
        Ok(catalog)
    }

    fn report(&self, status: LoadStatus, error: Option<CatalogError>) -> LoadReport {
        LoadReport { catalog: self.catalog.clone(), status, error }
    }

    /// Creates an entry remotely when possible, otherwise under a local id.
    pub async fn add_item(&mut self, category: Category, item: NewItem) -> Result<ContentItem> {
        let created = if self.is_remote_configured() {
            let row = NewRow::new(&item, category);
            let echoed = self.api.create(&row).await.map_err(|e| {
                error!(error = %e, %category, title = %item.title, "remote create failed");
                e
            })?;
            echoed.into_created(category, item.kept_episodes(category).cloned())
        } else {
            let id = self.next_local_id(category);
            item.into_item(category, id)
        };
        self.catalog.push(created.clone());
        self.persist();
        Ok(created)
    }

    fn next_local_id(&self, category: Category) -> String {
        let mut millis = Utc::now().timestamp_millis();
        loop {
            let id = format!("{}{}", LOCAL_ID_PREFIX, millis);
            if !self.catalog.contains(category, &id) {
                return id;
            }
            millis += 1;
        }
    }

    /// Removes an entry. Unknown ids are not an error.
    pub async fn delete_item(&mut self, category: Category, id: &str) -> Result<()> {
        if self.is_remote_configured() && !is_local_id(id) {
            self.api.delete(id).await.map_err(|e| {
                error!(error = %e, %category, id, "remote delete failed");
                e
            })?;
        }
        self.catalog.remove(category, id);
        self.persist();
        Ok(())
    }

    /// Applies `patch` to an entry. `Ok(false)` when the id is unknown.
    pub async fn update_item(&mut self, category: Category, id: &str, patch: ItemPatch) -> Result<bool> {
        if !self.catalog.contains(category, id) {
            return Ok(false);
        }
        if self.is_remote_configured() && !is_local_id(id) {
            let body = PatchRow::from_patch(&patch, true);
            self.api.update(id, &body).await.map_err(|e| {
                error!(error = %e, %category, id, "remote update failed");
                e
            })?;
        }
        self.catalog.apply(category, id, &patch);
        self.persist();
        Ok(true)
    }

    // Best-effort: a failed local write never fails the operation.
    fn persist(&self) {
        if let Err(e) = write_catalog(self.store.as_ref(), STORAGE_KEY, &self.catalog) {
            warn!(error = %e, "failed to write local catalog");
        }
    }
}
