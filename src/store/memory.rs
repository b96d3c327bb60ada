use std::collections::{BTreeMap, HashMap, HashSet};

use anyhow::{anyhow, bail, Result};
use itertools::Itertools;
use parking_lot::RwLock;

use crate::model::{ChildQuery, MetaEntry, NewPage, Page, PageId, PageQuery};
use crate::store::traits::{MetaStore, PageStore, Store, MAX_HIERARCHY_DEPTH};

#[derive(Debug, Default)]
struct MemoryState {
    pages: BTreeMap<PageId, Page>,
    meta: HashMap<PageId, Vec<MetaEntry>>,
    last_id: PageId,
}

/// Page store kept entirely in memory, used for development and tests
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<MemoryState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.state.read().pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn derive_full_path(pages: &BTreeMap<PageId, Page>, id: PageId) -> Result<String> {
    let mut current = pages
        .get(&id)
        .ok_or_else(|| anyhow!("Page not found: {}", id))?;
    let mut visited = HashSet::new();
    let mut slugs = Vec::new();

    loop {
        if !visited.insert(current.id) {
            bail!("Page hierarchy loop detected at page {}", current.id);
        }
        if slugs.len() >= MAX_HIERARCHY_DEPTH {
            bail!("Page hierarchy of {} exceeds {} levels", id, MAX_HIERARCHY_DEPTH);
        }
        slugs.push(current.slug.as_str());

        match current.parent.and_then(|parent| pages.get(&parent)) {
            Some(parent) => current = parent,
            None => break,
        }
    }

    Ok(slugs.iter().rev().join("/"))
}

#[async_trait::async_trait]
impl PageStore for InMemoryStore {
    async fn get_page(&self, id: PageId) -> Result<Option<Page>> {
        Ok(self.state.read().pages.get(&id).cloned())
    }

    async fn find_by_full_path(&self, post_type: &str, path: &str) -> Result<Vec<Page>> {
        let state = self.state.read();
        let leaf = path.rsplit('/').next().unwrap_or(path);

        let mut matches = Vec::new();
        for page in state
            .pages
            .values()
            .filter(|page| page.post_type == post_type && page.slug == leaf)
        {
            match derive_full_path(&state.pages, page.id) {
                Ok(full_path) if full_path == path => matches.push(page.clone()),
                Ok(_) => {}
                Err(e) => log::warn!("Skipping page {} during path lookup: {}", page.id, e),
            }
        }

        Ok(matches)
    }

    async fn list_children(&self, query: &ChildQuery) -> Result<Vec<Page>> {
        let state = self.state.read();
        let children = state
            .pages
            .values()
            .filter(|page| {
                page.parent == Some(query.parent)
                    && page.post_type == query.post_type
                    && query.status.map_or(true, |status| page.status == status)
            })
            .sorted_by_key(|page| (page.menu_order, page.id))
            .cloned()
            .collect();

        Ok(children)
    }

    async fn full_path_of(&self, id: PageId) -> Result<String> {
        derive_full_path(&self.state.read().pages, id)
    }

    async fn list_pages(&self, query: &PageQuery) -> Result<(Vec<Page>, usize)> {
        let state = self.state.read();
        let matching: Vec<&Page> = state
            .pages
            .values()
            .filter(|page| page.post_type == query.post_type && query.statuses.contains(&page.status))
            .sorted_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)))
            .collect();

        let total = matching.len();
        let window = matching
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect();

        Ok((window, total))
    }

    async fn insert_page(&self, page: NewPage) -> Result<Page> {
        let mut state = self.state.write();
        state.last_id += 1;
        let page = page.into_page(state.last_id, chrono::Utc::now());
        state.pages.insert(page.id, page.clone());
        Ok(page)
    }

    async fn update_page(&self, page: Page) -> Result<()> {
        let mut state = self.state.write();
        match state.pages.get_mut(&page.id) {
            Some(existing) => {
                *existing = page;
                Ok(())
            }
            None => bail!("Page not found: {}", page.id),
        }
    }

    async fn delete_page(&self, id: PageId) -> Result<bool> {
        let mut state = self.state.write();
        let Some(removed) = state.pages.remove(&id) else {
            return Ok(false);
        };

        for page in state.pages.values_mut() {
            if page.parent == Some(id) {
                page.parent = removed.parent;
            }
        }
        state.meta.remove(&id);

        Ok(true)
    }
}

#[async_trait::async_trait]
impl MetaStore for InMemoryStore {
    async fn list_meta(&self, id: PageId) -> Result<Vec<MetaEntry>> {
        Ok(self.state.read().meta.get(&id).cloned().unwrap_or_default())
    }

    async fn set_meta(&self, id: PageId, entry: MetaEntry) -> Result<()> {
        let mut state = self.state.write();
        let entries = state.meta.entry(id).or_default();
        match entries.iter_mut().find(|existing| existing.key == entry.key) {
            Some(existing) => existing.value = entry.value,
            None => entries.push(entry),
        }
        Ok(())
    }
}

impl Store for InMemoryStore {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PostStatus, PAGE_TYPE};

    async fn seeded() -> (InMemoryStore, PageId, PageId) {
        let store = InMemoryStore::new();
        let about = store.insert_page(NewPage::new("About", "about", 1)).await.unwrap();
        let team = store
            .insert_page(NewPage::new("Team", "team", 1).with_parent(about.id))
            .await
            .unwrap();
        (store, about.id, team.id)
    }

    #[tokio::test]
    async fn test_full_path_follows_parent_chain() {
        let (store, about, team) = seeded().await;
        assert_eq!(store.full_path_of(about).await.unwrap(), "about");
        assert_eq!(store.full_path_of(team).await.unwrap(), "about/team");
        assert!(store.full_path_of(999).await.is_err());
    }

    #[tokio::test]
    async fn test_find_by_full_path_is_exact() {
        let (store, _, team) = seeded().await;

        let found = store.find_by_full_path(PAGE_TYPE, "about/team").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, team);

        assert!(store.find_by_full_path(PAGE_TYPE, "team").await.unwrap().is_empty());
        assert!(store.find_by_full_path(PAGE_TYPE, "About/Team").await.unwrap().is_empty());
        assert!(store.find_by_full_path(PAGE_TYPE, "about/team/").await.unwrap().is_empty());
        assert!(store.find_by_full_path("post", "about/team").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dangling_parent_ends_chain() {
        let store = InMemoryStore::new();
        let orphan = store
            .insert_page(NewPage::new("Orphan", "orphan", 1).with_parent(42))
            .await
            .unwrap();
        assert_eq!(store.full_path_of(orphan.id).await.unwrap(), "orphan");
    }

    #[tokio::test]
    async fn test_hierarchy_loop_is_an_error() {
        let (store, about, team) = seeded().await;
        let mut root = store.get_page(about).await.unwrap().unwrap();
        root.parent = Some(team);
        store.update_page(root).await.unwrap();

        let err = store.full_path_of(team).await.unwrap_err();
        assert!(err.to_string().contains("loop"));
        // Lookups skip pages whose hierarchy cannot be derived
        assert!(store.find_by_full_path(PAGE_TYPE, "about/team").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_children_orders_by_menu_order() {
        let (store, about, team) = seeded().await;
        let history = store
            .insert_page(NewPage::new("History", "history", 1).with_parent(about).with_menu_order(-1))
            .await
            .unwrap();
        store
            .insert_page(
                NewPage::new("Draft", "draft", 1)
                    .with_parent(about)
                    .with_status(PostStatus::Draft),
            )
            .await
            .unwrap();

        let children = store.list_children(&ChildQuery::published(about)).await.unwrap();
        let ids: Vec<PageId> = children.iter().map(|page| page.id).collect();
        assert_eq!(ids, vec![history.id, team]);
    }

    #[tokio::test]
    async fn test_delete_reparents_children() {
        let (store, about, team) = seeded().await;
        let lead = store
            .insert_page(NewPage::new("Lead", "lead", 1).with_parent(team))
            .await
            .unwrap();

        assert!(store.delete_page(team).await.unwrap());
        assert!(!store.delete_page(team).await.unwrap());

        let lead = store.get_page(lead.id).await.unwrap().unwrap();
        assert_eq!(lead.parent, Some(about));
        assert_eq!(store.full_path_of(lead.id).await.unwrap(), "about/lead");
    }

    #[tokio::test]
    async fn test_meta_upserts_by_key() {
        let (store, about, _) = seeded().await;
        store.set_meta(about, MetaEntry::new("color", serde_json::json!("red"))).await.unwrap();
        store.set_meta(about, MetaEntry::new("color", serde_json::json!("blue"))).await.unwrap();

        let meta = store.list_meta(about).await.unwrap();
        assert_eq!(meta, vec![MetaEntry::new("color", serde_json::json!("blue"))]);
    }
}
