use std::sync::Arc;

use crate::logic::authorize::RoleAuthorizer;
use crate::logic::hooks::HookRegistry;
use crate::logic::links::UrlBuilder;
use crate::logic::pages::PageOperations;
use crate::logic::posts::PostOperations;
use crate::model::{NewPage, PageId, PAGE_TYPE};
use crate::store::{InMemoryStore, PageStore};

/// Ids of the sample hierarchy:
///
/// ```text
/// about            (rank 0)
///   history        (rank 1)
///   team           (rank 2)
/// contact          (rank 0)
/// ```
pub struct Tree {
    pub about: PageId,
    pub team: PageId,
    pub history: PageId,
    pub contact: PageId,
}

pub async fn seed_tree(store: &InMemoryStore) -> Tree {
    let about = store.insert_page(NewPage::new("About", "about", 1)).await.unwrap();
    let team = store
        .insert_page(NewPage::new("Team", "team", 1).with_parent(about.id).with_menu_order(2))
        .await
        .unwrap();
    let history = store
        .insert_page(
            NewPage::new("History", "history", 1)
                .with_parent(about.id)
                .with_menu_order(1),
        )
        .await
        .unwrap();
    let contact = store.insert_page(NewPage::new("Contact", "contact", 1)).await.unwrap();

    Tree {
        about: about.id,
        team: team.id,
        history: history.id,
        contact: contact.id,
    }
}

pub fn urls() -> UrlBuilder {
    UrlBuilder::new("http://api.test", "http://site.test", "/pages")
}

pub fn post_operations_with_hooks(
    store: Arc<InMemoryStore>,
    hooks: HookRegistry,
) -> PostOperations<InMemoryStore> {
    PostOperations::new(
        store,
        Arc::new(RoleAuthorizer),
        Arc::new(hooks),
        urls(),
        PAGE_TYPE,
    )
}

pub fn post_operations(store: Arc<InMemoryStore>) -> PostOperations<InMemoryStore> {
    post_operations_with_hooks(store, HookRegistry::new())
}

pub fn page_operations(store: Arc<InMemoryStore>) -> PageOperations<InMemoryStore> {
    PageOperations::new(post_operations(store))
}
