use crate::model::{AuthorId, MetaEntry, NewPage, Page, PageId, PostStatus, PAGE_TYPE};
use crate::store::traits::Store;
use anyhow::Result;
use serde_json::json;

/// Author id used for every seeded page
const SEED_AUTHOR: AuthorId = 1;

/// Helper function to insert a published page under `parent`
async fn create_seed_page<S: Store>(
    store: &S,
    title: &str,
    slug: &str,
    parent: Option<PageId>,
    menu_order: i32,
    content: &str,
) -> Result<Page> {
    let mut page = NewPage::new(title, slug, SEED_AUTHOR)
        .with_menu_order(menu_order)
        .with_content(content);
    if let Some(parent) = parent {
        page = page.with_parent(parent);
    }
    store.insert_page(page).await
}

/// Sample site structure:
///
/// ```text
/// about
///   history
///   team
///     leadership
/// services
///   consulting
///   training
/// contact
/// ```
pub async fn load_seed_data<S: Store>(store: &S) -> Result<()> {
    if !store.find_by_full_path(PAGE_TYPE, "about").await?.is_empty() {
        log::info!("Seed pages already present, skipping");
        return Ok(());
    }

    let about = create_seed_page(store, "About", "about", None, 0, "Who we are.").await?;
    create_seed_page(
        store,
        "History",
        "history",
        Some(about.id),
        1,
        "Founded in a garage, still tinkering.",
    )
    .await?;
    let team = create_seed_page(store, "Team", "team", Some(about.id), 2, "The people.").await?;
    create_seed_page(store, "Leadership", "leadership", Some(team.id), 0, "").await?;

    let services = create_seed_page(store, "Services", "services", None, 1, "").await?;
    create_seed_page(store, "Consulting", "consulting", Some(services.id), 0, "").await?;
    create_seed_page(store, "Training", "training", Some(services.id), 1, "").await?;

    let contact = create_seed_page(store, "Contact", "contact", None, 2, "Write to us.").await?;
    store
        .set_meta(contact.id, MetaEntry::new("email", json!("hello@example.com")))
        .await?;
    store
        .set_meta(contact.id, MetaEntry::new("_form_id", json!(12)))
        .await?;

    // A draft is stored but never listed as a child
    store
        .insert_page(
            NewPage::new("Careers", "careers", SEED_AUTHOR)
                .with_parent(about.id)
                .with_menu_order(3)
                .with_status(PostStatus::Draft),
        )
        .await?;

    log::info!("Seed pages loaded: about, services and contact trees");
    Ok(())
}
