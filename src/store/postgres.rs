use anyhow::{anyhow, bail, Context, Result};
use sqlx::{
    postgres::{PgPoolOptions, PgRow},
    PgPool, Row,
};
use std::collections::HashSet;

use crate::model::{ChildQuery, MetaEntry, NewPage, Page, PageId, PageQuery, PostStatus};
use crate::store::traits::{MetaStore, PageStore, Store, MAX_HIERARCHY_DEPTH};

const PAGE_COLUMNS: &str =
    "p.id, p.post_type, p.parent_id, p.menu_order, p.slug, p.title, p.content, p.excerpt, p.status, p.author, p.created_at, p.modified_at";

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }
}

fn decode_status(value: &str) -> Result<PostStatus> {
    PostStatus::parse(value).ok_or_else(|| anyhow!("Unknown post status '{}'", value))
}

fn page_from_row(row: &PgRow) -> Result<Page> {
    let status: String = row.try_get("status")?;

    Ok(Page {
        id: row.try_get("id")?,
        post_type: row.try_get("post_type")?,
        parent: row.try_get("parent_id")?,
        menu_order: row.try_get("menu_order")?,
        slug: row.try_get("slug")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        excerpt: row.try_get("excerpt")?,
        status: decode_status(&status)?,
        author: row.try_get("author")?,
        date: row.try_get("created_at")?,
        modified: row.try_get("modified_at")?,
    })
}

#[async_trait::async_trait]
impl PageStore for PostgresStore {
    async fn get_page(&self, id: PageId) -> Result<Option<Page>> {
        let row = sqlx::query(&format!("SELECT {} FROM pages p WHERE p.id = $1", PAGE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch page")?;

        row.as_ref().map(page_from_row).transpose()
    }

    async fn find_by_full_path(&self, post_type: &str, path: &str) -> Result<Vec<Page>> {
        // Pages whose parent is missing are treated as roots, matching
        // full_path_of which ends the chain at a missing parent.
        let sql = format!(
            r#"
            WITH RECURSIVE tree AS (
                SELECT r.id, r.slug AS full_path, 1 AS depth
                FROM pages r
                WHERE r.parent_id IS NULL
                   OR NOT EXISTS (SELECT 1 FROM pages q WHERE q.id = r.parent_id)
                UNION ALL
                SELECT c.id, tree.full_path || '/' || c.slug, tree.depth + 1
                FROM pages c
                JOIN tree ON c.parent_id = tree.id
                WHERE tree.depth < $3
            )
            SELECT {}
            FROM tree
            JOIN pages p ON p.id = tree.id
            WHERE p.post_type = $1 AND tree.full_path = $2
            ORDER BY p.id
            "#,
            PAGE_COLUMNS
        );

        let rows = sqlx::query(&sql)
            .bind(post_type)
            .bind(path)
            .bind(MAX_HIERARCHY_DEPTH as i32)
            .fetch_all(&self.pool)
            .await
            .context("Failed to look up page by path")?;

        rows.iter().map(page_from_row).collect()
    }

    async fn list_children(&self, query: &ChildQuery) -> Result<Vec<Page>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM pages p
            WHERE p.parent_id = $1
              AND p.post_type = $2
              AND ($3::text IS NULL OR p.status = $3)
            ORDER BY p.menu_order ASC, p.id ASC
            "#,
            PAGE_COLUMNS
        );

        let rows = sqlx::query(&sql)
            .bind(query.parent)
            .bind(&query.post_type)
            .bind(query.status.map(|status| status.as_str()))
            .fetch_all(&self.pool)
            .await
            .context("Failed to list child pages")?;

        rows.iter().map(page_from_row).collect()
    }

    async fn full_path_of(&self, id: PageId) -> Result<String> {
        let rows = sqlx::query(
            r#"
            WITH RECURSIVE chain AS (
                SELECT id, parent_id, slug, 0 AS depth
                FROM pages
                WHERE id = $1
                UNION ALL
                SELECT p.id, p.parent_id, p.slug, chain.depth + 1
                FROM pages p
                JOIN chain ON p.id = chain.parent_id
                WHERE chain.depth < $2
            )
            SELECT id, slug FROM chain ORDER BY depth DESC
            "#,
        )
        .bind(id)
        .bind(MAX_HIERARCHY_DEPTH as i32)
        .fetch_all(&self.pool)
        .await
        .context("Failed to derive page path")?;

        if rows.is_empty() {
            bail!("Page not found: {}", id);
        }

        let mut seen = HashSet::new();
        let mut slugs = Vec::with_capacity(rows.len());
        for row in &rows {
            let ancestor: PageId = row.try_get("id")?;
            if !seen.insert(ancestor) {
                bail!("Page hierarchy loop detected at page {}", ancestor);
            }
            slugs.push(row.try_get::<String, _>("slug")?);
        }
        if slugs.len() > MAX_HIERARCHY_DEPTH {
            bail!("Page hierarchy of {} exceeds {} levels", id, MAX_HIERARCHY_DEPTH);
        }

        Ok(slugs.join("/"))
    }

    async fn list_pages(&self, query: &PageQuery) -> Result<(Vec<Page>, usize)> {
        let statuses: Vec<String> = query
            .statuses
            .iter()
            .map(|status| status.as_str().to_string())
            .collect();

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM pages WHERE post_type = $1 AND status = ANY($2)",
        )
        .bind(&query.post_type)
        .bind(&statuses)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count pages")?;

        let sql = format!(
            r#"
            SELECT {}
            FROM pages p
            WHERE p.post_type = $1 AND p.status = ANY($2)
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT $3 OFFSET $4
            "#,
            PAGE_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(&query.post_type)
            .bind(&statuses)
            .bind(i64::try_from(query.limit).unwrap_or(i64::MAX))
            .bind(i64::try_from(query.offset).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .context("Failed to list pages")?;

        let pages = rows.iter().map(page_from_row).collect::<Result<Vec<_>>>()?;
        Ok((pages, total as usize))
    }

    async fn insert_page(&self, page: NewPage) -> Result<Page> {
        let sql = format!(
            r#"
            INSERT INTO pages AS p (post_type, parent_id, menu_order, slug, title, content, excerpt, status, author)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            PAGE_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(&page.post_type)
            .bind(page.parent)
            .bind(page.menu_order)
            .bind(&page.slug)
            .bind(&page.title)
            .bind(&page.content)
            .bind(&page.excerpt)
            .bind(page.status.as_str())
            .bind(page.author)
            .fetch_one(&self.pool)
            .await
            .context("Failed to insert page")?;

        page_from_row(&row)
    }

    async fn update_page(&self, page: Page) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE pages SET
                post_type = $2,
                parent_id = $3,
                menu_order = $4,
                slug = $5,
                title = $6,
                content = $7,
                excerpt = $8,
                status = $9,
                author = $10,
                modified_at = $11
            WHERE id = $1
            "#,
        )
        .bind(page.id)
        .bind(&page.post_type)
        .bind(page.parent)
        .bind(page.menu_order)
        .bind(&page.slug)
        .bind(&page.title)
        .bind(&page.content)
        .bind(&page.excerpt)
        .bind(page.status.as_str())
        .bind(page.author)
        .bind(page.modified)
        .execute(&self.pool)
        .await
        .context("Failed to update page")?;

        if result.rows_affected() == 0 {
            bail!("Page not found: {}", page.id);
        }
        Ok(())
    }

    async fn delete_page(&self, id: PageId) -> Result<bool> {
        let mut tx = self.pool.begin().await.context("Failed to start transaction")?;

        let parent: Option<Option<PageId>> =
            sqlx::query_scalar("SELECT parent_id FROM pages WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .context("Failed to fetch page for deletion")?;

        let Some(parent) = parent else {
            return Ok(false);
        };

        sqlx::query("UPDATE pages SET parent_id = $2 WHERE parent_id = $1")
            .bind(id)
            .bind(parent)
            .execute(&mut *tx)
            .await
            .context("Failed to reparent child pages")?;

        sqlx::query("DELETE FROM pages WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete page")?;

        tx.commit().await.context("Failed to commit page deletion")?;
        Ok(true)
    }
}

#[async_trait::async_trait]
impl MetaStore for PostgresStore {
    async fn list_meta(&self, id: PageId) -> Result<Vec<MetaEntry>> {
        let rows = sqlx::query(
            "SELECT meta_key, meta_value FROM page_meta WHERE page_id = $1 ORDER BY meta_key",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list page meta")?;

        rows.iter()
            .map(|row| -> Result<MetaEntry> {
                Ok(MetaEntry {
                    key: row.try_get("meta_key")?,
                    value: row.try_get("meta_value")?,
                })
            })
            .collect()
    }

    async fn set_meta(&self, id: PageId, entry: MetaEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO page_meta (page_id, meta_key, meta_value)
            VALUES ($1, $2, $3)
            ON CONFLICT (page_id, meta_key) DO UPDATE SET meta_value = EXCLUDED.meta_value
            "#,
        )
        .bind(id)
        .bind(&entry.key)
        .bind(&entry.value)
        .execute(&self.pool)
        .await
        .context("Failed to set page meta")?;

        Ok(())
    }
}

impl Store for PostgresStore {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PAGE_TYPE;

    /// Store backed by `DATABASE_URL`; these tests are skipped without one
    async fn test_store() -> Option<PostgresStore> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            println!("DATABASE_URL not set, skipping PostgreSQL test");
            return None;
        };
        let store = PostgresStore::new(&url, 2).await.unwrap();
        store.migrate().await.unwrap();
        Some(store)
    }

    /// Root slug no other run of the suite will use
    fn unique_root(name: &str) -> String {
        let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
        format!("{}-{}", name, nanos)
    }

    #[tokio::test]
    async fn test_find_by_full_path_matches_exactly() {
        let Some(store) = test_store().await else { return };
        let root_slug = unique_root("about");
        let root = store.insert_page(NewPage::new("About", &root_slug, 1)).await.unwrap();
        let team = store
            .insert_page(NewPage::new("Team", "team", 1).with_parent(root.id))
            .await
            .unwrap();

        let path = format!("{}/team", root_slug);
        let found = store.find_by_full_path(PAGE_TYPE, &path).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, team.id);
        assert_eq!(store.full_path_of(team.id).await.unwrap(), path);

        // Case sensitive, no prefix matches, no matches under another type
        let upper = format!("{}/Team", root_slug);
        assert!(store.find_by_full_path(PAGE_TYPE, &upper).await.unwrap().is_empty());
        let partial = format!("{}/tea", root_slug);
        assert!(store.find_by_full_path(PAGE_TYPE, &partial).await.unwrap().is_empty());
        assert!(store.find_by_full_path("post", &path).await.unwrap().is_empty());

        store.delete_page(team.id).await.unwrap();
        store.delete_page(root.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_dangling_parent_acts_as_root() {
        let Some(store) = test_store().await else { return };
        let slug = unique_root("orphan");
        let orphan = store
            .insert_page(NewPage::new("Orphan", &slug, 1).with_parent(i64::MAX - 7))
            .await
            .unwrap();

        assert_eq!(store.full_path_of(orphan.id).await.unwrap(), slug);
        let found = store.find_by_full_path(PAGE_TYPE, &slug).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, orphan.id);

        store.delete_page(orphan.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_parent_loop_is_a_storage_error() {
        let Some(store) = test_store().await else { return };
        let slug = unique_root("loop");
        let mut first = store.insert_page(NewPage::new("First", &slug, 1)).await.unwrap();
        let second = store
            .insert_page(NewPage::new("Second", "second", 1).with_parent(first.id))
            .await
            .unwrap();

        first.parent = Some(second.id);
        store.update_page(first.clone()).await.unwrap();

        let err = store.full_path_of(first.id).await.unwrap_err();
        assert!(err.to_string().contains("loop"), "{}", err);
        assert!(store.full_path_of(second.id).await.is_err());

        // Neither page is reachable from a root any more
        let path = format!("{}/second", slug);
        assert!(store.find_by_full_path(PAGE_TYPE, &path).await.unwrap().is_empty());
        assert!(store.find_by_full_path(PAGE_TYPE, &slug).await.unwrap().is_empty());

        store.delete_page(second.id).await.unwrap();
        store.delete_page(first.id).await.unwrap();
    }

    #[test]
    fn test_decode_status() {
        assert_eq!(decode_status("publish").unwrap(), PostStatus::Publish);
        assert_eq!(decode_status("trash").unwrap(), PostStatus::Trash);
        assert!(decode_status("inherit").is_err());
    }
}
