//! Layouts, pages and page routes

use sea_orm::sea_query::{Expr, Query};
use sea_orm::{ConnectionTrait, DbErr};
use tracing::{info, warn};

use super::{ChangeSet, Upserted, normalize_guid};
use crate::database::schema::{
    Attribute, AttributeValue, BLOCK_TYPE_QUALIFIER_COLUMN, Block, Layout, Page, PageRoute,
};

#[derive(Debug, Clone)]
pub struct LayoutSpec<'a> {
    pub guid: &'a str,
    pub name: &'a str,
    pub file_name: &'a str,
}

#[derive(Debug, Clone)]
pub struct PageSpec<'a> {
    pub guid: &'a str,
    pub parent_page_guid: Option<&'a str>,
    pub layout_guid: Option<&'a str>,
    pub internal_name: &'a str,
    pub page_title: &'a str,
    pub description: &'a str,
    pub icon_css_class: &'a str,
    pub order: i32,
}

impl<C: ConnectionTrait> ChangeSet<'_, C> {
    pub async fn upsert_layout(&self, spec: &LayoutSpec<'_>) -> Result<Upserted, DbErr> {
        self.upsert_by_guid(
            Layout::Table,
            spec.guid,
            vec![
                (Layout::Name, spec.name.into()),
                (Layout::FileName, spec.file_name.into()),
                (Layout::IsSystem, true.into()),
            ],
        )
        .await
    }

    /// Add the page, or bring an existing page with the same guid in line with `spec`
    pub async fn add_page(&self, spec: &PageSpec<'_>) -> Result<Upserted, DbErr> {
        let parent_id = match spec.parent_page_guid {
            Some(guid) => Some(self.require_id(Page::Table, guid).await?),
            None => None,
        };
        let layout_id = match spec.layout_guid {
            Some(guid) => Some(self.require_id(Layout::Table, guid).await?),
            None => None,
        };

        self.upsert_by_guid(
            Page::Table,
            spec.guid,
            vec![
                (Page::ParentPageId, parent_id.into()),
                (Page::LayoutId, layout_id.into()),
                (Page::InternalName, spec.internal_name.into()),
                (Page::PageTitle, spec.page_title.into()),
                (Page::Description, spec.description.into()),
                (Page::IconCssClass, spec.icon_css_class.into()),
                (Page::Order, spec.order.into()),
                (Page::IsSystem, true.into()),
            ],
        )
        .await
    }

    /// Re-parent a page; returns false when the page does not exist
    pub async fn move_page(&self, page_guid: &str, new_parent_guid: &str) -> Result<bool, DbErr> {
        let parent_id = self.require_id(Page::Table, new_parent_guid).await?;
        let update = Query::update()
            .table(Page::Table)
            .value(Page::ParentPageId, parent_id)
            .and_where(Expr::col(Page::Guid).eq(normalize_guid(page_guid)?))
            .to_owned();
        Ok(self.exec(&update).await? > 0)
    }

    pub async fn rename_page(
        &self,
        page_guid: &str,
        internal_name: &str,
        page_title: &str,
    ) -> Result<bool, DbErr> {
        let update = Query::update()
            .table(Page::Table)
            .values([
                (Page::InternalName, internal_name.into()),
                (Page::PageTitle, page_title.into()),
            ])
            .and_where(Expr::col(Page::Guid).eq(normalize_guid(page_guid)?))
            .to_owned();
        Ok(self.exec(&update).await? > 0)
    }

    /// Remove a page together with its routes, blocks and their attribute values
    pub async fn delete_page(&self, page_guid: &str) -> Result<bool, DbErr> {
        let Some(page_id) = self.id_by_guid(Page::Table, page_guid).await? else {
            return Ok(false);
        };

        let block_ids = self.block_ids_where(Expr::col(Block::PageId).eq(page_id)).await?;
        self.delete_block_values(&block_ids).await?;
        self.exec(
            &Query::delete()
                .from_table(Block::Table)
                .and_where(Expr::col(Block::PageId).eq(page_id))
                .to_owned(),
        )
        .await?;
        self.exec(
            &Query::delete()
                .from_table(PageRoute::Table)
                .and_where(Expr::col(PageRoute::PageId).eq(page_id))
                .to_owned(),
        )
        .await?;
        self.delete_by_guid(Page::Table, page_guid).await
    }

    pub async fn add_or_update_page_route(
        &self,
        page_guid: &str,
        route: &str,
        guid: &str,
    ) -> Result<Upserted, DbErr> {
        let page_id = self.require_id(Page::Table, page_guid).await?;
        self.upsert_by_guid(
            PageRoute::Table,
            guid,
            vec![
                (PageRoute::PageId, page_id.into()),
                (PageRoute::Route, route.into()),
                (PageRoute::IsSystem, true.into()),
            ],
        )
        .await
    }

    pub async fn delete_page_route(&self, guid: &str) -> Result<bool, DbErr> {
        self.delete_by_guid(PageRoute::Table, guid).await
    }

    /// Rewrite route text `old_route` to `new_route` wherever it appears.
    ///
    /// Skipped when `new_route` already exists, since two pages must not share a route.
    pub async fn rename_route(&self, old_route: &str, new_route: &str) -> Result<u64, DbErr> {
        let existing = Query::select()
            .column(PageRoute::Id)
            .from(PageRoute::Table)
            .and_where(Expr::col(PageRoute::Route).eq(new_route))
            .to_owned();
        if self
            .connection()
            .query_one(self.backend().build(&existing))
            .await?
            .is_some()
        {
            warn!(
                version = %self.version(),
                old_route, new_route, "Target route already exists; leaving old route in place"
            );
            return Ok(0);
        }

        let update = Query::update()
            .table(PageRoute::Table)
            .value(PageRoute::Route, new_route)
            .and_where(Expr::col(PageRoute::Route).eq(old_route))
            .to_owned();
        let renamed = self.exec(&update).await?;
        if renamed > 0 {
            info!(version = %self.version(), old_route, new_route, renamed, "Remapped route");
        }
        Ok(renamed)
    }

    /// Attribute values stored on the given blocks
    pub(crate) async fn delete_block_values(&self, block_ids: &[i32]) -> Result<u64, DbErr> {
        if block_ids.is_empty() {
            return Ok(0);
        }
        let block_attribute_ids = self.block_attribute_ids().await?;
        if block_attribute_ids.is_empty() {
            return Ok(0);
        }
        let delete = Query::delete()
            .from_table(AttributeValue::Table)
            .and_where(Expr::col(AttributeValue::EntityId).is_in(block_ids.iter().copied()))
            .and_where(
                Expr::col(AttributeValue::AttributeId)
                    .is_in(block_attribute_ids.iter().copied()),
            )
            .to_owned();
        self.exec(&delete).await
    }

    /// Ids of every attribute that hangs off a block type
    pub(crate) async fn block_attribute_ids(&self) -> Result<Vec<i32>, DbErr> {
        let select = Query::select()
            .column(Attribute::Id)
            .from(Attribute::Table)
            .and_where(
                Expr::col(Attribute::EntityTypeQualifierColumn).eq(BLOCK_TYPE_QUALIFIER_COLUMN),
            )
            .to_owned();
        let rows = self
            .connection()
            .query_all(self.backend().build(&select))
            .await?;
        rows.iter().map(|r| r.try_get::<i32>("", "id")).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::guids;
    use crate::database::test_support::migrated_db;

    const PAGE: &str = "11111111-2222-4333-8444-555555555555";
    const ROUTE: &str = "66666666-7777-4888-8999-000000000000";

    fn page_spec() -> PageSpec<'static> {
        PageSpec {
            guid: PAGE,
            parent_page_guid: Some(guids::page::FINANCE),
            layout_guid: Some(guids::layout::FULL_WIDTH),
            internal_name: "Pledge Analytics",
            page_title: "Pledge Analytics",
            description: "Pledge progress by campaign",
            icon_css_class: "fa fa-chart-line",
            order: 4,
        }
    }

    #[tokio::test]
    async fn test_add_page_twice_keeps_one_row() {
        let db = migrated_db().await;
        let changes = ChangeSet::new(&db, "test");

        let first = changes.add_page(&page_spec()).await.unwrap();
        let second = changes.add_page(&page_spec()).await.unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_add_page_requires_parent() {
        let db = migrated_db().await;
        let changes = ChangeSet::new(&db, "test");
        let mut spec = page_spec();
        spec.parent_page_guid = Some("99999999-9999-4999-8999-999999999999");

        let err = changes.add_page(&spec).await.unwrap_err();
        assert!(matches!(err, DbErr::RecordNotFound(_)));
    }

    #[tokio::test]
    async fn test_route_add_rename_and_collision() {
        let db = migrated_db().await;
        let changes = ChangeSet::new(&db, "test");
        changes.add_page(&page_spec()).await.unwrap();

        changes
            .add_or_update_page_route(PAGE, "finance/pledges", ROUTE)
            .await
            .unwrap();
        changes
            .add_or_update_page_route(PAGE, "finance/pledges", ROUTE)
            .await
            .unwrap();

        assert_eq!(
            changes.rename_route("finance/pledges", "finance/pledge-analytics").await.unwrap(),
            1
        );
        // Second run finds nothing left to rename
        assert_eq!(
            changes.rename_route("finance/pledges", "finance/pledge-analytics").await.unwrap(),
            0
        );

        // Renaming onto an existing route is refused
        changes
            .add_or_update_page_route(PAGE, "finance/pledges", "12121212-3434-4565-8787-909090909090")
            .await
            .unwrap();
        assert_eq!(
            changes.rename_route("finance/pledges", "finance/pledge-analytics").await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_move_and_delete_page() {
        let db = migrated_db().await;
        let changes = ChangeSet::new(&db, "test");
        changes.add_page(&page_spec()).await.unwrap();
        changes
            .add_or_update_page_route(PAGE, "finance/pledges", ROUTE)
            .await
            .unwrap();

        assert!(changes.move_page(PAGE, guids::page::INTERNAL_HOMEPAGE).await.unwrap());
        assert!(changes.rename_page(PAGE, "Pledges", "Pledges").await.unwrap());
        assert!(changes.delete_page(PAGE).await.unwrap());
        assert!(!changes.delete_page(PAGE).await.unwrap());
        assert_eq!(changes.id_by_guid(PageRoute::Table, ROUTE).await.unwrap(), None);
    }
}
