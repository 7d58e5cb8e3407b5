//! System rows every later unit builds on
//!
//! Entity and field types, the default layouts, the internal home and
//! finance pages, the person and finance categories with their defined
//! types, the stock block types and the legacy serving-team group type.

use sea_orm_migration::prelude::*;

use crate::database::changes::{
    AttributeSpec, BlockTypeSpec, CategorySpec, ChangeSet, DefinedTypeSpec, DefinedValueSpec,
    EntityTypeSpec, FieldTypeSpec, LayoutSpec, PageSpec,
};
use crate::database::guids;
use crate::database::schema::{
    Category, DefinedType, EntityType, FieldType, GroupType, GroupTypeRole, Layout,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

const ENTITY_TYPES: &[(&str, &str, &str)] = &[
    (guids::entity_type::BLOCK, "Rock.Model.Block", "Block"),
    (guids::entity_type::PAGE, "Rock.Model.Page", "Page"),
    (guids::entity_type::DEFINED_TYPE, "Rock.Model.DefinedType", "Defined Type"),
    (
        guids::entity_type::SYSTEM_COMMUNICATION,
        "Rock.Model.SystemCommunication",
        "System Communication",
    ),
    (guids::entity_type::SERVICE_JOB, "Rock.Model.ServiceJob", "Job"),
];

const FIELD_TYPES: &[(&str, &str, &str)] = &[
    (guids::field_type::TEXT, "Text", "Rock.Field.Types.TextFieldType"),
    (guids::field_type::BOOLEAN, "Boolean", "Rock.Field.Types.BooleanFieldType"),
    (guids::field_type::INTEGER, "Integer", "Rock.Field.Types.IntegerFieldType"),
    (guids::field_type::CODE_EDITOR, "Code Editor", "Rock.Field.Types.CodeEditorFieldType"),
    (guids::field_type::PAGE_REFERENCE, "Page Reference", "Rock.Field.Types.PageReferenceFieldType"),
];

/// (guid, value, description, order)
const RECORD_STATUSES: &[(&str, &str, &str, i32)] = &[
    (guids::defined_value::RECORD_STATUS_ACTIVE, "Active", "Active record", 0),
    (guids::defined_value::RECORD_STATUS_INACTIVE, "Inactive", "Inactive record", 1),
    (guids::defined_value::RECORD_STATUS_PENDING, "Pending", "Awaiting review", 2),
];

const CONNECTION_STATUSES: &[(&str, &str, &str, i32)] = &[
    (guids::defined_value::CONNECTION_STATUS_VISITOR, "Visitor", "First-time guest", 0),
    (
        guids::defined_value::CONNECTION_STATUS_WEB_PROSPECT,
        "Web Prospect",
        "Created from an online form",
        1,
    ),
];

const TRANSACTION_LIST_ATTRIBUTES: &[(&str, &str, &str, &str, &str)] = &[
    // (legacy guid, new guid, key, name, field type)
    (
        guids::attribute::LEGACY_TRANSACTION_LIST_TITLE,
        guids::attribute::TRANSACTION_LIST_TITLE,
        "Title",
        "Title",
        guids::field_type::TEXT,
    ),
    (
        guids::attribute::LEGACY_TRANSACTION_LIST_SHOW_ACCOUNT,
        guids::attribute::TRANSACTION_LIST_SHOW_ACCOUNT,
        "ShowAccountColumn",
        "Show Account Column",
        guids::field_type::BOOLEAN,
    ),
    (
        guids::attribute::LEGACY_TRANSACTION_LIST_CONTEXT_ENTITY,
        guids::attribute::TRANSACTION_LIST_CONTEXT_ENTITY,
        "ContextEntityType",
        "Context Entity Type",
        guids::field_type::TEXT,
    ),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let changes = ChangeSet::new(manager.get_connection(), self.name());

        for &(guid, name, friendly_name) in ENTITY_TYPES {
            changes
                .upsert_entity_type(&EntityTypeSpec {
                    guid,
                    name,
                    friendly_name,
                    is_entity: true,
                    is_secured: true,
                })
                .await?;
        }
        for &(guid, name, class) in FIELD_TYPES {
            changes
                .upsert_field_type(&FieldTypeSpec { guid, name, class })
                .await?;
        }

        changes
            .upsert_layout(&LayoutSpec {
                guid: guids::layout::FULL_WIDTH,
                name: "Full Width",
                file_name: "FullWidth",
            })
            .await?;
        changes
            .upsert_layout(&LayoutSpec {
                guid: guids::layout::RIGHT_SIDEBAR,
                name: "Right Sidebar",
                file_name: "RightSidebar",
            })
            .await?;

        changes
            .add_page(&PageSpec {
                guid: guids::page::INTERNAL_HOMEPAGE,
                parent_page_guid: None,
                layout_guid: Some(guids::layout::FULL_WIDTH),
                internal_name: "Internal Homepage",
                page_title: "Internal Homepage",
                description: "Main Rock homepage",
                icon_css_class: "fa fa-home",
                order: 0,
            })
            .await?;
        changes
            .add_page(&PageSpec {
                guid: guids::page::FINANCE,
                parent_page_guid: Some(guids::page::INTERNAL_HOMEPAGE),
                layout_guid: Some(guids::layout::FULL_WIDTH),
                internal_name: "Finance",
                page_title: "Finance",
                description: "Financial transactions and reports",
                icon_css_class: "fa fa-money",
                order: 3,
            })
            .await?;
        changes
            .add_page(&PageSpec {
                guid: guids::page::MY_ACCOUNT,
                parent_page_guid: Some(guids::page::INTERNAL_HOMEPAGE),
                layout_guid: Some(guids::layout::RIGHT_SIDEBAR),
                internal_name: "My Account",
                page_title: "My Account",
                description: "Profile and giving history of the signed in person",
                icon_css_class: "fa fa-dashboard",
                order: 9,
            })
            .await?;
        changes
            .add_or_update_page_route(
                guids::page::MY_ACCOUNT,
                "MyAccount",
                guids::page_route::MY_ACCOUNT,
            )
            .await?;

        changes
            .upsert_category(&CategorySpec {
                guid: guids::category::FINANCE_COMMUNICATIONS,
                entity_type_guid: Some(guids::entity_type::SYSTEM_COMMUNICATION),
                qualifier_column: None,
                qualifier_value: None,
                name: "Finance",
                icon_css_class: "fa fa-money",
                order: 0,
            })
            .await?;
        changes
            .upsert_category(&CategorySpec {
                guid: guids::category::PERSON_DEFINED_TYPES,
                entity_type_guid: Some(guids::entity_type::DEFINED_TYPE),
                qualifier_column: None,
                qualifier_value: None,
                name: "Person",
                icon_css_class: "fa fa-user",
                order: 0,
            })
            .await?;

        for (type_guid, name, values) in [
            (guids::defined_type::RECORD_STATUS, "Record Status", RECORD_STATUSES),
            (
                guids::defined_type::CONNECTION_STATUS,
                "Connection Status",
                CONNECTION_STATUSES,
            ),
        ] {
            changes
                .upsert_defined_type(&DefinedTypeSpec {
                    guid: type_guid,
                    category_guid: Some(guids::category::PERSON_DEFINED_TYPES),
                    name,
                    description: "",
                })
                .await?;
            for &(guid, value, description, order) in values {
                changes
                    .upsert_defined_value(&DefinedValueSpec {
                        guid,
                        defined_type_guid: type_guid,
                        value,
                        description,
                        order,
                    })
                    .await?;
            }
        }

        changes
            .upsert_block_type(&BlockTypeSpec {
                guid: guids::block_type::HTML_CONTENT,
                name: "HTML Content",
                description: "Adds an editable HTML fragment to the page",
                path: "~/Blocks/Cms/HtmlContentDetail.ascx",
                category: "CMS",
            })
            .await?;
        changes
            .upsert_block_type_attribute(&AttributeSpec {
                guid: guids::attribute::HTML_CONTENT_CACHE_DURATION,
                block_type_guid: guids::block_type::HTML_CONTENT,
                field_type_guid: guids::field_type::INTEGER,
                key: "CacheDuration",
                name: "Cache Duration",
                description: "Seconds to cache the rendered content",
                order: 0,
                default_value: "0",
            })
            .await?;

        changes
            .upsert_block_type(&BlockTypeSpec {
                guid: guids::block_type::LEGACY_TRANSACTION_LIST,
                name: "Transaction List (Legacy)",
                description: "Lists financial transactions",
                path: "~/Blocks/Finance/TransactionList.ascx",
                category: "Finance",
            })
            .await?;
        changes
            .upsert_block_type(&BlockTypeSpec {
                guid: guids::block_type::TRANSACTION_LIST,
                name: "Transaction List",
                description: "Lists financial transactions",
                path: "Rock.Blocks.Finance.FinancialTransactionList",
                category: "Finance",
            })
            .await?;
        for (order, &(legacy_guid, new_guid, key, name, field_type_guid)) in
            TRANSACTION_LIST_ATTRIBUTES.iter().enumerate()
        {
            for (guid, block_type_guid) in [
                (legacy_guid, guids::block_type::LEGACY_TRANSACTION_LIST),
                (new_guid, guids::block_type::TRANSACTION_LIST),
            ] {
                changes
                    .upsert_block_type_attribute(&AttributeSpec {
                        guid,
                        block_type_guid,
                        field_type_guid,
                        key,
                        name,
                        description: "",
                        order: order as i32,
                        default_value: "",
                    })
                    .await?;
            }
        }

        seed_legacy_group_type(&changes).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let changes = ChangeSet::new(manager.get_connection(), self.name());

        changes
            .delete_group_type_best_effort(guids::group_type::LEGACY_SERVING_TEAM)
            .await?;
        for block_type in [
            guids::block_type::TRANSACTION_LIST,
            guids::block_type::LEGACY_TRANSACTION_LIST,
            guids::block_type::HTML_CONTENT,
        ] {
            changes.delete_block_type(block_type).await?;
        }
        for &(guid, _, _, _) in CONNECTION_STATUSES.iter().chain(RECORD_STATUSES).rev() {
            changes.delete_defined_value(guid).await?;
        }
        for defined_type in [
            guids::defined_type::CONNECTION_STATUS,
            guids::defined_type::RECORD_STATUS,
        ] {
            changes.delete_by_guid(DefinedType::Table, defined_type).await?;
        }
        for category in [
            guids::category::PERSON_DEFINED_TYPES,
            guids::category::FINANCE_COMMUNICATIONS,
        ] {
            changes.delete_by_guid(Category::Table, category).await?;
        }
        for page in [
            guids::page::MY_ACCOUNT,
            guids::page::FINANCE,
            guids::page::INTERNAL_HOMEPAGE,
        ] {
            changes.delete_page(page).await?;
        }
        for layout in [guids::layout::RIGHT_SIDEBAR, guids::layout::FULL_WIDTH] {
            changes.delete_by_guid(Layout::Table, layout).await?;
        }
        for &(guid, _, _) in FIELD_TYPES.iter().rev() {
            changes.delete_by_guid(FieldType::Table, guid).await?;
        }
        for &(guid, _, _) in ENTITY_TYPES.iter().rev() {
            changes.delete_by_guid(EntityType::Table, guid).await?;
        }

        Ok(())
    }
}

/// Group type retired by a later unit; seeded here so that unit has something to remove
async fn seed_legacy_group_type<C: ConnectionTrait>(changes: &ChangeSet<'_, C>) -> Result<(), DbErr> {
    let group_type = changes
        .upsert_by_guid(
            GroupType::Table,
            guids::group_type::LEGACY_SERVING_TEAM,
            vec![
                (GroupType::Name, "Serving Team (Legacy)".into()),
                (GroupType::IsSystem, true.into()),
            ],
        )
        .await?;

    changes
        .upsert_by_guid(
            GroupTypeRole::Table,
            LEGACY_SERVING_TEAM_MEMBER_ROLE,
            vec![
                (GroupTypeRole::GroupTypeId, group_type.id.into()),
                (GroupTypeRole::Name, "Member".into()),
                (GroupTypeRole::IsLeader, false.into()),
            ],
        )
        .await?;
    Ok(())
}

const LEGACY_SERVING_TEAM_MEMBER_ROLE: &str = "f7c5b3a1-9e8d-4c6b-a4f2-1e0d9c8b7a65";
