//! Core CMS schema
//!
//! Every table carries an integer auto-increment `id` and a unique 36-char
//! `guid`. Owned rows cascade from their parent (attribute values, page
//! routes, defined values, group type roles); `group.group_type_id` does not,
//! so a group type in use cannot be dropped out from under its groups.

use sea_orm_migration::prelude::*;

use crate::database::schema::{
    Attribute, AttributeValue, Block, BlockType, Category, DefinedType, DefinedValue, EntityType,
    FieldType, Group, GroupType, GroupTypeRole, LavaShortcode, Layout, Page, PageRoute,
    RegistrationInstance, ServiceJob, SystemCommunication,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create tables in order of dependencies
        self.create_entity_type_table(manager).await?;
        self.create_field_type_table(manager).await?;
        self.create_category_table(manager).await?;
        self.create_layout_table(manager).await?;
        self.create_page_tables(manager).await?;
        self.create_block_tables(manager).await?;
        self.create_attribute_tables(manager).await?;
        self.create_defined_type_tables(manager).await?;
        self.create_service_job_table(manager).await?;
        self.create_system_communication_table(manager).await?;
        self.create_lava_shortcode_table(manager).await?;
        self.create_group_tables(manager).await?;
        self.create_registration_instance_table(manager).await?;

        self.create_indexes(manager).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order
        let tables: [DynIden; 19] = [
            RegistrationInstance::Table.into_iden(),
            Group::Table.into_iden(),
            GroupTypeRole::Table.into_iden(),
            GroupType::Table.into_iden(),
            LavaShortcode::Table.into_iden(),
            SystemCommunication::Table.into_iden(),
            ServiceJob::Table.into_iden(),
            DefinedValue::Table.into_iden(),
            DefinedType::Table.into_iden(),
            AttributeValue::Table.into_iden(),
            Attribute::Table.into_iden(),
            Block::Table.into_iden(),
            BlockType::Table.into_iden(),
            PageRoute::Table.into_iden(),
            Page::Table.into_iden(),
            Layout::Table.into_iden(),
            Category::Table.into_iden(),
            FieldType::Table.into_iden(),
            EntityType::Table.into_iden(),
        ];
        for table in tables {
            manager
                .drop_table(Table::drop().table(table).if_exists().to_owned())
                .await?;
        }

        Ok(())
    }
}

impl Migration {
    fn id_column(column: impl IntoIden) -> ColumnDef {
        ColumnDef::new(column)
            .integer()
            .not_null()
            .auto_increment()
            .primary_key()
            .to_owned()
    }

    fn guid_column(column: impl IntoIden) -> ColumnDef {
        ColumnDef::new(column)
            .string_len(36)
            .not_null()
            .unique_key()
            .to_owned()
    }

    fn flag_column(column: impl IntoIden) -> ColumnDef {
        ColumnDef::new(column)
            .boolean()
            .not_null()
            .default(false)
            .to_owned()
    }

    async fn create_entity_type_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EntityType::Table)
                    .if_not_exists()
                    .col(Self::id_column(EntityType::Id))
                    .col(Self::guid_column(EntityType::Guid))
                    .col(ColumnDef::new(EntityType::Name).string().not_null())
                    .col(ColumnDef::new(EntityType::FriendlyName).string())
                    .col(Self::flag_column(EntityType::IsEntity))
                    .col(Self::flag_column(EntityType::IsSecured))
                    .to_owned(),
            )
            .await
    }

    async fn create_field_type_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FieldType::Table)
                    .if_not_exists()
                    .col(Self::id_column(FieldType::Id))
                    .col(Self::guid_column(FieldType::Guid))
                    .col(ColumnDef::new(FieldType::Name).string().not_null())
                    .col(ColumnDef::new(FieldType::Class).string().not_null())
                    .col(Self::flag_column(FieldType::IsSystem))
                    .to_owned(),
            )
            .await
    }

    async fn create_category_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Category::Table)
                    .if_not_exists()
                    .col(Self::id_column(Category::Id))
                    .col(Self::guid_column(Category::Guid))
                    .col(ColumnDef::new(Category::EntityTypeId).integer())
                    .col(ColumnDef::new(Category::EntityTypeQualifierColumn).string())
                    .col(ColumnDef::new(Category::EntityTypeQualifierValue).string())
                    .col(ColumnDef::new(Category::Name).string().not_null())
                    .col(ColumnDef::new(Category::IconCssClass).string())
                    .col(
                        ColumnDef::new(Category::Order)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(Self::flag_column(Category::IsSystem))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_category_entity_type_id")
                            .from(Category::Table, Category::EntityTypeId)
                            .to(EntityType::Table, EntityType::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_layout_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Layout::Table)
                    .if_not_exists()
                    .col(Self::id_column(Layout::Id))
                    .col(Self::guid_column(Layout::Guid))
                    .col(ColumnDef::new(Layout::Name).string().not_null())
                    .col(ColumnDef::new(Layout::FileName).string().not_null())
                    .col(Self::flag_column(Layout::IsSystem))
                    .to_owned(),
            )
            .await
    }

    async fn create_page_tables(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Page::Table)
                    .if_not_exists()
                    .col(Self::id_column(Page::Id))
                    .col(Self::guid_column(Page::Guid))
                    .col(ColumnDef::new(Page::ParentPageId).integer())
                    .col(ColumnDef::new(Page::LayoutId).integer())
                    .col(ColumnDef::new(Page::InternalName).string().not_null())
                    .col(ColumnDef::new(Page::PageTitle).string().not_null())
                    .col(ColumnDef::new(Page::Description).text())
                    .col(ColumnDef::new(Page::IconCssClass).string())
                    .col(ColumnDef::new(Page::Order).integer().not_null().default(0))
                    .col(Self::flag_column(Page::IsSystem))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_page_parent_page_id")
                            .from(Page::Table, Page::ParentPageId)
                            .to(Page::Table, Page::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_page_layout_id")
                            .from(Page::Table, Page::LayoutId)
                            .to(Layout::Table, Layout::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PageRoute::Table)
                    .if_not_exists()
                    .col(Self::id_column(PageRoute::Id))
                    .col(Self::guid_column(PageRoute::Guid))
                    .col(ColumnDef::new(PageRoute::PageId).integer().not_null())
                    .col(ColumnDef::new(PageRoute::Route).string().not_null())
                    .col(Self::flag_column(PageRoute::IsSystem))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_page_route_page_id")
                            .from(PageRoute::Table, PageRoute::PageId)
                            .to(Page::Table, Page::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_block_tables(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BlockType::Table)
                    .if_not_exists()
                    .col(Self::id_column(BlockType::Id))
                    .col(Self::guid_column(BlockType::Guid))
                    .col(ColumnDef::new(BlockType::Name).string().not_null())
                    .col(ColumnDef::new(BlockType::Description).text())
                    .col(ColumnDef::new(BlockType::Path).string())
                    .col(ColumnDef::new(BlockType::Category).string())
                    .col(Self::flag_column(BlockType::IsSystem))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Block::Table)
                    .if_not_exists()
                    .col(Self::id_column(Block::Id))
                    .col(Self::guid_column(Block::Guid))
                    .col(ColumnDef::new(Block::BlockTypeId).integer().not_null())
                    .col(ColumnDef::new(Block::PageId).integer())
                    .col(ColumnDef::new(Block::LayoutId).integer())
                    .col(ColumnDef::new(Block::Zone).string().not_null())
                    .col(ColumnDef::new(Block::Name).string().not_null())
                    .col(ColumnDef::new(Block::Order).integer().not_null().default(0))
                    .col(Self::flag_column(Block::IsSystem))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_block_block_type_id")
                            .from(Block::Table, Block::BlockTypeId)
                            .to(BlockType::Table, BlockType::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_block_page_id")
                            .from(Block::Table, Block::PageId)
                            .to(Page::Table, Page::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_block_layout_id")
                            .from(Block::Table, Block::LayoutId)
                            .to(Layout::Table, Layout::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_attribute_tables(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Attribute::Table)
                    .if_not_exists()
                    .col(Self::id_column(Attribute::Id))
                    .col(Self::guid_column(Attribute::Guid))
                    .col(ColumnDef::new(Attribute::FieldTypeId).integer().not_null())
                    .col(ColumnDef::new(Attribute::EntityTypeId).integer())
                    .col(ColumnDef::new(Attribute::EntityTypeQualifierColumn).string())
                    .col(ColumnDef::new(Attribute::EntityTypeQualifierValue).string())
                    .col(ColumnDef::new(Attribute::Key).string().not_null())
                    .col(ColumnDef::new(Attribute::Name).string().not_null())
                    .col(ColumnDef::new(Attribute::Description).text())
                    .col(
                        ColumnDef::new(Attribute::Order)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Attribute::DefaultValue).text())
                    .col(Self::flag_column(Attribute::IsSystem))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attribute_field_type_id")
                            .from(Attribute::Table, Attribute::FieldTypeId)
                            .to(FieldType::Table, FieldType::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attribute_entity_type_id")
                            .from(Attribute::Table, Attribute::EntityTypeId)
                            .to(EntityType::Table, EntityType::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        // entity_id is polymorphic (block, page, person, ...) so it has no foreign key
        manager
            .create_table(
                Table::create()
                    .table(AttributeValue::Table)
                    .if_not_exists()
                    .col(Self::id_column(AttributeValue::Id))
                    .col(Self::guid_column(AttributeValue::Guid))
                    .col(
                        ColumnDef::new(AttributeValue::AttributeId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AttributeValue::EntityId).integer())
                    .col(ColumnDef::new(AttributeValue::Value).text().not_null())
                    .col(
                        ColumnDef::new(AttributeValue::ValueChecksum)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attribute_value_attribute_id")
                            .from(AttributeValue::Table, AttributeValue::AttributeId)
                            .to(Attribute::Table, Attribute::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_defined_type_tables(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DefinedType::Table)
                    .if_not_exists()
                    .col(Self::id_column(DefinedType::Id))
                    .col(Self::guid_column(DefinedType::Guid))
                    .col(ColumnDef::new(DefinedType::CategoryId).integer())
                    .col(ColumnDef::new(DefinedType::Name).string().not_null())
                    .col(ColumnDef::new(DefinedType::Description).text())
                    .col(Self::flag_column(DefinedType::IsSystem))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_defined_type_category_id")
                            .from(DefinedType::Table, DefinedType::CategoryId)
                            .to(Category::Table, Category::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DefinedValue::Table)
                    .if_not_exists()
                    .col(Self::id_column(DefinedValue::Id))
                    .col(Self::guid_column(DefinedValue::Guid))
                    .col(
                        ColumnDef::new(DefinedValue::DefinedTypeId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DefinedValue::Value).string().not_null())
                    .col(ColumnDef::new(DefinedValue::Description).text())
                    .col(
                        ColumnDef::new(DefinedValue::Order)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(DefinedValue::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(Self::flag_column(DefinedValue::IsSystem))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_defined_value_defined_type_id")
                            .from(DefinedValue::Table, DefinedValue::DefinedTypeId)
                            .to(DefinedType::Table, DefinedType::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_service_job_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ServiceJob::Table)
                    .if_not_exists()
                    .col(Self::id_column(ServiceJob::Id))
                    .col(Self::guid_column(ServiceJob::Guid))
                    .col(ColumnDef::new(ServiceJob::Name).string().not_null())
                    .col(ColumnDef::new(ServiceJob::Description).text())
                    .col(ColumnDef::new(ServiceJob::Class).string().not_null())
                    .col(ColumnDef::new(ServiceJob::CronExpression).string().not_null())
                    .col(Self::flag_column(ServiceJob::IsActive))
                    .col(Self::flag_column(ServiceJob::IsSystem))
                    .col(
                        ColumnDef::new(ServiceJob::NotificationStatus)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_system_communication_table(
        &self,
        manager: &SchemaManager<'_>,
    ) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SystemCommunication::Table)
                    .if_not_exists()
                    .col(Self::id_column(SystemCommunication::Id))
                    .col(Self::guid_column(SystemCommunication::Guid))
                    .col(ColumnDef::new(SystemCommunication::CategoryId).integer())
                    .col(ColumnDef::new(SystemCommunication::Title).string().not_null())
                    .col(ColumnDef::new(SystemCommunication::Subject).string().not_null())
                    .col(ColumnDef::new(SystemCommunication::Body).text().not_null())
                    .col(
                        ColumnDef::new(SystemCommunication::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(Self::flag_column(SystemCommunication::IsSystem))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_system_communication_category_id")
                            .from(SystemCommunication::Table, SystemCommunication::CategoryId)
                            .to(Category::Table, Category::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_lava_shortcode_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LavaShortcode::Table)
                    .if_not_exists()
                    .col(Self::id_column(LavaShortcode::Id))
                    .col(Self::guid_column(LavaShortcode::Guid))
                    .col(ColumnDef::new(LavaShortcode::Name).string().not_null())
                    .col(ColumnDef::new(LavaShortcode::TagName).string().not_null())
                    .col(
                        ColumnDef::new(LavaShortcode::TagType)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(LavaShortcode::Description).text())
                    .col(ColumnDef::new(LavaShortcode::Markup).text().not_null())
                    .col(ColumnDef::new(LavaShortcode::Parameters).text())
                    .col(
                        ColumnDef::new(LavaShortcode::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(Self::flag_column(LavaShortcode::IsSystem))
                    .to_owned(),
            )
            .await
    }

    async fn create_group_tables(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GroupType::Table)
                    .if_not_exists()
                    .col(Self::id_column(GroupType::Id))
                    .col(Self::guid_column(GroupType::Guid))
                    .col(ColumnDef::new(GroupType::Name).string().not_null())
                    .col(Self::flag_column(GroupType::IsSystem))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GroupTypeRole::Table)
                    .if_not_exists()
                    .col(Self::id_column(GroupTypeRole::Id))
                    .col(Self::guid_column(GroupTypeRole::Guid))
                    .col(
                        ColumnDef::new(GroupTypeRole::GroupTypeId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(GroupTypeRole::Name).string().not_null())
                    .col(Self::flag_column(GroupTypeRole::IsLeader))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_type_role_group_type_id")
                            .from(GroupTypeRole::Table, GroupTypeRole::GroupTypeId)
                            .to(GroupType::Table, GroupType::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Group::Table)
                    .if_not_exists()
                    .col(Self::id_column(Group::Id))
                    .col(Self::guid_column(Group::Guid))
                    .col(ColumnDef::new(Group::GroupTypeId).integer().not_null())
                    .col(ColumnDef::new(Group::Name).string().not_null())
                    .col(
                        ColumnDef::new(Group::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_group_type_id")
                            .from(Group::Table, Group::GroupTypeId)
                            .to(GroupType::Table, GroupType::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_registration_instance_table(
        &self,
        manager: &SchemaManager<'_>,
    ) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RegistrationInstance::Table)
                    .if_not_exists()
                    .col(Self::id_column(RegistrationInstance::Id))
                    .col(Self::guid_column(RegistrationInstance::Guid))
                    .col(ColumnDef::new(RegistrationInstance::Name).string().not_null())
                    .col(ColumnDef::new(RegistrationInstance::MaxAttendees).integer())
                    .col(ColumnDef::new(RegistrationInstance::TimeoutThreshold).integer())
                    .col(Self::flag_column(RegistrationInstance::TimeoutIsEnabled))
                    .to_owned(),
            )
            .await
    }

    async fn create_indexes(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        // Checksum seek for bulk value replacement
        manager
            .create_index(
                Index::create()
                    .name("idx_attribute_value_value_checksum")
                    .table(AttributeValue::Table)
                    .col(AttributeValue::ValueChecksum)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("ux_attribute_value_attribute_entity")
                    .table(AttributeValue::Table)
                    .col(AttributeValue::AttributeId)
                    .col(AttributeValue::EntityId)
                    .unique()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_attribute_qualifier")
                    .table(Attribute::Table)
                    .col(Attribute::EntityTypeQualifierColumn)
                    .col(Attribute::EntityTypeQualifierValue)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_block_block_type_id")
                    .table(Block::Table)
                    .col(Block::BlockTypeId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_page_route_route")
                    .table(PageRoute::Table)
                    .col(PageRoute::Route)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_category_name")
                    .table(Category::Table)
                    .col(Category::Name)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}
