//! Table and column identifiers of the CMS schema
//!
//! Shared by the core schema unit (which creates the tables) and by the
//! change primitives and data-repair units (which read and write them).

use sea_orm_migration::prelude::*;

#[derive(DeriveIden, Clone, Copy)]
pub enum EntityType {
    Table,
    Id,
    Guid,
    Name,
    FriendlyName,
    IsEntity,
    IsSecured,
}

#[derive(DeriveIden, Clone, Copy)]
pub enum FieldType {
    Table,
    Id,
    Guid,
    Name,
    Class,
    IsSystem,
}

#[derive(DeriveIden, Clone, Copy)]
pub enum Category {
    Table,
    Id,
    Guid,
    EntityTypeId,
    EntityTypeQualifierColumn,
    EntityTypeQualifierValue,
    Name,
    IconCssClass,
    Order,
    IsSystem,
}

#[derive(DeriveIden, Clone, Copy)]
pub enum Layout {
    Table,
    Id,
    Guid,
    Name,
    FileName,
    IsSystem,
}

#[derive(DeriveIden, Clone, Copy)]
pub enum Page {
    Table,
    Id,
    Guid,
    ParentPageId,
    LayoutId,
    InternalName,
    PageTitle,
    Description,
    IconCssClass,
    Order,
    IsSystem,
}

#[derive(DeriveIden, Clone, Copy)]
pub enum PageRoute {
    Table,
    Id,
    Guid,
    PageId,
    Route,
    IsSystem,
}

#[derive(DeriveIden, Clone, Copy)]
pub enum BlockType {
    Table,
    Id,
    Guid,
    Name,
    Description,
    Path,
    Category,
    IsSystem,
}

#[derive(DeriveIden, Clone, Copy)]
pub enum Block {
    Table,
    Id,
    Guid,
    BlockTypeId,
    PageId,
    LayoutId,
    Zone,
    Name,
    Order,
    IsSystem,
}

#[derive(DeriveIden, Clone, Copy)]
pub enum Attribute {
    Table,
    Id,
    Guid,
    FieldTypeId,
    EntityTypeId,
    EntityTypeQualifierColumn,
    EntityTypeQualifierValue,
    Key,
    Name,
    Description,
    Order,
    DefaultValue,
    IsSystem,
}

#[derive(DeriveIden, Clone, Copy)]
pub enum AttributeValue {
    Table,
    Id,
    Guid,
    AttributeId,
    EntityId,
    Value,
    ValueChecksum,
}

#[derive(DeriveIden, Clone, Copy)]
pub enum DefinedType {
    Table,
    Id,
    Guid,
    CategoryId,
    Name,
    Description,
    IsSystem,
}

#[derive(DeriveIden, Clone, Copy)]
pub enum DefinedValue {
    Table,
    Id,
    Guid,
    DefinedTypeId,
    Value,
    Description,
    Order,
    IsActive,
    IsSystem,
}

#[derive(DeriveIden, Clone, Copy)]
pub enum ServiceJob {
    Table,
    Id,
    Guid,
    Name,
    Description,
    Class,
    CronExpression,
    IsActive,
    IsSystem,
    NotificationStatus,
}

#[derive(DeriveIden, Clone, Copy)]
pub enum SystemCommunication {
    Table,
    Id,
    Guid,
    CategoryId,
    Title,
    Subject,
    Body,
    IsActive,
    IsSystem,
}

#[derive(DeriveIden, Clone, Copy)]
pub enum LavaShortcode {
    Table,
    Id,
    Guid,
    Name,
    TagName,
    TagType,
    Description,
    Markup,
    Parameters,
    IsActive,
    IsSystem,
}

#[derive(DeriveIden, Clone, Copy)]
pub enum GroupType {
    Table,
    Id,
    Guid,
    Name,
    IsSystem,
}

#[derive(DeriveIden, Clone, Copy)]
pub enum GroupTypeRole {
    Table,
    Id,
    Guid,
    GroupTypeId,
    Name,
    IsLeader,
}

#[derive(DeriveIden, Clone, Copy)]
pub enum Group {
    Table,
    Id,
    Guid,
    GroupTypeId,
    Name,
    IsActive,
}

#[derive(DeriveIden, Clone, Copy)]
pub enum RegistrationInstance {
    Table,
    Id,
    Guid,
    Name,
    MaxAttendees,
    TimeoutThreshold,
    TimeoutIsEnabled,
}

/// Qualifier column stored on block-type attributes
pub const BLOCK_TYPE_QUALIFIER_COLUMN: &str = "block_type_id";
