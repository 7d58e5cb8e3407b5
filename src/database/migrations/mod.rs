//! Migration units for the CMS schema
//!
//! Units run strictly in the order [`Migrator::migrations`] lists them, which
//! is also their timestamp order. The runner checks that invariant before it
//! touches the database (see [`crate::database::ledger`]).
//!
//! Schema and seed units come first; the rest are incremental content and
//! data-repair changes built from [`ChangeSet`](crate::database::changes::ChangeSet)
//! primitives, so each of them can be re-applied after a partial failure.

use std::sync::atomic::{AtomicU64, Ordering};

use sea_orm_migration::prelude::*;

use crate::config::MigrationsConfig;
use crate::config::defaults::DEFAULT_TRANSLATION_BATCH_SIZE;

/// Derive a migration's name from its containing folder when the migration
/// is implemented as `folder_name/mod.rs`.
///
/// `DeriveMigrationName` would report "mod" for every folder-based unit. The
/// folder name must follow `mYYYYMMDD_HHMMSS_description`.
///
/// Usage inside a folder-based migration's `mod.rs`:
/// ```ignore
/// pub struct Migration;
/// folder_migration_name!();
/// ```
#[macro_export]
macro_rules! folder_migration_name {
    () => {
        impl sea_orm_migration::MigrationName for Migration {
            fn name(&self) -> &str {
                static NAME: ::std::sync::OnceLock<String> = ::std::sync::OnceLock::new();
                NAME.get_or_init(|| {
                    // e.g. ".../m20240410_103000_dedupe_categories/mod.rs"
                    let path = file!()
                        .trim_end_matches("mod.rs")
                        .trim_end_matches(|c| c == '/' || c == '\\');
                    path.rsplit(|c| c == '/' || c == '\\')
                        .next()
                        .unwrap_or(path)
                        .to_string()
                })
            }
        }
    };
}

pub mod m20240101_000000_core_schema;
pub mod m20240101_000001_seed_system_data;
pub mod m20240212_090000_add_giving_automation_job;
pub mod m20240305_140000_registration_timeout_threshold_percent;
pub mod m20240410_103000_dedupe_categories;
pub mod m20240522_161500_rename_icon_classes;
pub mod m20240615_120000_remap_legacy_routes;
pub mod m20240701_080000_translate_boolean_attribute_values;
pub mod m20240801_093000_add_giving_alerts_page;
pub mod m20240902_110000_swap_legacy_transaction_list;
pub mod m20241015_150000_remove_obsolete_group_type;
pub mod m20241101_100000_define_reporting_views;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000000_core_schema::Migration),
            Box::new(m20240101_000001_seed_system_data::Migration),
            Box::new(m20240212_090000_add_giving_automation_job::Migration),
            Box::new(m20240305_140000_registration_timeout_threshold_percent::Migration),
            Box::new(m20240410_103000_dedupe_categories::Migration),
            Box::new(m20240522_161500_rename_icon_classes::Migration),
            Box::new(m20240615_120000_remap_legacy_routes::Migration),
            Box::new(m20240701_080000_translate_boolean_attribute_values::Migration),
            Box::new(m20240801_093000_add_giving_alerts_page::Migration),
            Box::new(m20240902_110000_swap_legacy_transaction_list::Migration),
            Box::new(m20241015_150000_remove_obsolete_group_type::Migration),
            Box::new(m20241101_100000_define_reporting_views::Migration),
        ]
    }
}

static TRANSLATION_BATCH_SIZE: AtomicU64 = AtomicU64::new(DEFAULT_TRANSLATION_BATCH_SIZE);

/// Apply tunables that units read at run time.
///
/// Units are constructed by [`Migrator::migrations`] without arguments, so
/// settings reach them through process-wide state set once at startup.
pub fn configure(config: &MigrationsConfig) {
    TRANSLATION_BATCH_SIZE.store(config.translation_batch_size.max(1), Ordering::Relaxed);
}

/// Page size used by units that walk large tables with a keyset cursor
pub fn translation_batch_size() -> u64 {
    TRANSLATION_BATCH_SIZE.load(Ordering::Relaxed)
}
