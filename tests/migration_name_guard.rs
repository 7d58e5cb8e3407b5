use std::collections::{HashMap, HashSet};
use std::path::Path;

use sea_orm_migration::MigratorTrait;

/// Guard test to ensure all migrations have:
/// 1. Unique names (no collisions like "mod" from folder-based units)
/// 2. A well-formed timestamped name: mYYYYMMDD_HHMMSS_description
/// 3. Any folder-based migration (directory under migrations/) reports a name
///    that EXACTLY matches the folder name
///
/// Fails with a full diagnostic so naming mistakes are caught in CI instead
/// of when the runner refuses to start.
#[test]
fn migration_names_are_unique_and_well_formed() {
    use rock_migrations::database::ledger::MigrationId;
    use rock_migrations::database::migrations::Migrator;

    let migrations = Migrator::migrations();

    let mut seen: HashSet<String> = HashSet::new();
    let mut duplicates: HashMap<String, usize> = HashMap::new();
    let mut invalid: Vec<String> = Vec::new();

    for mig in migrations.iter() {
        let name = mig.name().to_string();

        if name.parse::<MigrationId>().is_err() {
            invalid.push(name.clone());
        }

        if !seen.insert(name.clone()) {
            *duplicates.entry(name).or_insert(1) += 1;
        }
    }

    let migrations_dir = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("src")
        .join("database")
        .join("migrations");
    let mut folder_mismatches: Vec<String> = Vec::new();

    if let Ok(read_dir) = std::fs::read_dir(&migrations_dir) {
        for entry in read_dir.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            if let Some(folder_name) = path.file_name().and_then(|s| s.to_str()) {
                if folder_name.starts_with('m')
                    && folder_name.len() > 16
                    && folder_name.chars().nth(15) == Some('_')
                    && !seen.contains(folder_name)
                {
                    folder_mismatches.push(folder_name.to_string());
                }
            }
        }
    }

    if !duplicates.is_empty() || !invalid.is_empty() || !folder_mismatches.is_empty() {
        let mut msg = String::from("Migration naming guard failed:\n");

        if !duplicates.is_empty() {
            msg.push_str("  Duplicate names detected:\n");
            for (name, count) in duplicates {
                msg.push_str(&format!("    * {} (occurrences: {})\n", name, count + 1));
            }
        }

        if !invalid.is_empty() {
            msg.push_str("  Invalid naming format (expected mYYYYMMDD_HHMMSS_description):\n");
            for name in invalid {
                msg.push_str(&format!("    * {}\n", name));
            }
        }

        if !folder_mismatches.is_empty() {
            msg.push_str("  Folder/name mismatches (directory names not reported by Migrator):\n");
            for f in folder_mismatches {
                msg.push_str(&format!("    * {}\n", f));
            }
        }

        panic!("{msg}");
    }
}

#[test]
fn migrations_are_listed_in_timestamp_order() {
    let names = rock_migrations::database::runner::MigrationRunner::unit_names();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
}
