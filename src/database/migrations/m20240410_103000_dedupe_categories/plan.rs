use sea_orm::DbErr;

use crate::database::changes::normalize_guid;

/// The columns that decide whether two categories are the same
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRow {
    pub id: i32,
    pub guid: String,
    pub entity_type_id: Option<i32>,
    pub qualifier_column: Option<String>,
    pub qualifier_value: Option<String>,
}

impl CategoryRow {
    /// Same scope, treating two missing qualifiers as equal
    fn same_scope(&self, other: &CategoryRow) -> bool {
        self.entity_type_id == other.entity_type_id
            && self.qualifier_column == other.qualifier_column
            && self.qualifier_value == other.qualifier_value
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePlan {
    pub canonical_id: i32,
    pub duplicate_ids: Vec<i32>,
}

/// Work out which of `rows` (all sharing one name) collapse onto the row with
/// `canonical_guid`. Returns `None` when the canonical row does not exist.
pub fn plan_merge(rows: &[CategoryRow], canonical_guid: &str) -> Result<Option<MergePlan>, DbErr> {
    let canonical_guid = normalize_guid(canonical_guid)?;
    let Some(canonical) = rows
        .iter()
        .find(|row| row.guid.eq_ignore_ascii_case(&canonical_guid))
    else {
        return Ok(None);
    };

    let duplicate_ids = rows
        .iter()
        .filter(|row| row.id != canonical.id && row.same_scope(canonical))
        .map(|row| row.id)
        .collect();

    Ok(Some(MergePlan {
        canonical_id: canonical.id,
        duplicate_ids,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANONICAL: &str = "a9e3c4f1-6b2d-4e8a-9c7f-1d5b3a2e6f48";

    fn row(id: i32, guid: &str, column: Option<&str>, value: Option<&str>) -> CategoryRow {
        CategoryRow {
            id,
            guid: guid.to_string(),
            entity_type_id: Some(4),
            qualifier_column: column.map(str::to_string),
            qualifier_value: value.map(str::to_string),
        }
    }

    #[test]
    fn test_null_qualifiers_match_each_other() {
        let rows = vec![
            row(1, "00000000-0000-4000-8000-000000000001", None, None),
            row(2, CANONICAL, None, None),
            row(3, "00000000-0000-4000-8000-000000000003", None, None),
        ];
        let plan = plan_merge(&rows, CANONICAL).unwrap().unwrap();
        assert_eq!(plan.canonical_id, 2);
        assert_eq!(plan.duplicate_ids, vec![1, 3]);
    }

    #[test]
    fn test_different_scope_is_not_a_duplicate() {
        let rows = vec![
            row(1, CANONICAL, None, None),
            row(2, "00000000-0000-4000-8000-000000000002", Some("group_type_id"), Some("7")),
            row(3, "00000000-0000-4000-8000-000000000003", Some("group_type_id"), None),
            CategoryRow {
                entity_type_id: Some(9),
                ..row(4, "00000000-0000-4000-8000-000000000004", None, None)
            },
        ];
        let plan = plan_merge(&rows, CANONICAL).unwrap().unwrap();
        assert!(plan.duplicate_ids.is_empty());
    }

    #[test]
    fn test_missing_canonical_plans_nothing() {
        let rows = vec![row(1, "00000000-0000-4000-8000-000000000001", None, None)];
        assert_eq!(plan_merge(&rows, CANONICAL).unwrap(), None);
    }

    #[test]
    fn test_guid_match_ignores_case() {
        let rows = vec![row(5, &CANONICAL.to_uppercase(), None, None)];
        let plan = plan_merge(&rows, CANONICAL).unwrap().unwrap();
        assert_eq!(plan.canonical_id, 5);
    }
}
