//! Registration timeout threshold: attendee count to percent of capacity
//!
//! `timeout_threshold` used to hold an absolute number of registrants; it now
//! holds a percentage of `max_attendees`. `timeout_is_enabled` marks rows that
//! are already in percent form, which keeps both directions idempotent.

use sea_orm_migration::prelude::*;
use tracing::info;

use crate::database::changes::ChangeSet;
use crate::database::schema::RegistrationInstance;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Smallest percent that still covers `threshold` attendees: `ceil(100 * threshold / capacity)`
///
/// Callers guarantee `capacity > 0`.
pub fn threshold_to_percent(threshold: i32, capacity: i32) -> i32 {
    let threshold = i64::from(threshold);
    let capacity = i64::from(capacity);
    let percent = (100 * threshold + capacity - 1).div_euclid(capacity);
    clamp_i32(percent)
}

/// Attendee count covered by `percent`: `floor(percent * capacity / 100)`
pub fn percent_to_threshold(percent: i32, capacity: i32) -> i32 {
    let count = (i64::from(percent) * i64::from(capacity)).div_euclid(100);
    clamp_i32(count)
}

fn clamp_i32(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let changes = ChangeSet::new(manager.get_connection(), self.name());
        let converted = rewrite_thresholds(&changes, false, threshold_to_percent).await?;
        info!(version = %self.name(), converted, "Converted registration timeout thresholds to percent");
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let changes = ChangeSet::new(manager.get_connection(), self.name());
        let converted = rewrite_thresholds(&changes, true, percent_to_threshold).await?;
        info!(version = %self.name(), converted, "Converted registration timeout thresholds back to counts");
        Ok(())
    }
}

/// Rewrite every row with capacity, a threshold and `timeout_is_enabled =
/// currently_enabled`, flipping the flag as it goes
async fn rewrite_thresholds<C: ConnectionTrait>(
    changes: &ChangeSet<'_, C>,
    currently_enabled: bool,
    convert: fn(i32, i32) -> i32,
) -> Result<u64, DbErr> {
    let select = Query::select()
        .columns([
            RegistrationInstance::Id,
            RegistrationInstance::MaxAttendees,
            RegistrationInstance::TimeoutThreshold,
        ])
        .from(RegistrationInstance::Table)
        .and_where(Expr::col(RegistrationInstance::MaxAttendees).gt(0))
        .and_where(Expr::col(RegistrationInstance::TimeoutThreshold).is_not_null())
        .and_where(Expr::col(RegistrationInstance::TimeoutIsEnabled).eq(currently_enabled))
        .order_by(RegistrationInstance::Id, Order::Asc)
        .to_owned();
    let rows = changes
        .connection()
        .query_all(changes.backend().build(&select))
        .await?;

    let mut converted = 0;
    for row in rows {
        let id: i32 = row.try_get("", "id")?;
        let capacity: i32 = row.try_get("", "max_attendees")?;
        let threshold: i32 = row.try_get("", "timeout_threshold")?;

        let update = Query::update()
            .table(RegistrationInstance::Table)
            .values([
                (
                    RegistrationInstance::TimeoutThreshold,
                    convert(threshold, capacity).into(),
                ),
                (RegistrationInstance::TimeoutIsEnabled, (!currently_enabled).into()),
            ])
            .and_where(Expr::col(RegistrationInstance::Id).eq(id))
            .to_owned();
        converted += changes.exec(&update).await?;
    }
    Ok(converted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_hundred_seats_ten_threshold() {
        assert_eq!(threshold_to_percent(10, 100), 10);
        assert_eq!(percent_to_threshold(10, 100), 10);
    }

    #[test]
    fn test_percent_rounds_up() {
        // 1 of 3 seats is 33.3%
        assert_eq!(threshold_to_percent(1, 3), 34);
        assert_eq!(percent_to_threshold(34, 3), 1);
        assert_eq!(threshold_to_percent(0, 7), 0);
        assert_eq!(threshold_to_percent(7, 7), 100);
    }

    proptest! {
        #[test]
        fn prop_round_trip_is_exact_up_to_hundred_seats(
            (capacity, threshold) in (1i32..=100).prop_flat_map(|c| (Just(c), 0..=c))
        ) {
            let percent = threshold_to_percent(threshold, capacity);
            prop_assert_eq!(percent_to_threshold(percent, capacity), threshold);
        }

        #[test]
        fn prop_round_trip_never_shrinks(
            (capacity, threshold) in (1i32..=100_000).prop_flat_map(|c| (Just(c), 0..=c))
        ) {
            let percent = threshold_to_percent(threshold, capacity);
            prop_assert!((0..=100).contains(&percent));
            prop_assert!(percent_to_threshold(percent, capacity) >= threshold);
        }
    }
}
