//! Uniqueness checks run before creating or updating a record.
//!
//! A scope is the set of records a value must be unique within: a plain
//! `Entity::find()` for globally unique columns, or a filtered select such as
//! one user's artists. Every colliding field is reported in a single error.

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Select};
use tracing::debug;

use crate::errors::{ApiError, FieldErrors};

/// A column whose proposed value must not exist yet in the scope.
#[derive(Debug, Clone, Copy)]
pub struct UniqueField<'a, C> {
    /// Field name reported back to the client
    pub name: &'static str,
    pub column: C,
    /// Proposed value; `None` when the request leaves the field untouched
    pub value: Option<&'a str>,
}

impl<'a, C> UniqueField<'a, C> {
    pub fn new(name: &'static str, column: C, value: Option<&'a str>) -> Self {
        Self { name, column, value }
    }
}

/// Reject values that already exist anywhere in `scope`.
pub async fn check_unique_on_create<E, C>(
    db: &C,
    scope: Select<E>,
    fields: &[UniqueField<'_, E::Column>],
) -> Result<(), ApiError>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    collect_collisions(db, scope, fields).await
}

/// Reject values that exist in `scope` on a record other than `current_id`,
/// so a record may keep its own unchanged value.
pub async fn check_unique_on_update<E, C>(
    db: &C,
    scope: Select<E>,
    id_column: E::Column,
    current_id: i32,
    fields: &[UniqueField<'_, E::Column>],
) -> Result<(), ApiError>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    collect_collisions(db, scope.filter(id_column.ne(current_id)), fields).await
}

async fn collect_collisions<E, C>(
    db: &C,
    scope: Select<E>,
    fields: &[UniqueField<'_, E::Column>],
) -> Result<(), ApiError>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let mut errors = FieldErrors::new();

    for field in fields {
        let Some(value) = field.value else {
            continue;
        };

        let existing = scope
            .clone()
            .filter(field.column.eq(value))
            .one(db)
            .await?;

        if existing.is_some() {
            debug!(field = field.name, "Proposed value already in use");
            errors
                .entry(field.name.to_string())
                .or_default()
                .push(format!("A record with this {} already exists.", field.name));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Conflict(errors))
    }
}
