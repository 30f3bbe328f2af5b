use sea_orm::entity::prelude::*;

pub mod credentials;

/// Represents a user of the system.
///
/// Username and email are unique across all users. The password is only ever
/// held as an Argon2 PHC string; the bearer token is an opaque hex string that
/// is valid until `token_expiration`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    #[sea_orm(unique)]
    pub token: Option<String>,
    pub token_expiration: Option<DateTimeUtc>,
    #[sea_orm(default_value = "false")]
    pub is_admin: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A user owns any number of artists.
    #[sea_orm(has_many = "super::artist::Entity")]
    Artist,
}

impl Related<super::artist::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Artist.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Entity {
    /// Select the user with the given username.
    pub fn find_by_username(username: &str) -> Select<Entity> {
        Self::find().filter(Column::Username.eq(username))
    }
}
