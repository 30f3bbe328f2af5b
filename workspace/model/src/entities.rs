//! This file serves as the root for all SeaORM entity modules.
//! Users own artists; everything else hangs off the user record.

pub mod artist;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::artist::Entity as Artist;
    pub use super::user::Entity as User;
}

#[cfg(test)]
mod test {
    use chrono::Duration;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{
        ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait,
        ModelTrait, PaginatorTrait, Set,
    };

    use super::*;
    use prelude::*;

    async fn setup_db() -> Result<DatabaseConnection, DbErr> {
        let db = Database::connect("sqlite::memory:").await?;

        // Enable foreign keys
        db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;

        Migrator::up(&db, None).await.expect("Migrations failed.");
        Ok(db)
    }

    async fn create_user(db: &DatabaseConnection, username: &str) -> Result<user::Model, DbErr> {
        let mut active = user::ActiveModel {
            username: Set(username.to_string()),
            email: Set(format!("{username}@example.com")),
            is_admin: Set(false),
            ..Default::default()
        };
        active.set_password("example").expect("hashing failed");
        active.insert(db).await
    }

    #[tokio::test]
    async fn test_entity_integration() -> Result<(), DbErr> {
        let db = setup_db().await?;

        let john = create_user(&db, "john").await?;
        let jane = create_user(&db, "jane").await?;

        let users = User::find().all(&db).await?;
        assert_eq!(users.len(), 2);
        assert!(!john.is_admin);
        assert!(john.check_password("example"));

        // Artist names are scoped to the owner
        for owner in [&john, &jane] {
            artist::ActiveModel {
                name: Set("Nina Simone".to_string()),
                user_id: Set(owner.id),
                ..Default::default()
            }
            .insert(&db)
            .await?;
        }

        let duplicate = artist::ActiveModel {
            name: Set("Nina Simone".to_string()),
            user_id: Set(john.id),
            ..Default::default()
        }
        .insert(&db)
        .await;
        assert!(duplicate.is_err());

        let johns_artists = john.find_related(Artist).all(&db).await?;
        assert_eq!(johns_artists.len(), 1);
        assert_eq!(Artist::find_by_owner(jane.id).count(&db).await?, 1);

        // Deleting a user removes their artists
        john.delete(&db).await?;
        assert_eq!(Artist::find().count(&db).await?, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_unique_user_columns() -> Result<(), DbErr> {
        let db = setup_db().await?;
        create_user(&db, "john").await?;

        assert!(create_user(&db, "john").await.is_err());

        let same_email = user::ActiveModel {
            username: Set("johnny".to_string()),
            email: Set("john@example.com".to_string()),
            password_hash: Set("xxxx".to_string()),
            is_admin: Set(false),
            ..Default::default()
        }
        .insert(&db)
        .await;
        assert!(same_email.is_err());

        Ok(())
    }

    #[tokio::test]
    async fn test_token_lifecycle_against_database() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let mut john = create_user(&db, "john").await?;

        let token = john.get_token(Duration::hours(1));
        john.token_changes().update(&db).await?;

        let resolved = User::check_token(&db, &token).await?;
        assert_eq!(resolved.map(|user| user.id), Some(john.id));
        assert!(User::check_token(&db, "").await?.is_none());
        assert!(User::check_token(&db, &"0".repeat(64)).await?.is_none());

        john.revoke_token();
        john.token_changes().update(&db).await?;
        assert!(User::check_token(&db, &token).await?.is_none());

        let found = User::find_by_username("john").one(&db).await?;
        assert_eq!(found.map(|user| user.id), Some(john.id));

        Ok(())
    }
}
