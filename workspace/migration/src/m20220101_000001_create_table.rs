use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string(Users::Username).unique_key())
                    .col(string(Users::Email).unique_key())
                    .col(string(Users::PasswordHash))
                    .col(string_len_null(Users::Token, 64).unique_key())
                    .col(timestamp_with_time_zone_null(Users::TokenExpiration))
                    .col(boolean(Users::IsAdmin).default(false))
                    .to_owned(),
            )
            .await?;

        // Create artists table
        manager
            .create_table(
                Table::create()
                    .table(Artists::Table)
                    .if_not_exists()
                    .col(pk_auto(Artists::Id))
                    .col(string(Artists::Name))
                    .col(integer(Artists::UserId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_artists_user")
                            .from(Artists::Table, Artists::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Artist names are unique per owner
        manager
            .create_index(
                Index::create()
                    .name("idx_artists_user_id_name")
                    .table(Artists::Table)
                    .col(Artists::UserId)
                    .col(Artists::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order to avoid foreign key constraints
        manager
            .drop_table(Table::drop().table(Artists::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    Email,
    PasswordHash,
    Token,
    TokenExpiration,
    IsAdmin,
}

#[derive(DeriveIden)]
enum Artists {
    Table,
    Id,
    Name,
    UserId,
}
