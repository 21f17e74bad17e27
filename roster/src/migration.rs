//! Schema migrations for the roster tables.
//!
//! Run with `Migrator::up(&db, None)`; the server binary does so at startup and
//! the test suite does so against an in-memory `SQLite` database.

use sea_orm_migration::prelude::*;

use crate::entities::{logins, professions, skill_user, skills, teams, user_profiles, users};

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(CreateReferenceTables),
            Box::new(CreateUserTables),
        ]
    }
}

/// Teams, skills and professions: the lookup tables users point at.
pub struct CreateReferenceTables;

impl MigrationName for CreateReferenceTables {
    fn name(&self) -> &'static str {
        "m20201001_000001_create_reference_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for CreateReferenceTables {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(teams::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(teams::Column::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(teams::Column::Name).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(skills::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(skills::Column::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(skills::Column::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(professions::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(professions::Column::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(professions::Column::Title).string().not_null())
                    .col(ColumnDef::new(professions::Column::DeletedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(professions::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(skills::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(teams::Entity).to_owned())
            .await?;
        Ok(())
    }
}

/// Users and everything hanging off a user row.
pub struct CreateUserTables;

impl MigrationName for CreateUserTables {
    fn name(&self) -> &'static str {
        "m20201001_000002_create_user_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for CreateUserTables {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(users::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(users::Column::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(users::Column::FirstName).string().not_null())
                    .col(ColumnDef::new(users::Column::LastName).string().not_null())
                    .col(
                        ColumnDef::new(users::Column::Email)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(users::Column::Password).string().not_null())
                    .col(
                        ColumnDef::new(users::Column::Role)
                            .string()
                            .not_null()
                            .default("user"),
                    )
                    .col(
                        ColumnDef::new(users::Column::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(users::Column::TeamId).integer())
                    .col(
                        ColumnDef::new(users::Column::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(users::Column::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(users::Column::DeletedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .from(users::Entity, users::Column::TeamId)
                            .to(teams::Entity, teams::Column::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(user_profiles::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(user_profiles::Column::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(user_profiles::Column::UserId).integer().not_null())
                    .col(ColumnDef::new(user_profiles::Column::Bio).text().not_null())
                    .col(ColumnDef::new(user_profiles::Column::Twitter).string())
                    .col(ColumnDef::new(user_profiles::Column::ProfessionId).integer())
                    .col(ColumnDef::new(user_profiles::Column::DeletedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .from(user_profiles::Entity, user_profiles::Column::UserId)
                            .to(users::Entity, users::Column::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(user_profiles::Entity, user_profiles::Column::ProfessionId)
                            .to(professions::Entity, professions::Column::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(skill_user::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(skill_user::Column::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(skill_user::Column::UserId).integer().not_null())
                    .col(ColumnDef::new(skill_user::Column::SkillId).integer().not_null())
                    .col(
                        ColumnDef::new(skill_user::Column::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(skill_user::Column::DeletedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .from(skill_user::Entity, skill_user::Column::UserId)
                            .to(users::Entity, users::Column::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(skill_user::Entity, skill_user::Column::SkillId)
                            .to(skills::Entity, skills::Column::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_skill_user_user_skill")
                    .table(skill_user::Entity)
                    .col(skill_user::Column::UserId)
                    .col(skill_user::Column::SkillId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(logins::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(logins::Column::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(logins::Column::UserId).integer().not_null())
                    .col(
                        ColumnDef::new(logins::Column::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(logins::Entity, logins::Column::UserId)
                            .to(users::Entity, users::Column::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // last_login_at is a correlated "latest login per user" lookup
        manager
            .create_index(
                Index::create()
                    .name("idx_logins_user_created")
                    .table(logins::Entity)
                    .col(logins::Column::UserId)
                    .col(logins::Column::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(logins::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(skill_user::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(user_profiles::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(users::Entity).to_owned())
            .await?;
        Ok(())
    }
}
