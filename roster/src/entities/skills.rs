use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "skills")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::skill_user::Entity")]
    SkillUser,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        super::skill_user::Relation::User.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::skill_user::Relation::Skill.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
