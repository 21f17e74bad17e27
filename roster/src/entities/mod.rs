//! Sea-ORM entities for the roster schema.
//!
//! Soft-deletable tables (`users`, `user_profiles`, `skill_user`, `professions`)
//! carry a nullable `deleted_at` column; rows with a value there are "in the trash".

pub mod logins;
pub mod professions;
pub mod skill_user;
pub mod skills;
pub mod teams;
pub mod user_profiles;
pub mod users;

pub mod prelude {
    pub use super::logins::Entity as Login;
    pub use super::professions::Entity as Profession;
    pub use super::skill_user::Entity as SkillUser;
    pub use super::skills::Entity as Skill;
    pub use super::teams::Entity as Team;
    pub use super::user_profiles::Entity as UserProfile;
    pub use super::users::Entity as User;
}
