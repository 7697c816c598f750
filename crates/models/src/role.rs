use sea_orm::{entity::prelude::*, QueryFilter, Set};
use uuid::Uuid;
use serde::{Deserialize, Serialize};

use crate::{errors, user, user_role, Identifiable};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "role")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
}

impl Identifiable for Model {
    fn id(&self) -> Uuid { self.id }
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { UserRole }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self { Relation::UserRole => Entity::has_many(user_role::Entity).into() }
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef { user_role::Relation::User.def() }
    fn via() -> Option<RelationDef> { Some(user_role::Relation::Role.def().rev()) }
}

impl ActiveModelBehavior for ActiveModel {}

pub async fn create<C: ConnectionTrait>(db: &C, name: &str) -> Result<Model, errors::ModelError> {
    if name.trim().is_empty() { return Err(errors::ModelError::Validation("role name required".into())); }
    let am = ActiveModel { id: Set(Uuid::new_v4()), name: Set(name.to_string()) };
    Ok(am.insert(db).await?)
}

pub async fn find_by_name<C: ConnectionTrait>(db: &C, name: &str) -> Result<Option<Model>, errors::ModelError> {
    Ok(Entity::find().filter(Column::Name.eq(name)).one(db).await?)
}
