use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{role, tenant, user_claim, user_login, user_role, Identifiable, TenantId};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub user_name: String,
    pub email: Option<String>,
    pub email_confirmed: bool,
    pub security_stamp: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    pub fn tenant(&self) -> TenantId { TenantId::new(self.tenant_id) }
}

impl Identifiable for Model {
    fn id(&self) -> Uuid { self.id }
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Tenant,
    Login,
    Claim,
    UserRole,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Tenant => Entity::belongs_to(tenant::Entity).from(Column::TenantId).to(tenant::Column::Id).into(),
            Relation::Login => Entity::has_many(user_login::Entity).into(),
            Relation::Claim => Entity::has_many(user_claim::Entity).into(),
            Relation::UserRole => Entity::has_many(user_role::Entity).into(),
        }
    }
}

impl Related<tenant::Entity> for Entity {
    fn to() -> RelationDef { Relation::Tenant.def() }
}

impl Related<user_login::Entity> for Entity {
    fn to() -> RelationDef { Relation::Login.def() }
}

impl Related<user_claim::Entity> for Entity {
    fn to() -> RelationDef { Relation::Claim.def() }
}

impl Related<role::Entity> for Entity {
    fn to() -> RelationDef { user_role::Relation::Role.def() }
    fn via() -> Option<RelationDef> { Some(user_role::Relation::User.def().rev()) }
}

impl ActiveModelBehavior for ActiveModel {}
