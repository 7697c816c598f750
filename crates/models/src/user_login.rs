use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{tenant, user, Loginable, TenantId, TenantScoped};

/// External login binding. The four key columns together form the primary key.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_login")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub tenant_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub login_provider: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub provider_key: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: Uuid,
    pub created_at: DateTimeWithTimeZone,
}

impl TenantScoped for Model {
    fn tenant_id(&self) -> TenantId { TenantId::new(self.tenant_id) }
    fn set_tenant_id(&mut self, tenant_id: TenantId) { self.tenant_id = tenant_id.as_uuid(); }
}

impl Loginable for Model {
    fn login_provider(&self) -> &str { &self.login_provider }
    fn provider_key(&self) -> &str { &self.provider_key }
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { User, Tenant }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::User => Entity::belongs_to(user::Entity).from(Column::UserId).to(user::Column::Id).into(),
            Relation::Tenant => Entity::belongs_to(tenant::Entity).from(Column::TenantId).to(tenant::Column::Id).into(),
        }
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef { Relation::User.def() }
}

impl ActiveModelBehavior for ActiveModel {}
