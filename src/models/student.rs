use serde::{Serialize, Deserialize};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "students")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    // Clé de jointure entre le badge physique et l'élève
    #[sea_orm(unique)]
    pub rfid: String,
    pub parent_id: i32,
    pub route_id: Option<i32>, // NULL si pas encore affecté à un trajet
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::parent::Entity",
        from = "Column::ParentId",
        to = "super::parent::Column::Id",
        on_delete = "Restrict"
    )]
    Parent,

    #[sea_orm(
        belongs_to = "super::route::Entity",
        from = "Column::RouteId",
        to = "super::route::Column::Id",
        on_delete = "SetNull"
    )]
    Route,

    #[sea_orm(has_many = "super::boarding_history::Entity")]
    BoardingHistory,
}

impl Related<super::parent::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Parent.def()
    }
}

impl Related<super::route::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Route.def()
    }
}

impl Related<super::boarding_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BoardingHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
