use serde::{Serialize, Deserialize};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "buses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub number_plate: String,
    // Un chauffeur ne conduit qu'un seul bus à la fois
    #[sea_orm(unique)]
    pub driver_id: Option<i32>,
    // NULL = position inconnue (différent de 0,0)
    pub current_latitude: Option<f64>,
    pub current_longitude: Option<f64>,
    pub location_reported_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::driver::Entity",
        from = "Column::DriverId",
        to = "super::driver::Column::Id",
        on_delete = "SetNull"
    )]
    Driver,

    #[sea_orm(has_one = "super::route::Entity")]
    Route,

    #[sea_orm(has_many = "super::boarding_history::Entity")]
    BoardingHistory,
}

impl Related<super::driver::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Driver.def()
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
