// ============================================================================
// MODÈLE : BOARDING HISTORY
// ============================================================================
//
// Description:
//   Journal d'audit des montées/descentes enregistrées par les lecteurs RFID.
//   Une ligne par scan, jamais modifiée ni supprimée.
//
// Colonnes de la table boarding_history:
//   - id (INTEGER, PRIMARY KEY, SERIAL)
//   - student_id (INTEGER, NOT NULL, FK vers students)
//   - bus_id (INTEGER, NOT NULL, FK vers buses)
//   - action (VARCHAR(10), NOT NULL) - 'board' ou 'alight'
//   - gps_location (VARCHAR, NOT NULL) - chaîne vide si le lecteur n'a pas de GPS
//   - timestamp (TIMESTAMPTZ, NOT NULL) - attribué par le serveur
//
// Points d'attention:
//   - "Dernière montée" = ligne la plus récente avec action = 'board'
//   - Une descente plus récente n'efface pas la dernière montée
//   - Pas de déduplication des scans rapides (comportement voulu)
//   - FK en RESTRICT: un élève ou un bus avec historique ne peut être supprimé
//
// ============================================================================

use serde::{Serialize, Deserialize};
use sea_orm::entity::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "lowercase")]
pub enum BoardingAction {
    #[sea_orm(string_value = "board")]
    Board,
    #[sea_orm(string_value = "alight")]
    Alight,
}

impl BoardingAction {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "board" => Some(Self::Board),
            "alight" => Some(Self::Alight),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Board => "board",
            Self::Alight => "alight",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "boarding_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub student_id: i32,
    pub bus_id: i32,
    pub action: BoardingAction,
    pub gps_location: String,
    pub timestamp: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id",
        on_delete = "Restrict"
    )]
    Student,

    #[sea_orm(
        belongs_to = "super::bus::Entity",
        from = "Column::BusId",
        to = "super::bus::Column::Id",
        on_delete = "Restrict"
    )]
    Bus,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl Related<super::bus::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bus.def()
    }
}

// Journal en ajout seul: UPDATE et DELETE refusés au niveau du modèle
#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if !insert {
            return Err(DbErr::Custom("boarding_history is append-only".to_string()));
        }
        Ok(self)
    }

    async fn before_delete<C>(self, _db: &C) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        Err(DbErr::Custom("boarding_history is append-only".to_string()))
    }
}
