//! Slip entity - Stores uploaded proof-of-payment images.

use sea_orm::entity::prelude::*;

/// Slip image database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "slips")]
pub struct Model {
    /// Unique identifier for the image
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Original file name
    pub filename: String,
    /// Raw image bytes
    pub data: Vec<u8>,
    /// When the image was received
    pub created_at: DateTime,
}

/// Slips are referenced by users and transactions but own no relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
