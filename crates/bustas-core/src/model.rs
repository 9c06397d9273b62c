//! Entity types for the brokerage platform.
//!
//! Identifiers are opaque: numeric keys for most entities, strings for
//! pictures, sessions and confirmations. Every `fk_*` field is a plain
//! key; traversal of the owning chain happens in the storage layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id_user: i64,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub registration_time: DateTime<Utc>,
    pub profile_picture: Option<String>,
}

/// Marker row: the user id is an administrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Administrator {
    pub id_user: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Broker {
    pub id_user: i64,
    pub confirmed: bool,
    pub blocked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Buyer {
    pub id_user: i64,
    pub confirmed: bool,
    pub blocked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Building {
    pub id_building: i64,
    pub city: String,
    pub address: String,
    pub area: f64,
    pub year: i32,
    pub last_renovation_year: Option<i32>,
    pub floors: i32,
    /// Energy class reference id, optional.
    pub energy: Option<i32>,
    pub fk_broker: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Apartment {
    pub id_apartment: i64,
    pub apartment_number: Option<i32>,
    pub area: f64,
    pub floor: Option<i32>,
    pub rooms: i32,
    pub notes: Option<String>,
    /// Heating type reference id, optional. A null here is never part of
    /// an ownership chain.
    pub heating: Option<i32>,
    pub finish: i32,
    pub is_whole_building: bool,
    pub fk_building: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Picture {
    pub id: String,
    pub public: bool,
    pub fk_apartment: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id_listing: i64,
    pub description: String,
    pub asking_price: f64,
    pub rent: bool,
    /// 1:1 — each picture backs at most one listing.
    pub fk_picture: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub id_availability: i64,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub fk_broker: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewing {
    pub id_viewing: i64,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    /// Viewing status reference id.
    pub status: i32,
    pub fk_availability: i64,
    pub fk_listing: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub created: DateTime<Utc>,
    pub remember: bool,
    pub last_activity: DateTime<Utc>,
    pub expires: DateTime<Utc>,
    pub revoked: bool,
    pub fk_user: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Confirmation {
    pub id: String,
    pub expires: DateTime<Utc>,
    pub fk_buyer: i64,
}

/// Reference tables validated at write time (energy classes, finish
/// types, heating types, viewing statuses).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    EnergyClass,
    FinishType,
    HeatingType,
    ViewingStatus,
}

impl ReferenceKind {
    pub fn table(self) -> &'static str {
        match self {
            ReferenceKind::EnergyClass => "energy_classes",
            ReferenceKind::FinishType => "finish_types",
            ReferenceKind::HeatingType => "heating_types",
            ReferenceKind::ViewingStatus => "viewing_statuses",
        }
    }
}
