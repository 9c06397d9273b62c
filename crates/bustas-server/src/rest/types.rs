//! Request payloads for the REST surface.
//!
//! Payloads carry client-chosen keys for POST (the key is required in
//! the body) and ignore any key on PUT, where the path id wins. Event
//! times arrive as strings and are parsed with [`parse_event_time`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use bustas_core::model::{
    Apartment, Availability, Building, Listing, Picture, Session, Viewing,
};

use crate::error::ApiError;

const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

/// Parses a scheduling timestamp from a request body.
///
/// A value that is a valid calendar date but carries no time component
/// is rejected as unprocessable rather than malformed: the client sent
/// a well-formed date, it is just not enough to schedule with.
pub fn parse_event_time(raw: &str) -> Result<DateTime<Utc>, ApiError> {
    let raw = raw.trim();
    for format in DATE_TIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    if NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok() {
        return Err(ApiError::UnprocessableEntity(format!(
            "date '{raw}' is missing a time component"
        )));
    }
    Err(ApiError::MalformedInput(format!("unparseable date: '{raw}'")))
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::MalformedInput(format!("{field} is required")))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    #[serde(default)]
    pub id_user: Option<i64>,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub phone: String,
    /// Plain-text on the wire; hashed before it reaches storage. On PUT
    /// a missing password keeps the stored hash.
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub profile_picture: Option<String>,
}

impl UserPayload {
    pub fn require_id(&self) -> Result<i64, ApiError> {
        required(self.id_user, "idUser")
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RolePayload {
    #[serde(default)]
    pub id_user: Option<i64>,
    #[serde(default)]
    pub confirmed: bool,
    #[serde(default)]
    pub blocked: bool,
}

impl RolePayload {
    pub fn require_id(&self) -> Result<i64, ApiError> {
        required(self.id_user, "idUser")
    }
}

/// PATCH body for broker and buyer account status. Exactly one of the
/// two flags must be present.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountStatusPatch {
    #[serde(default)]
    pub confirmed: Option<bool>,
    #[serde(default)]
    pub blocked: Option<bool>,
}

impl AccountStatusPatch {
    pub fn validate(&self) -> Result<(), ApiError> {
        match (self.confirmed, self.blocked) {
            (Some(_), None) | (None, Some(_)) => Ok(()),
            _ => Err(ApiError::MalformedInput(
                "exactly one of 'confirmed' or 'blocked' must be set".to_string(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingPayload {
    #[serde(default)]
    pub id_building: Option<i64>,
    pub city: String,
    pub address: String,
    pub area: f64,
    pub year: i32,
    #[serde(default)]
    pub last_renovation_year: Option<i32>,
    pub floors: i32,
    #[serde(default)]
    pub energy: Option<i32>,
    pub fk_broker: i64,
}

impl BuildingPayload {
    pub fn require_id(&self) -> Result<i64, ApiError> {
        required(self.id_building, "idBuilding")
    }

    pub fn into_building(self, id: i64) -> Building {
        Building {
            id_building: id,
            city: self.city,
            address: self.address,
            area: self.area,
            year: self.year,
            last_renovation_year: self.last_renovation_year,
            floors: self.floors,
            energy: self.energy,
            fk_broker: self.fk_broker,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApartmentPayload {
    #[serde(default)]
    pub id_apartment: Option<i64>,
    #[serde(default)]
    pub apartment_number: Option<i32>,
    pub area: f64,
    #[serde(default)]
    pub floor: Option<i32>,
    pub rooms: i32,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub heating: Option<i32>,
    pub finish: i32,
    #[serde(default)]
    pub is_whole_building: bool,
    pub fk_building: i64,
}

impl ApartmentPayload {
    pub fn require_id(&self) -> Result<i64, ApiError> {
        required(self.id_apartment, "idApartment")
    }

    pub fn into_apartment(self, id: i64) -> Apartment {
        Apartment {
            id_apartment: id,
            apartment_number: self.apartment_number,
            area: self.area,
            floor: self.floor,
            rooms: self.rooms,
            notes: self.notes,
            heating: self.heating,
            finish: self.finish,
            is_whole_building: self.is_whole_building,
            fk_building: self.fk_building,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PicturePayload {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub public: bool,
    pub fk_apartment: i64,
}

impl PicturePayload {
    pub fn require_id(&self) -> Result<String, ApiError> {
        required(self.id.clone(), "id")
    }

    pub fn into_picture(self, id: String) -> Picture {
        Picture {
            id,
            public: self.public,
            fk_apartment: self.fk_apartment,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PictureVisibilityPatch {
    pub public: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingPayload {
    #[serde(default)]
    pub id_listing: Option<i64>,
    pub description: String,
    pub asking_price: f64,
    #[serde(default)]
    pub rent: bool,
    pub fk_picture: String,
}

impl ListingPayload {
    pub fn require_id(&self) -> Result<i64, ApiError> {
        required(self.id_listing, "idListing")
    }

    pub fn into_listing(self, id: i64) -> Listing {
        Listing {
            id_listing: id,
            description: self.description,
            asking_price: self.asking_price,
            rent: self.rent,
            fk_picture: self.fk_picture,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityPayload {
    #[serde(default)]
    pub id_availability: Option<i64>,
    pub from: String,
    pub to: String,
    pub fk_broker: i64,
}

impl AvailabilityPayload {
    pub fn require_id(&self) -> Result<i64, ApiError> {
        required(self.id_availability, "idAvailability")
    }

    pub fn into_availability(self, id: i64) -> Result<Availability, ApiError> {
        Ok(Availability {
            id_availability: id,
            from: parse_event_time(&self.from)?,
            to: parse_event_time(&self.to)?,
            fk_broker: self.fk_broker,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewingPayload {
    #[serde(default)]
    pub id_viewing: Option<i64>,
    pub from: String,
    pub to: String,
    pub status: i32,
    pub fk_availability: i64,
    pub fk_listing: i64,
}

impl ViewingPayload {
    pub fn require_id(&self) -> Result<i64, ApiError> {
        required(self.id_viewing, "idViewing")
    }

    pub fn into_viewing(self, id: i64) -> Result<Viewing, ApiError> {
        Ok(Viewing {
            id_viewing: id,
            from: parse_event_time(&self.from)?,
            to: parse_event_time(&self.to)?,
            status: self.status,
            fk_availability: self.fk_availability,
            fk_listing: self.fk_listing,
        })
    }
}

/// PATCH body for a viewing. Anything other than a bare status object
/// is malformed.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ViewingStatusPatch {
    pub status: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPayload {
    /// Optional client-chosen id; a fresh one is generated when absent.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub remember: bool,
    pub fk_user: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUpdate {
    pub remember: bool,
    pub revoked: bool,
}

impl SessionUpdate {
    pub fn apply(&self, mut session: Session) -> Session {
        session.remember = self.remember;
        session.revoked = self.revoked;
        session.last_activity = Utc::now();
        session
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationPayload {
    #[serde(default)]
    pub id: Option<String>,
    pub expires: String,
    pub fk_buyer: i64,
}
