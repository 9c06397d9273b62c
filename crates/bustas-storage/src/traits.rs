use bustas_core::model::{
    Administrator, Apartment, Availability, Broker, Building, Buyer, Confirmation, Listing,
    Picture, ReferenceKind, Session, User, Viewing,
};
use bustas_core::OwnershipResolver;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("duplicate key")]
    DuplicateKey,
    #[error("foreign key violation: {0}")]
    ForeignKeyViolation(String),
    #[error("row not found")]
    RowNotFound,
    #[error("internal storage error: {0}")]
    Internal(String),
}

/// Users plus their role rows (administrator, broker, buyer).
///
/// Inserts fail with `DuplicateKey` on primary-key or unique-column
/// collisions and with `ForeignKeyViolation` when a role row names a
/// user that does not exist. Updates and deletes of a missing row fail
/// with `RowNotFound`. Deletes cascade to dependent rows.
pub trait AccountStore: Send + Sync {
    fn find_user(&self, id: i64) -> impl Future<Output = Result<Option<User>, StorageError>> + Send;

    fn find_user_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<User>, StorageError>> + Send;

    fn list_users(&self) -> impl Future<Output = Result<Vec<User>, StorageError>> + Send;

    fn insert_user(&self, user: &User) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn update_user(&self, user: &User) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn delete_user(&self, id: i64) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn find_administrator(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<Option<Administrator>, StorageError>> + Send;

    fn list_administrators(
        &self,
    ) -> impl Future<Output = Result<Vec<Administrator>, StorageError>> + Send;

    fn insert_administrator(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn delete_administrator(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn find_broker(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<Option<Broker>, StorageError>> + Send;

    fn list_brokers(&self) -> impl Future<Output = Result<Vec<Broker>, StorageError>> + Send;

    fn insert_broker(
        &self,
        broker: &Broker,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn update_broker(
        &self,
        broker: &Broker,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn delete_broker(&self, id: i64) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn find_buyer(&self, id: i64)
    -> impl Future<Output = Result<Option<Buyer>, StorageError>> + Send;

    fn list_buyers(&self) -> impl Future<Output = Result<Vec<Buyer>, StorageError>> + Send;

    fn insert_buyer(&self, buyer: &Buyer) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn update_buyer(&self, buyer: &Buyer) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn delete_buyer(&self, id: i64) -> impl Future<Output = Result<(), StorageError>> + Send;
}

/// Buildings, apartments, pictures and listings. `*_owned` variants
/// filter by the broker at the end of the ownership chain.
pub trait PropertyStore: Send + Sync {
    fn find_building(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<Option<Building>, StorageError>> + Send;

    fn list_buildings(&self) -> impl Future<Output = Result<Vec<Building>, StorageError>> + Send;

    fn list_buildings_owned(
        &self,
        broker_id: i64,
    ) -> impl Future<Output = Result<Vec<Building>, StorageError>> + Send;

    fn insert_building(
        &self,
        building: &Building,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn update_building(
        &self,
        building: &Building,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn delete_building(&self, id: i64) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn find_apartment(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<Option<Apartment>, StorageError>> + Send;

    fn list_apartments(&self) -> impl Future<Output = Result<Vec<Apartment>, StorageError>> + Send;

    fn list_apartments_owned(
        &self,
        broker_id: i64,
    ) -> impl Future<Output = Result<Vec<Apartment>, StorageError>> + Send;

    fn list_apartments_in_building(
        &self,
        building_id: i64,
    ) -> impl Future<Output = Result<Vec<Apartment>, StorageError>> + Send;

    fn insert_apartment(
        &self,
        apartment: &Apartment,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn update_apartment(
        &self,
        apartment: &Apartment,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn delete_apartment(&self, id: i64) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn find_picture(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<Picture>, StorageError>> + Send;

    fn list_pictures(&self) -> impl Future<Output = Result<Vec<Picture>, StorageError>> + Send;

    fn list_pictures_owned(
        &self,
        broker_id: i64,
    ) -> impl Future<Output = Result<Vec<Picture>, StorageError>> + Send;

    fn list_pictures_of_apartment(
        &self,
        apartment_id: i64,
    ) -> impl Future<Output = Result<Vec<Picture>, StorageError>> + Send;

    fn insert_picture(
        &self,
        picture: &Picture,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn update_picture(
        &self,
        picture: &Picture,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn delete_picture(&self, id: &str) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn find_listing(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<Option<Listing>, StorageError>> + Send;

    /// The picture link is unique, so at most one row comes back.
    fn find_listing_by_picture(
        &self,
        picture_id: &str,
    ) -> impl Future<Output = Result<Option<Listing>, StorageError>> + Send;

    fn list_listings(&self) -> impl Future<Output = Result<Vec<Listing>, StorageError>> + Send;

    fn list_listings_owned(
        &self,
        broker_id: i64,
    ) -> impl Future<Output = Result<Vec<Listing>, StorageError>> + Send;

    fn insert_listing(
        &self,
        listing: &Listing,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn update_listing(
        &self,
        listing: &Listing,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn delete_listing(&self, id: i64) -> impl Future<Output = Result<(), StorageError>> + Send;
}

/// Availabilities and viewings.
pub trait SchedulingStore: Send + Sync {
    fn find_availability(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<Option<Availability>, StorageError>> + Send;

    fn list_availabilities(
        &self,
    ) -> impl Future<Output = Result<Vec<Availability>, StorageError>> + Send;

    fn list_availabilities_owned(
        &self,
        broker_id: i64,
    ) -> impl Future<Output = Result<Vec<Availability>, StorageError>> + Send;

    fn insert_availability(
        &self,
        availability: &Availability,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn update_availability(
        &self,
        availability: &Availability,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn delete_availability(&self, id: i64)
    -> impl Future<Output = Result<(), StorageError>> + Send;

    fn find_viewing(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<Option<Viewing>, StorageError>> + Send;

    fn list_viewings(&self) -> impl Future<Output = Result<Vec<Viewing>, StorageError>> + Send;

    fn list_viewings_owned(
        &self,
        broker_id: i64,
    ) -> impl Future<Output = Result<Vec<Viewing>, StorageError>> + Send;

    fn list_viewings_for_availability(
        &self,
        availability_id: i64,
    ) -> impl Future<Output = Result<Vec<Viewing>, StorageError>> + Send;

    fn insert_viewing(
        &self,
        viewing: &Viewing,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn update_viewing(
        &self,
        viewing: &Viewing,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn delete_viewing(&self, id: i64) -> impl Future<Output = Result<(), StorageError>> + Send;
}

/// Refresh-token sessions and buyer confirmations.
pub trait SessionStore: Send + Sync {
    fn find_session(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<Session>, StorageError>> + Send;

    fn list_sessions(&self) -> impl Future<Output = Result<Vec<Session>, StorageError>> + Send;

    fn list_sessions_for_user(
        &self,
        user_id: i64,
    ) -> impl Future<Output = Result<Vec<Session>, StorageError>> + Send;

    fn insert_session(
        &self,
        session: &Session,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn update_session(
        &self,
        session: &Session,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn delete_session(&self, id: &str) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn find_confirmation(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<Confirmation>, StorageError>> + Send;

    fn list_confirmations(
        &self,
    ) -> impl Future<Output = Result<Vec<Confirmation>, StorageError>> + Send;

    fn insert_confirmation(
        &self,
        confirmation: &Confirmation,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn update_confirmation(
        &self,
        confirmation: &Confirmation,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn delete_confirmation(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;
}

/// Lookup against the seeded reference tables (energy classes, finish
/// types, heating types, viewing statuses).
pub trait ReferenceStore: Send + Sync {
    fn reference_exists(
        &self,
        kind: ReferenceKind,
        id: i32,
    ) -> impl Future<Output = Result<bool, StorageError>> + Send;
}

/// Everything a backend must provide to serve the API.
pub trait Store:
    AccountStore
    + PropertyStore
    + SchedulingStore
    + SessionStore
    + ReferenceStore
    + OwnershipResolver
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> Store for T where
    T: AccountStore
        + PropertyStore
        + SchedulingStore
        + SessionStore
        + ReferenceStore
        + OwnershipResolver
        + Clone
        + Send
        + Sync
        + 'static
{
}
