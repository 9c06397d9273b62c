//! The access decision layer.
//!
//! Every protected operation funnels through [`AccessPolicy::decide`],
//! which evaluates an ordered rule table against the caller and the
//! resource shape. The table is evaluated top to bottom; the first
//! matching rule wins:
//!
//! 1. administrators are allowed everything;
//! 2. self-scoped resources allow the user whose id and role both match
//!    (never for confirmed/blocked status changes, those stay
//!    administrative);
//! 3. ownership-scoped resources allow a broker who owns the resource,
//!    or for creates, the declared parent;
//! 4. everything else is denied.
//!
//! The policy answers allow/deny only. Distinguishing a denial from a
//! missing resource is the caller's job: handlers check existence
//! before asking for a decision, so an `owns_*` probe against a key
//! that vanished concurrently simply resolves to `false`.

use crate::identity::{Actor, Role};
use std::future::Future;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("ownership lookup failed: {0}")]
    Backend(String),
}

/// Resolves whether a broker owns a resource by walking its foreign-key
/// chain down to a broker id. Each operation is a single existence
/// query against one consistent snapshot; a nonexistent key resolves to
/// `false`, never to an error.
pub trait OwnershipResolver {
    /// Building → fk_broker.
    fn owns_building(
        &self,
        broker_id: i64,
        building_id: i64,
    ) -> impl Future<Output = Result<bool, ResolveError>> + Send;

    /// Apartment → Building → fk_broker.
    fn owns_apartment(
        &self,
        broker_id: i64,
        apartment_id: i64,
    ) -> impl Future<Output = Result<bool, ResolveError>> + Send;

    /// Picture → Apartment → Building → fk_broker.
    fn owns_picture(
        &self,
        broker_id: i64,
        picture_id: &str,
    ) -> impl Future<Output = Result<bool, ResolveError>> + Send;

    /// Listing → Picture → Apartment → Building → fk_broker.
    fn owns_listing(
        &self,
        broker_id: i64,
        listing_id: i64,
    ) -> impl Future<Output = Result<bool, ResolveError>> + Send;

    /// Availability → fk_broker.
    fn owns_availability(
        &self,
        broker_id: i64,
        availability_id: i64,
    ) -> impl Future<Output = Result<bool, ResolveError>> + Send;

    /// Viewing → Availability → fk_broker.
    fn owns_viewing(
        &self,
        broker_id: i64,
        viewing_id: i64,
    ) -> impl Future<Output = Result<bool, ResolveError>> + Send;
}

/// What the caller is trying to do to the resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Read,
    Create,
    Update,
    Delete,
    /// Flipping `confirmed`/`blocked` on a broker or buyer row.
    PatchStatus,
}

/// The shape a handler presents to the policy. Existing resources carry
/// their id; creates carry the declared parent instead, since the new
/// row does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Building { id: i64 },
    NewBuilding { broker_id: i64 },
    Apartment { id: i64 },
    NewApartment { building_id: i64 },
    Picture { id: String },
    NewPicture { apartment_id: i64 },
    Listing { id: i64 },
    NewListing { picture_id: String },
    Availability { id: i64 },
    NewAvailability { broker_id: i64 },
    Viewing { id: i64 },
    /// A viewing write names both halves of the pair; the caller must
    /// own the availability and the listing.
    ViewingPair { availability_id: i64, listing_id: i64 },
    BrokerSelf { user_id: i64 },
    BuyerSelf { user_id: i64 },
    UserSelf { user_id: i64 },
    AdminOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// Narrowing applied to a collection read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    /// Full, unfiltered collection.
    All,
    /// Rows whose ownership chain ends at this broker id (or, for
    /// sessions, rows belonging to this user id).
    OwnedBy(i64),
    Deny,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Users,
    Administrators,
    Brokers,
    Buyers,
    Buildings,
    Apartments,
    Pictures,
    Listings,
    Availabilities,
    Viewings,
    Sessions,
    Confirmations,
}

/// Centralized policy over an [`OwnershipResolver`].
#[derive(Debug, Clone)]
pub struct AccessPolicy<R> {
    resolver: R,
}

impl<R: OwnershipResolver> AccessPolicy<R> {
    pub fn new(resolver: R) -> AccessPolicy<R> {
        AccessPolicy { resolver }
    }

    /// Evaluates the rule table for one operation on one resource.
    pub async fn decide(
        &self,
        actor: &Actor,
        op: Operation,
        resource: &Resource,
    ) -> Result<Decision, ResolveError> {
        if actor.is_admin() {
            return Ok(Decision::Allow);
        }

        let allowed = match resource {
            Resource::AdminOnly => false,
            // Self scope requires the matching role, not just the
            // matching id; sessions go through UserSelf, which any
            // authenticated role may hold.
            Resource::UserSelf { user_id } => {
                op != Operation::PatchStatus && actor.user_id == *user_id
            }
            Resource::BrokerSelf { user_id } => {
                op != Operation::PatchStatus
                    && actor.role == Role::Broker
                    && actor.user_id == *user_id
            }
            Resource::BuyerSelf { user_id } => {
                op != Operation::PatchStatus
                    && actor.role == Role::Buyer
                    && actor.user_id == *user_id
            }
            // Ownership rules apply to brokers only.
            _ if actor.role != Role::Broker => false,
            Resource::Building { id } => self.resolver.owns_building(actor.user_id, *id).await?,
            Resource::NewBuilding { broker_id } => actor.user_id == *broker_id,
            Resource::Apartment { id } => self.resolver.owns_apartment(actor.user_id, *id).await?,
            Resource::NewApartment { building_id } => {
                self.resolver
                    .owns_building(actor.user_id, *building_id)
                    .await?
            }
            Resource::Picture { id } => self.resolver.owns_picture(actor.user_id, id).await?,
            Resource::NewPicture { apartment_id } => {
                self.resolver
                    .owns_apartment(actor.user_id, *apartment_id)
                    .await?
            }
            Resource::Listing { id } => self.resolver.owns_listing(actor.user_id, *id).await?,
            Resource::NewListing { picture_id } => {
                self.resolver.owns_picture(actor.user_id, picture_id).await?
            }
            Resource::Availability { id } => {
                self.resolver
                    .owns_availability(actor.user_id, *id)
                    .await?
            }
            Resource::NewAvailability { broker_id } => actor.user_id == *broker_id,
            Resource::Viewing { id } => self.resolver.owns_viewing(actor.user_id, *id).await?,
            Resource::ViewingPair {
                availability_id,
                listing_id,
            } => {
                self.resolver
                    .owns_availability(actor.user_id, *availability_id)
                    .await?
                    && self.resolver.owns_listing(actor.user_id, *listing_id).await?
            }
        };

        Ok(if allowed { Decision::Allow } else { Decision::Deny })
    }

    /// Scope applied to a collection read. Pure: narrowing only names
    /// the owner, the store applies the filter.
    pub fn list_scope(&self, actor: &Actor, collection: Collection) -> ListScope {
        if actor.is_admin() {
            return ListScope::All;
        }
        match collection {
            Collection::Sessions => ListScope::OwnedBy(actor.user_id),
            Collection::Buildings
            | Collection::Apartments
            | Collection::Pictures
            | Collection::Listings
            | Collection::Availabilities
            | Collection::Viewings
                if actor.role == Role::Broker =>
            {
                ListScope::OwnedBy(actor.user_id)
            }
            _ => ListScope::Deny,
        }
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }
}
