use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use bustas_core::model::{
    Administrator, Apartment, Availability, Broker, Building, Buyer, Confirmation, Listing,
    Picture, ReferenceKind, Session, User, Viewing,
};
use bustas_core::{OwnershipResolver, ResolveError};

use crate::traits::{
    AccountStore, PropertyStore, ReferenceStore, SchedulingStore, SessionStore, StorageError,
};

#[derive(Debug, Default)]
struct InnerState {
    users: BTreeMap<i64, User>,
    administrators: BTreeSet<i64>,
    brokers: BTreeMap<i64, Broker>,
    buyers: BTreeMap<i64, Buyer>,
    buildings: BTreeMap<i64, Building>,
    apartments: BTreeMap<i64, Apartment>,
    pictures: BTreeMap<String, Picture>,
    listings: BTreeMap<i64, Listing>,
    availabilities: BTreeMap<i64, Availability>,
    viewings: BTreeMap<i64, Viewing>,
    sessions: BTreeMap<String, Session>,
    confirmations: BTreeMap<String, Confirmation>,
    references: HashMap<ReferenceKind, BTreeSet<i32>>,
}

impl InnerState {
    // Ownership chain walks. Each returns the broker id at the end of
    // the chain, or None when any link is missing.

    fn building_owner(&self, id: i64) -> Option<i64> {
        self.buildings.get(&id).map(|b| b.fk_broker)
    }

    fn apartment_owner(&self, id: i64) -> Option<i64> {
        let apartment = self.apartments.get(&id)?;
        self.building_owner(apartment.fk_building)
    }

    fn picture_owner(&self, id: &str) -> Option<i64> {
        let picture = self.pictures.get(id)?;
        self.apartment_owner(picture.fk_apartment)
    }

    fn listing_owner(&self, id: i64) -> Option<i64> {
        let listing = self.listings.get(&id)?;
        self.picture_owner(&listing.fk_picture)
    }

    fn availability_owner(&self, id: i64) -> Option<i64> {
        self.availabilities.get(&id).map(|a| a.fk_broker)
    }

    fn viewing_owner(&self, id: i64) -> Option<i64> {
        let viewing = self.viewings.get(&id)?;
        self.availability_owner(viewing.fk_availability)
    }

    // FK checks applied before every write.

    fn require_user(&self, id: i64) -> Result<(), StorageError> {
        if self.users.contains_key(&id) {
            Ok(())
        } else {
            Err(StorageError::ForeignKeyViolation(format!("user {id}")))
        }
    }

    fn require_broker(&self, id: i64) -> Result<(), StorageError> {
        if self.brokers.contains_key(&id) {
            Ok(())
        } else {
            Err(StorageError::ForeignKeyViolation(format!("broker {id}")))
        }
    }

    fn require_buyer(&self, id: i64) -> Result<(), StorageError> {
        if self.buyers.contains_key(&id) {
            Ok(())
        } else {
            Err(StorageError::ForeignKeyViolation(format!("buyer {id}")))
        }
    }

    fn require_building(&self, id: i64) -> Result<(), StorageError> {
        if self.buildings.contains_key(&id) {
            Ok(())
        } else {
            Err(StorageError::ForeignKeyViolation(format!("building {id}")))
        }
    }

    fn require_apartment(&self, id: i64) -> Result<(), StorageError> {
        if self.apartments.contains_key(&id) {
            Ok(())
        } else {
            Err(StorageError::ForeignKeyViolation(format!("apartment {id}")))
        }
    }

    fn require_picture(&self, id: &str) -> Result<(), StorageError> {
        if self.pictures.contains_key(id) {
            Ok(())
        } else {
            Err(StorageError::ForeignKeyViolation(format!("picture {id}")))
        }
    }

    fn require_availability(&self, id: i64) -> Result<(), StorageError> {
        if self.availabilities.contains_key(&id) {
            Ok(())
        } else {
            Err(StorageError::ForeignKeyViolation(format!(
                "availability {id}"
            )))
        }
    }

    fn require_listing(&self, id: i64) -> Result<(), StorageError> {
        if self.listings.contains_key(&id) {
            Ok(())
        } else {
            Err(StorageError::ForeignKeyViolation(format!("listing {id}")))
        }
    }

    fn require_reference(&self, kind: ReferenceKind, id: i32) -> Result<(), StorageError> {
        let known = self
            .references
            .get(&kind)
            .is_some_and(|ids| ids.contains(&id));
        if known {
            Ok(())
        } else {
            Err(StorageError::ForeignKeyViolation(format!(
                "{} {id}",
                kind.table()
            )))
        }
    }

    fn validate_building(&self, building: &Building) -> Result<(), StorageError> {
        self.require_broker(building.fk_broker)?;
        if let Some(energy) = building.energy {
            self.require_reference(ReferenceKind::EnergyClass, energy)?;
        }
        Ok(())
    }

    fn validate_apartment(&self, apartment: &Apartment) -> Result<(), StorageError> {
        self.require_building(apartment.fk_building)?;
        self.require_reference(ReferenceKind::FinishType, apartment.finish)?;
        if let Some(heating) = apartment.heating {
            self.require_reference(ReferenceKind::HeatingType, heating)?;
        }
        Ok(())
    }

    fn validate_viewing(&self, viewing: &Viewing) -> Result<(), StorageError> {
        self.require_availability(viewing.fk_availability)?;
        self.require_listing(viewing.fk_listing)?;
        self.require_reference(ReferenceKind::ViewingStatus, viewing.status)
    }

    // Cascading removal, mirroring ON DELETE CASCADE in the pg schema.

    fn remove_listing(&mut self, id: i64) {
        self.viewings.retain(|_, v| v.fk_listing != id);
        self.listings.remove(&id);
    }

    fn remove_picture(&mut self, id: &str) {
        let dependent: Vec<i64> = self
            .listings
            .values()
            .filter(|l| l.fk_picture == id)
            .map(|l| l.id_listing)
            .collect();
        for listing_id in dependent {
            self.remove_listing(listing_id);
        }
        self.pictures.remove(id);
    }

    fn remove_apartment(&mut self, id: i64) {
        let dependent: Vec<String> = self
            .pictures
            .values()
            .filter(|p| p.fk_apartment == id)
            .map(|p| p.id.clone())
            .collect();
        for picture_id in dependent {
            self.remove_picture(&picture_id);
        }
        self.apartments.remove(&id);
    }

    fn remove_building(&mut self, id: i64) {
        let dependent: Vec<i64> = self
            .apartments
            .values()
            .filter(|a| a.fk_building == id)
            .map(|a| a.id_apartment)
            .collect();
        for apartment_id in dependent {
            self.remove_apartment(apartment_id);
        }
        self.buildings.remove(&id);
    }

    fn remove_availability(&mut self, id: i64) {
        self.viewings.retain(|_, v| v.fk_availability != id);
        self.availabilities.remove(&id);
    }

    fn remove_broker(&mut self, id: i64) {
        let buildings: Vec<i64> = self
            .buildings
            .values()
            .filter(|b| b.fk_broker == id)
            .map(|b| b.id_building)
            .collect();
        for building_id in buildings {
            self.remove_building(building_id);
        }
        let availabilities: Vec<i64> = self
            .availabilities
            .values()
            .filter(|a| a.fk_broker == id)
            .map(|a| a.id_availability)
            .collect();
        for availability_id in availabilities {
            self.remove_availability(availability_id);
        }
        self.brokers.remove(&id);
    }

    fn remove_buyer(&mut self, id: i64) {
        self.confirmations.retain(|_, c| c.fk_buyer != id);
        self.buyers.remove(&id);
    }

    fn remove_user(&mut self, id: i64) {
        self.administrators.remove(&id);
        if self.brokers.contains_key(&id) {
            self.remove_broker(id);
        }
        if self.buyers.contains_key(&id) {
            self.remove_buyer(id);
        }
        self.sessions.retain(|_, s| s.fk_user != id);
        self.users.remove(&id);
    }
}

/// In-memory backend. One mutex guards the whole state, so every
/// operation, including the six ownership walks, sees one consistent
/// snapshot.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<InnerState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let mut references = HashMap::new();
        references.insert(
            ReferenceKind::EnergyClass,
            (1..=7).collect::<BTreeSet<i32>>(),
        );
        references.insert(ReferenceKind::FinishType, (1..=3).collect());
        references.insert(ReferenceKind::HeatingType, (1..=5).collect());
        references.insert(ReferenceKind::ViewingStatus, (1..=4).collect());

        Self {
            state: Arc::new(Mutex::new(InnerState {
                references,
                ..InnerState::default()
            })),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountStore for MemoryStore {
    async fn find_user(&self, id: i64) -> Result<Option<User>, StorageError> {
        let state = self.state.lock().unwrap();
        Ok(state.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        let state = self.state.lock().unwrap();
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, StorageError> {
        let state = self.state.lock().unwrap();
        Ok(state.users.values().cloned().collect())
    }

    async fn insert_user(&self, user: &User) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        if state.users.contains_key(&user.id_user) {
            return Err(StorageError::DuplicateKey);
        }
        if state.users.values().any(|u| u.email == user.email) {
            return Err(StorageError::DuplicateKey);
        }
        state.users.insert(user.id_user, user.clone());
        Ok(())
    }

    async fn update_user(&self, user: &User) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        if !state.users.contains_key(&user.id_user) {
            return Err(StorageError::RowNotFound);
        }
        let email_taken = state
            .users
            .values()
            .any(|u| u.id_user != user.id_user && u.email == user.email);
        if email_taken {
            return Err(StorageError::DuplicateKey);
        }
        state.users.insert(user.id_user, user.clone());
        Ok(())
    }

    async fn delete_user(&self, id: i64) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        if !state.users.contains_key(&id) {
            return Err(StorageError::RowNotFound);
        }
        state.remove_user(id);
        Ok(())
    }

    async fn find_administrator(&self, id: i64) -> Result<Option<Administrator>, StorageError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .administrators
            .contains(&id)
            .then_some(Administrator { id_user: id }))
    }

    async fn list_administrators(&self) -> Result<Vec<Administrator>, StorageError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .administrators
            .iter()
            .map(|&id| Administrator { id_user: id })
            .collect())
    }

    async fn insert_administrator(&self, id: i64) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        state.require_user(id)?;
        if !state.administrators.insert(id) {
            return Err(StorageError::DuplicateKey);
        }
        Ok(())
    }

    async fn delete_administrator(&self, id: i64) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        if !state.administrators.remove(&id) {
            return Err(StorageError::RowNotFound);
        }
        Ok(())
    }

    async fn find_broker(&self, id: i64) -> Result<Option<Broker>, StorageError> {
        let state = self.state.lock().unwrap();
        Ok(state.brokers.get(&id).copied())
    }

    async fn list_brokers(&self) -> Result<Vec<Broker>, StorageError> {
        let state = self.state.lock().unwrap();
        Ok(state.brokers.values().copied().collect())
    }

    async fn insert_broker(&self, broker: &Broker) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        state.require_user(broker.id_user)?;
        if state.brokers.contains_key(&broker.id_user) {
            return Err(StorageError::DuplicateKey);
        }
        state.brokers.insert(broker.id_user, *broker);
        Ok(())
    }

    async fn update_broker(&self, broker: &Broker) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        if !state.brokers.contains_key(&broker.id_user) {
            return Err(StorageError::RowNotFound);
        }
        state.brokers.insert(broker.id_user, *broker);
        Ok(())
    }

    async fn delete_broker(&self, id: i64) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        if !state.brokers.contains_key(&id) {
            return Err(StorageError::RowNotFound);
        }
        state.remove_broker(id);
        Ok(())
    }

    async fn find_buyer(&self, id: i64) -> Result<Option<Buyer>, StorageError> {
        let state = self.state.lock().unwrap();
        Ok(state.buyers.get(&id).copied())
    }

    async fn list_buyers(&self) -> Result<Vec<Buyer>, StorageError> {
        let state = self.state.lock().unwrap();
        Ok(state.buyers.values().copied().collect())
    }

    async fn insert_buyer(&self, buyer: &Buyer) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        state.require_user(buyer.id_user)?;
        if state.buyers.contains_key(&buyer.id_user) {
            return Err(StorageError::DuplicateKey);
        }
        state.buyers.insert(buyer.id_user, *buyer);
        Ok(())
    }

    async fn update_buyer(&self, buyer: &Buyer) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        if !state.buyers.contains_key(&buyer.id_user) {
            return Err(StorageError::RowNotFound);
        }
        state.buyers.insert(buyer.id_user, *buyer);
        Ok(())
    }

    async fn delete_buyer(&self, id: i64) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        if !state.buyers.contains_key(&id) {
            return Err(StorageError::RowNotFound);
        }
        state.remove_buyer(id);
        Ok(())
    }
}

impl PropertyStore for MemoryStore {
    async fn find_building(&self, id: i64) -> Result<Option<Building>, StorageError> {
        let state = self.state.lock().unwrap();
        Ok(state.buildings.get(&id).cloned())
    }

    async fn list_buildings(&self) -> Result<Vec<Building>, StorageError> {
        let state = self.state.lock().unwrap();
        Ok(state.buildings.values().cloned().collect())
    }

    async fn list_buildings_owned(&self, broker_id: i64) -> Result<Vec<Building>, StorageError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .buildings
            .values()
            .filter(|b| b.fk_broker == broker_id)
            .cloned()
            .collect())
    }

    async fn insert_building(&self, building: &Building) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        if state.buildings.contains_key(&building.id_building) {
            return Err(StorageError::DuplicateKey);
        }
        state.validate_building(building)?;
        state.buildings.insert(building.id_building, building.clone());
        Ok(())
    }

    async fn update_building(&self, building: &Building) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        if !state.buildings.contains_key(&building.id_building) {
            return Err(StorageError::RowNotFound);
        }
        state.validate_building(building)?;
        state.buildings.insert(building.id_building, building.clone());
        Ok(())
    }

    async fn delete_building(&self, id: i64) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        if !state.buildings.contains_key(&id) {
            return Err(StorageError::RowNotFound);
        }
        state.remove_building(id);
        Ok(())
    }

    async fn find_apartment(&self, id: i64) -> Result<Option<Apartment>, StorageError> {
        let state = self.state.lock().unwrap();
        Ok(state.apartments.get(&id).cloned())
    }

    async fn list_apartments(&self) -> Result<Vec<Apartment>, StorageError> {
        let state = self.state.lock().unwrap();
        Ok(state.apartments.values().cloned().collect())
    }

    async fn list_apartments_owned(&self, broker_id: i64) -> Result<Vec<Apartment>, StorageError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .apartments
            .values()
            .filter(|a| state.building_owner(a.fk_building) == Some(broker_id))
            .cloned()
            .collect())
    }

    async fn list_apartments_in_building(
        &self,
        building_id: i64,
    ) -> Result<Vec<Apartment>, StorageError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .apartments
            .values()
            .filter(|a| a.fk_building == building_id)
            .cloned()
            .collect())
    }

    async fn insert_apartment(&self, apartment: &Apartment) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        if state.apartments.contains_key(&apartment.id_apartment) {
            return Err(StorageError::DuplicateKey);
        }
        state.validate_apartment(apartment)?;
        state
            .apartments
            .insert(apartment.id_apartment, apartment.clone());
        Ok(())
    }

    async fn update_apartment(&self, apartment: &Apartment) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        if !state.apartments.contains_key(&apartment.id_apartment) {
            return Err(StorageError::RowNotFound);
        }
        state.validate_apartment(apartment)?;
        state
            .apartments
            .insert(apartment.id_apartment, apartment.clone());
        Ok(())
    }

    async fn delete_apartment(&self, id: i64) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        if !state.apartments.contains_key(&id) {
            return Err(StorageError::RowNotFound);
        }
        state.remove_apartment(id);
        Ok(())
    }

    async fn find_picture(&self, id: &str) -> Result<Option<Picture>, StorageError> {
        let state = self.state.lock().unwrap();
        Ok(state.pictures.get(id).cloned())
    }

    async fn list_pictures(&self) -> Result<Vec<Picture>, StorageError> {
        let state = self.state.lock().unwrap();
        Ok(state.pictures.values().cloned().collect())
    }

    async fn list_pictures_owned(&self, broker_id: i64) -> Result<Vec<Picture>, StorageError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .pictures
            .values()
            .filter(|p| state.apartment_owner(p.fk_apartment) == Some(broker_id))
            .cloned()
            .collect())
    }

    async fn list_pictures_of_apartment(
        &self,
        apartment_id: i64,
    ) -> Result<Vec<Picture>, StorageError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .pictures
            .values()
            .filter(|p| p.fk_apartment == apartment_id)
            .cloned()
            .collect())
    }

    async fn insert_picture(&self, picture: &Picture) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        if state.pictures.contains_key(&picture.id) {
            return Err(StorageError::DuplicateKey);
        }
        state.require_apartment(picture.fk_apartment)?;
        state.pictures.insert(picture.id.clone(), picture.clone());
        Ok(())
    }

    async fn update_picture(&self, picture: &Picture) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        if !state.pictures.contains_key(&picture.id) {
            return Err(StorageError::RowNotFound);
        }
        state.require_apartment(picture.fk_apartment)?;
        state.pictures.insert(picture.id.clone(), picture.clone());
        Ok(())
    }

    async fn delete_picture(&self, id: &str) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        if !state.pictures.contains_key(id) {
            return Err(StorageError::RowNotFound);
        }
        state.remove_picture(id);
        Ok(())
    }

    async fn find_listing(&self, id: i64) -> Result<Option<Listing>, StorageError> {
        let state = self.state.lock().unwrap();
        Ok(state.listings.get(&id).cloned())
    }

    async fn find_listing_by_picture(
        &self,
        picture_id: &str,
    ) -> Result<Option<Listing>, StorageError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .listings
            .values()
            .find(|l| l.fk_picture == picture_id)
            .cloned())
    }

    async fn list_listings(&self) -> Result<Vec<Listing>, StorageError> {
        let state = self.state.lock().unwrap();
        Ok(state.listings.values().cloned().collect())
    }

    async fn list_listings_owned(&self, broker_id: i64) -> Result<Vec<Listing>, StorageError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .listings
            .values()
            .filter(|l| state.picture_owner(&l.fk_picture) == Some(broker_id))
            .cloned()
            .collect())
    }

    async fn insert_listing(&self, listing: &Listing) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        if state.listings.contains_key(&listing.id_listing) {
            return Err(StorageError::DuplicateKey);
        }
        state.require_picture(&listing.fk_picture)?;
        let picture_taken = state
            .listings
            .values()
            .any(|l| l.fk_picture == listing.fk_picture);
        if picture_taken {
            return Err(StorageError::DuplicateKey);
        }
        state.listings.insert(listing.id_listing, listing.clone());
        Ok(())
    }

    async fn update_listing(&self, listing: &Listing) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        if !state.listings.contains_key(&listing.id_listing) {
            return Err(StorageError::RowNotFound);
        }
        state.require_picture(&listing.fk_picture)?;
        let picture_taken = state
            .listings
            .values()
            .any(|l| l.id_listing != listing.id_listing && l.fk_picture == listing.fk_picture);
        if picture_taken {
            return Err(StorageError::DuplicateKey);
        }
        state.listings.insert(listing.id_listing, listing.clone());
        Ok(())
    }

    async fn delete_listing(&self, id: i64) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        if !state.listings.contains_key(&id) {
            return Err(StorageError::RowNotFound);
        }
        state.remove_listing(id);
        Ok(())
    }
}

impl SchedulingStore for MemoryStore {
    async fn find_availability(&self, id: i64) -> Result<Option<Availability>, StorageError> {
        let state = self.state.lock().unwrap();
        Ok(state.availabilities.get(&id).cloned())
    }

    async fn list_availabilities(&self) -> Result<Vec<Availability>, StorageError> {
        let state = self.state.lock().unwrap();
        Ok(state.availabilities.values().cloned().collect())
    }

    async fn list_availabilities_owned(
        &self,
        broker_id: i64,
    ) -> Result<Vec<Availability>, StorageError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .availabilities
            .values()
            .filter(|a| a.fk_broker == broker_id)
            .cloned()
            .collect())
    }

    async fn insert_availability(&self, availability: &Availability) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        if state
            .availabilities
            .contains_key(&availability.id_availability)
        {
            return Err(StorageError::DuplicateKey);
        }
        state.require_broker(availability.fk_broker)?;
        state
            .availabilities
            .insert(availability.id_availability, availability.clone());
        Ok(())
    }

    async fn update_availability(&self, availability: &Availability) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        if !state
            .availabilities
            .contains_key(&availability.id_availability)
        {
            return Err(StorageError::RowNotFound);
        }
        state.require_broker(availability.fk_broker)?;
        state
            .availabilities
            .insert(availability.id_availability, availability.clone());
        Ok(())
    }

    async fn delete_availability(&self, id: i64) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        if !state.availabilities.contains_key(&id) {
            return Err(StorageError::RowNotFound);
        }
        state.remove_availability(id);
        Ok(())
    }

    async fn find_viewing(&self, id: i64) -> Result<Option<Viewing>, StorageError> {
        let state = self.state.lock().unwrap();
        Ok(state.viewings.get(&id).cloned())
    }

    async fn list_viewings(&self) -> Result<Vec<Viewing>, StorageError> {
        let state = self.state.lock().unwrap();
        Ok(state.viewings.values().cloned().collect())
    }

    async fn list_viewings_owned(&self, broker_id: i64) -> Result<Vec<Viewing>, StorageError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .viewings
            .values()
            .filter(|v| state.availability_owner(v.fk_availability) == Some(broker_id))
            .cloned()
            .collect())
    }

    async fn list_viewings_for_availability(
        &self,
        availability_id: i64,
    ) -> Result<Vec<Viewing>, StorageError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .viewings
            .values()
            .filter(|v| v.fk_availability == availability_id)
            .cloned()
            .collect())
    }

    async fn insert_viewing(&self, viewing: &Viewing) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        if state.viewings.contains_key(&viewing.id_viewing) {
            return Err(StorageError::DuplicateKey);
        }
        state.validate_viewing(viewing)?;
        state.viewings.insert(viewing.id_viewing, viewing.clone());
        Ok(())
    }

    async fn update_viewing(&self, viewing: &Viewing) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        if !state.viewings.contains_key(&viewing.id_viewing) {
            return Err(StorageError::RowNotFound);
        }
        state.validate_viewing(viewing)?;
        state.viewings.insert(viewing.id_viewing, viewing.clone());
        Ok(())
    }

    async fn delete_viewing(&self, id: i64) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        if state.viewings.remove(&id).is_none() {
            return Err(StorageError::RowNotFound);
        }
        Ok(())
    }
}

impl SessionStore for MemoryStore {
    async fn find_session(&self, id: &str) -> Result<Option<Session>, StorageError> {
        let state = self.state.lock().unwrap();
        Ok(state.sessions.get(id).cloned())
    }

    async fn list_sessions(&self) -> Result<Vec<Session>, StorageError> {
        let state = self.state.lock().unwrap();
        Ok(state.sessions.values().cloned().collect())
    }

    async fn list_sessions_for_user(&self, user_id: i64) -> Result<Vec<Session>, StorageError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .sessions
            .values()
            .filter(|s| s.fk_user == user_id)
            .cloned()
            .collect())
    }

    async fn insert_session(&self, session: &Session) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        if state.sessions.contains_key(&session.id) {
            return Err(StorageError::DuplicateKey);
        }
        state.require_user(session.fk_user)?;
        state.sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn update_session(&self, session: &Session) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        if !state.sessions.contains_key(&session.id) {
            return Err(StorageError::RowNotFound);
        }
        state.require_user(session.fk_user)?;
        state.sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn delete_session(&self, id: &str) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        if state.sessions.remove(id).is_none() {
            return Err(StorageError::RowNotFound);
        }
        Ok(())
    }

    async fn find_confirmation(&self, id: &str) -> Result<Option<Confirmation>, StorageError> {
        let state = self.state.lock().unwrap();
        Ok(state.confirmations.get(id).cloned())
    }

    async fn list_confirmations(&self) -> Result<Vec<Confirmation>, StorageError> {
        let state = self.state.lock().unwrap();
        Ok(state.confirmations.values().cloned().collect())
    }

    async fn insert_confirmation(&self, confirmation: &Confirmation) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        if state.confirmations.contains_key(&confirmation.id) {
            return Err(StorageError::DuplicateKey);
        }
        state.require_buyer(confirmation.fk_buyer)?;
        state
            .confirmations
            .insert(confirmation.id.clone(), confirmation.clone());
        Ok(())
    }

    async fn update_confirmation(&self, confirmation: &Confirmation) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        if !state.confirmations.contains_key(&confirmation.id) {
            return Err(StorageError::RowNotFound);
        }
        state.require_buyer(confirmation.fk_buyer)?;
        state
            .confirmations
            .insert(confirmation.id.clone(), confirmation.clone());
        Ok(())
    }

    async fn delete_confirmation(&self, id: &str) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        if state.confirmations.remove(id).is_none() {
            return Err(StorageError::RowNotFound);
        }
        Ok(())
    }
}

impl ReferenceStore for MemoryStore {
    async fn reference_exists(&self, kind: ReferenceKind, id: i32) -> Result<bool, StorageError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .references
            .get(&kind)
            .is_some_and(|ids| ids.contains(&id)))
    }
}

impl OwnershipResolver for MemoryStore {
    async fn owns_building(&self, broker_id: i64, building_id: i64) -> Result<bool, ResolveError> {
        let state = self.state.lock().unwrap();
        Ok(state.building_owner(building_id) == Some(broker_id))
    }

    async fn owns_apartment(
        &self,
        broker_id: i64,
        apartment_id: i64,
    ) -> Result<bool, ResolveError> {
        let state = self.state.lock().unwrap();
        Ok(state.apartment_owner(apartment_id) == Some(broker_id))
    }

    async fn owns_picture(&self, broker_id: i64, picture_id: &str) -> Result<bool, ResolveError> {
        let state = self.state.lock().unwrap();
        Ok(state.picture_owner(picture_id) == Some(broker_id))
    }

    async fn owns_listing(&self, broker_id: i64, listing_id: i64) -> Result<bool, ResolveError> {
        let state = self.state.lock().unwrap();
        Ok(state.listing_owner(listing_id) == Some(broker_id))
    }

    async fn owns_availability(
        &self,
        broker_id: i64,
        availability_id: i64,
    ) -> Result<bool, ResolveError> {
        let state = self.state.lock().unwrap();
        Ok(state.availability_owner(availability_id) == Some(broker_id))
    }

    async fn owns_viewing(&self, broker_id: i64, viewing_id: i64) -> Result<bool, ResolveError> {
        let state = self.state.lock().unwrap();
        Ok(state.viewing_owner(viewing_id) == Some(broker_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(id: i64, email: &str) -> User {
        User {
            id_user: id,
            name: "Jonas".to_string(),
            surname: "Jonaitis".to_string(),
            email: email.to_string(),
            phone: "+37060000000".to_string(),
            password_hash: "hash".to_string(),
            registration_time: Utc::now(),
            profile_picture: None,
        }
    }

    fn building(id: i64, broker: i64) -> Building {
        Building {
            id_building: id,
            city: "Vilnius".to_string(),
            address: "Gedimino pr. 1".to_string(),
            area: 450.0,
            year: 1998,
            last_renovation_year: None,
            floors: 5,
            energy: Some(3),
            fk_broker: broker,
        }
    }

    fn apartment(id: i64, building: i64) -> Apartment {
        Apartment {
            id_apartment: id,
            apartment_number: Some(12),
            area: 54.3,
            floor: Some(3),
            rooms: 2,
            notes: None,
            heating: Some(1),
            finish: 1,
            is_whole_building: false,
            fk_building: building,
        }
    }

    fn picture(id: &str, apartment: i64) -> Picture {
        Picture {
            id: id.to_string(),
            public: true,
            fk_apartment: apartment,
        }
    }

    fn listing(id: i64, picture: &str) -> Listing {
        Listing {
            id_listing: id,
            description: "Two rooms near the center".to_string(),
            asking_price: 145_000.0,
            rent: false,
            fk_picture: picture.to_string(),
        }
    }

    fn availability(id: i64, broker: i64) -> Availability {
        Availability {
            id_availability: id,
            from: Utc::now(),
            to: Utc::now(),
            fk_broker: broker,
        }
    }

    fn viewing(id: i64, avail: i64, listing: i64) -> Viewing {
        Viewing {
            id_viewing: id,
            from: Utc::now(),
            to: Utc::now(),
            status: 1,
            fk_availability: avail,
            fk_listing: listing,
        }
    }

    async fn broker_with_chain(store: &MemoryStore, broker_id: i64) {
        store
            .insert_user(&user(broker_id, &format!("broker{broker_id}@example.com")))
            .await
            .unwrap();
        store
            .insert_broker(&Broker {
                id_user: broker_id,
                confirmed: true,
                blocked: false,
            })
            .await
            .unwrap();
    }

    /// Broker 5 owns building 10 > apartment 20 > picture "p1" >
    /// listing 30, plus availability 40 > viewing 7. Broker 6 exists
    /// and owns nothing.
    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        broker_with_chain(&store, 5).await;
        broker_with_chain(&store, 6).await;
        store.insert_building(&building(10, 5)).await.unwrap();
        store.insert_apartment(&apartment(20, 10)).await.unwrap();
        store.insert_picture(&picture("p1", 20)).await.unwrap();
        store.insert_listing(&listing(30, "p1")).await.unwrap();
        store.insert_availability(&availability(40, 5)).await.unwrap();
        store.insert_viewing(&viewing(7, 40, 30)).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_01_insert_and_find_user() {
        let store = MemoryStore::new();
        store.insert_user(&user(1, "a@example.com")).await.unwrap();
        let found = store.find_user(1).await.unwrap().unwrap();
        assert_eq!(found.email, "a@example.com");
        assert!(store.find_user(2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_02_duplicate_user_id_rejected() {
        let store = MemoryStore::new();
        store.insert_user(&user(1, "a@example.com")).await.unwrap();
        let err = store.insert_user(&user(1, "b@example.com")).await.unwrap_err();
        assert_eq!(err, StorageError::DuplicateKey);
    }

    #[tokio::test]
    async fn test_03_duplicate_email_rejected() {
        let store = MemoryStore::new();
        store.insert_user(&user(1, "a@example.com")).await.unwrap();
        let err = store.insert_user(&user(2, "a@example.com")).await.unwrap_err();
        assert_eq!(err, StorageError::DuplicateKey);
    }

    #[tokio::test]
    async fn test_04_broker_row_requires_user() {
        let store = MemoryStore::new();
        let err = store
            .insert_broker(&Broker {
                id_user: 99,
                confirmed: false,
                blocked: false,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::ForeignKeyViolation(_)));
    }

    #[tokio::test]
    async fn test_05_owner_resolves_true_down_the_whole_chain() {
        let store = seeded().await;
        assert!(store.owns_building(5, 10).await.unwrap());
        assert!(store.owns_apartment(5, 20).await.unwrap());
        assert!(store.owns_picture(5, "p1").await.unwrap());
        assert!(store.owns_listing(5, 30).await.unwrap());
        assert!(store.owns_availability(5, 40).await.unwrap());
        assert!(store.owns_viewing(5, 7).await.unwrap());
    }

    #[tokio::test]
    async fn test_06_non_owner_resolves_false_down_the_whole_chain() {
        let store = seeded().await;
        assert!(!store.owns_building(6, 10).await.unwrap());
        assert!(!store.owns_apartment(6, 20).await.unwrap());
        assert!(!store.owns_picture(6, "p1").await.unwrap());
        assert!(!store.owns_listing(6, 30).await.unwrap());
        assert!(!store.owns_availability(6, 40).await.unwrap());
        assert!(!store.owns_viewing(6, 7).await.unwrap());
    }

    #[tokio::test]
    async fn test_07_nonexistent_keys_resolve_false_not_error() {
        let store = seeded().await;
        assert!(!store.owns_building(5, 999).await.unwrap());
        assert!(!store.owns_apartment(5, 999).await.unwrap());
        assert!(!store.owns_picture(5, "missing").await.unwrap());
        assert!(!store.owns_listing(5, 999).await.unwrap());
        assert!(!store.owns_availability(5, 999).await.unwrap());
        assert!(!store.owns_viewing(5, 999).await.unwrap());
    }

    #[tokio::test]
    async fn test_08_dangling_fk_rejected_on_insert() {
        let store = seeded().await;
        let err = store.insert_apartment(&apartment(21, 999)).await.unwrap_err();
        assert!(matches!(err, StorageError::ForeignKeyViolation(_)));
        let err = store.insert_picture(&picture("p2", 999)).await.unwrap_err();
        assert!(matches!(err, StorageError::ForeignKeyViolation(_)));
        let err = store.insert_viewing(&viewing(8, 999, 30)).await.unwrap_err();
        assert!(matches!(err, StorageError::ForeignKeyViolation(_)));
    }

    #[tokio::test]
    async fn test_09_picture_link_is_unique_across_listings() {
        let store = seeded().await;
        let err = store.insert_listing(&listing(31, "p1")).await.unwrap_err();
        assert_eq!(err, StorageError::DuplicateKey);
    }

    #[tokio::test]
    async fn test_10_unknown_reference_id_rejected() {
        let store = seeded().await;
        let mut flat = apartment(21, 10);
        flat.finish = 99;
        let err = store.insert_apartment(&flat).await.unwrap_err();
        assert!(matches!(err, StorageError::ForeignKeyViolation(_)));

        let mut v = viewing(8, 40, 30);
        v.status = 99;
        let err = store.insert_viewing(&v).await.unwrap_err();
        assert!(matches!(err, StorageError::ForeignKeyViolation(_)));
    }

    #[tokio::test]
    async fn test_11_delete_building_cascades_to_the_chain() {
        let store = seeded().await;
        store.delete_building(10).await.unwrap();
        assert!(store.find_apartment(20).await.unwrap().is_none());
        assert!(store.find_picture("p1").await.unwrap().is_none());
        assert!(store.find_listing(30).await.unwrap().is_none());
        // Viewing referenced the cascaded listing.
        assert!(store.find_viewing(7).await.unwrap().is_none());
        // The availability is owned directly and survives.
        assert!(store.find_availability(40).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_12_delete_availability_cascades_viewings() {
        let store = seeded().await;
        store.delete_availability(40).await.unwrap();
        assert!(store.find_viewing(7).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_13_owned_lists_narrow_by_chain_owner() {
        let store = seeded().await;
        assert_eq!(store.list_buildings_owned(5).await.unwrap().len(), 1);
        assert_eq!(store.list_buildings_owned(6).await.unwrap().len(), 0);
        assert_eq!(store.list_apartments_owned(5).await.unwrap().len(), 1);
        assert_eq!(store.list_listings_owned(5).await.unwrap().len(), 1);
        assert_eq!(store.list_listings_owned(6).await.unwrap().len(), 0);
        assert_eq!(store.list_viewings_owned(5).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_14_update_of_missing_row_is_row_not_found() {
        let store = MemoryStore::new();
        let err = store.update_building(&building(1, 1)).await.unwrap_err();
        assert_eq!(err, StorageError::RowNotFound);
        let err = store.delete_listing(1).await.unwrap_err();
        assert_eq!(err, StorageError::RowNotFound);
    }

    #[tokio::test]
    async fn test_15_update_revalidates_foreign_keys() {
        let store = seeded().await;
        let mut flat = apartment(20, 10);
        flat.fk_building = 999;
        let err = store.update_apartment(&flat).await.unwrap_err();
        assert!(matches!(err, StorageError::ForeignKeyViolation(_)));
    }

    #[tokio::test]
    async fn test_16_delete_user_cascades_role_rows_and_sessions() {
        let store = seeded().await;
        store
            .insert_session(&Session {
                id: "s1".to_string(),
                created: Utc::now(),
                remember: false,
                last_activity: Utc::now(),
                expires: Utc::now(),
                revoked: false,
                fk_user: 5,
            })
            .await
            .unwrap();
        store.delete_user(5).await.unwrap();
        assert!(store.find_broker(5).await.unwrap().is_none());
        assert!(store.find_session("s1").await.unwrap().is_none());
        assert!(store.find_building(10).await.unwrap().is_none());
        assert!(store.find_availability(40).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_17_reassigned_parent_moves_chain_ownership() {
        let store = seeded().await;
        store.insert_building(&building(11, 6)).await.unwrap();
        let mut flat = apartment(20, 10);
        flat.fk_building = 11;
        store.update_apartment(&flat).await.unwrap();
        assert!(store.owns_apartment(6, 20).await.unwrap());
        assert!(!store.owns_apartment(5, 20).await.unwrap());
        // Downstream picture and listing move with the apartment.
        assert!(store.owns_listing(6, 30).await.unwrap());
    }

    #[tokio::test]
    async fn test_18_sessions_listed_per_user() {
        let store = seeded().await;
        for (id, user) in [("s1", 5), ("s2", 5), ("s3", 6)] {
            store
                .insert_session(&Session {
                    id: id.to_string(),
                    created: Utc::now(),
                    remember: false,
                    last_activity: Utc::now(),
                    expires: Utc::now(),
                    revoked: false,
                    fk_user: user,
                })
                .await
                .unwrap();
        }
        assert_eq!(store.list_sessions_for_user(5).await.unwrap().len(), 2);
        assert_eq!(store.list_sessions_for_user(6).await.unwrap().len(), 1);
        assert_eq!(store.list_sessions().await.unwrap().len(), 3);
    }
}
