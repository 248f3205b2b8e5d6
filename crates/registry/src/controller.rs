use log::debug;
use model::{
    shelter::{Coordinates, RegionInfo, Shelter, ShelterDraft, ShelterPatch},
    WithDistance, WithId,
};
use schemars::JsonSchema;
use serde::Serialize;
use utility::{geo, id::Id};

use crate::{store::ShelterStore, RegistryError, Result};

/// What map clicks currently mean to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    /// Clicks are no-ops; the mirror is browsable.
    Idle,
    /// The next click picks the location of a new shelter.
    Placing,
    /// A draft with a location exists and is being filled in.
    Editing,
}

/// Proof of a map click handed back to the caller so it can resolve the
/// reverse geocode without holding the registry. The embedded sequence
/// number is compared on [`ShelterRegistry::apply_geocode`]; a ticket
/// superseded by a later click is silently discarded, which is what makes
/// the last-click-wins ordering explicit.
#[derive(Debug, Clone)]
pub struct PlacementTicket {
    seq: u64,
    coordinates: Coordinates,
}

impl PlacementTicket {
    pub fn coordinates(&self) -> Coordinates {
        self.coordinates
    }
}

/// Mediates between map clicks, the reverse geocoder, the shelter store and
/// the displayed collection. Owns the in-memory mirror of the persisted
/// shelters and the draft for the shelter currently being placed. The
/// mirror is only ever mutated here, and only after the corresponding store
/// call succeeded.
pub struct ShelterRegistry<S> {
    store: S,
    shelters: Vec<WithId<Shelter>>,
    draft: ShelterDraft,
    mode: Mode,
    click_seq: u64,
}

impl<S> ShelterRegistry<S>
where
    S: ShelterStore,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            shelters: Vec::new(),
            draft: ShelterDraft::default(),
            mode: Mode::Idle,
            click_seq: 0,
        }
    }

    pub fn shelters(&self) -> &[WithId<Shelter>] {
        &self.shelters
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn draft(&self) -> &ShelterDraft {
        &self.draft
    }

    /// Replaces the mirror with a full fetch from the store and returns to
    /// `Idle`. On failure the previous mirror stays available (stale beats
    /// empty) and any in-progress draft is kept as well.
    pub async fn load(&mut self) -> Result<()> {
        let shelters = self.store.list().await?;
        self.shelters = shelters;
        self.draft = ShelterDraft::default();
        self.mode = Mode::Idle;
        Ok(())
    }

    /// Arms the map: the next click is a location pick.
    pub fn begin_placement(&mut self) -> Result<()> {
        self.expect_mode(Mode::Idle, "begin_placement")?;
        self.mode = Mode::Placing;
        Ok(())
    }

    /// Records a location pick. The draft is reset to the clicked
    /// coordinates only; region fields arrive later via
    /// [`apply_geocode`](Self::apply_geocode). A click while an earlier
    /// geocode is still outstanding supersedes it.
    pub fn on_map_click(
        &mut self,
        coordinates: Coordinates,
    ) -> Result<PlacementTicket> {
        self.expect_mode(Mode::Placing, "on_map_click")?;
        self.click_seq += 1;
        self.draft = ShelterDraft::at(coordinates);
        Ok(PlacementTicket {
            seq: self.click_seq,
            coordinates,
        })
    }

    /// Feeds a resolved (or degraded-to-empty) geocode result back into the
    /// draft belonging to the given ticket. Returns whether the result was
    /// applied; stale tickets and tickets whose placement was cancelled in
    /// the meantime are discarded.
    pub fn apply_geocode(
        &mut self,
        ticket: &PlacementTicket,
        region: RegionInfo,
    ) -> bool {
        if self.mode != Mode::Placing || ticket.seq != self.click_seq {
            debug!(
                "discarding geocode result for superseded click #{}",
                ticket.seq
            );
            return false;
        }
        self.draft.set_region(region);
        self.mode = Mode::Editing;
        true
    }

    /// Merges one operator-supplied field into the draft.
    pub fn update_draft(&mut self, patch: ShelterPatch) -> Result<()> {
        self.expect_mode(Mode::Editing, "update_draft")?;
        self.draft.set_field(patch);
        Ok(())
    }

    /// Persists the draft. Unset fields get their documented defaults; a
    /// draft without a picked location is rejected before the store is
    /// touched. On success the new record is appended to the mirror with
    /// the store-assigned id (optimistic append, no refetch). On store
    /// failure draft and mode survive so the operator can retry without
    /// re-entering anything.
    pub async fn confirm_add(&mut self) -> Result<Id<Shelter>> {
        self.expect_mode(Mode::Editing, "confirm_add")?;
        let shelter = self
            .draft
            .clone()
            .finish()
            .ok_or(RegistryError::Validation("draft has no location"))?;
        let id = self.store.create(shelter.clone()).await?;
        self.shelters.push(WithId::new(id.clone(), shelter));
        self.draft = ShelterDraft::default();
        self.mode = Mode::Idle;
        Ok(id)
    }

    /// Drops the draft without persisting anything.
    pub fn cancel_placement(&mut self) -> Result<()> {
        if self.mode == Mode::Idle {
            return Err(RegistryError::Mode {
                operation: "cancel_placement",
                mode: self.mode,
            });
        }
        self.draft = ShelterDraft::default();
        self.mode = Mode::Idle;
        Ok(())
    }

    /// Flips a shelter's active flag via a field-level store patch and
    /// mirrors the flip locally once the store accepted it. Returns the new
    /// value.
    pub async fn toggle_active(&mut self, id: &Id<Shelter>) -> Result<bool> {
        let index = self.index_of(id)?;
        let next = !self.shelters[index].content.is_active;
        let patch = ShelterPatch::IsActive(next);
        self.store.update_field(id, patch.clone()).await?;
        patch.apply(&mut self.shelters[index].content);
        Ok(next)
    }

    /// Deletes a shelter. The caller is expected to have confirmed the
    /// intent with the operator already. Returns the removed record.
    pub async fn remove(&mut self, id: &Id<Shelter>) -> Result<WithId<Shelter>> {
        let index = self.index_of(id)?;
        self.store.delete(id).await?;
        Ok(self.shelters.remove(index))
    }

    /// Mirror-side query: shelters within `radius_km` of a point, nearest
    /// first. A bounding box narrows the candidates before the exact
    /// haversine check.
    pub fn nearby(
        &self,
        latitude: f64,
        longitude: f64,
        radius_km: f64,
    ) -> Vec<WithDistance<WithId<Shelter>>> {
        let ((min_lat, min_lon), (max_lat, max_lon)) =
            geo::calculate_bounding_box(latitude, longitude, radius_km);
        let mut found = self
            .shelters
            .iter()
            .filter(|shelter| {
                (min_lat..=max_lat).contains(&shelter.content.latitude)
                    && (min_lon..=max_lon).contains(&shelter.content.longitude)
            })
            .cloned()
            .map(|shelter| shelter.with_distance_to(latitude, longitude))
            .filter(|shelter| shelter.distance_km <= radius_km)
            .collect::<Vec<_>>();
        found.sort_by(|a, b| {
            a.distance_km
                .partial_cmp(&b.distance_km)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        found
    }

    fn index_of(&self, id: &Id<Shelter>) -> Result<usize> {
        self.shelters
            .iter()
            .position(|shelter| &shelter.id == id)
            .ok_or(RegistryError::NotFound)
    }

    fn expect_mode(&self, expected: Mode, operation: &'static str) -> Result<()> {
        if self.mode == expected {
            Ok(())
        } else {
            Err(RegistryError::Mode {
                operation,
                mode: self.mode,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    };

    use async_trait::async_trait;
    use model::shelter::{DEFAULT_CAPACITY, DEFAULT_CONTACT};

    use super::*;
    use crate::store::{Result as StoreResult, StoreError};

    #[derive(Default)]
    struct MemoryStoreInner {
        shelters: Vec<(String, Shelter)>,
        next_id: u64,
        fail: bool,
    }

    /// In-memory stand-in for the persistent store, with a failure switch
    /// and a write-call counter.
    #[derive(Clone, Default)]
    struct MemoryStore {
        inner: Arc<Mutex<MemoryStoreInner>>,
        create_calls: Arc<AtomicUsize>,
    }

    impl MemoryStore {
        fn with_shelters(shelters: Vec<Shelter>) -> Self {
            let store = Self::default();
            {
                let mut inner = store.inner.lock().unwrap();
                for shelter in shelters {
                    inner.next_id += 1;
                    let id = format!("shelter-{}", inner.next_id);
                    inner.shelters.push((id, shelter));
                }
            }
            store
        }

        fn set_fail(&self, fail: bool) {
            self.inner.lock().unwrap().fail = fail;
        }

        fn create_calls(&self) -> usize {
            self.create_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ShelterStore for MemoryStore {
        async fn list(&self) -> StoreResult<Vec<WithId<Shelter>>> {
            let inner = self.inner.lock().unwrap();
            if inner.fail {
                return Err(StoreError::other(std::io::Error::other("down")));
            }
            Ok(inner
                .shelters
                .iter()
                .map(|(id, shelter)| {
                    WithId::new(Id::new(id.clone()), shelter.clone())
                })
                .collect())
        }

        async fn create(&self, shelter: Shelter) -> StoreResult<Id<Shelter>> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            let mut inner = self.inner.lock().unwrap();
            if inner.fail {
                return Err(StoreError::other(std::io::Error::other("down")));
            }
            inner.next_id += 1;
            let id = format!("shelter-{}", inner.next_id);
            inner.shelters.push((id.clone(), shelter));
            Ok(Id::new(id))
        }

        async fn update_field(
            &self,
            id: &Id<Shelter>,
            patch: ShelterPatch,
        ) -> StoreResult<()> {
            let mut inner = self.inner.lock().unwrap();
            if inner.fail {
                return Err(StoreError::other(std::io::Error::other("down")));
            }
            let raw = id.raw();
            let shelter = inner
                .shelters
                .iter_mut()
                .find(|(stored, _)| *stored == raw)
                .ok_or(StoreError::NotFound)?;
            patch.apply(&mut shelter.1);
            Ok(())
        }

        async fn delete(&self, id: &Id<Shelter>) -> StoreResult<()> {
            let mut inner = self.inner.lock().unwrap();
            if inner.fail {
                return Err(StoreError::other(std::io::Error::other("down")));
            }
            let raw = id.raw();
            let before = inner.shelters.len();
            inner.shelters.retain(|(stored, _)| *stored != raw);
            if inner.shelters.len() == before {
                return Err(StoreError::NotFound);
            }
            Ok(())
        }
    }

    fn sample_shelter(name: &str) -> Shelter {
        Shelter {
            name: name.to_owned(),
            capacity: 50,
            latitude: 19.0,
            longitude: 73.0,
            state: "Maharashtra".to_owned(),
            district: "Raigad".to_owned(),
            address: "Somewhere".to_owned(),
            contact_number: "123".to_owned(),
            is_active: true,
        }
    }

    fn mumbai() -> Coordinates {
        Coordinates {
            latitude: 19.076,
            longitude: 72.877,
        }
    }

    fn mumbai_region() -> RegionInfo {
        RegionInfo {
            state: "Maharashtra".to_owned(),
            district: "Mumbai".to_owned(),
            address: "Mumbai, MH".to_owned(),
        }
    }

    /// Drives a registry through begin → click → geocode into `Editing`.
    fn start_editing(
        registry: &mut ShelterRegistry<MemoryStore>,
        coordinates: Coordinates,
        region: RegionInfo,
    ) {
        registry.begin_placement().unwrap();
        let ticket = registry.on_map_click(coordinates).unwrap();
        assert!(registry.apply_geocode(&ticket, region));
        assert_eq!(registry.mode(), Mode::Editing);
    }

    #[tokio::test]
    async fn load_from_empty_store_is_empty_and_idle() {
        let mut registry = ShelterRegistry::new(MemoryStore::default());
        registry.load().await.unwrap();
        assert!(registry.shelters().is_empty());
        assert_eq!(registry.mode(), Mode::Idle);
    }

    #[tokio::test]
    async fn load_failure_keeps_previous_mirror() {
        let store =
            MemoryStore::with_shelters(vec![sample_shelter("Community Hall")]);
        let mut registry = ShelterRegistry::new(store.clone());
        registry.load().await.unwrap();
        assert_eq!(registry.shelters().len(), 1);

        store.set_fail(true);
        assert!(matches!(
            registry.load().await,
            Err(RegistryError::Store(_))
        ));
        assert_eq!(registry.shelters().len(), 1);
    }

    #[tokio::test]
    async fn confirm_appends_exactly_one_with_the_store_id() {
        let store = MemoryStore::default();
        let mut registry = ShelterRegistry::new(store.clone());
        registry.load().await.unwrap();

        start_editing(&mut registry, mumbai(), mumbai_region());
        let first = registry.confirm_add().await.unwrap();
        assert_eq!(registry.shelters().len(), 1);
        assert_eq!(registry.shelters()[0].id, first);

        start_editing(&mut registry, mumbai(), mumbai_region());
        let second = registry.confirm_add().await.unwrap();
        assert_eq!(registry.shelters().len(), 2);
        assert_ne!(first, second);
        assert_eq!(registry.mode(), Mode::Idle);
    }

    #[tokio::test]
    async fn confirm_without_location_never_touches_the_store() {
        let store = MemoryStore::default();
        let mut registry = ShelterRegistry::new(store.clone());
        // Force the mode; the public flow cannot reach Editing without a
        // location, but the contract must hold regardless.
        registry.mode = Mode::Editing;

        assert!(matches!(
            registry.confirm_add().await,
            Err(RegistryError::Validation(_))
        ));
        assert_eq!(store.create_calls(), 0);
        assert!(registry.shelters().is_empty());
    }

    #[tokio::test]
    async fn mumbai_scenario_applies_defaults_and_keeps_geocoded_fields() {
        let mut registry = ShelterRegistry::new(MemoryStore::default());
        registry.load().await.unwrap();

        start_editing(&mut registry, mumbai(), mumbai_region());
        registry
            .update_draft(ShelterPatch::Name("Shelter A".to_owned()))
            .unwrap();
        registry.confirm_add().await.unwrap();

        let added = &registry.shelters()[0].content;
        assert_eq!(added.name, "Shelter A");
        assert_eq!(added.capacity, DEFAULT_CAPACITY);
        assert_eq!(added.contact_number, DEFAULT_CONTACT);
        assert!(added.is_active);
        assert_eq!(added.state, "Maharashtra");
        assert_eq!(added.district, "Mumbai");
        assert_eq!(added.address, "Mumbai, MH");
        assert_eq!(added.latitude, 19.076);
        assert_eq!(added.longitude, 72.877);
    }

    #[tokio::test]
    async fn confirm_failure_preserves_draft_and_mode_for_retry() {
        let store = MemoryStore::default();
        let mut registry = ShelterRegistry::new(store.clone());
        registry.load().await.unwrap();

        start_editing(&mut registry, mumbai(), mumbai_region());
        registry
            .update_draft(ShelterPatch::Name("Shelter A".to_owned()))
            .unwrap();

        store.set_fail(true);
        assert!(matches!(
            registry.confirm_add().await,
            Err(RegistryError::Store(_))
        ));
        assert_eq!(registry.mode(), Mode::Editing);
        assert_eq!(registry.draft().name.as_deref(), Some("Shelter A"));
        assert!(registry.shelters().is_empty());

        // Retry after the store recovers, without re-entering anything.
        store.set_fail(false);
        registry.confirm_add().await.unwrap();
        assert_eq!(registry.shelters().len(), 1);
        assert_eq!(registry.shelters()[0].content.name, "Shelter A");
    }

    #[tokio::test]
    async fn last_click_wins_when_responses_arrive_out_of_order() {
        let mut registry = ShelterRegistry::new(MemoryStore::default());
        registry.begin_placement().unwrap();

        let ticket_a = registry
            .on_map_click(Coordinates {
                latitude: 10.0,
                longitude: 76.0,
            })
            .unwrap();
        let ticket_b = registry.on_map_click(mumbai()).unwrap();

        // B's geocode resolves first and is applied.
        assert!(registry.apply_geocode(&ticket_b, mumbai_region()));
        assert_eq!(registry.mode(), Mode::Editing);

        // A's late response must not overwrite the newer draft.
        let applied = registry.apply_geocode(
            &ticket_a,
            RegionInfo {
                state: "Kerala".to_owned(),
                district: "Idukki".to_owned(),
                address: "Idukki, KL".to_owned(),
            },
        );
        assert!(!applied);
        assert_eq!(registry.draft().state.as_deref(), Some("Maharashtra"));
        assert_eq!(registry.draft().district.as_deref(), Some("Mumbai"));
        let coordinates = registry.draft().coordinates.unwrap();
        assert_eq!(coordinates.latitude, 19.076);
    }

    #[tokio::test]
    async fn geocode_result_after_cancel_is_discarded() {
        let mut registry = ShelterRegistry::new(MemoryStore::default());
        registry.begin_placement().unwrap();
        let ticket = registry.on_map_click(mumbai()).unwrap();
        registry.cancel_placement().unwrap();

        assert!(!registry.apply_geocode(&ticket, mumbai_region()));
        assert_eq!(registry.mode(), Mode::Idle);
        assert!(!registry.draft().has_location());
    }

    #[tokio::test]
    async fn degraded_geocode_still_enters_editing() {
        let mut registry = ShelterRegistry::new(MemoryStore::default());
        registry.begin_placement().unwrap();
        let ticket = registry.on_map_click(mumbai()).unwrap();

        assert!(registry.apply_geocode(&ticket, RegionInfo::default()));
        assert_eq!(registry.mode(), Mode::Editing);
        assert!(registry.draft().has_location());
        assert_eq!(registry.draft().state, None);
    }

    #[tokio::test]
    async fn toggling_twice_restores_the_original_value() {
        let store = MemoryStore::with_shelters(vec![sample_shelter("Hall")]);
        let mut registry = ShelterRegistry::new(store);
        registry.load().await.unwrap();
        let id = registry.shelters()[0].id.clone();

        assert!(!registry.toggle_active(&id).await.unwrap());
        assert!(registry.toggle_active(&id).await.unwrap());
        assert!(registry.shelters()[0].content.is_active);
    }

    #[tokio::test]
    async fn toggle_failure_leaves_the_mirror_untouched() {
        let store = MemoryStore::with_shelters(vec![sample_shelter("Hall")]);
        let mut registry = ShelterRegistry::new(store.clone());
        registry.load().await.unwrap();
        let id = registry.shelters()[0].id.clone();

        store.set_fail(true);
        assert!(registry.toggle_active(&id).await.is_err());
        assert!(registry.shelters()[0].content.is_active);
    }

    #[tokio::test]
    async fn toggle_of_unknown_id_is_not_found() {
        let mut registry = ShelterRegistry::new(MemoryStore::default());
        let id: Id<Shelter> = Id::new("missing".to_owned());
        assert!(matches!(
            registry.toggle_active(&id).await,
            Err(RegistryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn remove_of_unknown_id_is_not_found_and_changes_nothing() {
        let store = MemoryStore::with_shelters(vec![sample_shelter("Hall")]);
        let mut registry = ShelterRegistry::new(store);
        registry.load().await.unwrap();

        let id: Id<Shelter> = Id::new("missing".to_owned());
        assert!(matches!(
            registry.remove(&id).await,
            Err(RegistryError::NotFound)
        ));
        assert_eq!(registry.shelters().len(), 1);
    }

    #[tokio::test]
    async fn remove_deletes_from_store_and_mirror() {
        let store = MemoryStore::with_shelters(vec![
            sample_shelter("Hall"),
            sample_shelter("School"),
        ]);
        let mut registry = ShelterRegistry::new(store.clone());
        registry.load().await.unwrap();
        let id = registry.shelters()[0].id.clone();

        let removed = registry.remove(&id).await.unwrap();
        assert_eq!(removed.content.name, "Hall");
        assert_eq!(registry.shelters().len(), 1);
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn mode_misuse_is_rejected() {
        let mut registry = ShelterRegistry::new(MemoryStore::default());

        assert!(matches!(
            registry.on_map_click(mumbai()),
            Err(RegistryError::Mode { .. })
        ));
        assert!(matches!(
            registry.update_draft(ShelterPatch::Capacity(10)),
            Err(RegistryError::Mode { .. })
        ));
        assert!(matches!(
            registry.cancel_placement(),
            Err(RegistryError::Mode { .. })
        ));

        registry.begin_placement().unwrap();
        assert!(matches!(
            registry.begin_placement(),
            Err(RegistryError::Mode { .. })
        ));
    }

    #[tokio::test]
    async fn nearby_filters_and_sorts_by_distance() {
        let mut far = sample_shelter("Far");
        far.latitude = 28.6;
        far.longitude = 77.2;
        let mut near = sample_shelter("Near");
        near.latitude = 19.08;
        near.longitude = 72.88;
        let store = MemoryStore::with_shelters(vec![far, near]);
        let mut registry = ShelterRegistry::new(store);
        registry.load().await.unwrap();

        let found = registry.nearby(19.076, 72.877, 50.0);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].content.content.name, "Near");
        assert!(found[0].distance_km < 1.0);
    }

    #[tokio::test]
    async fn nearby_keeps_shelters_close_to_the_radius_edge() {
        // ~44 km east of the query point, inside a 50 km radius. The coarse
        // bounding-box filter must not drop it.
        let mut edge = sample_shelter("Edge");
        edge.latitude = 19.076;
        edge.longitude = 73.30;
        let store = MemoryStore::with_shelters(vec![edge]);
        let mut registry = ShelterRegistry::new(store);
        registry.load().await.unwrap();

        let found = registry.nearby(19.076, 72.877, 50.0);
        assert_eq!(found.len(), 1);
        assert!(found[0].distance_km > 40.0 && found[0].distance_km <= 50.0);
        assert!(registry.nearby(19.076, 72.877, 40.0).is_empty());
    }
}
