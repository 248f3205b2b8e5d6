use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::{geo, id::HasId};

use crate::{ExampleData, WithDistance, WithId};

/// Defaults applied to fields the operator left blank when a draft is
/// confirmed. Geocoded fields degrade to empty strings, which count as
/// blank here as well.
pub const DEFAULT_NAME: &str = "New Shelter";
pub const DEFAULT_CAPACITY: u32 = 100;
pub const DEFAULT_STATE: &str = "Unknown";
pub const DEFAULT_DISTRICT: &str = "Unknown";
pub const DEFAULT_ADDRESS: &str = "No address provided";
pub const DEFAULT_CONTACT: &str = "No contact";

/// A persisted emergency shelter record. The identifier is assigned by the
/// store on creation and lives in [`WithId`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Shelter {
    pub name: String,
    pub capacity: u32,
    pub latitude: f64,
    pub longitude: f64,
    pub state: String,
    pub district: String,
    pub address: String,
    pub contact_number: String,
    pub is_active: bool,
}

impl HasId for Shelter {
    type IdType = String;
}

impl Shelter {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }

    pub fn distance_to(&self, latitude: f64, longitude: f64) -> f64 {
        geo::haversine_distance(self.latitude, self.longitude, latitude, longitude)
    }
}

impl WithId<Shelter> {
    pub fn with_distance_to(
        self,
        latitude: f64,
        longitude: f64,
    ) -> WithDistance<WithId<Shelter>> {
        let distance = self.content.distance_to(latitude, longitude);
        WithDistance::new(distance, self)
    }
}

impl ExampleData for Shelter {
    fn example_data() -> Self {
        Shelter {
            name: "Ghansoli Community Hall".to_owned(),
            capacity: 250,
            latitude: 19.1256,
            longitude: 73.0050,
            state: "Maharashtra".to_owned(),
            district: "Thane".to_owned(),
            address: "Ghansoli, Navi Mumbai, Maharashtra".to_owned(),
            contact_number: "+91 1234567890".to_owned(),
            is_active: true,
        }
    }
}

/// A latitude/longitude pair. Kept as one value so a draft either has a
/// complete location or none at all.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn in_range(&self) -> bool {
        geo::in_latitude_range(self.latitude)
            && geo::in_longitude_range(self.longitude)
    }
}

/// Administrative region names and display address for a coordinate, as
/// returned by reverse geocoding. All fields fall back to the empty string
/// when the geocoder cannot resolve them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegionInfo {
    pub state: String,
    pub district: String,
    pub address: String,
}

/// One mutable shelter field plus its new value. Used both for draft edits
/// and for field-level store updates, so a patch never overwrites columns
/// it does not name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum ShelterPatch {
    Name(String),
    Capacity(u32),
    State(String),
    District(String),
    Address(String),
    ContactNumber(String),
    IsActive(bool),
}

impl ShelterPatch {
    pub fn apply(&self, shelter: &mut Shelter) {
        match self {
            ShelterPatch::Name(name) => shelter.name = name.clone(),
            ShelterPatch::Capacity(capacity) => shelter.capacity = *capacity,
            ShelterPatch::State(state) => shelter.state = state.clone(),
            ShelterPatch::District(district) => {
                shelter.district = district.clone()
            }
            ShelterPatch::Address(address) => shelter.address = address.clone(),
            ShelterPatch::ContactNumber(contact) => {
                shelter.contact_number = contact.clone()
            }
            ShelterPatch::IsActive(active) => shelter.is_active = *active,
        }
    }
}

/// A shelter under construction: the map click supplies the coordinates,
/// reverse geocoding the region fields, the operator the rest. Never
/// persisted as-is; [`ShelterDraft::finish`] turns it into a [`Shelter`].
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShelterDraft {
    pub coordinates: Option<Coordinates>,
    pub name: Option<String>,
    pub capacity: Option<u32>,
    pub state: Option<String>,
    pub district: Option<String>,
    pub address: Option<String>,
    pub contact_number: Option<String>,
}

impl ShelterDraft {
    /// A fresh draft holding nothing but the clicked location.
    pub fn at(coordinates: Coordinates) -> Self {
        Self {
            coordinates: Some(coordinates),
            ..Self::default()
        }
    }

    /// Merges geocoded region fields into the draft. Empty strings are the
    /// geocoder's "unknown" and are not taken over, so the confirm-time
    /// defaults still apply to them.
    pub fn set_region(&mut self, region: RegionInfo) {
        self.state = non_empty(region.state);
        self.district = non_empty(region.district);
        self.address = non_empty(region.address);
    }

    /// Merges a single operator-supplied field, leaving all others alone.
    /// Location and activation are not draft concerns; patches for them are
    /// ignored.
    pub fn set_field(&mut self, patch: ShelterPatch) {
        match patch {
            ShelterPatch::Name(name) => self.name = non_empty(name),
            ShelterPatch::Capacity(capacity) => self.capacity = Some(capacity),
            ShelterPatch::State(state) => self.state = non_empty(state),
            ShelterPatch::District(district) => {
                self.district = non_empty(district)
            }
            ShelterPatch::Address(address) => self.address = non_empty(address),
            ShelterPatch::ContactNumber(contact) => {
                self.contact_number = non_empty(contact)
            }
            ShelterPatch::IsActive(_) => {}
        }
    }

    pub fn has_location(&self) -> bool {
        self.coordinates.is_some()
    }

    /// Completes the draft into a persistable record, filling unset fields
    /// with the documented defaults. `None` when no location was picked yet.
    pub fn finish(self) -> Option<Shelter> {
        let coordinates = self.coordinates?;
        Some(Shelter {
            name: self.name.unwrap_or_else(|| DEFAULT_NAME.to_owned()),
            capacity: self.capacity.unwrap_or(DEFAULT_CAPACITY),
            latitude: coordinates.latitude,
            longitude: coordinates.longitude,
            state: self.state.unwrap_or_else(|| DEFAULT_STATE.to_owned()),
            district: self
                .district
                .unwrap_or_else(|| DEFAULT_DISTRICT.to_owned()),
            address: self.address.unwrap_or_else(|| DEFAULT_ADDRESS.to_owned()),
            contact_number: self
                .contact_number
                .unwrap_or_else(|| DEFAULT_CONTACT.to_owned()),
            is_active: true,
        })
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
