use model::{shelter::Shelter, WithId};
use sqlx::prelude::FromRow;
use utility::id::Id;

/// Row shape of the `shelters` table.
#[derive(Debug, Clone, FromRow)]
pub struct ShelterRow {
    pub id: String,
    pub name: String,
    pub capacity: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub state: String,
    pub district: String,
    pub address: String,
    pub contact_number: String,
    pub is_active: bool,
}

impl ShelterRow {
    pub fn into_model(self) -> WithId<Shelter> {
        WithId::new(
            Id::new(self.id),
            Shelter {
                name: self.name,
                // The column allows the full BIGINT range above zero; clamp
                // instead of truncating.
                capacity: self.capacity.clamp(0, u32::MAX as i64) as u32,
                latitude: self.latitude,
                longitude: self.longitude,
                state: self.state,
                district: self.district,
                address: self.address,
                contact_number: self.contact_number,
                is_active: self.is_active,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_with_capacity(capacity: i64) -> ShelterRow {
        ShelterRow {
            id: "shelter-1".to_owned(),
            name: "Shelter A".to_owned(),
            capacity,
            latitude: 19.076,
            longitude: 72.877,
            state: "Maharashtra".to_owned(),
            district: "Mumbai".to_owned(),
            address: "Mumbai, MH".to_owned(),
            contact_number: "+91 1234567890".to_owned(),
            is_active: true,
        }
    }

    #[test]
    fn capacity_saturates_instead_of_truncating() {
        let model = row_with_capacity(i64::MAX).into_model();
        assert_eq!(model.content.capacity, u32::MAX);
        let model = row_with_capacity(u32::MAX as i64 + 1).into_model();
        assert_eq!(model.content.capacity, u32::MAX);
    }

    #[test]
    fn capacity_never_goes_negative() {
        let model = row_with_capacity(-7).into_model();
        assert_eq!(model.content.capacity, 0);
    }
}
