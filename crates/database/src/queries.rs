use model::{
    shelter::{Shelter, ShelterPatch},
    WithId,
};
use registry::store::{Result, StoreError};
use sqlx::{postgres::PgQueryResult, Executor, Postgres};
use utility::id::Id;

use crate::data_model::ShelterRow;

pub(crate) fn convert_error(why: sqlx::Error) -> StoreError {
    match why {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        _ => StoreError::Other(Box::new(why)),
    }
}

fn expect_row_hit(result: PgQueryResult) -> Result<()> {
    if result.rows_affected() == 0 {
        Err(StoreError::NotFound)
    } else {
        Ok(())
    }
}

pub async fn get_all<'c, E>(executor: E) -> Result<Vec<WithId<Shelter>>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        SELECT
            id, name, capacity, latitude, longitude,
            state, district, address, contact_number, is_active
        FROM
            shelters
        ORDER BY created_at, id;
        ",
    )
    .fetch_all(executor)
    .await
    .map_err(convert_error)
    .map(|rows: Vec<ShelterRow>| {
        rows.into_iter().map(ShelterRow::into_model).collect()
    })
}

pub async fn insert<'c, E>(executor: E, shelter: Shelter) -> Result<Id<Shelter>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_scalar(
        "
        INSERT INTO shelters(
            name,
            capacity,
            latitude,
            longitude,
            state,
            district,
            address,
            contact_number,
            is_active
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id;
        ",
    )
    .bind(&shelter.name)
    .bind(shelter.capacity as i64)
    .bind(shelter.latitude)
    .bind(shelter.longitude)
    .bind(&shelter.state)
    .bind(&shelter.district)
    .bind(&shelter.address)
    .bind(&shelter.contact_number)
    .bind(shelter.is_active)
    .fetch_one(executor)
    .await
    .map(|id: String| Id::new(id))
    .map_err(convert_error)
}

/// Single-column update; other columns are never mentioned in the statement,
/// so concurrent edits of other fields cannot be overwritten here.
pub async fn update_field<'c, E>(
    executor: E,
    id: &Id<Shelter>,
    patch: ShelterPatch,
) -> Result<()>
where
    E: Executor<'c, Database = Postgres>,
{
    let result = match patch {
        ShelterPatch::Name(name) => {
            sqlx::query("UPDATE shelters SET name = $2 WHERE id = $1;")
                .bind(id.raw())
                .bind(name)
                .execute(executor)
                .await
        }
        ShelterPatch::Capacity(capacity) => {
            sqlx::query("UPDATE shelters SET capacity = $2 WHERE id = $1;")
                .bind(id.raw())
                .bind(capacity as i64)
                .execute(executor)
                .await
        }
        ShelterPatch::State(state) => {
            sqlx::query("UPDATE shelters SET state = $2 WHERE id = $1;")
                .bind(id.raw())
                .bind(state)
                .execute(executor)
                .await
        }
        ShelterPatch::District(district) => {
            sqlx::query("UPDATE shelters SET district = $2 WHERE id = $1;")
                .bind(id.raw())
                .bind(district)
                .execute(executor)
                .await
        }
        ShelterPatch::Address(address) => {
            sqlx::query("UPDATE shelters SET address = $2 WHERE id = $1;")
                .bind(id.raw())
                .bind(address)
                .execute(executor)
                .await
        }
        ShelterPatch::ContactNumber(contact) => {
            sqlx::query("UPDATE shelters SET contact_number = $2 WHERE id = $1;")
                .bind(id.raw())
                .bind(contact)
                .execute(executor)
                .await
        }
        ShelterPatch::IsActive(active) => {
            sqlx::query("UPDATE shelters SET is_active = $2 WHERE id = $1;")
                .bind(id.raw())
                .bind(active)
                .execute(executor)
                .await
        }
    };
    result.map_err(convert_error).and_then(expect_row_hit)
}

pub async fn delete<'c, E>(executor: E, id: &Id<Shelter>) -> Result<()>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query("DELETE FROM shelters WHERE id = $1;")
        .bind(id.raw())
        .execute(executor)
        .await
        .map_err(convert_error)
        .and_then(expect_row_hit)
}
