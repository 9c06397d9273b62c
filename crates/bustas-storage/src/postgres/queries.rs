use crate::traits::StorageError;

pub fn to_storage_error(e: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return StorageError::DuplicateKey;
        }
        if db_err.is_foreign_key_violation() {
            return StorageError::ForeignKeyViolation(db_err.message().to_string());
        }
    }
    StorageError::Internal(e.to_string())
}

async fn exists<'e>(
    executor: impl sqlx::PgExecutor<'e>,
    query: &str,
    broker_id: i64,
    bind: Bind<'_>,
) -> Result<bool, StorageError> {
    let q = sqlx::query_as::<_, (bool,)>(query).bind(broker_id);
    let q = match bind {
        Bind::Int(id) => q.bind(id),
        Bind::Text(id) => q.bind(id),
    };
    let row = q.fetch_one(executor).await.map_err(to_storage_error)?;
    Ok(row.0)
}

enum Bind<'a> {
    Int(i64),
    Text(&'a str),
}

// Each ownership probe is one EXISTS over the foreign-key join chain.
// A missing key on any link makes the join empty, so the probe yields
// false rather than an error.

pub async fn broker_owns_building<'e>(
    executor: impl sqlx::PgExecutor<'e>,
    broker_id: i64,
    building_id: i64,
) -> Result<bool, StorageError> {
    exists(
        executor,
        r#"
        SELECT EXISTS (
            SELECT 1 FROM buildings b
            WHERE b.fk_broker = $1 AND b.id_building = $2
        )
        "#,
        broker_id,
        Bind::Int(building_id),
    )
    .await
}

pub async fn broker_owns_apartment<'e>(
    executor: impl sqlx::PgExecutor<'e>,
    broker_id: i64,
    apartment_id: i64,
) -> Result<bool, StorageError> {
    exists(
        executor,
        r#"
        SELECT EXISTS (
            SELECT 1 FROM apartments a
            JOIN buildings b ON b.id_building = a.fk_building
            WHERE b.fk_broker = $1 AND a.id_apartment = $2
        )
        "#,
        broker_id,
        Bind::Int(apartment_id),
    )
    .await
}

pub async fn broker_owns_picture<'e>(
    executor: impl sqlx::PgExecutor<'e>,
    broker_id: i64,
    picture_id: &str,
) -> Result<bool, StorageError> {
    exists(
        executor,
        r#"
        SELECT EXISTS (
            SELECT 1 FROM pictures p
            JOIN apartments a ON a.id_apartment = p.fk_apartment
            JOIN buildings b ON b.id_building = a.fk_building
            WHERE b.fk_broker = $1 AND p.id = $2
        )
        "#,
        broker_id,
        Bind::Text(picture_id),
    )
    .await
}

pub async fn broker_owns_listing<'e>(
    executor: impl sqlx::PgExecutor<'e>,
    broker_id: i64,
    listing_id: i64,
) -> Result<bool, StorageError> {
    exists(
        executor,
        r#"
        SELECT EXISTS (
            SELECT 1 FROM listings l
            JOIN pictures p ON p.id = l.fk_picture
            JOIN apartments a ON a.id_apartment = p.fk_apartment
            JOIN buildings b ON b.id_building = a.fk_building
            WHERE b.fk_broker = $1 AND l.id_listing = $2
        )
        "#,
        broker_id,
        Bind::Int(listing_id),
    )
    .await
}

pub async fn broker_owns_availability<'e>(
    executor: impl sqlx::PgExecutor<'e>,
    broker_id: i64,
    availability_id: i64,
) -> Result<bool, StorageError> {
    exists(
        executor,
        r#"
        SELECT EXISTS (
            SELECT 1 FROM availabilities av
            WHERE av.fk_broker = $1 AND av.id_availability = $2
        )
        "#,
        broker_id,
        Bind::Int(availability_id),
    )
    .await
}

pub async fn broker_owns_viewing<'e>(
    executor: impl sqlx::PgExecutor<'e>,
    broker_id: i64,
    viewing_id: i64,
) -> Result<bool, StorageError> {
    exists(
        executor,
        r#"
        SELECT EXISTS (
            SELECT 1 FROM viewings v
            JOIN availabilities av ON av.id_availability = v.fk_availability
            WHERE av.fk_broker = $1 AND v.id_viewing = $2
        )
        "#,
        broker_id,
        Bind::Int(viewing_id),
    )
    .await
}
