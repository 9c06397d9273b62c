use sqlx::PgPool;

/// Applies the embedded DDL. Every statement is idempotent, so running
/// this on an already-migrated database is a no-op.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in TABLES {
        sqlx::query(statement).execute(pool).await?;
    }
    for statement in SEEDS {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

const TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id_user             BIGINT PRIMARY KEY,
        name                TEXT NOT NULL,
        surname             TEXT NOT NULL,
        email               TEXT NOT NULL UNIQUE,
        phone               TEXT NOT NULL,
        password_hash       TEXT NOT NULL,
        registration_time   TIMESTAMPTZ NOT NULL,
        profile_picture     TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS administrators (
        id_user BIGINT PRIMARY KEY REFERENCES users(id_user) ON DELETE CASCADE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS brokers (
        id_user     BIGINT PRIMARY KEY REFERENCES users(id_user) ON DELETE CASCADE,
        confirmed   BOOLEAN NOT NULL,
        blocked     BOOLEAN NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS buyers (
        id_user     BIGINT PRIMARY KEY REFERENCES users(id_user) ON DELETE CASCADE,
        confirmed   BOOLEAN NOT NULL,
        blocked     BOOLEAN NOT NULL
    )
    "#,
    "CREATE TABLE IF NOT EXISTS energy_classes (id INT PRIMARY KEY, name TEXT NOT NULL)",
    "CREATE TABLE IF NOT EXISTS finish_types (id INT PRIMARY KEY, name TEXT NOT NULL)",
    "CREATE TABLE IF NOT EXISTS heating_types (id INT PRIMARY KEY, name TEXT NOT NULL)",
    "CREATE TABLE IF NOT EXISTS viewing_statuses (id INT PRIMARY KEY, name TEXT NOT NULL)",
    r#"
    CREATE TABLE IF NOT EXISTS buildings (
        id_building          BIGINT PRIMARY KEY,
        city                 TEXT NOT NULL,
        address              TEXT NOT NULL,
        area                 DOUBLE PRECISION NOT NULL,
        year                 INT NOT NULL,
        last_renovation_year INT,
        floors               INT NOT NULL,
        energy               INT REFERENCES energy_classes(id),
        fk_broker            BIGINT NOT NULL REFERENCES brokers(id_user) ON DELETE CASCADE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS apartments (
        id_apartment      BIGINT PRIMARY KEY,
        apartment_number  INT,
        area              DOUBLE PRECISION NOT NULL,
        floor             INT,
        rooms             INT NOT NULL,
        notes             TEXT,
        heating           INT REFERENCES heating_types(id),
        finish            INT NOT NULL REFERENCES finish_types(id),
        is_whole_building BOOLEAN NOT NULL,
        fk_building       BIGINT NOT NULL REFERENCES buildings(id_building) ON DELETE CASCADE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS pictures (
        id           TEXT PRIMARY KEY,
        public       BOOLEAN NOT NULL,
        fk_apartment BIGINT NOT NULL REFERENCES apartments(id_apartment) ON DELETE CASCADE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS listings (
        id_listing   BIGINT PRIMARY KEY,
        description  TEXT NOT NULL,
        asking_price DOUBLE PRECISION NOT NULL,
        rent         BOOLEAN NOT NULL,
        fk_picture   TEXT NOT NULL UNIQUE REFERENCES pictures(id) ON DELETE CASCADE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS availabilities (
        id_availability BIGINT PRIMARY KEY,
        from_time       TIMESTAMPTZ NOT NULL,
        to_time         TIMESTAMPTZ NOT NULL,
        fk_broker       BIGINT NOT NULL REFERENCES brokers(id_user) ON DELETE CASCADE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS viewings (
        id_viewing      BIGINT PRIMARY KEY,
        from_time       TIMESTAMPTZ NOT NULL,
        to_time         TIMESTAMPTZ NOT NULL,
        status          INT NOT NULL REFERENCES viewing_statuses(id),
        fk_availability BIGINT NOT NULL REFERENCES availabilities(id_availability) ON DELETE CASCADE,
        fk_listing      BIGINT NOT NULL REFERENCES listings(id_listing) ON DELETE CASCADE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sessions (
        id            TEXT PRIMARY KEY,
        created       TIMESTAMPTZ NOT NULL,
        remember      BOOLEAN NOT NULL,
        last_activity TIMESTAMPTZ NOT NULL,
        expires       TIMESTAMPTZ NOT NULL,
        revoked       BOOLEAN NOT NULL,
        fk_user       BIGINT NOT NULL REFERENCES users(id_user) ON DELETE CASCADE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS confirmations (
        id       TEXT PRIMARY KEY,
        expires  TIMESTAMPTZ NOT NULL,
        fk_buyer BIGINT NOT NULL REFERENCES buyers(id_user) ON DELETE CASCADE
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_buildings_broker ON buildings (fk_broker)",
    "CREATE INDEX IF NOT EXISTS idx_apartments_building ON apartments (fk_building)",
    "CREATE INDEX IF NOT EXISTS idx_pictures_apartment ON pictures (fk_apartment)",
    "CREATE INDEX IF NOT EXISTS idx_availabilities_broker ON availabilities (fk_broker)",
    "CREATE INDEX IF NOT EXISTS idx_viewings_availability ON viewings (fk_availability)",
    "CREATE INDEX IF NOT EXISTS idx_viewings_listing ON viewings (fk_listing)",
    "CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions (fk_user)",
    "CREATE INDEX IF NOT EXISTS idx_confirmations_buyer ON confirmations (fk_buyer)",
];

const SEEDS: &[&str] = &[
    r#"
    INSERT INTO energy_classes (id, name) VALUES
        (1, 'A++'), (2, 'A+'), (3, 'A'), (4, 'B'), (5, 'C'), (6, 'D'), (7, 'E')
    ON CONFLICT DO NOTHING
    "#,
    r#"
    INSERT INTO finish_types (id, name) VALUES
        (1, 'Full'), (2, 'Partial'), (3, 'None')
    ON CONFLICT DO NOTHING
    "#,
    r#"
    INSERT INTO heating_types (id, name) VALUES
        (1, 'Central'), (2, 'Gas'), (3, 'Electric'), (4, 'Solid fuel'), (5, 'None')
    ON CONFLICT DO NOTHING
    "#,
    r#"
    INSERT INTO viewing_statuses (id, name) VALUES
        (1, 'Requested'), (2, 'Confirmed'), (3, 'Cancelled'), (4, 'Completed')
    ON CONFLICT DO NOTHING
    "#,
];
