//! Schema of the drone booking platform.
//!
//! [`init_schema`] issues the creation statements for the six relations
//! the platform uses. It is idempotent: running it on a populated database
//! keeps every row.

use tracing::info;

use crate::database::{Database, DatabaseResult};

/// Platform users. `email` is declared UNIQUE.
pub const USERS: &str = "
    CREATE TABLE IF NOT EXISTS users (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      name TEXT NOT NULL,
      email TEXT UNIQUE NOT NULL,
      password TEXT NOT NULL,
      role TEXT NOT NULL CHECK(role IN ('USER', 'PROVIDER', 'ADMIN')),
      phone TEXT,
      created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    )";

/// Drone operators, one per provider user.
pub const PROVIDERS: &str = "
    CREATE TABLE IF NOT EXISTS providers (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      user_id INTEGER UNIQUE NOT NULL,
      company TEXT NOT NULL,
      cities TEXT NOT NULL,
      status TEXT NOT NULL DEFAULT 'PENDING' CHECK(status IN ('PENDING', 'APPROVED', 'REJECTED')),
      latitude REAL,
      longitude REAL,
      created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
      FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
    )";

/// Drones offered by providers.
pub const DRONES: &str = "
    CREATE TABLE IF NOT EXISTS drones (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      provider_id INTEGER NOT NULL,
      name TEXT NOT NULL,
      type TEXT NOT NULL,
      price_per_hour REAL NOT NULL,
      available INTEGER DEFAULT 1,
      specs TEXT,
      created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
      FOREIGN KEY (provider_id) REFERENCES providers(id) ON DELETE CASCADE
    )";

/// Service catalog.
pub const SERVICES: &str = "
    CREATE TABLE IF NOT EXISTS services (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      name TEXT NOT NULL,
      description TEXT,
      base_price REAL NOT NULL,
      category TEXT NOT NULL,
      image_url TEXT,
      created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    )";

/// Bookings of a service by a user with a provider.
pub const BOOKINGS: &str = "
    CREATE TABLE IF NOT EXISTS bookings (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      user_id INTEGER NOT NULL,
      provider_id INTEGER NOT NULL,
      service_id INTEGER NOT NULL,
      drone_id INTEGER,
      date TEXT NOT NULL,
      time TEXT NOT NULL,
      latitude REAL NOT NULL,
      longitude REAL NOT NULL,
      address TEXT,
      status TEXT NOT NULL DEFAULT 'PENDING' CHECK(status IN ('PENDING', 'CONFIRMED', 'IN_PROGRESS', 'COMPLETED', 'CANCELLED')),
      amount REAL NOT NULL,
      duration_hours INTEGER DEFAULT 1,
      notes TEXT,
      created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
      FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
      FOREIGN KEY (provider_id) REFERENCES providers(id) ON DELETE CASCADE,
      FOREIGN KEY (service_id) REFERENCES services(id) ON DELETE CASCADE,
      FOREIGN KEY (drone_id) REFERENCES drones(id) ON DELETE SET NULL
    )";

/// Payments for bookings.
pub const PAYMENTS: &str = "
    CREATE TABLE IF NOT EXISTS payments (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      booking_id INTEGER NOT NULL,
      amount REAL NOT NULL,
      status TEXT NOT NULL DEFAULT 'PENDING' CHECK(status IN ('PENDING', 'PAID', 'FAILED', 'REFUNDED')),
      fake_order_id TEXT NOT NULL,
      fake_payment_id TEXT,
      payment_method TEXT DEFAULT 'CARD',
      created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
      FOREIGN KEY (booking_id) REFERENCES bookings(id) ON DELETE CASCADE
    )";

/// Creation statements in dependency order.
pub const SCHEMA: [&str; 6] = [USERS, PROVIDERS, DRONES, SERVICES, BOOKINGS, PAYMENTS];

/// Creates the platform relations.
pub fn init_schema(db: &Database) -> DatabaseResult<()> {
    for statement in SCHEMA {
        db.execute(statement)?;
    }
    info!(relations = SCHEMA.len(), "schema initialized");
    Ok(())
}
