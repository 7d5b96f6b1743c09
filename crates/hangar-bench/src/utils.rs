//! Benchmark utilities and helpers.

use hangar_db::{bootstrap, params, Database, DatabaseResult};
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Booking statuses accepted by the platform schema.
pub const BOOKING_STATUSES: [&str; 5] = ["PENDING", "CONFIRMED", "IN_PROGRESS", "COMPLETED", "CANCELLED"];

/// A generated user.
#[derive(Debug, Clone)]
pub struct UserRecord {
    /// Display name.
    pub name: String,
    /// Unique email.
    pub email: String,
    /// Role.
    pub role: &'static str,
}

/// A generated booking.
#[derive(Debug, Clone)]
pub struct BookingRecord {
    /// Booking user.
    pub user_id: i64,
    /// Provider.
    pub provider_id: i64,
    /// Service.
    pub service_id: i64,
    /// Date, `YYYY-MM-DD`.
    pub date: String,
    /// Time, `HH:MM`.
    pub time: String,
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
    /// Status.
    pub status: &'static str,
    /// Amount.
    pub amount: f64,
}

/// Generates random string data for benchmarks.
pub fn random_string(rng: &mut StdRng, len: usize) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Generates random user records with distinct emails.
pub fn generate_user_records(count: usize) -> Vec<UserRecord> {
    let mut rng = StdRng::seed_from_u64(42);
    let names = [
        "Alice", "Bob", "Charlie", "Diana", "Eve", "Frank", "Grace", "Henry",
    ];
    let roles = ["USER", "USER", "USER", "PROVIDER", "ADMIN"];

    (0..count)
        .map(|i| {
            let name = names[rng.gen_range(0..names.len())];
            let suffix = random_string(&mut rng, 6).to_lowercase();
            UserRecord {
                name: format!("{}_{}", name, suffix),
                email: format!("{}.{}@example.com", suffix, i),
                role: roles[rng.gen_range(0..roles.len())],
            }
        })
        .collect()
}

/// Generates random bookings referencing `users` users and `providers`
/// providers.
pub fn generate_booking_records(count: usize, users: i64, providers: i64) -> Vec<BookingRecord> {
    let mut rng = StdRng::seed_from_u64(7);

    (0..count)
        .map(|_| BookingRecord {
            user_id: rng.gen_range(1..=users.max(1)),
            provider_id: rng.gen_range(1..=providers.max(1)),
            service_id: rng.gen_range(1..=4),
            date: format!("2024-{:02}-{:02}", rng.gen_range(1..=12), rng.gen_range(1..=28)),
            time: format!("{:02}:00", rng.gen_range(8..18)),
            latitude: rng.gen_range(18.0..19.0),
            longitude: rng.gen_range(73.0..74.0),
            status: BOOKING_STATUSES[rng.gen_range(0..BOOKING_STATUSES.len())],
            amount: rng.gen_range(50.0..500.0),
        })
        .collect()
}

/// Creates a database with the platform schema, `users` users and
/// `bookings` bookings.
pub fn seeded_database(users: usize, bookings: usize) -> DatabaseResult<Database> {
    let db = Database::in_memory();
    bootstrap::init_schema(&db)?;

    let insert_user = db.prepare("INSERT INTO users (name, email, password, role) VALUES (?, ?, ?, ?)");
    for user in generate_user_records(users) {
        insert_user.run(&params![user.name, user.email, "hash", user.role])?;
    }

    let insert_booking = db.prepare(
        "INSERT INTO bookings (user_id, provider_id, service_id, date, time, latitude, longitude, status, amount)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    );
    for booking in generate_booking_records(bookings, users as i64, 10) {
        insert_booking.run(&params![
            booking.user_id,
            booking.provider_id,
            booking.service_id,
            booking.date,
            booking.time,
            booking.latitude,
            booking.longitude,
            booking.status,
            booking.amount,
        ])?;
    }

    Ok(db)
}
