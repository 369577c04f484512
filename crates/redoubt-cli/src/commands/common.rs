use std::sync::Arc;

use redoubt_core::{Config, Database, FocusService, SystemClock};

/// Open the durable state and build a service on the system clock.
pub fn open_service() -> Result<FocusService, Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let config = Config::load()?;
    Ok(FocusService::new(db, Arc::new(SystemClock), config)?)
}
