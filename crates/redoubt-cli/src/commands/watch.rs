//! Foreground tick loop.
//!
//! Timers tick every second; schedule evaluation runs at the configured
//! poll interval. Every event is printed as a JSON line. A failed tick
//! is transient (storage may be briefly unavailable) and is retried on
//! the next interval.

use std::time::Duration;

use log::warn;

use super::common::open_service;

pub fn run(interval: Option<u64>) -> Result<(), Box<dyn std::error::Error>> {
    let mut service = open_service()?;
    let poll_secs = interval
        .unwrap_or(service.config().scheduler.poll_interval_secs)
        .max(1);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let mut second = tokio::time::interval(Duration::from_secs(1));
        let mut elapsed: u64 = 0;
        loop {
            tokio::select! {
                _ = second.tick() => {}
                _ = tokio::signal::ctrl_c() => break,
            }

            let result = if elapsed % poll_secs == 0 {
                service.tick()
            } else {
                service.tick_timers()
            };
            elapsed += 1;

            match result {
                Ok(events) => {
                    for event in events {
                        match serde_json::to_string(&event) {
                            Ok(line) => println!("{line}"),
                            Err(e) => warn!("could not serialize event: {e}"),
                        }
                    }
                }
                Err(e) => warn!("tick failed: {e}"),
            }
        }
    });
    Ok(())
}
