use super::common::open_service;

pub fn run(limit: u32, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let service = open_service()?;
    let entries = service.recent_focus_intervals(limit)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if entries.is_empty() {
        println!("no completed focus intervals");
    } else {
        for e in entries {
            println!(
                "{}  {}  {}min  {}{}",
                e.ended_at.format("%Y-%m-%d %H:%M"),
                e.name,
                e.duration_min,
                e.session_type,
                if e.hardcore { " [hardcore]" } else { "" }
            );
        }
    }
    Ok(())
}
