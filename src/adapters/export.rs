use crate::domain::model::{AnnotatedEvent, ClashStatus};
use crate::utils::error::Result;
use std::path::Path;

const HEADER: [&str; 7] = ["name", "date", "city", "genre", "subgenre", "tickets", "clash"];

pub fn to_csv_string(events: &[AnnotatedEvent]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    write_records(&mut writer, events)?;
    let bytes = writer
        .into_inner()
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub fn write_csv<P: AsRef<Path>>(path: P, events: &[AnnotatedEvent]) -> Result<()> {
    let mut writer = csv::Writer::from_path(&path)?;
    write_records(&mut writer, events)?;
    writer.flush()?;
    tracing::info!("📁 Wrote {} events to {}", events.len(), path.as_ref().display());
    Ok(())
}

fn write_records<W: std::io::Write>(
    writer: &mut csv::Writer<W>,
    events: &[AnnotatedEvent],
) -> Result<()> {
    writer.write_record(HEADER)?;
    for annotated in events {
        let event = &annotated.event;
        let clash = match &annotated.clash {
            ClashStatus::Clashing { calendar_event } => calendar_event.as_str(),
            ClashStatus::Clear => "",
        };
        let date = event.date.format("%Y-%m-%d").to_string();
        writer.write_record([
            event.name.as_str(),
            date.as_str(),
            event.city.as_str(),
            event.genre.as_str(),
            event.subgenre.as_str(),
            event.ticket_url.as_str(),
            clash,
        ])?;
    }
    Ok(())
}
