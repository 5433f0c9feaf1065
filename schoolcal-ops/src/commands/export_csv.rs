//! CSV export of refined calendar data
//!
//! One row per school. The term/date/detail column triples are
//! data-dependent, so the export is two-pass: scan every school for the
//! maximum term count, then emit with a fixed header.

use std::path::PathBuf;

use anyhow::Result;
use serde_json::{json, Value};
use sqlx::SqlitePool;

use schoolcal_common::calendar::{classify, DataStatus};
use schoolcal_common::db::models::School;
use schoolcal_common::db::queries;

use super::banner;

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub output: PathBuf,
    /// Also emit rows for schools without valid calendar data
    pub include_invalid: bool,
}

#[derive(Debug, Default)]
pub struct ExportReport {
    pub total_schools: usize,
    pub with_calendar: usize,
    pub without_calendar: usize,
    pub rows_written: usize,
    pub max_terms: usize,
}

pub async fn run(pool: &SqlitePool, opts: &ExportOptions) -> Result<ExportReport> {
    let schools = queries::all_schools(pool).await?;

    // Pass 1: resolve each school's calendar document and the widest term count
    let mut resolved: Vec<(School, Option<Value>)> = Vec::with_capacity(schools.len());
    for school in schools {
        let calendar = match queries::current_record(pool, school.urn).await? {
            Some(record) => record.data.filter(|data| is_calendar_shaped(data)),
            None => None,
        };
        resolved.push((school, calendar));
    }
    let max_terms = resolved
        .iter()
        .filter_map(|(_, calendar)| calendar.as_ref())
        .map(term_count)
        .max()
        .unwrap_or(0);

    // Pass 2: emit
    let mut writer = csv::Writer::from_path(&opts.output)?;
    writer.write_record(header_row(max_terms))?;

    let mut report = ExportReport {
        total_schools: resolved.len(),
        max_terms,
        ..Default::default()
    };

    for (school, calendar) in &resolved {
        if calendar.is_none() {
            report.without_calendar += 1;
            if !opts.include_invalid {
                continue;
            }
        } else {
            report.with_calendar += 1;
        }

        let info = school_info(pool, school).await?;
        let mut row = vec![
            school.urn.to_string(),
            school.establishment_name.clone(),
            info.address,
            info.latitude,
            info.longitude,
            info.contact_detail,
        ];

        let terms = calendar.as_ref().map(term_cells).unwrap_or_default();
        for i in 0..max_terms {
            match terms.get(i) {
                Some((term, date, detail)) => {
                    row.push(term.clone());
                    row.push(date.clone());
                    row.push(detail.clone());
                }
                None => row.extend(["", "", ""].map(String::from)),
            }
        }

        writer.write_record(&row)?;
        report.rows_written += 1;
    }

    writer.flush()?;
    Ok(report)
}

/// The export treats any calendar-shaped payload as exportable, including
/// ones with an empty terms list.
fn is_calendar_shaped(data: &Value) -> bool {
    matches!(
        classify(Some(data)),
        DataStatus::Refined | DataStatus::RefinedEmptyTerms
    )
}

fn term_count(calendar: &Value) -> usize {
    calendar
        .get("terms")
        .and_then(Value::as_array)
        .map(Vec::len)
        .unwrap_or(0)
}

fn header_row(max_terms: usize) -> Vec<String> {
    let mut headers: Vec<String> = [
        "school_id",
        "school_name",
        "address",
        "latitude",
        "longitude",
        "contact_detail",
    ]
    .map(String::from)
    .to_vec();
    for i in 1..=max_terms {
        headers.push(format!("term_{i}"));
        headers.push(format!("date_{i}"));
        headers.push(format!("detail_{i}"));
    }
    headers
}

/// One `(term, date, detail)` cell triple per term.
///
/// The date comes from the term's first event; the detail concatenates all
/// event descriptions in the term.
fn term_cells(calendar: &Value) -> Vec<(String, String, String)> {
    let terms = calendar.get("terms").and_then(Value::as_array);
    let Some(terms) = terms else {
        return Vec::new();
    };

    terms
        .iter()
        .map(|term| {
            let term_name = term
                .get("term_name")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string();
            let events = term
                .get("events")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();

            let date = events.first().map(event_date_range).unwrap_or_default();
            let detail = events
                .iter()
                .filter_map(|event| event.get("event_text").and_then(Value::as_str))
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join(" | ");

            (term_name, date, detail)
        })
        .collect()
}

fn event_date_range(event: &Value) -> String {
    let start = event.get("start_date").and_then(Value::as_str).unwrap_or("");
    let end = event.get("end_date").and_then(Value::as_str).unwrap_or("");
    if !end.is_empty() && end != start {
        format!("{start} to {end}")
    } else {
        start.to_string()
    }
}

struct SchoolInfo {
    address: String,
    latitude: String,
    longitude: String,
    contact_detail: String,
}

/// Address, coordinates and contact details come from the school's original
/// CSV-shaped record when one survives, since refined calendar documents
/// carry none of them.
async fn school_info(pool: &SqlitePool, school: &School) -> Result<SchoolInfo> {
    let records = queries::records_for_school(pool, school.urn).await?;
    let original = records.iter().find_map(|record| {
        let data = record.data.as_ref()?;
        let obj = data.as_object()?;
        (obj.contains_key("URN") || obj.contains_key("EstablishmentName")).then_some(data)
    });

    let text_field = |data: &Value, key: &str| {
        data.get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let mut address = String::new();
    let mut latitude = String::new();
    let mut longitude = String::new();
    let mut contact = serde_json::Map::new();

    if let Some(website) = school.website.as_deref().filter(|w| !w.is_empty()) {
        contact.insert("website".to_string(), json!(website));
    }

    if let Some(original) = original {
        let parts: Vec<String> = ["Street", "Locality", "Town", "Postcode"]
            .iter()
            .filter_map(|key| text_field(original, key))
            .collect();
        address = parts.join(", ");

        latitude = text_field(original, "Latitude").unwrap_or_default();
        longitude = text_field(original, "Longitude").unwrap_or_default();

        if !contact.contains_key("website") {
            if let Some(site) = text_field(original, "SchoolWebsite") {
                contact.insert("website".to_string(), json!(site));
            }
        }
        if let Some(tel) = text_field(original, "TelephoneNum") {
            contact.insert("telephone".to_string(), json!(tel));
        }
    }

    let contact_detail = if contact.is_empty() {
        "{}".to_string()
    } else {
        Value::Object(contact).to_string()
    };

    Ok(SchoolInfo {
        address,
        latitude,
        longitude,
        contact_detail,
    })
}

impl ExportReport {
    pub fn print(&self, opts: &ExportOptions) {
        banner("EXPORT RESULTS");
        println!("Total schools processed: {}", self.total_schools);
        println!("Maximum terms found: {}", self.max_terms);
        println!("Schools with calendar data: {}", self.with_calendar);
        if opts.include_invalid {
            println!("Schools without calendar data: {}", self.without_calendar);
        }
        println!("Total rows exported: {}", self.rows_written);
        println!("CSV file created: {}", opts.output.display());
    }
}
