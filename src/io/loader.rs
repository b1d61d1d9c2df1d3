// src/io/loader.rs - Reading the restaurant list and the FLY deal sheet
use anyhow::{Context, Result};
use log::{debug, info};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::models::core::{Query, ReferenceEntity};

/// Allocation cells that mean "no allocation" in the deal export.
pub const SENTINEL_ALLOCATIONS: [&str; 2] = ["Contract not found", "Hospitality Group"];

#[derive(Debug, Deserialize)]
struct RestaurantRow {
    #[serde(rename = "Restaurant ID", default)]
    id: String,
    #[serde(rename = "Restaurant Name", default)]
    name: String,
    #[serde(rename = "Location Name", default)]
    location: Option<String>,
    #[serde(rename = "Restaurant Group ID", default)]
    group_id: String,
    #[serde(rename = "Restaurant Group Name", default)]
    group_name: String,
}

#[derive(Debug, Deserialize)]
struct DealRow {
    #[serde(rename = "Deal Name", default)]
    deal_name: String,
    #[serde(rename = "FLY Allocation", default)]
    allocation: String,
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader)
}

/// Every restaurant row, in file order. Rows with a blank name are kept; the
/// ranker skips them.
pub fn read_restaurants<R: Read>(reader: R) -> Result<Vec<ReferenceEntity>> {
    let mut rdr = csv_reader(reader);
    let mut entities = Vec::new();
    for (line, row) in rdr.deserialize::<RestaurantRow>().enumerate() {
        let row = row.with_context(|| format!("Failed to parse restaurant row {}", line + 2))?;
        entities.push(ReferenceEntity::new(
            row.id.trim(),
            row.name.trim(),
            row.location.as_deref(),
            row.group_id.trim(),
            row.group_name.trim(),
        ));
    }
    Ok(entities)
}

/// Deals with both a name and a real allocation, in file order.
pub fn read_deals<R: Read>(reader: R) -> Result<Vec<Query>> {
    let mut rdr = csv_reader(reader);
    let mut deals = Vec::new();
    let mut skipped = 0usize;
    for (line, row) in rdr.deserialize::<DealRow>().enumerate() {
        let row = row.with_context(|| format!("Failed to parse deal row {}", line + 2))?;
        let deal_name = row.deal_name.trim();
        let allocation = row.allocation.trim();
        if deal_name.is_empty() || allocation.is_empty() || SENTINEL_ALLOCATIONS.contains(&allocation) {
            skipped += 1;
            continue;
        }
        deals.push(Query::new(deal_name, allocation));
    }
    if skipped > 0 {
        debug!("Skipped {} deal rows without a usable name or allocation", skipped);
    }
    Ok(deals)
}

pub fn load_restaurants(path: &Path) -> Result<Vec<ReferenceEntity>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open restaurant file {}", path.display()))?;
    let entities = read_restaurants(file)
        .with_context(|| format!("Failed to read restaurant file {}", path.display()))?;
    info!("📁 Loaded {} restaurants from {}", entities.len(), path.display());
    Ok(entities)
}

pub fn load_deals(path: &Path) -> Result<Vec<Query>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open deal file {}", path.display()))?;
    let deals =
        read_deals(file).with_context(|| format!("Failed to read deal file {}", path.display()))?;
    info!("📁 Loaded {} FLY deals from {}", deals.len(), path.display());
    Ok(deals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const RESTAURANTS: &str = "\u{feff}Restaurant ID,Restaurant Name,Location Name,Restaurant Group ID,Restaurant Group Name
r1,Joe's Pizza,Soho,g1,Joe's Pizza Group
r2,  Carbone ,,g2,Major Food Group
r3,,Chelsea,g3,Nameless
";

    #[test]
    fn test_read_restaurants() {
        let entities = read_restaurants(RESTAURANTS.as_bytes()).unwrap();
        assert_eq!(entities.len(), 3);
        assert_eq!(entities[0].id, "r1");
        assert_eq!(entities[0].location(), Some("Soho"));
        assert_eq!(entities[1].display_name, "Carbone");
        assert_eq!(entities[1].location(), None);
        assert_eq!(entities[1].group_name, "Major Food Group");
        assert!(!entities[2].has_name());
    }

    #[test]
    fn test_read_deals_filters_sentinels() {
        let data = "Deal Name,FLY Allocation
Joe's Pizza Soho,\"$1,200\"
Carbone,Contract not found
Major Food,Hospitality Group
,500
Le Bernardin,
  Balthazar  , 800
";
        let deals = read_deals(data.as_bytes()).unwrap();
        assert_eq!(
            deals,
            vec![
                Query::new("Joe's Pizza Soho", "$1,200"),
                Query::new("Balthazar", "800"),
            ]
        );
    }

    #[test]
    fn test_missing_columns_default_to_empty() {
        let deals = read_deals("Deal Name\nCarbone\n".as_bytes()).unwrap();
        assert!(deals.is_empty());

        let entities = read_restaurants("Restaurant Name\nCarbone\n".as_bytes()).unwrap();
        assert_eq!(entities[0].display_name, "Carbone");
        assert_eq!(entities[0].id, "");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(RESTAURANTS.as_bytes()).unwrap();
        let entities = load_restaurants(file.path()).unwrap();
        assert_eq!(entities.len(), 3);

        let missing = load_deals(Path::new("/definitely/not/here.csv"));
        assert!(missing.is_err());
    }
}
