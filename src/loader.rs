use std::collections::BTreeMap;
use std::error::Error;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::catalog::BidCatalog;
use crate::types::{AdvertiserId, Bid};

/// Read the bidder dataset and build the catalog
///
/// The dataset is a CSV with a header row and columns
/// Advertiser, Keyword, Bid Value, Budget. The budget column repeats on
/// every row of an advertiser; the first occurrence wins.
pub fn load_catalog(path: &Path) -> Result<BidCatalog, Box<dyn Error>> {
    let file = File::open(path)
        .map_err(|e| format!("cannot open dataset '{}': {}", path.display(), e))?;
    let reader = BufReader::new(file);

    let mut original_budgets: BTreeMap<AdvertiserId, f64> = BTreeMap::new();
    let mut bids = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if index == 0 {
            // Header row
            continue;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != 4 {
            return Err(format!(
                "dataset line {}: expected 4 fields, got {}",
                index + 1,
                fields.len()
            )
            .into());
        }

        let advertiser: AdvertiserId = fields[0].trim().parse().map_err(|e| {
            format!("dataset line {}: bad advertiser id '{}': {}", index + 1, fields[0], e)
        })?;
        let keyword = fields[1].trim().to_string();
        let value: f64 = fields[2].trim().parse().map_err(|e| {
            format!("dataset line {}: bad bid value '{}': {}", index + 1, fields[2], e)
        })?;
        let budget: f64 = fields[3].trim().parse().map_err(|e| {
            format!("dataset line {}: bad budget '{}': {}", index + 1, fields[3], e)
        })?;

        original_budgets.entry(advertiser).or_insert(budget);
        bids.push(Bid {
            advertiser,
            keyword,
            value,
        });
    }

    BidCatalog::new(original_budgets, bids)
}

/// Read the query list, one keyword per line; blank lines are skipped
pub fn load_queries(path: &Path) -> Result<Vec<String>, Box<dyn Error>> {
    let file = File::open(path)
        .map_err(|e| format!("cannot open query list '{}': {}", path.display(), e))?;
    let reader = BufReader::new(file);

    let mut queries = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let query = line.trim();
        if !query.is_empty() {
            queries.push(query.to_string());
        }
    }
    Ok(queries)
}
