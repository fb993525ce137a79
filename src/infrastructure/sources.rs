use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::info;

use crate::domain::{validate_draft, Category, Deal, DealDraft, ValidationErrors};

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid deal JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid deal CSV in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Unsupported deal file {}, expected .json or .csv", .0.display())]
    UnsupportedFormat(PathBuf),
    #[error("Invalid deal {id} in {}: {source}", .path.display())]
    InvalidDeal {
        path: PathBuf,
        id: String,
        #[source]
        source: ValidationErrors,
    },
    #[error("Duplicate deal id {id} in {}", .path.display())]
    DuplicateId { path: PathBuf, id: String },
}

/// Supplies the deal collection the storefront browses.
pub struct DealSource;

impl DealSource {
    /// Loads deals from a `.json` array or a `.csv` file with a header row.
    pub fn load(path: &Path) -> Result<Vec<Deal>, SourceError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        let deals = match extension.as_deref() {
            Some("json") => Self::load_json(path)?,
            Some("csv") => Self::load_csv(path)?,
            _ => return Err(SourceError::UnsupportedFormat(path.to_path_buf())),
        };
        info!(path = %path.display(), count = deals.len(), "loaded deals");
        Ok(deals)
    }

    pub fn load_json(path: &Path) -> Result<Vec<Deal>, SourceError> {
        let content = fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let deals = serde_json::from_str(&content).map_err(|source| SourceError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        check_deals(path, deals)
    }

    pub fn load_csv(path: &Path) -> Result<Vec<Deal>, SourceError> {
        let csv_error = |source| SourceError::Csv {
            path: path.to_path_buf(),
            source,
        };
        let mut reader = csv::Reader::from_path(path).map_err(csv_error)?;
        let deals = reader
            .deserialize()
            .collect::<Result<Vec<Deal>, _>>()
            .map_err(csv_error)?;
        check_deals(path, deals)
    }
}

/// Rejects files whose deals break the catalog's rules: ids must be unique
/// and every deal must pass the same checks as admin-authored content.
fn check_deals(path: &Path, deals: Vec<Deal>) -> Result<Vec<Deal>, SourceError> {
    let mut seen = HashSet::new();
    for deal in &deals {
        if !seen.insert(deal.id.as_str()) {
            return Err(SourceError::DuplicateId {
                path: path.to_path_buf(),
                id: deal.id.clone(),
            });
        }
        validate_draft(&DealDraft::from(deal)).map_err(|source| SourceError::InvalidDeal {
            path: path.to_path_buf(),
            id: deal.id.clone(),
            source,
        })?;
    }
    Ok(deals)
}

/// The storefront's built-in catalog, used when no deal file is configured.
pub fn sample_deals() -> Vec<Deal> {
    vec![
        Deal {
            id: "1".to_string(),
            title: "Luxury Spa Day Package with Massage and Facial".to_string(),
            description: "Indulge in a full day of pampering with our premium spa package including a 60-minute massage and rejuvenating facial treatment."
                .to_string(),
            original_price: 200.0,
            discounted_price: 99.0,
            discount_percentage: 50,
            image_url: "https://images.unsplash.com/photo-1540555700478-4be289fbecef?auto=format&fit=crop&q=80"
                .to_string(),
            category: Category::BeautyAndSpas,
            location: "Downtown Spa & Wellness".to_string(),
            end_date: const { sample_date(2024, 4, 30) },
            sold_count: 234,
        },
        Deal {
            id: "2".to_string(),
            title: "Fine Dining Experience for Two".to_string(),
            description: "Enjoy a romantic 3-course dinner for two at our award-winning restaurant with wine pairing."
                .to_string(),
            original_price: 150.0,
            discounted_price: 89.0,
            discount_percentage: 40,
            image_url: "https://images.unsplash.com/photo-1414235077428-338989a2e8c0?auto=format&fit=crop&q=80"
                .to_string(),
            category: Category::Restaurants,
            location: "Gourmet Heights Restaurant".to_string(),
            end_date: const { sample_date(2024, 4, 25) },
            sold_count: 156,
        },
        Deal {
            id: "3".to_string(),
            title: "Adventure Park All-Day Pass".to_string(),
            description: "Access all rides and attractions with our all-inclusive day pass. Perfect for the whole family!"
                .to_string(),
            original_price: 80.0,
            discounted_price: 45.0,
            discount_percentage: 44,
            image_url: "https://images.unsplash.com/photo-1536697246787-1f7ae568d89a?auto=format&fit=crop&q=80"
                .to_string(),
            category: Category::Activities,
            location: "Thrill Zone Adventure Park".to_string(),
            end_date: const { sample_date(2024, 5, 15) },
            sold_count: 489,
        },
        Deal {
            id: "4".to_string(),
            title: "Designer Boutique Shopping Spree".to_string(),
            description: "Get $200 worth of latest fashion items from our curated designer collection. Includes personal styling session."
                .to_string(),
            original_price: 200.0,
            discounted_price: 99.0,
            discount_percentage: 50,
            image_url: "https://images.unsplash.com/photo-1441984904996-e0b6ba687e04?auto=format&fit=crop&q=80"
                .to_string(),
            category: Category::Shopping,
            location: "Luxe Fashion Gallery".to_string(),
            end_date: const { sample_date(2024, 4, 28) },
            sold_count: 178,
        },
        Deal {
            id: "5".to_string(),
            title: "Beachfront Resort Weekend Getaway".to_string(),
            description: "2 nights in a luxury ocean-view suite with breakfast, spa credit, and sunset dinner cruise included."
                .to_string(),
            original_price: 599.0,
            discounted_price: 299.0,
            discount_percentage: 50,
            image_url: "https://images.unsplash.com/photo-1582610116397-edb318620f90?auto=format&fit=crop&q=80"
                .to_string(),
            category: Category::Travel,
            location: "Seaside Paradise Resort".to_string(),
            end_date: const { sample_date(2024, 5, 30) },
            sold_count: 89,
        },
        Deal {
            id: "6".to_string(),
            title: "Professional Photography Session".to_string(),
            description: "90-minute photo session with expert photographer, including 10 edited digital images and print release."
                .to_string(),
            original_price: 300.0,
            discounted_price: 149.0,
            discount_percentage: 50,
            image_url: "https://images.unsplash.com/photo-1554048612-b6a482bc67e5?auto=format&fit=crop&q=80"
                .to_string(),
            category: Category::Services,
            location: "Capture Perfect Photography Studio".to_string(),
            end_date: const { sample_date(2024, 5, 20) },
            sold_count: 142,
        },
    ]
}

/// Evaluated in const context, so a bad literal fails the build.
const fn sample_date(year: i32, month: u32, day: u32) -> NaiveDate {
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) => date,
        None => panic!("invalid sample date"),
    }
}
