use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// The closed set of deal categories offered by the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Category {
    Restaurants,
    BeautyAndSpas,
    Activities,
    Shopping,
    Travel,
    Services,
}

impl Category {
    /// Every category, in the order the category bar shows them.
    pub const ALL: [Category; 6] = [
        Category::Restaurants,
        Category::BeautyAndSpas,
        Category::Activities,
        Category::Shopping,
        Category::Travel,
        Category::Services,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Restaurants => "Restaurants",
            Category::BeautyAndSpas => "Beauty & Spas",
            Category::Activities => "Activities",
            Category::Shopping => "Shopping",
            Category::Travel => "Travel",
            Category::Services => "Services",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .into_iter()
            .find(|category| category.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| DomainError::UnknownCategory(s.to_string()))
    }
}

impl TryFrom<String> for Category {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.label().to_string()
    }
}

/// Category selection of the filter criteria.
///
/// `All` is the "no category filter" sentinel and is labelled "All Deals".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub const ALL_LABEL: &'static str = "All Deals";

    /// The sentinel followed by every category.
    pub fn options() -> Vec<CategoryFilter> {
        std::iter::once(CategoryFilter::All)
            .chain(Category::ALL.into_iter().map(CategoryFilter::Only))
            .collect()
    }

    pub fn label(self) -> &'static str {
        match self {
            CategoryFilter::All => Self::ALL_LABEL,
            CategoryFilter::Only(category) => category.label(),
        }
    }

    pub fn accepts(self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(selected) => selected == category,
        }
    }

    /// Next option in category-bar order, wrapping around.
    pub fn next(self) -> CategoryFilter {
        let options = Self::options();
        let index = self.position(&options);
        options[(index + 1) % options.len()]
    }

    /// Previous option in category-bar order, wrapping around.
    pub fn previous(self) -> CategoryFilter {
        let options = Self::options();
        let index = self.position(&options);
        options[(index + options.len() - 1) % options.len()]
    }

    fn position(self, options: &[CategoryFilter]) -> usize {
        options.iter().position(|option| *option == self).unwrap_or(0)
    }
}

impl FromStr for CategoryFilter {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case(Self::ALL_LABEL) {
            Ok(CategoryFilter::All)
        } else {
            s.parse().map(CategoryFilter::Only)
        }
    }
}

/// The two predicates the shopper controls to narrow the catalog.
///
/// Both fields always hold a usable value: the `All` sentinel and an empty
/// query mean "no constraint".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FilterCriteria {
    pub selected_category: CategoryFilter,
    pub search_query: String,
}

impl FilterCriteria {
    pub fn new(selected_category: CategoryFilter, search_query: impl Into<String>) -> Self {
        Self {
            selected_category,
            search_query: search_query.into(),
        }
    }

    pub fn has_search(&self) -> bool {
        !self.search_query.trim().is_empty()
    }

    pub fn is_unconstrained(&self) -> bool {
        self.selected_category == CategoryFilter::All && !self.has_search()
    }
}

/// One time-boxed promotional offer.
///
/// Field names serialize in camelCase so catalogs written by the web
/// storefront load without conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub id: String,
    pub title: String,
    pub description: String,
    pub original_price: f64,
    pub discounted_price: f64,
    /// Supplied as-is; never recomputed by the query engine.
    pub discount_percentage: u8,
    pub image_url: String,
    pub category: Category,
    pub location: String,
    pub end_date: NaiveDate,
    pub sold_count: u32,
}

impl Deal {
    /// A deal is expired once `today` is past its end date.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        today > self.end_date
    }

    pub(crate) fn from_draft(id: String, sold_count: u32, draft: DealDraft) -> Self {
        let discount_percentage = discount_percentage(draft.original_price, draft.discounted_price);
        Self {
            id,
            title: draft.title,
            description: draft.description,
            original_price: draft.original_price,
            discounted_price: draft.discounted_price,
            discount_percentage,
            image_url: draft.image_url,
            category: draft.category,
            location: draft.location,
            end_date: draft.end_date,
            sold_count,
        }
    }
}

/// Admin-authored deal content: everything but the id, sold count and
/// discount percentage, which the catalog assigns.
#[derive(Debug, Clone, PartialEq)]
pub struct DealDraft {
    pub title: String,
    pub description: String,
    pub original_price: f64,
    pub discounted_price: f64,
    pub image_url: String,
    pub category: Category,
    pub location: String,
    pub end_date: NaiveDate,
}

impl From<&Deal> for DealDraft {
    fn from(deal: &Deal) -> Self {
        Self {
            title: deal.title.clone(),
            description: deal.description.clone(),
            original_price: deal.original_price,
            discounted_price: deal.discounted_price,
            image_url: deal.image_url.clone(),
            category: deal.category,
            location: deal.location.clone(),
            end_date: deal.end_date,
        }
    }
}

/// Whole-percent discount of `discounted` relative to `original`, clamped to
/// `0..=100`. A free original price yields no discount.
pub fn discount_percentage(original: f64, discounted: f64) -> u8 {
    if original <= 0.0 || !original.is_finite() || !discounted.is_finite() {
        return 0;
    }
    let percent = ((original - discounted) / original * 100.0).round();
    percent.clamp(0.0, 100.0) as u8
}

/// A resolved user record produced by a successful login or signup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub name: String,
    pub is_admin: bool,
    pub email_verified: bool,
}

/// The single current authentication state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Session {
    #[default]
    Anonymous,
    Authenticated(Identity),
}

impl Session {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Session::Anonymous => None,
            Session::Authenticated(identity) => Some(identity),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated(_))
    }

    /// Gate for the admin surface.
    pub fn is_admin(&self) -> bool {
        self.identity().is_some_and(|identity| identity.is_admin)
    }

    /// Drives the email-verification banner.
    pub fn needs_email_verification(&self) -> bool {
        self.identity().is_some_and(|identity| !identity.email_verified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(is_admin: bool, email_verified: bool) -> Identity {
        Identity {
            id: "7".to_string(),
            email: "shopper@example.com".to_string(),
            name: "Shopper".to_string(),
            is_admin,
            email_verified,
        }
    }

    #[test]
    fn test_category_labels_round_trip_through_parse() {
        for category in Category::ALL {
            assert_eq!(category.label().parse::<Category>().unwrap(), category);
        }
        assert_eq!("beauty & spas".parse::<Category>().unwrap(), Category::BeautyAndSpas);
        assert!(matches!(
            "Groceries".parse::<Category>(),
            Err(DomainError::UnknownCategory(name)) if name == "Groceries"
        ));
    }

    #[test]
    fn test_category_serializes_as_label() {
        let json = serde_json::to_string(&Category::BeautyAndSpas).unwrap();
        assert_eq!(json, "\"Beauty & Spas\"");
        let parsed: Category = serde_json::from_str("\"Travel\"").unwrap();
        assert_eq!(parsed, Category::Travel);
    }

    #[test]
    fn test_category_filter_options_and_cycling() {
        let options = CategoryFilter::options();
        assert_eq!(options.len(), 7);
        assert_eq!(options[0], CategoryFilter::All);
        assert_eq!(CategoryFilter::All.label(), "All Deals");

        assert_eq!(CategoryFilter::All.next(), CategoryFilter::Only(Category::Restaurants));
        assert_eq!(CategoryFilter::All.previous(), CategoryFilter::Only(Category::Services));
        assert_eq!(CategoryFilter::Only(Category::Services).next(), CategoryFilter::All);
    }

    #[test]
    fn test_category_filter_parse() {
        assert_eq!("All Deals".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        assert_eq!(
            "Shopping".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Only(Category::Shopping)
        );
    }

    #[test]
    fn test_filter_criteria_whitespace_is_unconstrained() {
        let criteria = FilterCriteria::new(CategoryFilter::All, "   ");
        assert!(!criteria.has_search());
        assert!(criteria.is_unconstrained());

        let criteria = FilterCriteria::new(CategoryFilter::Only(Category::Travel), "");
        assert!(!criteria.is_unconstrained());
    }

    #[test]
    fn test_discount_percentage() {
        assert_eq!(discount_percentage(200.0, 99.0), 51);
        assert_eq!(discount_percentage(80.0, 45.0), 44);
        assert_eq!(discount_percentage(100.0, 100.0), 0);
        assert_eq!(discount_percentage(0.0, 10.0), 0);
        assert_eq!(discount_percentage(50.0, 80.0), 0);
        assert_eq!(discount_percentage(50.0, 0.0), 100);
    }

    #[test]
    fn test_deal_expiry() {
        let draft = DealDraft {
            title: "Pass".to_string(),
            description: "Day pass".to_string(),
            original_price: 80.0,
            discounted_price: 45.0,
            image_url: "https://example.com/pass.jpg".to_string(),
            category: Category::Activities,
            location: "Park".to_string(),
            end_date: NaiveDate::from_ymd_opt(2024, 5, 15).unwrap(),
        };
        let deal = Deal::from_draft("3".to_string(), 0, draft);
        assert_eq!(deal.discount_percentage, 44);
        assert!(!deal.is_expired(NaiveDate::from_ymd_opt(2024, 5, 15).unwrap()));
        assert!(deal.is_expired(NaiveDate::from_ymd_opt(2024, 5, 16).unwrap()));
    }

    #[test]
    fn test_session_derived_flags() {
        let anonymous = Session::Anonymous;
        assert!(!anonymous.is_authenticated());
        assert!(!anonymous.is_admin());
        assert!(!anonymous.needs_email_verification());

        let admin = Session::Authenticated(identity(true, true));
        assert!(admin.is_authenticated());
        assert!(admin.is_admin());
        assert!(!admin.needs_email_verification());

        let fresh = Session::Authenticated(identity(false, false));
        assert!(!fresh.is_admin());
        assert!(fresh.needs_email_verification());
    }
}
