//! Validation of admin-authored deal content and of the sign-in dialog.
//!
//! The admin form collects every field as text. [`parse_draft`] turns those
//! strings into a typed [`DealDraft`], reporting every invalid field at once
//! rather than stopping at the first. [`validate_login`] and
//! [`validate_signup`] do the same for credentials before they reach the
//! identity provider.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use url::Url;

use super::models::{Category, Deal, DealDraft};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub const MIN_PASSWORD_CHARS: usize = 6;
pub const MIN_NAME_CHARS: usize = 2;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

/// The editable fields of a deal, in form order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DealField {
    Title,
    Category,
    OriginalPrice,
    DiscountedPrice,
    Location,
    EndDate,
    ImageUrl,
    Description,
}

impl DealField {
    pub const ALL: [DealField; 8] = [
        DealField::Title,
        DealField::Category,
        DealField::OriginalPrice,
        DealField::DiscountedPrice,
        DealField::Location,
        DealField::EndDate,
        DealField::ImageUrl,
        DealField::Description,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DealField::Title => "Title",
            DealField::Category => "Category",
            DealField::OriginalPrice => "Original Price ($)",
            DealField::DiscountedPrice => "Discounted Price ($)",
            DealField::Location => "Location",
            DealField::EndDate => "End Date",
            DealField::ImageUrl => "Image URL",
            DealField::Description => "Description",
        }
    }
}

/// The fields of the sign-in and sign-up dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthField {
    Name,
    Email,
    Password,
    ConfirmPassword,
}

impl AuthField {
    pub fn label(self) -> &'static str {
        match self {
            AuthField::Name => "Full Name",
            AuthField::Email => "Email",
            AuthField::Password => "Password",
            AuthField::ConfirmPassword => "Confirm Password",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError<F = DealField> {
    pub field: F,
    pub message: String,
}

impl<F> FieldError<F> {
    fn new(field: F, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Every field that failed validation, in form order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid input: {}", describe(.0))]
pub struct ValidationErrors<F = DealField>(pub Vec<FieldError<F>>);

impl<F: PartialEq> ValidationErrors<F> {
    pub fn for_field(&self, field: F) -> Option<&str> {
        self.0
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.message.as_str())
    }
}

fn describe<F>(errors: &[FieldError<F>]) -> String {
    errors
        .iter()
        .map(|error| error.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Raw text of the admin deal form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DealFormFields {
    pub title: String,
    pub category: String,
    pub original_price: String,
    pub discounted_price: String,
    pub location: String,
    pub end_date: String,
    pub image_url: String,
    pub description: String,
}

impl DealFormFields {
    pub fn get(&self, field: DealField) -> &str {
        match field {
            DealField::Title => &self.title,
            DealField::Category => &self.category,
            DealField::OriginalPrice => &self.original_price,
            DealField::DiscountedPrice => &self.discounted_price,
            DealField::Location => &self.location,
            DealField::EndDate => &self.end_date,
            DealField::ImageUrl => &self.image_url,
            DealField::Description => &self.description,
        }
    }

    pub fn get_mut(&mut self, field: DealField) -> &mut String {
        match field {
            DealField::Title => &mut self.title,
            DealField::Category => &mut self.category,
            DealField::OriginalPrice => &mut self.original_price,
            DealField::DiscountedPrice => &mut self.discounted_price,
            DealField::Location => &mut self.location,
            DealField::EndDate => &mut self.end_date,
            DealField::ImageUrl => &mut self.image_url,
            DealField::Description => &mut self.description,
        }
    }
}

impl From<&Deal> for DealFormFields {
    fn from(deal: &Deal) -> Self {
        Self {
            title: deal.title.clone(),
            category: deal.category.label().to_string(),
            original_price: deal.original_price.to_string(),
            discounted_price: deal.discounted_price.to_string(),
            location: deal.location.clone(),
            end_date: deal.end_date.format(DATE_FORMAT).to_string(),
            image_url: deal.image_url.clone(),
            description: deal.description.clone(),
        }
    }
}

/// Parses and validates the raw form text into a draft.
pub fn parse_draft(fields: &DealFormFields) -> Result<DealDraft, ValidationErrors> {
    let mut errors = Vec::new();

    check_required(&mut errors, DealField::Title, &fields.title, "Title is required");
    let category = parse_category(&mut errors, &fields.category);
    let original_price = parse_price(&mut errors, DealField::OriginalPrice, &fields.original_price);
    let discounted_price =
        parse_price(&mut errors, DealField::DiscountedPrice, &fields.discounted_price);
    check_required(&mut errors, DealField::Location, &fields.location, "Location is required");
    let end_date = parse_end_date(&mut errors, &fields.end_date);
    check_url(&mut errors, &fields.image_url);
    check_required(
        &mut errors,
        DealField::Description,
        &fields.description,
        "Description is required",
    );

    match (category, original_price, discounted_price, end_date) {
        (Some(category), Some(original_price), Some(discounted_price), Some(end_date))
            if errors.is_empty() =>
        {
            Ok(DealDraft {
                title: fields.title.trim().to_string(),
                description: fields.description.trim().to_string(),
                original_price,
                discounted_price,
                image_url: fields.image_url.trim().to_string(),
                category,
                location: fields.location.trim().to_string(),
                end_date,
            })
        }
        _ => Err(ValidationErrors(errors)),
    }
}

/// Validates a draft built in code rather than typed into the form.
pub fn validate_draft(draft: &DealDraft) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();
    check_required(&mut errors, DealField::Title, &draft.title, "Title is required");
    check_price(&mut errors, DealField::OriginalPrice, draft.original_price);
    check_price(&mut errors, DealField::DiscountedPrice, draft.discounted_price);
    check_required(&mut errors, DealField::Location, &draft.location, "Location is required");
    check_url(&mut errors, &draft.image_url);
    check_required(
        &mut errors,
        DealField::Description,
        &draft.description,
        "Description is required",
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}

/// Checks sign-in credentials.
pub fn validate_login(email: &str, password: &str) -> Result<(), ValidationErrors<AuthField>> {
    let mut errors = Vec::new();
    check_email(&mut errors, email);
    check_password(&mut errors, password);
    finish(errors)
}

/// Checks a new account, including that both password entries agree.
pub fn validate_signup(
    name: &str,
    email: &str,
    password: &str,
    confirm_password: &str,
) -> Result<(), ValidationErrors<AuthField>> {
    let mut errors = Vec::new();
    if name.trim().chars().count() < MIN_NAME_CHARS {
        errors.push(FieldError::new(AuthField::Name, "Name must be at least 2 characters"));
    }
    check_email(&mut errors, email);
    check_password(&mut errors, password);
    if password != confirm_password {
        errors.push(FieldError::new(AuthField::ConfirmPassword, "Passwords don't match"));
    }
    finish(errors)
}

fn finish<F>(errors: Vec<FieldError<F>>) -> Result<(), ValidationErrors<F>> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}

fn check_email(errors: &mut Vec<FieldError<AuthField>>, email: &str) {
    if !EMAIL_RE.is_match(email.trim()) {
        errors.push(FieldError::new(AuthField::Email, "Invalid email address"));
    }
}

fn check_password(errors: &mut Vec<FieldError<AuthField>>, password: &str) {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        errors.push(FieldError::new(
            AuthField::Password,
            "Password must be at least 6 characters",
        ));
    }
}

fn check_required(errors: &mut Vec<FieldError>, field: DealField, value: &str, message: &str) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, message));
    }
}

fn check_price(errors: &mut Vec<FieldError>, field: DealField, price: f64) {
    if !price.is_finite() || price < 0.0 {
        errors.push(FieldError::new(field, "Price must be positive"));
    }
}

fn check_url(errors: &mut Vec<FieldError>, value: &str) {
    if Url::parse(value.trim()).is_err() {
        errors.push(FieldError::new(DealField::ImageUrl, "Must be a valid URL"));
    }
}

fn parse_price(errors: &mut Vec<FieldError>, field: DealField, value: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() {
        errors.push(FieldError::new(field, "Price is required"));
        return None;
    }
    match value.parse::<f64>() {
        Ok(price) => {
            let before = errors.len();
            check_price(errors, field, price);
            (errors.len() == before).then_some(price)
        }
        Err(_) => {
            errors.push(FieldError::new(field, "Price must be a number"));
            None
        }
    }
}

fn parse_category(errors: &mut Vec<FieldError>, value: &str) -> Option<Category> {
    if value.trim().is_empty() {
        errors.push(FieldError::new(DealField::Category, "Category is required"));
        return None;
    }
    match value.parse::<Category>() {
        Ok(category) => Some(category),
        Err(err) => {
            errors.push(FieldError::new(DealField::Category, err.to_string()));
            None
        }
    }
}

fn parse_end_date(errors: &mut Vec<FieldError>, value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        errors.push(FieldError::new(DealField::EndDate, "End date is required"));
        return None;
    }
    match NaiveDate::parse_from_str(value, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(_) => {
            errors.push(FieldError::new(DealField::EndDate, "End date must be YYYY-MM-DD"));
            None
        }
    }
}
