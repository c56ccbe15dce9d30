//! Site-visit records.
//!
//! Field names serialize in camelCase to match what the intake form posts.

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use sitevisit_id::CustomerId;
use uuid::Uuid;

/// Kind of work the site visit is quoting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceType {
    Ceiling,
    Gutters,
    Roof,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ceiling => "Ceiling",
            Self::Gutters => "Gutters",
            Self::Roof => "Roof",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Ceiling" => Some(Self::Ceiling),
            "Gutters" => Some(Self::Gutters),
            "Roof" => Some(Self::Roof),
            _ => None,
        }
    }
}

/// One measured ceiling area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CeilingArea {
    pub length: f64,
    pub width: f64,
}

impl CeilingArea {
    pub fn area(&self) -> f64 {
        self.length * self.width
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CeilingDetails {
    pub ceiling_type: String,
    #[serde(default)]
    pub has_macfoil: bool,
    pub price_per_square_feet: f64,
    #[serde(default)]
    pub areas: Vec<CeilingArea>,
}

impl CeilingDetails {
    pub fn total_area(&self) -> f64 {
        self.areas.iter().map(CeilingArea::area).sum()
    }

    pub fn total_price(&self) -> f64 {
        self.total_area() * self.price_per_square_feet
    }
}

/// Gutter component quantities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GutterDetails {
    pub gutters_valance_b: bool,
    pub b_flashing_valance_b: bool,
    pub gutters: u32,
    pub valance_b: u32,
    pub b_flashing: u32,
    pub d_pipes: u32,
    pub nozzels: u32,
    pub end_caps: u32,
    pub chain_packets: u32,
    pub wall_f_size: Option<String>,
    pub wall_f: u32,
    pub blind_wall_flashing_size: Option<String>,
    pub blind_wall_flashing: u32,
    pub ridge_cover: u32,
    pub rat_guard: u32,
    pub custom_design_note: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoofDetails {
    pub roof_type: String,
    pub structure_type: String,
    pub finish_type: String,
    pub material_type: String,
    pub color: String,
    pub sub_type: String,
}

/// Service-specific details; the variant must match the visit's service type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ServiceDetails {
    Ceiling(CeilingDetails),
    Gutters(GutterDetails),
    Roof(RoofDetails),
}

impl ServiceDetails {
    pub fn service_type(&self) -> ServiceType {
        match self {
            Self::Ceiling(_) => ServiceType::Ceiling,
            Self::Gutters(_) => ServiceType::Gutters,
            Self::Roof(_) => ServiceType::Roof,
        }
    }
}

/// A site visit as submitted by the intake form.
///
/// `customer_id` is optional: when absent the service issues the next one.
/// When present it is kept as the raw string so a malformed value can be
/// reported as a field error instead of a body rejection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSiteVisit {
    #[serde(default)]
    pub customer_id: Option<String>,
    pub customer_name: String,
    pub date_received: NaiveDate,
    pub phone_number: String,
    #[serde(default, rename = "hasWhatsApp")]
    pub has_whatsapp: bool,
    #[serde(default, rename = "hasWhatsAppNumber")]
    pub has_whatsapp_number: bool,
    #[serde(default)]
    pub whatsapp_number: Option<String>,
    pub district: String,
    pub city: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub has_removals: bool,
    #[serde(default)]
    pub removal_charge: Option<f64>,
    #[serde(default)]
    pub has_additional_labour: bool,
    #[serde(default)]
    pub additional_labour_charge: Option<f64>,
    pub service_type: ServiceType,
    pub status: String,
    #[serde(default)]
    pub quotation_number: Option<String>,
    #[serde(default)]
    pub details: Option<ServiceDetails>,
}

/// A single failed field check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
    /// Machine-readable reason, when the check has one.
    pub code: Option<&'static str>,
}

impl FieldViolation {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
            code: None,
        }
    }

    fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }
}

impl NewSiteVisit {
    /// Checks every field and returns all violations at once.
    ///
    /// On success returns the parsed customer ID, if one was supplied.
    pub fn validate(&self) -> Result<Option<CustomerId>, Vec<FieldViolation>> {
        let mut violations = Vec::new();

        let customer_id = match self.customer_id.as_deref() {
            None | Some("") => None,
            Some(raw) => match CustomerId::parse(raw) {
                Ok(id) => Some(id),
                Err(e) => {
                    violations.push(
                        FieldViolation::new("customerId", format!("Invalid Customer ID format: {e}"))
                            .with_code(e.code()),
                    );
                    None
                }
            },
        };

        for (field, value) in [
            ("customerName", &self.customer_name),
            ("phoneNumber", &self.phone_number),
            ("district", &self.district),
            ("city", &self.city),
            ("status", &self.status),
        ] {
            if value.trim().is_empty() {
                violations.push(FieldViolation::new(field, "is required"));
            }
        }

        if self.has_whatsapp_number
            && self
                .whatsapp_number
                .as_deref()
                .map_or(true, |n| n.trim().is_empty())
        {
            violations.push(FieldViolation::new(
                "whatsappNumber",
                "is required when a separate WhatsApp number is indicated",
            ));
        }

        if let Some(lat) = self.latitude {
            if !(-90.0..=90.0).contains(&lat) {
                violations.push(FieldViolation::new("latitude", "must be between -90 and 90"));
            }
        }
        if let Some(lng) = self.longitude {
            if !(-180.0..=180.0).contains(&lng) {
                violations.push(FieldViolation::new(
                    "longitude",
                    "must be between -180 and 180",
                ));
            }
        }

        for (field, charge) in [
            ("removalCharge", self.removal_charge),
            ("additionalLabourCharge", self.additional_labour_charge),
        ] {
            if charge.is_some_and(|c| c < 0.0) {
                violations.push(FieldViolation::new(field, "cannot be negative"));
            }
        }

        if let Some(details) = &self.details {
            if details.service_type() != self.service_type {
                violations.push(FieldViolation::new(
                    "details",
                    format!(
                        "{} details do not match service type {}",
                        details.service_type().as_str(),
                        self.service_type.as_str()
                    ),
                ));
            }
            if let ServiceDetails::Ceiling(ceiling) = details {
                if ceiling.price_per_square_feet < 0.0 {
                    violations.push(FieldViolation::new(
                        "details.pricePerSquareFeet",
                        "cannot be negative",
                    ));
                }
                if ceiling
                    .areas
                    .iter()
                    .any(|a| a.length <= 0.0 || a.width <= 0.0)
                {
                    violations.push(FieldViolation::new(
                        "details.areas",
                        "length and width must be positive",
                    ));
                }
            }
        }

        if violations.is_empty() {
            Ok(customer_id)
        } else {
            Err(violations)
        }
    }

    /// Builds the stored record under the given customer ID.
    pub fn into_site_visit(self, customer_id: CustomerId, created_at: DateTime<Utc>) -> SiteVisit {
        SiteVisit {
            id: Uuid::now_v7(),
            customer_id,
            customer_name: self.customer_name,
            date_received: self.date_received,
            day_of_week: day_name(self.date_received.weekday()).to_string(),
            phone_number: self.phone_number,
            has_whatsapp: self.has_whatsapp,
            whatsapp_number: self.whatsapp_number,
            district: self.district,
            city: self.city,
            address: self.address,
            latitude: self.latitude,
            longitude: self.longitude,
            has_removals: self.has_removals,
            removal_charge: self.removal_charge,
            has_additional_labour: self.has_additional_labour,
            additional_labour_charge: self.additional_labour_charge,
            service_type: self.service_type,
            status: self.status,
            quotation_number: self.quotation_number,
            details: self.details,
            created_at,
        }
    }
}

/// A persisted site visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteVisit {
    pub id: Uuid,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub date_received: NaiveDate,
    pub day_of_week: String,
    pub phone_number: String,
    #[serde(rename = "hasWhatsApp")]
    pub has_whatsapp: bool,
    pub whatsapp_number: Option<String>,
    pub district: String,
    pub city: String,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub has_removals: bool,
    pub removal_charge: Option<f64>,
    pub has_additional_labour: bool,
    pub additional_labour_charge: Option<f64>,
    pub service_type: ServiceType,
    pub status: String,
    pub quotation_number: Option<String>,
    pub details: Option<ServiceDetails>,
    pub created_at: DateTime<Utc>,
}

/// English weekday name, as shown on the sheet.
pub fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
