//! Spreadsheet export of site visits.
//!
//! Rows go either to a Google Apps Script web app, posted as JSON, or
//! straight to the Sheets v4 `values:append` endpoint as a row of cells. The
//! exporter is built once at startup and handed to the application state;
//! export is best effort and never blocks intake.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{SheetsApiConfig, SheetsConfig};
use crate::model::SiteVisit;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com";

/// Errors from exporting a row.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to sheet failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("sheet returned HTTP {status}")]
    Status { status: u16 },

    #[error("sheet web app reply is not valid JSON: {0}")]
    InvalidReply(#[source] reqwest::Error),

    /// The web app answered but did not append the row.
    #[error("sheet web app rejected the row: {0}")]
    Rejected(String),
}

/// One sheet row, in the column order of the sheet header.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetRow {
    pub customer_id: String,
    pub customer_name: String,
    pub date_received: String,
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
    pub service_type: String,
    pub status: String,
    pub quotation_number: Option<String>,
    pub created_at: String,
}

impl SheetRow {
    /// Sheet header, left to right.
    pub const HEADERS: [&'static str; 20] = [
        "Customer ID",
        "Customer Name",
        "Date Received",
        "Day of Week",
        "Phone Number",
        "Has WhatsApp",
        "WhatsApp Number",
        "District",
        "City",
        "Address",
        "Latitude",
        "Longitude",
        "Has Removals",
        "Removal Charge",
        "Has Additional Labour",
        "Additional Labour Charge",
        "Service Type",
        "Status",
        "Quotation Number",
        "Created At",
    ];

    /// Cell values as they appear in the sheet, matching [`Self::HEADERS`].
    pub fn cells(&self) -> [String; 20] {
        fn yes_no(b: bool) -> String {
            (if b { "Yes" } else { "No" }).to_string()
        }
        fn opt<T: ToString>(v: &Option<T>) -> String {
            v.as_ref().map(ToString::to_string).unwrap_or_default()
        }

        [
            self.customer_id.clone(),
            self.customer_name.clone(),
            self.date_received.clone(),
            self.day_of_week.clone(),
            self.phone_number.clone(),
            yes_no(self.has_whatsapp),
            opt(&self.whatsapp_number),
            self.district.clone(),
            self.city.clone(),
            opt(&self.address),
            opt(&self.latitude),
            opt(&self.longitude),
            yes_no(self.has_removals),
            opt(&self.removal_charge),
            yes_no(self.has_additional_labour),
            opt(&self.additional_labour_charge),
            self.service_type.clone(),
            self.status.clone(),
            opt(&self.quotation_number),
            self.created_at.clone(),
        ]
    }
}

impl From<&SiteVisit> for SheetRow {
    fn from(visit: &SiteVisit) -> Self {
        Self {
            customer_id: visit.customer_id.to_string(),
            customer_name: visit.customer_name.clone(),
            date_received: visit.date_received.format("%Y-%m-%d").to_string(),
            day_of_week: visit.day_of_week.clone(),
            phone_number: visit.phone_number.clone(),
            has_whatsapp: visit.has_whatsapp,
            whatsapp_number: visit.whatsapp_number.clone(),
            district: visit.district.clone(),
            city: visit.city.clone(),
            address: visit.address.clone(),
            latitude: visit.latitude,
            longitude: visit.longitude,
            has_removals: visit.has_removals,
            removal_charge: visit.removal_charge,
            has_additional_labour: visit.has_additional_labour,
            additional_labour_charge: visit.additional_labour_charge,
            service_type: visit.service_type.as_str().to_string(),
            status: visit.status.clone(),
            quotation_number: visit.quotation_number.clone(),
            created_at: visit.created_at.to_rfc3339(),
        }
    }
}

/// Picks the exporter for `config`: the web app when its URL is set, the
/// Sheets API when credentials are set, otherwise none.
pub fn from_config(config: &SheetsConfig) -> Result<Arc<dyn SheetExporter>, ExportError> {
    if let Some(url) = &config.webhook_url {
        info!("Sheet export enabled through the Apps Script web app");
        return Ok(Arc::new(WebhookExporter::new(url.clone(), config.timeout)?));
    }
    if let Some(api) = &config.api {
        info!(
            spreadsheet_id = %api.spreadsheet_id,
            range = %api.range,
            "Sheet export enabled through the Sheets API"
        );
        return Ok(Arc::new(SheetsApiExporter::new(api, config.timeout)?));
    }
    info!("Sheet export disabled; no web app URL or Sheets API key configured");
    Ok(Arc::new(DisabledExporter))
}

fn http_client(timeout: Duration) -> Result<reqwest::Client, ExportError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(ExportError::Client)
}

/// Destination for exported rows.
#[async_trait]
pub trait SheetExporter: Send + Sync {
    async fn append(&self, row: &SheetRow) -> Result<(), ExportError>;

    /// Name used in logs.
    fn name(&self) -> &'static str;
}

/// Exporter used when no sheet is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledExporter;

#[async_trait]
impl SheetExporter for DisabledExporter {
    async fn append(&self, row: &SheetRow) -> Result<(), ExportError> {
        debug!(customer_id = %row.customer_id, "Sheet export disabled; skipping row");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// Posts rows to an Apps Script web app URL.
#[derive(Debug, Clone)]
pub struct WebhookExporter {
    client: reqwest::Client,
    url: String,
}

/// Body the web app answers with, HTTP 200 even when the append failed.
#[derive(Debug, Deserialize)]
struct WebAppReply {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

impl WebhookExporter {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ExportError> {
        Ok(Self {
            client: http_client(timeout)?,
            url: url.into(),
        })
    }
}

#[async_trait]
impl SheetExporter for WebhookExporter {
    async fn append(&self, row: &SheetRow) -> Result<(), ExportError> {
        let response = self
            .client
            .post(&self.url)
            .json(row)
            .send()
            .await
            .map_err(ExportError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExportError::Status {
                status: status.as_u16(),
            });
        }

        let reply: WebAppReply = response.json().await.map_err(ExportError::InvalidReply)?;
        if !reply.success {
            return Err(ExportError::Rejected(
                reply.error.unwrap_or_else(|| "no reason given".to_string()),
            ));
        }

        debug!(customer_id = %row.customer_id, "Row appended to sheet");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "webhook"
    }
}

/// Appends rows of cells through the Sheets v4 API with an API key.
#[derive(Debug, Clone)]
pub struct SheetsApiExporter {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    spreadsheet_id: String,
    range: String,
}

#[derive(Serialize)]
struct AppendRequest {
    values: [[String; 20]; 1],
}

impl SheetsApiExporter {
    pub fn new(config: &SheetsApiConfig, timeout: Duration) -> Result<Self, ExportError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: SHEETS_API_BASE.to_string(),
            api_key: config.api_key.clone(),
            spreadsheet_id: config.spreadsheet_id.clone(),
            range: config.range.clone(),
        })
    }

    /// Sends requests to `base_url` instead of the Google endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn append_url(&self) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}:append",
            self.base_url.trim_end_matches('/'),
            self.spreadsheet_id,
            self.range
        )
    }
}

#[async_trait]
impl SheetExporter for SheetsApiExporter {
    async fn append(&self, row: &SheetRow) -> Result<(), ExportError> {
        let body = AppendRequest {
            values: [row.cells()],
        };
        let response = self
            .client
            .post(self.append_url())
            .query(&[
                ("valueInputOption", "USER_ENTERED"),
                ("key", self.api_key.as_str()),
            ])
            .json(&body)
            .send()
            .await
            .map_err(ExportError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExportError::Status {
                status: status.as_u16(),
            });
        }

        debug!(
            customer_id = %row.customer_id,
            range = %self.range,
            "Row appended through Sheets API"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "sheets-api"
    }
}
