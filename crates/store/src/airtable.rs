//! Airtable REST client.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use courier_common::config::AppConfig;
use courier_common::error::StoreError;
use courier_common::types::{Route, Ticket, Volunteer};

use crate::formula;
use crate::records::{FromRecord, RawRecord, decode_all};
use crate::{
    BULK_DELIVERY_CONFIRMED, BULK_ROUTES_TABLE, INTAKE_TABLE, RecordStore, VOLUNTEER_FORM_TABLE,
};

/// Record ids per `RECORD_ID()` lookup formula.
const MAX_IDS_PER_FORMULA: usize = 50;

#[derive(Debug, Deserialize)]
struct Page {
    records: Vec<RawRecord>,
    #[serde(default)]
    offset: Option<String>,
}

/// Record store backed by an Airtable base.
#[derive(Clone)]
pub struct AirtableStore {
    client: Client,
    base_url: Url,
    base_id: String,
    api_key: String,
}

impl AirtableStore {
    pub fn new(config: &AppConfig) -> Result<Self, StoreError> {
        Self::with_endpoint(
            &config.airtable_api_url,
            &config.airtable_base_id,
            &config.airtable_api_key,
        )
    }

    pub fn with_endpoint(api_url: &str, base_id: &str, api_key: &str) -> Result<Self, StoreError> {
        let base_url =
            Url::parse(api_url).map_err(|e| StoreError::InvalidUrl(format!("{api_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::InvalidUrl(api_url.to_string()));
        }

        Ok(Self {
            client: Client::new(),
            base_url,
            base_id: base_id.to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push(&self.base_id)
            .extend(segments);
        Ok(url)
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, StoreError> {
        let response = request.bearer_auth(&self.api_key).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<T>().await?)
    }

    /// All records in `table` matching `formula`, following pagination.
    pub async fn records_with_filter(
        &self,
        table: &str,
        formula: &str,
    ) -> Result<Vec<RawRecord>, StoreError> {
        let url = self.endpoint(&[table])?;
        let mut records = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(url.clone())
                .query(&[("filterByFormula", formula)]);
            if let Some(offset) = &offset {
                request = request.query(&[("offset", offset)]);
            }

            let page: Page = self.fetch(request).await?;
            records.extend(page.records);

            match page.offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        tracing::debug!(table, count = records.len(), "Fetched records");
        Ok(records)
    }

    /// All records in `table` whose `Status` equals `status`.
    pub async fn records_with_status(
        &self,
        table: &str,
        status: &str,
    ) -> Result<Vec<RawRecord>, StoreError> {
        self.records_with_filter(table, &formula::field_equals("Status", status))
            .await
    }

    /// A single record by id.
    pub async fn get_record(&self, table: &str, id: &str) -> Result<RawRecord, StoreError> {
        let url = self.endpoint(&[table, id])?;
        match self.fetch(self.client.get(url)).await {
            Err(StoreError::Status { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Err(StoreError::NotFound(format!("{table}/{id}")))
            }
            other => other,
        }
    }
}

#[async_trait]
impl RecordStore for AirtableStore {
    async fn bulk_delivery_tickets(&self) -> Result<Vec<Ticket>, StoreError> {
        let records = self
            .records_with_status(INTAKE_TABLE, BULK_DELIVERY_CONFIRMED)
            .await?;
        decode_all(&records)
    }

    async fn routes_for_date(&self, date: NaiveDate) -> Result<Vec<Route>, StoreError> {
        let records = self
            .records_with_filter(
                BULK_ROUTES_TABLE,
                &formula::same_day("Delivery Date", date),
            )
            .await?;
        decode_all(&records)
    }

    async fn route_by_name(&self, date: NaiveDate, name: &str) -> Result<Vec<Route>, StoreError> {
        let filter = formula::and(&[
            formula::same_day("Delivery Date", date),
            formula::field_equals("Name", name),
        ]);
        let records = self.records_with_filter(BULK_ROUTES_TABLE, &filter).await?;
        decode_all(&records)
    }

    async fn tickets_for_routes(&self, routes: &[Route]) -> Result<Vec<Ticket>, StoreError> {
        let ids: Vec<&str> = routes
            .iter()
            .flat_map(|r| r.ticket_refs.iter().map(String::as_str))
            .collect();

        let mut tickets = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(MAX_IDS_PER_FORMULA) {
            let records = self
                .records_with_filter(INTAKE_TABLE, &formula::record_id_in(chunk))
                .await?;
            tickets.extend(decode_all::<Ticket>(&records)?);
        }
        Ok(tickets)
    }

    async fn volunteer(&self, id: &str) -> Result<Volunteer, StoreError> {
        let record = self.get_record(VOLUNTEER_FORM_TABLE, id).await?;
        Volunteer::from_record(&record)
    }
}
