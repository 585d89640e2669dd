//! Dispatch coordinator. Runs the pipeline end to end.
//!
//! 1. Load the delivery units for the requested date (routes or clusters)
//! 2. For every unit concurrently: fetch tickets, resolve the volunteer, render
//! 3. Print (dry run) or send every rendered document concurrently
//!
//! A unit that fails grouping or validation gets no notification and is
//! reported; sibling units carry on. A route with no tickets is skipped. A failed send is logged and reported
//! without stopping the other sends.

use std::sync::Arc;

use chrono::NaiveDate;
use futures::future::join_all;
use tracing::Instrument;
use uuid::Uuid;

use courier_common::error::{AppError, StoreError, TransportError};
use courier_common::types::{DeliveryUnit, GroupingMode, NotificationDocument, Route};
use courier_notifier::Transport;
use courier_store::RecordStore;

use crate::grouper::{partition_by_cluster, route_unit};
use crate::renderer::Renderer;
use crate::validator::resolve_volunteer;

/// Parameters of a single dispatch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchPlan {
    pub delivery_date: NaiveDate,
    /// Restrict the run to one route name (route mode) or cluster id (cluster mode).
    pub unit_name: Option<String>,
    pub mode: GroupingMode,
    pub dry_run: bool,
}

/// A unit (or, for grouping errors, a ticket) that produced no notification.
#[derive(Debug)]
pub struct UnitFailure {
    pub unit: String,
    pub error: AppError,
}

/// A rendered document the transport did not accept.
#[derive(Debug)]
pub struct SendFailure {
    pub unit: String,
    pub recipients: Vec<String>,
    pub error: TransportError,
}

/// Outcome of a dispatch run.
#[derive(Debug, Default)]
pub struct DispatchReport {
    pub documents: Vec<NotificationDocument>,
    pub failed_units: Vec<UnitFailure>,
    /// Units left out because they have nothing to deliver.
    pub skipped_units: Vec<String>,
    pub sent: usize,
    pub failed_sends: Vec<SendFailure>,
    pub dry_run: bool,
}

impl DispatchReport {
    /// True when every unit rendered and every send was accepted.
    pub fn is_success(&self) -> bool {
        self.failed_units.is_empty() && self.failed_sends.is_empty()
    }
}

enum Prepared {
    Document(NotificationDocument),
    Empty(String),
}

type UnitOutcome = Result<Prepared, UnitFailure>;

/// Drives grouping, validation, rendering and delivery for one run.
pub struct Dispatcher {
    store: Arc<dyn RecordStore>,
    transport: Option<Arc<dyn Transport>>,
    renderer: Renderer,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn RecordStore>, renderer: Renderer) -> Self {
        Self {
            store,
            transport: None,
            renderer,
        }
    }

    /// Set the transport used for live runs. Dry runs never touch it.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Run the pipeline.
    ///
    /// Only a missing transport on a live run, or a failure to load the unit
    /// list, aborts the run. Everything else is collected in the report.
    pub async fn run(&self, plan: &DispatchPlan) -> Result<DispatchReport, AppError> {
        if !plan.dry_run && self.transport.is_none() {
            return Err(AppError::Config(
                "a transport is required unless running dry".to_string(),
            ));
        }

        let span = tracing::info_span!(
            "dispatch",
            run_id = %Uuid::new_v4(),
            mode = %plan.mode,
            delivery_date = %plan.delivery_date,
            dry_run = plan.dry_run,
        );
        self.run_inner(plan).instrument(span).await
    }

    async fn run_inner(&self, plan: &DispatchPlan) -> Result<DispatchReport, AppError> {
        let outcomes = match plan.mode {
            GroupingMode::Route => self.prepare_routes(plan).await?,
            GroupingMode::Cluster => self.prepare_clusters(plan).await?,
        };

        let mut report = DispatchReport {
            dry_run: plan.dry_run,
            ..Default::default()
        };
        for outcome in outcomes {
            match outcome {
                Ok(Prepared::Document(document)) => report.documents.push(document),
                Ok(Prepared::Empty(unit)) => {
                    tracing::warn!(
                        unit = %unit,
                        "Unit has no tickets, no notification will be sent"
                    );
                    report.skipped_units.push(unit);
                }
                Err(failure) => {
                    tracing::error!(
                        unit = %failure.unit,
                        error = %failure.error,
                        "Unit failed, no notification will be sent"
                    );
                    report.failed_units.push(failure);
                }
            }
        }

        tracing::info!(
            rendered = report.documents.len(),
            failed = report.failed_units.len(),
            skipped = report.skipped_units.len(),
            "Rendered notifications"
        );

        let transport = match &self.transport {
            Some(transport) if !plan.dry_run => transport.as_ref(),
            _ => {
                tracing::info!("Dry run, skipping delivery");
                return Ok(report);
            }
        };

        let results = join_all(
            report
                .documents
                .iter()
                .map(|document| async move { (document, transport.send(document).await) }),
        )
        .await;

        for (document, result) in results {
            match result {
                Ok(()) => report.sent += 1,
                Err(error) => {
                    tracing::error!(
                        unit = %document.unit,
                        recipients = ?document.to,
                        transport = transport.name(),
                        error = %error,
                        body = error.body().unwrap_or_default(),
                        "Failed to send notification"
                    );
                    report.failed_sends.push(SendFailure {
                        unit: document.unit.clone(),
                        recipients: document.to.clone(),
                        error,
                    });
                }
            }
        }

        tracing::info!(
            sent = report.sent,
            failed = report.failed_sends.len(),
            "Dispatch complete"
        );
        Ok(report)
    }

    async fn prepare_routes(&self, plan: &DispatchPlan) -> Result<Vec<UnitOutcome>, StoreError> {
        let routes = match &plan.unit_name {
            Some(name) => self.store.route_by_name(plan.delivery_date, name).await?,
            None => self.store.routes_for_date(plan.delivery_date).await?,
        };

        if routes.is_empty() {
            tracing::warn!(route = ?plan.unit_name, "No routes found");
        }

        let outcomes = join_all(routes.iter().map(|route| async move {
            self.route_document(route)
                .await
                .map_err(|error| UnitFailure {
                    unit: route.name.clone(),
                    error,
                })
        }))
        .await;
        Ok(outcomes)
    }

    async fn route_document(&self, route: &Route) -> Result<Prepared, AppError> {
        let routes = std::slice::from_ref(route);
        let tickets = self.store.tickets_for_routes(routes).await?;
        let unit = route_unit(route, tickets);
        if unit.tickets.is_empty() {
            return Ok(Prepared::Empty(unit.name));
        }
        self.render_unit(&unit).await.map(Prepared::Document)
    }

    async fn prepare_clusters(&self, plan: &DispatchPlan) -> Result<Vec<UnitOutcome>, StoreError> {
        let tickets = self.store.bulk_delivery_tickets().await?;
        let partition = partition_by_cluster(tickets);

        let (rejected, unrelated): (Vec<_>, Vec<_>) =
            partition.rejected.into_iter().partition(|error| {
                plan.unit_name
                    .as_ref()
                    .is_none_or(|name| error.units.contains(name))
            });
        for error in unrelated {
            tracing::warn!(
                ticket = %error.ticket_id,
                error = %error,
                "Ticket outside the requested cluster can't be grouped"
            );
        }

        let mut outcomes: Vec<UnitOutcome> = rejected
            .into_iter()
            .map(|error| {
                Err(UnitFailure {
                    unit: format!("ticket {}", error.ticket_id),
                    error: error.into(),
                })
            })
            .collect();

        let units: Vec<DeliveryUnit> = match &plan.unit_name {
            Some(name) => partition
                .units
                .into_iter()
                .filter(|unit| &unit.id == name)
                .collect(),
            None => partition.units,
        };

        if units.is_empty() {
            tracing::warn!(cluster = ?plan.unit_name, "No clusters found");
        }

        outcomes.extend(
            join_all(units.iter().map(|unit| async move {
                self.render_unit(unit)
                    .await
                    .map(Prepared::Document)
                    .map_err(|error| UnitFailure {
                        unit: unit.name.clone(),
                        error,
                    })
            }))
            .await,
        );
        Ok(outcomes)
    }

    async fn render_unit(&self, unit: &DeliveryUnit) -> Result<NotificationDocument, AppError> {
        let volunteer = resolve_volunteer(self.store.as_ref(), unit).await?;
        let document = self.renderer.render(&volunteer, unit);

        tracing::info!(
            unit = %unit.name,
            tickets = unit.tickets.len(),
            volunteer = %volunteer.id,
            "Rendered notification"
        );
        Ok(document)
    }
}
