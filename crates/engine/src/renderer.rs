//! Notification renderer: turns a volunteer and their delivery unit into an email.
//!
//! Rendering is a pure function of its inputs. The Markdown body is kept as
//! the plain-text part and converted to HTML (with task-list checkboxes) for
//! the rich part.

use pulldown_cmark::{Options, Parser, html};

use courier_common::config::AppConfig;
use courier_common::maps::google_maps_url;
use courier_common::types::{DeliveryUnit, NotificationDocument, Ticket, Volunteer};

/// Separates ticket blocks.
pub const TICKET_SEPARATOR: &str = "---";

/// Fixed, non-ticket content of every notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSettings {
    pub from: String,
    pub ops_email: String,
    pub ops_phone: String,
    pub warehouse_address: String,
    pub completion_form_url: String,
    pub default_arrival_time: String,
}

impl From<&AppConfig> for RenderSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            from: config.email_from.clone(),
            ops_email: config.ops_email.clone(),
            ops_phone: config.ops_phone.clone(),
            warehouse_address: config.warehouse_address.clone(),
            completion_form_url: config.completion_form_url.clone(),
            default_arrival_time: config.default_arrival_time.clone(),
        }
    }
}

/// Renders notification documents from validated units.
#[derive(Debug, Clone)]
pub struct Renderer {
    settings: RenderSettings,
}

impl Renderer {
    pub fn new(settings: RenderSettings) -> Self {
        Self { settings }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(RenderSettings::from(config))
    }

    pub fn subject(volunteer: &Volunteer) -> String {
        match volunteer.first_name() {
            Some(first) => format!("{first}, here are your bulk delivery instructions"),
            None => "Here are your bulk delivery instructions".to_string(),
        }
    }

    /// Render the notification for `volunteer` delivering `unit`.
    pub fn render(&self, volunteer: &Volunteer, unit: &DeliveryUnit) -> NotificationDocument {
        let text = self.render_text(volunteer, unit);
        let html = markdown_to_html(&text);

        NotificationDocument {
            unit: unit.name.clone(),
            from: self.settings.from.clone(),
            to: vec![volunteer.email.clone()],
            cc: vec![self.settings.ops_email.clone()],
            reply_to: Some(self.settings.ops_email.clone()),
            subject: Self::subject(volunteer),
            text,
            html,
        }
    }

    /// Markdown body: greeting, summary, pickup, checklist, then one block per ticket.
    pub fn render_text(&self, volunteer: &Volunteer, unit: &DeliveryUnit) -> String {
        let mut blocks = vec![
            format!("Hi {}!", volunteer.first_name().unwrap_or("there")),
            "Thank you for volunteering to deliver groceries to our neighbors!".to_string(),
            format!(
                "You're delivering **{}**, which covers the following tickets: {}",
                unit.name,
                unit.ticket_ids().join(", ")
            ),
            self.pickup_block(unit),
            self.checklist_block(),
        ];
        blocks.extend(
            unit.tickets
                .iter()
                .map(|ticket| format!("{TICKET_SEPARATOR}\n\n{}", ticket_block(ticket))),
        );

        let mut text = blocks.join("\n\n");
        text.push('\n');
        text
    }

    fn pickup_block(&self, unit: &DeliveryUnit) -> String {
        let arrival = unit
            .arrival_time
            .as_deref()
            .unwrap_or(&self.settings.default_arrival_time);
        let warehouse = &self.settings.warehouse_address;

        let mut lines = vec![
            format!(
                "**Location**: [{warehouse}]({})",
                google_maps_url(warehouse)
            ),
            format!("**Arrival time**: {arrival}"),
        ];
        if let Some(date) = unit.delivery_date {
            lines.push(format!("**Delivery date**: {}", date.format("%A, %B %-d, %Y")));
        }

        format!(
            "## Pickup\n\nPlease come to the warehouse to load your car with the boxes for the tickets above.\n\n{}",
            lines.join("<br/>\n")
        )
    }

    fn checklist_block(&self) -> String {
        let phone = &self.settings.ops_phone;
        let form = &self.settings.completion_form_url;
        [
            "## Checklist".to_string(),
            [
                format!("- [ ] Confirm you can make the arrival time, or call us at {phone}"),
                "- [ ] Plan your route from the warehouse to each delivery address".to_string(),
                "- [ ] Call each household on the morning of delivery to confirm they'll be home"
                    .to_string(),
                "- [ ] Load the boxes for every ticket listed above before you leave".to_string(),
                "- [ ] Check off each ticket below as you complete it".to_string(),
                format!("- [ ] Fill out the [Completion Form]({form}) when you're done"),
            ]
            .join("\n"),
            format!(
                "If you cannot complete any of your deliveries, call us at {phone} and we'll take the groceries back and donate them elsewhere."
            ),
        ]
        .join("\n\n")
    }
}

fn joined_or_none(values: &[String]) -> String {
    if values.is_empty() {
        "None".to_string()
    } else {
        values.join(", ")
    }
}

fn ticket_block(ticket: &Ticket) -> String {
    let mut fields = vec![
        format!("**Name**: {}", ticket.requester_name),
        format!(
            "**Address**: [{}]({})",
            ticket.address,
            google_maps_url(&ticket.address)
        ),
        format!("**Phone Number**: {}", ticket.phone_number),
        format!(
            "**Vulnerabilities**: {}",
            joined_or_none(&ticket.vulnerabilities)
        ),
        format!("**Household Size**: {}", ticket.household_size),
        format!("**Grocery List**: {}", joined_or_none(&ticket.grocery_list)),
    ];
    if let Some(items) = &ticket.custom_items {
        fields.push(format!("**Custom Items**: {items}"));
    }
    if let Some(notes) = &ticket.delivery_notes {
        fields.push(format!("**Delivery Notes**: {notes}"));
    }

    format!(
        "### Ticket ID: {}\n\n- [ ] Delivered\n- [ ] Completion form submitted\n\n{}",
        ticket.ticket_id,
        fields.join("<br/>\n")
    )
}

/// Convert Markdown (with task lists) to HTML.
pub fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::ENABLE_TASKLISTS);
    let mut out = String::with_capacity(markdown.len() * 2);
    html::push_html(&mut out, parser);
    out
}
