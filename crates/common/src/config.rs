use serde::Deserialize;

const DEFAULT_AIRTABLE_API_URL: &str = "https://api.airtable.com/v0";
const DEFAULT_SENDGRID_API_URL: &str = "https://api.sendgrid.com/v3/mail/send";
const DEFAULT_WAREHOUSE_ADDRESS: &str = "Brooklyn Packers, 221 Bedford Ave, Brooklyn, NY 11211";
const DEFAULT_COMPLETION_FORM_URL: &str = "https://airtable.com/shrvHf4k5lRo0I8F4";
const DEFAULT_ARRIVAL_TIME: &str = "between 1pm and 3pm";

/// Global application configuration loaded once at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Airtable API key
    pub airtable_api_key: String,

    /// Airtable base holding the intake, volunteer and route tables
    pub airtable_base_id: String,

    /// Airtable REST endpoint (default: https://api.airtable.com/v0)
    pub airtable_api_url: String,

    /// SendGrid API key. Only required when messages are actually sent.
    pub sendgrid_api_key: Option<String>,

    /// SendGrid mail send endpoint
    pub sendgrid_api_url: String,

    /// Email sender address
    pub email_from: String,

    /// Operations address, copied on and replying to every message
    pub ops_email: String,

    /// Operations contact phone number shown to volunteers
    pub ops_phone: String,

    /// Warehouse pickup location
    pub warehouse_address: String,

    /// Form volunteers fill out once deliveries are done
    pub completion_form_url: String,

    /// Arrival time used for units that don't carry one
    pub default_arrival_time: String,
}

impl AppConfig {
    /// Load configuration from a `.env` file and environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("{key} environment variable is required"))
        };
        let or_default = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let email_from = required("EMAIL_FROM")?;
        let ops_email = required("OPS_EMAIL")?;
        for (key, value) in [("EMAIL_FROM", &email_from), ("OPS_EMAIL", &ops_email)] {
            if !value.contains('@') {
                anyhow::bail!("{key} must be an email address, got {value:?}");
            }
        }

        Ok(Self {
            airtable_api_key: required("AIRTABLE_API_KEY")?,
            airtable_base_id: required("AIRTABLE_BASE_ID")?,
            airtable_api_url: or_default("AIRTABLE_API_URL", DEFAULT_AIRTABLE_API_URL)
                .trim_end_matches('/')
                .to_string(),
            sendgrid_api_key: lookup("SENDGRID_API_KEY").filter(|v| !v.trim().is_empty()),
            sendgrid_api_url: or_default("SENDGRID_API_URL", DEFAULT_SENDGRID_API_URL),
            email_from,
            ops_email,
            ops_phone: required("OPS_PHONE")?,
            warehouse_address: or_default("WAREHOUSE_ADDRESS", DEFAULT_WAREHOUSE_ADDRESS),
            completion_form_url: or_default("COMPLETION_FORM_URL", DEFAULT_COMPLETION_FORM_URL),
            default_arrival_time: or_default("DEFAULT_ARRIVAL_TIME", DEFAULT_ARRIVAL_TIME),
        })
    }
}
