//! `facility-export` -- headless CSV exporter.
//!
//! Pages through one resource on the facility backend with the same filters
//! the list screens send and writes every matching row to a CSV file.
//!
//! # Environment variables
//!
//! | Variable               | Required | Default      | Description                          |
//! |------------------------|----------|--------------|--------------------------------------|
//! | `FACILITY_BASE_URL`    | yes      | --           | Backend host, e.g. `https://fm.example.com` |
//! | `FACILITY_TOKEN`       | yes      | --           | Bearer token for the session         |
//! | `EXPORT_RESOURCE`      | yes      | --           | Resource name, e.g. `tickets`        |
//! | `EXPORT_FILTERS`       | no       | (none)       | `field_predicate=value,...`          |
//! | `EXPORT_OUTPUT`        | no       | `export.csv` | Output path                          |
//! | `EXPORT_PAGE_SIZE`     | no       | `100`        | Rows per request                     |
//! | `REQUEST_TIMEOUT_SECS` | no       | `30`         | Per-request timeout                  |

use anyhow::Context;
use facility_export::config::ExportConfig;
use facility_export::runner;
use facility_gateway::config::{GatewayConfig, SessionConfig, SessionSource};
use facility_gateway::GatewayClient;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "facility_export=info,facility_gateway=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let export = ExportConfig::from_env().context("invalid export configuration")?;
    let gateway_config = GatewayConfig::from_env().context("invalid gateway configuration")?;
    let session = SessionConfig::from_env().context("FACILITY_BASE_URL and FACILITY_TOKEN are required")?;

    tracing::info!(
        base_url = %session.base_url(),
        resource = %export.resource,
        output = %export.output.display(),
        "Starting facility-export",
    );

    let client = GatewayClient::new(&gateway_config, SessionSource::Fixed(session))?;
    let summary = runner::run_export(&client, &export).await?;

    println!(
        "Exported {} {} to {} at {}",
        summary.rows,
        summary.resource.label().to_lowercase(),
        summary.output.display(),
        summary.finished_at.to_rfc3339(),
    );
    Ok(())
}
