use parkcast::{api, config, data, model, state};
use std::net::SocketAddr;
use std::sync::Arc;

fn init_tracing() {
    let subscriber = tracing_subscriber::fmt().with_target(false).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    tracing::info!(
        config_path = config::DEFAULT_CONFIG_PATH,
        "parkcast starting"
    );
    let config = config::load_default()?;

    let dataset = data::load_dataset_from_path(config.dataset_path())?;
    tracing::info!(
        zones = dataset.occupancy_history.zone_count(),
        enforcement_keys = dataset.enforcement_history.key_count(),
        lots = dataset.capacities.lots().len(),
        weather_days = dataset.weather.len(),
        "Dataset loaded"
    );

    let occupancy = if config.occupancy_enabled() {
        match config.occupancy_model_path() {
            Some(path) => match model::load_occupancy_bundle(path) {
                Ok(bundle) => {
                    tracing::info!(
                        path = %path.display(),
                        model_type = %bundle.metadata.model_type,
                        features = bundle.metadata.feature_count,
                        "Occupancy model loaded"
                    );
                    Some(bundle)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to load occupancy model, serving without it");
                    None
                }
            },
            None => {
                tracing::warn!("No occupancy model path configured");
                None
            }
        }
    } else {
        tracing::info!("Occupancy model disabled by configuration");
        None
    };

    let enforcement = if config.enforcement_enabled() {
        match config.enforcement_model_path() {
            Some(path) => match model::load_enforcement_bundle(path) {
                Ok(bundle) => {
                    tracing::info!(
                        path = %path.display(),
                        model_type = %bundle.metadata.model_type,
                        features = bundle.metadata.feature_count,
                        "Enforcement model loaded"
                    );
                    Some(bundle)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to load enforcement model, serving without it");
                    None
                }
            },
            None => {
                tracing::warn!("No enforcement model path configured");
                None
            }
        }
    } else {
        tracing::info!("Enforcement model disabled by configuration");
        None
    };

    if occupancy.is_none() && enforcement.is_none() {
        tracing::warn!("No prediction models loaded - prediction endpoints will return errors");
    }

    let state = Arc::new(state::ServiceState::new(dataset, occupancy, enforcement));

    let app = api::router(Arc::clone(&state));
    let port = config.server_port();
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use parkcast::config;

    #[test]
    fn default_config_is_valid_toml() -> Result<(), Box<dyn std::error::Error>> {
        let _config = config::load_default()?;
        Ok(())
    }
}
