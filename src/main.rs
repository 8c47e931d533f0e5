use pp_core::NavigationState;
use pp_runtime::{build_runtime, init_tracing_subscriber, resolve_config};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional; SENTRY_DSN, RUST_LOG and PAWPOINT_CONFIG may live there
    let _ = dotenvy::dotenv();

    let config = resolve_config()?;

    if let Err(e) = init_tracing_subscriber(&config.log_dir) {
        eprintln!("Failed to initialize tracing: {e:#}");
    }

    info!(data_dir = %config.data_dir.display(), "starting pawpoint");

    let runtime = build_runtime(&config)?;
    let mut routes = runtime.subscribe_navigation();
    runtime.init().await;

    let initial: Option<NavigationState> = routes.borrow_and_update().clone();
    if let Some(state) = initial {
        info!(route = ?state.route, stack = ?state.stack, "route resolved");
    }

    loop {
        tokio::select! {
            changed = routes.changed() => {
                if changed.is_err() {
                    error!("navigation resolver stopped");
                    break;
                }
                let current: Option<NavigationState> = routes.borrow_and_update().clone();
                if let Some(state) = current {
                    info!(route = ?state.route, stack = ?state.stack, "route changed");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested");
                break;
            }
        }
    }

    runtime.dispose().await;
    Ok(())
}
