use std::net::SocketAddr;

use anyhow::Context;

use crate::agent::Agent;
use crate::infra::config::AppConfig;

pub async fn run_server(cfg: AppConfig) -> anyhow::Result<()> {
    cfg.validate()?;
    tracing::info!(
        mode = %cfg.server.mode,
        port = cfg.server.port,
        planner = %cfg.planner.model,
        "BOOT planner-agent"
    );

    let agent = Agent::from_config(&cfg).context("building agent")?;

    if cfg.server.mode == "stdio" {
        crate::infra::runtime::mcp_transport::serve_stdio(crate::infra::mcp::make_factory(agent))
            .await
            .map_err(|e| anyhow::anyhow!(e))?;
        return Ok(());
    }

    let app = crate::infra::http_app::build_app(agent);
    let addr: SocketAddr = ([0, 0, 0, 0], cfg.server.port).into();
    tracing::info!(%addr, "listening");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}
