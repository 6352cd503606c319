use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    planner_agent::infra::logging::init();
    planner_agent::cli::run().await
}
