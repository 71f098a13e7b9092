#[tokio::main]
async fn main() -> std::process::ExitCode {
    match edupulse_lib::run().await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("EduPulse failed: {e}");
            eprintln!("EduPulse failed: {e}");
            std::process::ExitCode::FAILURE
        }
    }
}
