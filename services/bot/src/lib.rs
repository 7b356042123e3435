mod cli;
mod demo;
mod dispatch;
mod infra;
mod serve;

use gatehouse::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
