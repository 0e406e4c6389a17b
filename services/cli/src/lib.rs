mod cli;
mod report;
mod session;

use easy_apply::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
