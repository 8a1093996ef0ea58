// src/cli/serve.rs — `review-eval serve`

pub async fn run_serve(port: u16) -> anyhow::Result<i32> {
    println!("Health endpoint on http://127.0.0.1:{port}/health");
    crate::api::start_server(port).await?;
    Ok(0)
}
