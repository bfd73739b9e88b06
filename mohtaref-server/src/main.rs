use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            return Err(err.into());
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let (app, settings) = mohtaref_server::app::site_app()?;
    let state = mohtaref_server::app::open_state(&settings).await?;
    let ax = mohtaref_server::build(app, state)?;

    let addr = settings.addr();
    println!("[mohtaref] listening on http://{addr}");

    ax.listen(addr).await?;

    Ok(())
}
