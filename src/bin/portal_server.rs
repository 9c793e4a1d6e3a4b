use anyhow::{Context, Result};
use cg_portal::config::ServerConfig;
use cg_portal::database::mysql;
use cg_portal::servers::portal::PortalState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_ansi(std::io::IsTerminal::is_terminal(&std::io::stderr()))
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut conf_file = "conf/portal.yaml".to_string();

    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "--h" | "--?" | "/?" => {
                println!("Usage: portal_server [--conf FILE]");
                return Ok(());
            }
            "--conf" => {
                if i + 1 < args.len() {
                    i += 1;
                    conf_file = args[i].clone();
                } else {
                    eprintln!("Error: --conf requires a FILE argument");
                    return Ok(());
                }
            }
            _ => {}
        }
        i += 1;
    }

    let config = ServerConfig::from_file(&conf_file)
        .with_context(|| format!("Cannot load config: {}", conf_file))?;

    // Connections open lazily; the first request pays for the handshake.
    let pool = mysql::pool_from_config(&config);
    let state = PortalState::from_config(pool, &config)?;

    tracing::info!(
        "[portal] [started] db={}:{}/{} charset={} pool={}",
        config.sql_ip,
        config.sql_port,
        config.sql_db,
        state.gateway.bridge().charset(),
        config.pool_size
    );

    state.run(&config.http_addr()).await?;
    Ok(())
}
