//! Status command - probes a running service.

use anyhow::Result;
use driftdrop_core::Config;

pub async fn execute(addr: Option<String>) -> Result<()> {
    let addr = match addr {
        Some(addr) => addr,
        None => Config::load_with_env()?.bind_addr,
    };

    println!("driftdrop daemon status");
    println!("=======================");
    println!();

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()?;

    let health_url = format!("http://{addr}/api/health");
    match client.get(&health_url).send().await {
        Ok(resp) if resp.status().is_success() => {
            println!("Status:  \x1b[32m● Running\x1b[0m");
            println!("Address: {addr}");

            let users_url = format!("http://{addr}/api/active-users");
            if let Ok(resp) = client.get(&users_url).send().await {
                if let Ok(body) = resp.json::<serde_json::Value>().await {
                    let count = body["users"].as_array().map(|u| u.len()).unwrap_or(0);
                    println!("Peers:   {count} online");
                }
            }
        }
        _ => {
            println!("Status:  \x1b[31m○ Not reachable\x1b[0m");
            println!("Address: {addr}");
        }
    }

    Ok(())
}
