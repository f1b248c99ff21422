use std::env;

use heating_schedule::{HubClient, JsonConfigStore, Scheduler};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let address = args.get(1).expect("usage: run <address> <token> [config.json]");
    let token = args.get(2).expect("usage: run <address> <token> [config.json]");
    let config_path = args.get(3).map(String::as_str).unwrap_or("config.json");

    let client = HubClient::builder(address).token(token).build();
    let store = JsonConfigStore::new(config_path);

    println!("Starting heating schedule against {address}...");
    Scheduler::new(client, store).run().await
}
