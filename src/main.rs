// src/main.rs

//! # Ecosystem Client - Demo Entry Point
//!
//! Walks through the sample flow against a running ecosystem service:
//! 1. Load configuration (`.env`, `essa.toml`, `ESSA_*` variables)
//! 2. Start the session for the demo user (or the next one with `ESSA_NEW_USER`)
//! 3. Log in, earn, spend, and optionally pay another user
//!
//! Each step awaits the previous one and stops at the first failure.
//! See [`ecosystem_client::settings`] for the recognised variables.

use anyhow::Context;
use dotenv::dotenv;
use ecosystem_client::models::user::{generate_user_id, next_user_id};
use ecosystem_client::settings::Settings;
use ecosystem_client::wallet::key_management::AppCredentials;
use ecosystem_client::{ClaimSet, ConfirmationAssertion, EcosystemClient, HttpTransport, SignedRequestBuilder};
use log::warn;
use std::sync::Arc;

const EARN_AMOUNT: u64 = 10;
const SPEND_AMOUNT: u64 = 5;
const PAY_AMOUNT: u64 = 2;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::load().context("loading settings")?;
    let credentials = AppCredentials::from_settings(&settings).context("loading signing key")?;

    let builder = SignedRequestBuilder::new(settings.algorithm, settings.key_id.clone());
    let transport = Arc::new(HttpTransport::new(&settings.service_url));
    let client = EcosystemClient::new(credentials, builder, transport, settings.request_timeout());

    let user = demo_user(&settings);
    let user = client.start(&user)?;
    println!("Ecosystem service: {}", settings.service_url);
    println!("Signed in as:      {user}");

    client.login().await.context("login")?;
    println!("- login confirmed");

    let earned = client
        .earn(EARN_AMOUNT, "Sample earn", "Completed the sample tutorial")
        .await
        .context("earn")?;
    report("earn", &earned);

    let spent = client
        .spend(SPEND_AMOUNT, "Sample spend", "Bought a sample sticker")
        .await
        .context("spend")?;
    report("spend", &spent);

    if let Some(peer) = settings.pay_to_user.as_deref() {
        let paid = client
            .pay_to_user(peer, PAY_AMOUNT, &format!("Pay to {peer}"), "Sample peer payment")
            .await
            .context("pay to user")?;
        report("pay to user", &paid);
    }

    Ok(())
}

fn demo_user(settings: &Settings) -> String {
    let current = settings.user_id.clone().unwrap_or_else(generate_user_id);
    if !settings.new_user {
        return current;
    }
    next_user_id(&current).unwrap_or_else(|| {
        warn!("{current} has no numeric suffix, generating a fresh user");
        generate_user_id()
    })
}

fn report(step: &str, confirmation: &ConfirmationAssertion) {
    match confirmation.peek_claims::<ClaimSet>() {
        Ok(claims) => match claims.offer {
            Some(offer) => println!("- {step} confirmed: offer {} for {} Kin", offer.id, offer.amount),
            None => println!("- {step} confirmed"),
        },
        Err(_) => println!("- {step} confirmed: {confirmation}"),
    }
}
