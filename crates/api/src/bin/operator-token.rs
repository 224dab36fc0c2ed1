#!/usr/bin/env cargo
//! Operator token utility for multisite
//!
//! Issues an operator bearer token signed with OPERATOR_JWT_SECRET, for scripting
//! calls to the backend multisite endpoints (e.g. cache invalidation after a deploy).
//!
//! Usage:
//!   cargo run --bin operator-token
//!   cargo run --bin operator-token 464

use multisite_api::auth::JwtManager;
use multisite_shared::{Operator, SiteId};
use std::env;
use uuid::Uuid;

/// Short-lived: these tokens are meant for one-off scripted calls
const TOKEN_EXPIRY_HOURS: i64 = 1;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let secret = env::var("OPERATOR_JWT_SECRET")
        .map_err(|_| "OPERATOR_JWT_SECRET must be set")?;
    if secret.len() < 32 {
        return Err("OPERATOR_JWT_SECRET must be at least 32 characters".into());
    }

    let site_id = match env::args().nth(1) {
        Some(arg) => Some(SiteId(arg.parse::<i64>().map_err(|_| "site id must be an integer")?)),
        None => None,
    };

    let operator = Operator {
        id: Uuid::new_v4(),
        site_id,
    };
    let token = JwtManager::new(&secret, TOKEN_EXPIRY_HOURS).generate_token(&operator)?;

    eprintln!("Operator {} (site: {:?})", operator.id, operator.site_id);
    println!("{}", token);

    Ok(())
}
