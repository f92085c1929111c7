#![deny(clippy::pedantic, clippy::all, clippy::nursery)]
#![allow(clippy::must_use_candidate)]

#[cfg(not(any(target_os = "macos", unix)))]
compile_error!("Only macos and unix are currently supported");

use courier::{config, controller::Courier};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = config::find()?;
    Courier::load(&path)?.run().await
}
