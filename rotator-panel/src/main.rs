use clap::Parser;
use log::info;
use miette::Result;
use std::time::Duration;
use tokio_graceful_shutdown::{SubsystemBuilder, Toplevel};

use rotator_core::Point;
use rotator_panel::config::Settings;
use rotator_panel::hub::HubClient;
use rotator_panel::panel;
use rotator_panel::stream::Watcher;
use rotator_panel::{Action, Cli, VERSION};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .init();

    let settings = Settings::resolve(&args)?;
    let client = HubClient::new(&settings)?;

    match args.action {
        Action::Watch { .. } => {
            info!("rotator-panel {} writing to {}", VERSION, settings.output_dir.display());
            let watcher = Watcher::new(&settings)?;
            Toplevel::new(|s| async move {
                s.start(SubsystemBuilder::new("Watch", move |subsys| watcher.run(subsys)));
            })
            .catch_signals()
            .handle_shutdown_requests(Duration::from_secs(5))
            .await
            .map_err(|e| miette::miette!("{}", e))?;
        }
        Action::List => {
            print!("{}", panel::list(&client).await?);
        }
        Action::Set {
            name,
            azimuth,
            elevation,
        } => {
            panel::send(&client, panel::set_commands(&name, azimuth, elevation)).await?;
        }
        Action::Stop { name, axis } => {
            panel::send(&client, vec![rotator_core::Command::stop(name, axis)]).await?;
        }
        Action::Click { name, x, y, axis } => {
            panel::click(&client, &settings, &name, axis, Point::new(x, y)).await?;
        }
    }
    Ok(())
}
