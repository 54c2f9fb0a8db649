use anyhow::Result;
use clap::Parser;
use rcj_cli::{cli::Cli, logging::setup_logging, MatchRunner};
use rcj_referee::{LogConsole, TickOutcome};
use rcj_webui::{ConsoleBridge, UiConfig};
use tokio::{
    sync::broadcast,
    time::{interval, Duration, MissedTickBehavior},
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (_guard, log_file) = setup_logging(&cli.log_level, cli.log_directory.as_deref())?;
    tracing::info!("Saving logs to {}", log_file.display());

    let settings = cli.settings();
    let mut bridge = (!cli.no_webui).then(ConsoleBridge::new);
    let supervisor = match &bridge {
        Some(bridge) => cli.supervisor(&settings, bridge.console()),
        None => cli.supervisor(&settings, LogConsole),
    };
    let mut runner = MatchRunner::new(settings.clone(), supervisor, &cli.blue, &cli.yellow);

    let (stop_tx, _) = broadcast::channel(1);
    let webui_task = bridge.as_ref().map(|bridge| {
        let config = UiConfig {
            port: cli.webui_port,
            ..Default::default()
        };
        tokio::spawn(rcj_webui::start(config, bridge.state(), stop_tx.subscribe()))
    });

    let mut ticker = interval(Duration::from_millis(settings.time_step_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut ticks = 0u64;
    loop {
        let wait = async {
            if cli.fast {
                tokio::task::yield_now().await;
            } else {
                ticker.tick().await;
            }
        };
        tokio::select! {
            _ = &mut ctrl_c => {
                tracing::info!("Shutting down");
                break;
            }
            _ = wait => {}
        }

        let command = bridge.as_mut().and_then(|bridge| bridge.try_next_command());
        match runner.tick(command.as_deref()) {
            TickOutcome::GameOver if cli.loop_matches => {
                tracing::info!("Match over, starting the next one");
                runner.restart_match();
            }
            TickOutcome::GameOver | TickOutcome::Finished if bridge.is_none() => {
                tracing::info!("Match over");
                break;
            }
            _ => {}
        }

        ticks += 1;
        if cli.ticks.is_some_and(|max| ticks >= max) {
            tracing::info!("Stopping after {} ticks", ticks);
            break;
        }
    }

    let _ = stop_tx.send(());
    if let Some(task) = webui_task {
        match task.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::error!("Webui failed: {:#}", err),
            Err(err) => tracing::error!("Webui task failed: {}", err),
        }
    }

    Ok(())
}
