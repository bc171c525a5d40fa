use std::{
    env,
    path::{Path, PathBuf},
    process,
};

use anyhow::Result;
use clap::{Parser, Subcommand};
use fcitx_im_client::{
    signal::Signals,
    transport::{BusType, Transport},
    FcitxInputMethod, InputMethodList,
};
use futures_util::StreamExt;

use crate::config::Config;

mod config;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The path of config file.
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// The bus the daemon is on: session, system or starter.
    #[arg(long)]
    bus: Option<BusType>,

    /// The display number the daemon is serving.
    #[arg(short, long)]
    display: Option<i32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current input method.
    Current,
    /// Switch to an input method.
    SetCurrent { im: String },
    /// Print the configured input methods.
    List,
    /// Enable an input method in the list.
    Enable { im: String },
    /// Disable an input method in the list.
    Disable { im: String },
    /// Move an input method to a position in the list.
    Move { im: String, index: usize },
    /// Print the addon providing an input method.
    Addon { im: String },
    /// Open the configuration tool.
    Configure,
    /// Open the configuration of an addon.
    ConfigureAddon { addon: String },
    /// Reload the configuration of the daemon.
    Reload,
    /// Restart the daemon.
    Restart,
    /// Ask the daemon to exit.
    Exit,
    /// Print the list whenever it changes, until interrupted.
    Watch,
}

fn config_path(args: &Args) -> Result<PathBuf> {
    if let Ok(path) = env::var("FCITX_IM_CTL_CONFIG") {
        Ok(Path::new(&path).to_path_buf())
    } else if let Some(path) = &args.config {
        Ok(path.clone())
    } else if let Ok(home_path) = env::var("HOME") {
        let mut buf = PathBuf::new();
        buf.push(home_path);
        buf.push(".config/fcitx-im-ctl/config.toml");
        Ok(buf)
    } else {
        anyhow::bail!("can't get the path of config file, specify it by -c or FCITX_IM_CTL_CONFIG");
    }
}

fn print_list(list: &InputMethodList) {
    for item in list {
        println!(
            "[{}] {}\t{}\t{}",
            if item.enable() { "x" } else { " " },
            item.unique_name(),
            item.name(),
            item.lang_code()
        );
    }
}

async fn fetch_list(im: &FcitxInputMethod) -> Result<InputMethodList> {
    im.im_list()
        .await
        .ok_or_else(|| anyhow::anyhow!("unable to get the input method list"))
}

async fn update_list<F>(im: &FcitxInputMethod, name: &str, update: F) -> Result<()>
where
    F: FnOnce(&InputMethodList) -> Option<InputMethodList>,
{
    let list = fetch_list(im).await?;
    let updated =
        update(&list).ok_or_else(|| anyhow::anyhow!("input method is not in the list: {name}"))?;
    im.set_im_list(&updated).await;
    Ok(())
}

async fn watch(im: &FcitxInputMethod) -> Result<()> {
    let mut subscription = im.subscribe_im_list_changed().await?;
    let mut signals = Signals::try_default()?;
    loop {
        tokio::select! {
            kind = &mut signals => {
                tracing::info!("stopping by signal: {:?}", kind);
                break;
            }
            changed = subscription.next() => {
                if changed.is_none() {
                    tracing::warn!("notification stream is closed");
                    break;
                }
                match im.im_list().await {
                    Some(list) => {
                        print_list(&list);
                        println!();
                    }
                    None => tracing::warn!("IMList changed, but it can't be fetched"),
                }
            }
        }
    }
    subscription.cancel();
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let config = Config::new(&config_path(&args)?)?;

    let _log_guard = fcitx_im_client::log::init_log(
        config.log_directives(),
        config.log_timestamp().unwrap_or(false),
    )?;

    let bus_type = args.bus.unwrap_or(config.bus());
    let display_number = args
        .display
        .unwrap_or_else(|| config.resolved_display_number());
    tracing::debug!(
        "bus: {}, display number: {}, flags: {:?}",
        bus_type,
        display_number,
        config.flags()
    );
    let transport = Transport::connect(bus_type, config.flags(), display_number).await?;
    let im = FcitxInputMethod::new_with_transport(&transport).await?;

    match args.command {
        Command::Current => match im.current_im().await {
            Some(current) => println!("{current}"),
            None => anyhow::bail!("unable to get the current input method"),
        },
        Command::SetCurrent { im: name } => im.set_current_im(&name).await,
        Command::List => print_list(&fetch_list(&im).await?),
        Command::Enable { im: name } => {
            update_list(&im, &name, |list| list.with_enabled(&name, true)).await?
        }
        Command::Disable { im: name } => {
            update_list(&im, &name, |list| list.with_enabled(&name, false)).await?
        }
        Command::Move { im: name, index } => {
            update_list(&im, &name, |list| list.moved(&name, index)).await?
        }
        Command::Addon { im: name } => match im.im_addon(&name).await {
            Some(addon) => println!("{addon}"),
            None => anyhow::bail!("unable to get the addon of {name}"),
        },
        Command::Configure => im.configure().await,
        Command::ConfigureAddon { addon } => im.configure_addon(&addon).await,
        Command::Reload => im.reload_config().await,
        Command::Restart => im.restart().await,
        Command::Exit => im.exit().await,
        Command::Watch => watch(&im).await?,
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    if let Err(e) = run(args).await {
        eprintln!("run command failed: {e:?}");
        process::exit(1);
    }
}
