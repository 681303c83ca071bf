/*
 * This file is part of cprofan.
 *
 * Copyright (C) 2025 cprofan contributors
 *
 * cprofan is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * cprofan is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with cprofan. If not, see <https://www.gnu.org/licenses/>.
 */

mod cli;

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{debug, info};

use cprofan::config::{config_path, load_config, save_config};
use cprofan::hwmon::HwmonAttr;
use cprofan::logger;
use cprofan::sim::SimulatedCommander;
use cprofan::transport::Transport;
use cprofan::usb::UsbTransport;
use cprofan::{CommanderPro, DriverConfig};

use cli::{Cli, Commands};

fn parse_attr(name: &str) -> Result<HwmonAttr> {
    match HwmonAttr::parse(name) {
        Some(attr) => Ok(attr),
        None => bail!("Unknown attribute '{}'", name),
    }
}

/// 1-based fan number from the command line to a channel index
fn fan_channel(fan: usize) -> Result<usize> {
    match fan.checked_sub(1) {
        Some(ch) => Ok(ch),
        None => bail!("Fan numbers start at 1"),
    }
}

/// Apply a fan enable change to the device and keep it in the config file
fn switch_fan(
    dev: &CommanderPro<Box<dyn Transport>>,
    config: &mut DriverConfig,
    config_file: &Path,
    channel: usize,
    enabled: bool,
) -> Result<()> {
    dev.set_fan_enabled(channel, enabled)?;
    config.set_fan_enabled(channel, enabled)?;
    save_config(config_file, config)
        .with_context(|| format!("saving {}", config_file.display()))?;
    debug!(channel, enabled, path = %config_file.display(), "Fan enable saved");
    Ok(())
}

fn run(
    dev: &CommanderPro<Box<dyn Transport>>,
    config: &mut DriverConfig,
    config_file: &Path,
    command: Commands,
) -> Result<()> {
    match command {
        Commands::Status => {
            for attr in dev.attributes() {
                let value = match dev.read_string(attr) {
                    Ok(v) => v,
                    Err(e) if e.is_no_data() => "-".to_string(),
                    Err(e) => return Err(e).with_context(|| format!("reading {}", attr)),
                };
                println!("{:<14} {}", attr.to_string(), value);
            }
        }
        Commands::Attrs => {
            for attr in dev.attributes() {
                let mode = dev.attr_mode(attr).unwrap_or_default();
                println!("{:04o} {}", mode, attr);
            }
        }
        Commands::Read { attr } => {
            let attr = parse_attr(&attr)?;
            let value = dev.read_string(attr).with_context(|| format!("reading {}", attr))?;
            println!("{}", value);
        }
        Commands::Write { attr, value } => {
            let attr = parse_attr(&attr)?;
            dev.write(attr, value).with_context(|| format!("writing {}", attr))?;
            if let HwmonAttr::FanEnable(channel) = attr {
                switch_fan(dev, config, config_file, channel, value == 1)?;
            }
        }
        Commands::SetPwm { fan, value } => {
            let channel = fan_channel(fan)?;
            dev.set_pwm(channel, value)
                .with_context(|| format!("setting fan {} duty", fan))?;
            info!("Fan {} set to {}", fan, value);
        }
        Commands::FanEnable { fan, state } => {
            let channel = fan_channel(fan)?;
            switch_fan(dev, config, config_file, channel, state.is_on())
                .with_context(|| format!("switching fan {}", fan))?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init_logging(cli.log_level.as_deref());

    let mut config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    let config_file = cli.config.clone().unwrap_or_else(config_path);
    debug!(?config, "Configuration");

    let transport: Box<dyn Transport> = if cli.simulate {
        info!("Using simulated Commander Pro");
        Box::new(SimulatedCommander::demo())
    } else {
        Box::new(UsbTransport::open(&config).context("Failed to open Commander Pro")?)
    };

    let dev = CommanderPro::attach_with_config(transport, &config)
        .context("Failed to attach to Commander Pro")?;

    run(&dev, &mut config, &config_file, cli.command)
}
