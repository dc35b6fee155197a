#[macro_use]
extern crate log;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate bitflags;

mod atoms;
mod client;
mod config;
mod decorator;
mod display;
mod error;
mod frame;
mod geometry;
mod icon;
mod input;
mod monitor;
mod protocol;
mod shell;
mod strut;
mod theme;
mod wm;

use wm::Rdwm;

fn main() {
    env_logger::builder()
        .write_style(env_logger::WriteStyle::Auto)
        .init();

    match Rdwm::init() {
        Ok(mut rdwm) => {
            info!("rdwm started");
            rdwm.run();
        }
        Err(e) => {
            error!("rdwm failed to start: {}", e);
            std::process::exit(1);
        }
    }
}
