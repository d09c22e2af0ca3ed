#![forbid(unsafe_code)]

mod args;
mod logger;
mod show;

#[macro_use]
extern crate clap;

use clap::AppSettings;
use logger::CliLogger;
use std::process;

fn main() {
    let matches = clap_app!(app =>
        (name: "tagkit")
        (version: crate_version!())
        (about: "Reads ID3v2 tag metadata from audio files.")
        (setting: AppSettings::SubcommandRequiredElseHelp)
        (@arg verbose: -v --verbose "Print informational log messages")
        (@subcommand show =>
            (about: "Read and print a file's ID3v2 tag")
            (@arg path: +required +takes_value +multiple "Files to read")
            (@arg tags: -t --tags +takes_value +multiple "Only show these fields")
            (settings: &[AppSettings::DisableVersion])
        )
    )
    .get_matches();

    if matches.is_present("verbose") {
        CliLogger::setup();
    }

    let result = match matches.subcommand() {
        ("show", Some(show_matches)) => show::show(
            show_matches.values_of("path").unwrap(),
            show_matches.values_of("tags").map(|v| v.collect()),
        ),
        _ => unreachable!(),
    };

    if let Err(err) = result {
        eprintln!("tagkit: {}", err);
        process::exit(1);
    }
}
