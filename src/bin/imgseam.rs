use std::path::{Path, PathBuf};
use std::process;
use std::rc::Rc;

use clap::{App, Arg, ArgMatches};
use failure::{bail, Error};
use image::ColorType;
use log::info;

use imgseam::cq;
use imgseam::energy::energy_to_gray;
use imgseam::{CarveSession, SessionObserver};

/// Logs the session events the GUI front-ends repaint on.
struct Progress;

impl SessionObserver for Progress {
    fn on_image_change(&self) {
        info!("image loaded");
    }

    fn on_image_seamed(&self) {
        info!("image carved");
    }
}

/// Default output path: the input name with a suffix spliced in
/// before the extension, e.g. `cat.png` -> `cat_seam.png`.
fn suggested_output(input: &Path, suffix: &str, force_png: bool) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    let ext = cq!(
        force_png,
        "png",
        input.extension().and_then(|s| s.to_str()).unwrap_or("png")
    );
    input.with_file_name(format!("{}_{}.{}", stem, suffix, ext))
}

fn parse_dimension(matches: &ArgMatches, name: &str, fallback: u32) -> Result<u32, Error> {
    match matches.value_of(name) {
        Some(raw) => match raw.parse::<u32>() {
            Ok(v) => Ok(v),
            Err(_) => bail!("--{} wants a positive pixel count, not {:?}", name, raw),
        },
        None => Ok(fallback),
    }
}

fn run(matches: &ArgMatches) -> Result<(), Error> {
    let input = Path::new(matches.value_of("file").unwrap());

    let mut session = CarveSession::new();
    if !session.accepts(input) {
        bail!("{} does not look like an image we can read", input.display());
    }
    session.register_observer(Rc::new(Progress));
    session.load(input)?;

    if matches.is_present("energy") {
        let original = session.original_image();
        let out = matches
            .value_of("output")
            .map(PathBuf::from)
            .unwrap_or_else(|| suggested_output(input, "energy", true));
        image::save_buffer(
            &out,
            &energy_to_gray(original),
            original.width(),
            original.height(),
            ColorType::Gray(8),
        )?;
        println!("{}", out.display());
        return Ok(());
    }

    let width = parse_dimension(matches, "width", session.original_image().width())?;
    let height = parse_dimension(matches, "height", session.original_image().height())?;
    session.carve_to(width, height)?;

    let carved = session.active_image();
    let out = matches
        .value_of("output")
        .map(PathBuf::from)
        .unwrap_or_else(|| suggested_output(input, "seam", false));
    image::save_buffer(
        &out,
        &carved.packed_rgb(),
        carved.width(),
        carved.height(),
        ColorType::RGB(8),
    )?;
    println!("{}", out.display());
    Ok(())
}

fn main() {
    env_logger::init();

    let matches = App::new("imgseam")
        .version("0.1.0")
        .about("Content-aware image shrinking by seam carving")
        .arg(
            Arg::with_name("file")
                .help("The image to carve")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("width")
                .long("width")
                .takes_value(true)
                .help("Target width in pixels (defaults to the input width)"),
        )
        .arg(
            Arg::with_name("height")
                .long("height")
                .takes_value(true)
                .help("Target height in pixels (defaults to the input height)"),
        )
        .arg(
            Arg::with_name("output")
                .long("output")
                .short("o")
                .takes_value(true)
                .help("Where to write the result (defaults to <name>_seam.<ext>)"),
        )
        .arg(
            Arg::with_name("energy")
                .long("energy")
                .help("Write the grayscale energy map instead of carving"),
        )
        .get_matches();

    if let Err(err) = run(&matches) {
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}
